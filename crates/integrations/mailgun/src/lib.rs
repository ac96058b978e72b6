mod client;
mod config;
mod error;
mod form;
mod provider;
mod signature;

pub use client::{MailgunClient, NewRoute, RouteRecord};
pub use config::MailgunConfig;
pub use error::MailgunError;
pub use provider::{INCOMING_PATH, MailgunProvider};
pub use signature::MailgunVerifier;
