pub mod error;
pub mod html;
pub mod ingest;
pub mod log;
pub mod provider;
pub mod route;
pub mod signature;
pub mod sweeper;

pub use error::ProviderError;
pub use html::{ContentError, add_target_blank};
pub use ingest::{IncomingMail, IngestError, IngestPipeline};
pub use log::LogEmailProvider;
pub use provider::{Blacklist, EmailProvider, ProviderContext, allow_all};
pub use route::{decode_route_ttl, encode_route_ttl};
pub use signature::{SignatureError, SignatureVerifier, WebhookSignature};
pub use sweeper::{Route, RouteClient, RouteSweeper, SweepReport, SweeperConfig};
