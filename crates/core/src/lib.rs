pub mod id;
pub mod inbox;
pub mod message;
pub mod received;

pub use id::generate_id;
pub use inbox::{Inbox, InboxStatus, UNREGISTERED_ROUTE_ID, new_inbox};
pub use message::Message;
pub use received::{received_details, received_details_at};
