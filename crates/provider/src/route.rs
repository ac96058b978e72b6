//! TTL tagging of provider forwarding rules.
//!
//! A route's free-text description carries the owning inbox's expiry as a
//! decimal epoch-seconds string. The sweeper relies on this to decide which
//! routes to delete without consulting local storage.

use std::num::ParseIntError;

pub fn encode_route_ttl(ttl: i64) -> String {
    ttl.to_string()
}

pub fn decode_route_ttl(description: &str) -> Result<i64, ParseIntError> {
    description.trim().parse()
}
