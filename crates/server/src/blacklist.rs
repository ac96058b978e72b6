use std::collections::HashSet;
use std::sync::Arc;

use burner_provider::Blacklist;

use crate::config::BlacklistConfig;

/// Build the sender predicate handed to the email provider.
///
/// A sender is refused when its full address or its domain is listed. Both
/// comparisons ignore ASCII case.
pub fn build_blacklist(config: &BlacklistConfig) -> Blacklist {
    let domains: HashSet<String> = config
        .domains
        .iter()
        .map(|d| d.trim().to_ascii_lowercase())
        .collect();
    let addresses: HashSet<String> = config
        .addresses
        .iter()
        .map(|a| a.trim().to_ascii_lowercase())
        .collect();

    Arc::new(move |sender: &str| {
        let sender = sender.trim().to_ascii_lowercase();
        if addresses.contains(&sender) {
            return true;
        }
        sender
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domains.contains(domain))
    })
}
