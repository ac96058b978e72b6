//! Link rewriting for stored HTML bodies.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to rewrite html: {0}")]
    Rewrite(String),
}

/// Set `target="_blank"` on every `<a>` element so links open outside the
/// viewer. Markup that leaves the parser in an ambiguous state is rejected
/// rather than guessed at.
///
/// The rewriter parses with scripting enabled, so `<noscript>` content is raw
/// text and anchors inside it are left untouched.
pub fn add_target_blank(html: &str) -> Result<String, ContentError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a", |el| {
                el.set_attribute("target", "_blank")?;
                Ok(())
            })],
            strict: true,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| ContentError::Rewrite(e.to_string()))
}
