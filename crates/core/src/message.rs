use serde::{Deserialize, Serialize};

/// A single inbound email stored under its owning inbox.
///
/// Messages are immutable once stored and are removed only together with the
/// inbox that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, generated at ingestion time.
    pub id: String,

    /// Identifier of the owning inbox.
    pub inbox_id: String,

    /// The relay's own message identifier. Kept for bookkeeping only.
    #[serde(rename = "ep_id")]
    pub email_provider_id: String,

    /// Epoch seconds at ingestion.
    pub received_at: i64,

    /// Copied from the owning inbox at ingestion time.
    pub ttl: i64,

    /// Envelope sender.
    pub sender: String,

    /// `From` header as received.
    pub from: String,

    pub subject: String,

    pub body_plain: String,

    /// HTML body with rewritten links. `None` when the inbound event carried
    /// no HTML part, so clients fall back to the plain body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            id: "m1".into(),
            inbox_id: "i1".into(),
            email_provider_id: "<abc@mail.example.com>".into(),
            received_at: 100,
            ttl: 200,
            sender: "bob@example.com".into(),
            from: "Bobby Tables <bob@example.com>".into(),
            subject: "DELETE FROM MESSAGES;".into(),
            body_plain: "Hello there".into(),
            body_html: None,
        }
    }

    #[test]
    fn absent_html_is_omitted() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("body_html").is_none());
        assert_eq!(json["ep_id"], "<abc@mail.example.com>");
    }

    #[test]
    fn missing_html_deserializes_to_none() {
        let json = r#"{
            "id": "m1",
            "inbox_id": "i1",
            "ep_id": "x",
            "received_at": 1,
            "ttl": 2,
            "sender": "a@b.c",
            "from": "a@b.c",
            "subject": "hi",
            "body_plain": "plain"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.body_html.is_none());
        assert_eq!(msg.body_plain, "plain");
    }

    #[test]
    fn present_html_survives_serde() {
        let mut msg = sample();
        msg.body_html = Some("<p>hi</p>".into());
        let back: Message = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(back.body_html.as_deref(), Some("<p>hi</p>"));
    }
}
