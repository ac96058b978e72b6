//! Conversions between the domain model and `DynamoDB` attribute maps.
//!
//! Attribute names match the persisted schema: an inbox item carries `id`,
//! `email_address`, `ttl`, `ep_routeid`, `failed_to_create` and a `messages`
//! map whose values are nested message maps keyed by message id.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use burner_core::{Inbox, Message};
use burner_store::StoreError;

pub const ID: &str = "id";
pub const ADDRESS: &str = "email_address";
pub const TTL: &str = "ttl";
pub const ROUTE_ID: &str = "ep_routeid";
pub const FAILED: &str = "failed_to_create";
pub const MESSAGES: &str = "messages";

const INBOX_ID: &str = "inbox_id";
const PROVIDER_ID: &str = "ep_id";
const RECEIVED_AT: &str = "received_at";
const SENDER: &str = "sender";
const FROM: &str = "from";
const SUBJECT: &str = "subject";
const BODY_PLAIN: &str = "body_plain";
const BODY_HTML: &str = "body_html";

type Item = HashMap<String, AttributeValue>;

/// Full inbox item for `PutItem`, including an empty `messages` map.
pub fn inbox_to_item(inbox: &Inbox) -> Item {
    HashMap::from([
        (ID.to_owned(), AttributeValue::S(inbox.id.clone())),
        (ADDRESS.to_owned(), AttributeValue::S(inbox.address.clone())),
        (TTL.to_owned(), AttributeValue::N(inbox.ttl.to_string())),
        (
            ROUTE_ID.to_owned(),
            AttributeValue::S(inbox.email_provider_route_id.clone()),
        ),
        (FAILED.to_owned(), AttributeValue::Bool(inbox.failed_to_create)),
        (MESSAGES.to_owned(), AttributeValue::M(HashMap::new())),
    ])
}

pub fn inbox_from_item(item: &Item) -> Result<Inbox, StoreError> {
    Ok(Inbox {
        id: string(item, ID)?,
        address: string(item, ADDRESS)?,
        ttl: number(item, TTL)?,
        email_provider_route_id: string(item, ROUTE_ID)?,
        failed_to_create: match item.get(FAILED) {
            Some(AttributeValue::Bool(b)) => *b,
            None => false,
            Some(_) => return Err(wrong_type(FAILED)),
        },
    })
}

/// Nested map value stored under `messages.<id>`.
pub fn message_to_attr(message: &Message) -> AttributeValue {
    let mut map = HashMap::from([
        (ID.to_owned(), AttributeValue::S(message.id.clone())),
        (INBOX_ID.to_owned(), AttributeValue::S(message.inbox_id.clone())),
        (
            PROVIDER_ID.to_owned(),
            AttributeValue::S(message.email_provider_id.clone()),
        ),
        (
            RECEIVED_AT.to_owned(),
            AttributeValue::N(message.received_at.to_string()),
        ),
        (TTL.to_owned(), AttributeValue::N(message.ttl.to_string())),
        (SENDER.to_owned(), AttributeValue::S(message.sender.clone())),
        (FROM.to_owned(), AttributeValue::S(message.from.clone())),
        (SUBJECT.to_owned(), AttributeValue::S(message.subject.clone())),
        (
            BODY_PLAIN.to_owned(),
            AttributeValue::S(message.body_plain.clone()),
        ),
    ]);
    if let Some(html) = &message.body_html {
        map.insert(BODY_HTML.to_owned(), AttributeValue::S(html.clone()));
    }
    AttributeValue::M(map)
}

pub fn message_from_attr(value: &AttributeValue) -> Result<Message, StoreError> {
    let AttributeValue::M(map) = value else {
        return Err(StoreError::Serialization(
            "message attribute is not a map".to_owned(),
        ));
    };
    Ok(Message {
        id: string(map, ID)?,
        inbox_id: string(map, INBOX_ID)?,
        email_provider_id: string(map, PROVIDER_ID)?,
        received_at: number(map, RECEIVED_AT)?,
        ttl: number(map, TTL)?,
        sender: string(map, SENDER)?,
        from: string(map, FROM)?,
        subject: string(map, SUBJECT)?,
        body_plain: string(map, BODY_PLAIN)?,
        body_html: match map.get(BODY_HTML) {
            Some(AttributeValue::S(s)) => Some(s.clone()),
            Some(AttributeValue::Null(_)) | None => None,
            Some(_) => return Err(wrong_type(BODY_HTML)),
        },
    })
}

/// Decode every value of a `messages` map.
pub fn messages_from_attr(value: Option<&AttributeValue>) -> Result<Vec<Message>, StoreError> {
    match value {
        None => Ok(Vec::new()),
        Some(AttributeValue::M(map)) => map.values().map(message_from_attr).collect(),
        Some(_) => Err(wrong_type(MESSAGES)),
    }
}

fn string(item: &Item, name: &str) -> Result<String, StoreError> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        None => Ok(String::new()),
        Some(_) => Err(wrong_type(name)),
    }
}

fn number(item: &Item, name: &str) -> Result<i64, StoreError> {
    match item.get(name) {
        Some(AttributeValue::N(n)) => n
            .parse::<i64>()
            .map_err(|e| StoreError::Serialization(format!("{name}: {e}"))),
        None => Ok(0),
        Some(_) => Err(wrong_type(name)),
    }
}

fn wrong_type(name: &str) -> StoreError {
    StoreError::Serialization(format!("attribute {name} has an unexpected type"))
}
