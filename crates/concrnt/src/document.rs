//! Signed document and wire types exchanged with the platform.
//!
//! Documents travel as JSON strings inside commits and pub/sub events; the
//! signature covers the exact serialized bytes, so documents are serialized
//! once and carried opaquely from then on.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// A message document of body type `T`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument<T> {
    pub signer: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema: String,
    pub body: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    pub signed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy_params: String,
    #[serde(default)]
    pub timelines: Vec<String>,
}

/// An association document of body type `T`, targeted at another object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationDocument<T> {
    pub signer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema: String,
    pub body: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    pub signed_at: DateTime<Utc>,
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
    #[serde(default)]
    pub timelines: Vec<String>,
}

/// Minimal view of a document, enough to route a pub/sub event.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentHead {
    #[serde(default)]
    pub signer: String,
    #[serde(rename = "type", default)]
    pub doc_type: String,
}

/// A timeline document of body type `T`. Read-only on the bridge side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDocument<T> {
    pub signer: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema: String,
    pub body: T,
}

/// A profile document of body type `T`. Read-only on the bridge side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument<T> {
    pub signer: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema: String,
    pub body: T,
}

/// A deletion document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocument {
    pub signer: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub signed_at: DateTime<Utc>,
    pub target: String,
}

/// A signed commit submitted to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub document: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub option: String,
}

/// Commit options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOption {
    pub is_ephemeral: bool,
}

/// Envelope of every gateway response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseBase<T> {
    pub status: String,
    pub content: T,
}

/// A stored message as returned by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub document: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timelines: Vec<String>,
}

/// A stored association as returned by the gateway or in events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Association {
    pub id: String,
    pub author: String,
    pub owner: String,
    pub schema: String,
    pub target: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub variant: String,
    pub document: String,
}

/// Registry record of an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityInfo {
    pub ccid: String,
    pub domain: String,
}

/// Registry record of a timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineRecord {
    pub id: String,
    pub owner: String,
    pub document: String,
}

/// Registry record of a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub id: String,
    pub author: String,
    pub document: String,
}

/// One pub/sub timeline event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub timeline: String,
    pub item: TimelineItem,
    pub document: String,
    pub resource: Value,
}

/// Timeline item referenced by an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineItem {
    #[serde(rename = "resourceID")]
    pub resource_id: String,
    #[serde(rename = "timelineID")]
    pub timeline_id: String,
    pub owner: String,
    pub author: String,
}

/// Deserialize a document string into a concrete document shape.
///
/// # Errors
///
/// Returns the serde error when the payload does not match `T`.
pub fn parse_document<T: DeserializeOwned>(document: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(document)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::world::MarkdownMessage;

    #[test]
    fn test_message_document_serialization() {
        let doc = MessageDocument {
            signer: "CCproxy".to_string(),
            doc_type: "message".to_string(),
            schema: crate::consts::MARKDOWN_MESSAGE_SCHEMA.to_string(),
            body: MarkdownMessage {
                body: "hello".to_string(),
                ..Default::default()
            },
            meta: None,
            signed_at: Utc::now(),
            policy: String::new(),
            policy_params: String::new(),
            timelines: vec!["t1@example.com".to_string()],
        };

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"type\":\"message\""));
        assert!(json.contains("\"signedAt\""));
        assert!(!json.contains("policyParams"));

        let back: MessageDocument<MarkdownMessage> = parse_document(&json).unwrap();
        assert_eq!(back.body.body, "hello");
    }

    #[test]
    fn test_event_field_names() {
        let payload = r#"{
            "timeline": "t1@example.com",
            "item": {"resourceID": "m123", "timelineID": "t1", "owner": "CCa", "author": "CCa"},
            "document": "{}",
            "resource": {}
        }"#;
        let event: Event = serde_json::from_str(payload).unwrap();
        assert_eq!(event.item.resource_id, "m123");
    }

    #[test]
    fn test_commit_option() {
        let opt = CommitOption { is_ephemeral: true };
        assert_eq!(serde_json::to_string(&opt).unwrap(), "{\"isEphemeral\":true}");
    }
}
