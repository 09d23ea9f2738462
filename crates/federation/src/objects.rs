//! Outbound ActivityPub wire types.
//!
//! One sparse catch-all object covers every activity and actor shape the
//! bridge emits; `skip_serializing_if` keeps the wire form minimal. Inbound
//! payloads never deserialize into this shape, they go through
//! [`crate::RawApObj`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A sparse ActivityPub object.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApObject {
    #[serde(rename = "@context", skip_serializing_if = "Value::is_null")]
    pub context: Value,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub actor: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub object_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachment: Vec<Attachment>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub in_reply_to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(rename = "_misskey_content", skip_serializing_if = "String::is_empty")]
    pub misskey_content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub published: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attributed_to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub quote_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub inbox: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub outbox: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub shared_inbox: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<PersonEndpoints>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub followers: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub following: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preferred_username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Key>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub object: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
}

/// Actor endpoints block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEndpoints {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub shared_inbox: String,
}

/// Actor public key block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub key_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub owner: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub public_key_pem: String,
}

/// Icon block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub icon_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub media_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub url: String,
}

/// Attachment block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub attachment_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub media_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub url: String,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub sensitive: bool,
}

/// Tag block (Emoji, Hashtag, Mention).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub tag_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub href: String,
}

/// host-meta style well-known response.
#[derive(Debug, Clone, Serialize)]
pub struct WellKnown {
    pub links: Vec<WellKnownLink>,
}

/// Link of a well-known response.
#[derive(Debug, Clone, Serialize)]
pub struct WellKnownLink {
    pub rel: String,
    pub href: String,
}

/// WebFinger JRD response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebFinger {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub links: Vec<WebFingerLink>,
}

/// Link of a WebFinger response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebFingerLink {
    #[serde(default)]
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub link_type: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub href: String,
}

/// NodeInfo 2.0 document.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub version: String,
    pub software: NodeInfoSoftware,
    pub protocols: Vec<String>,
    pub open_registrations: bool,
    pub metadata: NodeInfoMetadata,
}

/// NodeInfo software block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeInfoSoftware {
    pub name: String,
    pub version: String,
}

/// NodeInfo metadata block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_description: String,
    pub maintainer: NodeInfoMaintainer,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub theme_color: String,
    #[serde(rename = "proxyCCID", skip_serializing_if = "String::is_empty")]
    pub proxy_ccid: String,
}

/// NodeInfo maintainer block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeInfoMaintainer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
}

/// Follows/followers listing returned by the stats endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountStats {
    pub follows: Vec<String>,
    pub followers: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_serialization() {
        let accept = ApObject {
            context: json!("https://www.w3.org/ns/activitystreams"),
            object_type: "Accept".to_string(),
            id: "https://fqdn/ap/acct/alice/follows/x".to_string(),
            actor: "https://fqdn/ap/acct/alice".to_string(),
            object: json!({"type": "Follow"}),
            ..Default::default()
        };

        let wire = serde_json::to_value(&accept).unwrap();
        assert_eq!(wire["type"], "Accept");
        assert_eq!(wire["@context"], "https://www.w3.org/ns/activitystreams");
        // absent fields stay off the wire
        assert!(wire.get("to").is_none());
        assert!(wire.get("inReplyTo").is_none());
        assert!(wire.get("sensitive").is_none());
    }

    #[test]
    fn test_misskey_content_field_name() {
        let note = ApObject {
            object_type: "Note".to_string(),
            misskey_content: "hello".to_string(),
            ..Default::default()
        };
        let wire = serde_json::to_string(&note).unwrap();
        assert!(wire.contains("\"_misskey_content\":\"hello\""));
    }

    #[test]
    fn test_webfinger_parses_remote_document() {
        let body = r#"{
            "subject": "acct:bob@remote",
            "links": [
                {"rel": "http://webfinger.net/rel/profile-page", "type": "text/html", "href": "https://remote/@bob"},
                {"rel": "self", "type": "application/activity+json", "href": "https://remote/users/bob"}
            ]
        }"#;
        let wf: WebFinger = serde_json::from_str(body).unwrap();
        let link = wf.links.iter().find(|l| l.rel == "self").unwrap();
        assert_eq!(link.href, "https://remote/users/bob");
    }
}
