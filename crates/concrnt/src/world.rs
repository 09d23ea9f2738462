//! Message and association body types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main profile document body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub username: String,
    pub avatar: String,
    pub description: String,
    pub banner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprofiles: Option<Vec<String>>,
}

/// Custom emoji, keyed by shortcode in the containing map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emoji {
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

/// Authorship presentation override for documents signed by the proxy key
/// on behalf of a remote author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileOverride {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(rename = "characterID", skip_serializing_if = "String::is_empty")]
    pub character_id: String,
}

/// Plain markdown message body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownMessage {
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emojis: Option<HashMap<String, Emoji>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// One attached media item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Media {
    #[serde(rename = "mediaURL")]
    pub media_url: String,
    pub media_type: String,
    #[serde(rename = "thumbnailURL", skip_serializing_if = "String::is_empty")]
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub blurhash: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flag: String,
}

/// Message body carrying media attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaMessage {
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emojis: Option<HashMap<String, Emoji>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medias: Option<Vec<Media>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Reply message body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplyMessage {
    #[serde(rename = "replyToMessageId")]
    pub reply_to_message_id: String,
    pub reply_to_message_author: String,
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emojis: Option<HashMap<String, Emoji>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Reroute (boost/quote) message body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RerouteMessage {
    #[serde(rename = "rerouteMessageId")]
    pub reroute_message_id: String,
    pub reroute_message_author: String,
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emojis: Option<HashMap<String, Emoji>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Plain like association body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LikeAssociation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Custom emoji reaction association body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactionAssociation {
    pub image_url: String,
    pub shortcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Reply notification association body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplyAssociation {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub message_author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Reroute notification association body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RerouteAssociation {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub message_author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<ProfileOverride>,
}

/// Parameters of the whisper visibility policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhisperPolicy {
    pub participants: Vec<String>,
}

/// Community timeline document body, used to canonicalize hashtag names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityTimeline {
    pub name: String,
    pub shortname: String,
    pub description: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reroute_message_field_names() {
        let msg = RerouteMessage {
            reroute_message_id: "m1".into(),
            reroute_message_author: "CCauthor".into(),
            body: String::new(),
            ..Default::default()
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"rerouteMessageId\":\"m1\""));
        assert!(json.contains("\"rerouteMessageAuthor\":\"CCauthor\""));
    }

    #[test]
    fn test_emoji_map_round_trip() {
        let mut emojis = HashMap::new();
        emojis.insert(
            "party".to_string(),
            Emoji {
                image_url: "https://r/p.png".into(),
            },
        );
        let json = serde_json::to_string(&emojis).unwrap();
        assert!(json.contains("\"imageURL\":\"https://r/p.png\""));

        let back: HashMap<String, Emoji> = serde_json::from_str(&json).unwrap();
        assert_eq!(back["party"].image_url, "https://r/p.png");
    }
}
