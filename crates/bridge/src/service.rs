//! Note ↔ Message translation.

use std::collections::HashMap;
use std::sync::OnceLock;

use ccbridge_common::{ApConfig, AppError, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::{
    parse_document, AssociationDocument, Message, MessageDocument, TimelineDocument,
};
use ccbridge_concrnt::world::{
    CommunityTimeline, Emoji, MarkdownMessage, Media, MediaMessage, ProfileOverride,
    ReplyAssociation, ReplyMessage, RerouteAssociation, RerouteMessage, WhisperPolicy,
};
use ccbridge_concrnt::{GatewayClient, Options};
use ccbridge_federation::{ApObject, Attachment, Icon, RawApObj, Tag, AS_PUBLIC};
use ccbridge_store::Store;
use chrono::{DateTime, SecondsFormat, Utc};
use pulldown_cmark::{html, Options as MarkdownOptions, Parser};
use regex::Regex;
use serde_json::json;
use tracing::{instrument, warn};

/// Inbound content is truncated at this many characters.
const MAX_CONTENT_LEN: usize = 4096;

fn image_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\(([^)]*)\)").expect("valid regex"))
}

fn hashtag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[^#\s]+").expect("valid regex"))
}

fn cw_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<details>(.*)<summary>(.*)</summary>(.*)</details>").expect("valid regex")
    })
}

/// Translation service between AP objects and Native documents.
#[derive(Clone)]
pub struct Bridge {
    store: Store,
    gateway: GatewayClient,
    config: ApConfig,
}

#[derive(Debug)]
struct ResolvedVisibility {
    visibility: &'static str,
    participants: Vec<String>,
}

impl Bridge {
    /// Create a new bridge.
    #[must_use]
    pub const fn new(store: Store, gateway: GatewayClient, config: ApConfig) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    fn note_url(&self, id: &str) -> String {
        format!("https://{}/ap/note/{id}", self.config.fqdn)
    }

    fn acct_url(&self, id: &str) -> String {
        format!("https://{}/ap/acct/{id}", self.config.fqdn)
    }

    fn acct_prefix(&self) -> String {
        format!("https://{}/ap/acct/", self.config.fqdn)
    }

    fn note_prefix(&self) -> String {
        format!("https://{}/ap/note/", self.config.fqdn)
    }

    /// Resolve visibility class and whisper participants from `to`/`cc`.
    ///
    /// Public sentinel anywhere wins outright. Otherwise `to` entries ending
    /// in `/followers` select followers visibility and enumerate the
    /// publisher's local followers; a direct local recipient overrides
    /// followers and stops the scan.
    async fn resolve_visibility(
        &self,
        object: &RawApObj,
    ) -> AppResult<ResolvedVisibility> {
        let to = object.get_str_list("to");
        let cc = object.get_str_list("cc");

        if to.iter().chain(cc.iter()).any(|v| v == AS_PUBLIC) {
            return Ok(ResolvedVisibility {
                visibility: "public",
                participants: Vec::new(),
            });
        }

        let mut visibility: &'static str = "";
        let mut participants = Vec::new();

        for recipient in &to {
            if recipient.ends_with("/followers") {
                visibility = "followers";

                let publisher = object.must_str("attributedTo");
                match self.store.follows.find_by_publisher(&publisher).await {
                    Ok(follows) => {
                        for follow in follows {
                            match self
                                .store
                                .entities
                                .find_by_id(&follow.subscriber_user_id)
                                .await
                            {
                                Ok(Some(entity)) => participants.push(entity.ccid),
                                Ok(None) => {
                                    warn!(id = %follow.subscriber_user_id, "entity not found");
                                }
                                Err(e) => warn!(error = %e, "entity lookup failed"),
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "followers not found"),
                }
            }

            if let Some(local) = recipient.strip_prefix(&self.acct_prefix()) {
                visibility = "direct";
                match self.store.entities.find_by_id(local).await {
                    Ok(Some(entity)) => participants.push(entity.ccid),
                    _ => warn!(id = %local, "entity not found"),
                }
                break;
            }
        }

        if visibility.is_empty() || participants.is_empty() {
            return Err(AppError::BadRequest("invalid to".to_string()));
        }

        Ok(ResolvedVisibility {
            visibility,
            participants,
        })
    }

    /// Resolve a reply/quote target to a Native message id and author.
    ///
    /// Local note URLs are stripped and loaded; anything else goes through
    /// the cross-reference (author defaults to the proxy address there).
    async fn resolve_cross_reference(&self, target: &str) -> AppResult<(String, String)> {
        if let Some(local) = target.strip_prefix(&self.note_prefix()) {
            let message = self
                .gateway
                .get_message(local, Some(&Options::resolver(&self.config.fqdn)))
                .await
                .map_err(|e| e.context("message not found"))?;
            return Ok((message.id, message.author));
        }

        let reference = self
            .store
            .references
            .find_by_ap_id(target)
            .await?
            .ok_or_else(|| AppError::ReferenceNotFound(target.to_string()))?;
        Ok((reference.cc_object_id, self.config.proxy_ccid.clone()))
    }

    /// Convert an inbound AP Note into a committed Native message.
    ///
    /// Mints the message document with the proxy key, commits it ephemerally
    /// and, for replies and quotes, follows up with an association on the
    /// parent author's notify timeline.
    #[instrument(name = "Bridge.NoteToMessage", skip_all)]
    pub async fn note_to_message(
        &self,
        object: &RawApObj,
        person: &RawApObj,
        dest_streams: Vec<String>,
    ) -> AppResult<Message> {
        let host = url::Url::parse(&person.must_str("id"))
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let actor_id = format!("@{}@{host}", person.must_str("preferredUsername"));

        let (content, is_misskey) = select_content(object);
        let content = cap_content(content);

        let emojis = collect_emojis(object);
        let flag = content_flag(object);
        let date = parse_published(object);

        let mut content_with_image = content.clone();
        for attachment in object.get_obj_list("attachment") {
            if attachment.must_str("type") == "document" {
                content_with_image.push_str("\n\n![image](");
                content_with_image.push_str(&attachment.must_str("url"));
                content_with_image.push(')');
            }
        }

        let username = display_name(person);
        let profile_override = ProfileOverride {
            username: username.clone(),
            avatar: person.must_str("icon.url"),
            link: person.must_str("url"),
            ..Default::default()
        };

        let resolved = self.resolve_visibility(object).await?;

        let (policy, policy_params) = if resolved.participants.is_empty() {
            (String::new(), String::new())
        } else {
            let params = WhisperPolicy {
                participants: resolved.participants.clone(),
            };
            (
                consts::WHISPER_POLICY.to_string(),
                serde_json::to_string(&params).map_err(|e| AppError::Internal(e.to_string()))?,
            )
        };

        let meta = json!({
            "apActorId": actor_id,
            "apActor": person.must_str("url"),
            "apObjectRef": object.must_str("id"),
            "apPublisherInbox": person.must_str("inbox"),
            "visibility": resolved.visibility,
        });

        let in_reply_to = object.must_str("inReplyTo");
        let quote_url = object.must_str("quoteUrl");
        let attachments = object.get_obj_list("attachment");

        let mut reply_target: Option<(String, String)> = None;
        let mut reroute_target: Option<(String, String)> = None;

        let document = if !in_reply_to.is_empty() {
            if content.is_empty() {
                return Err(AppError::BadRequest("empty content".to_string()));
            }
            let (target_id, target_author) = self
                .resolve_cross_reference(&in_reply_to)
                .await
                .map_err(|e| e.context("bridge/note reply"))?;
            reply_target = Some((target_id.clone(), target_author.clone()));

            let doc = MessageDocument {
                signer: self.config.proxy_ccid.clone(),
                doc_type: "message".to_string(),
                schema: consts::REPLY_MESSAGE_SCHEMA.to_string(),
                body: ReplyMessage {
                    reply_to_message_id: target_id,
                    reply_to_message_author: target_author,
                    body: content_with_image.clone(),
                    flag,
                    emojis: Some(emojis),
                    profile_override: Some(profile_override.clone()),
                },
                meta: Some(meta),
                signed_at: date,
                policy,
                policy_params,
                timelines: dest_streams,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        } else if !quote_url.is_empty() {
            if content.is_empty() {
                return Err(AppError::BadRequest("empty content".to_string()));
            }
            let (target_id, target_author) = self
                .resolve_cross_reference(&quote_url)
                .await
                .map_err(|e| e.context("bridge/note quote"))?;
            reroute_target = Some((target_id.clone(), target_author.clone()));

            let doc = MessageDocument {
                signer: self.config.proxy_ccid.clone(),
                doc_type: "message".to_string(),
                schema: consts::REROUTE_MESSAGE_SCHEMA.to_string(),
                body: RerouteMessage {
                    reroute_message_id: target_id,
                    reroute_message_author: target_author,
                    body: content_with_image.clone(),
                    flag,
                    emojis: Some(emojis),
                    profile_override: Some(profile_override.clone()),
                },
                meta: Some(meta),
                signed_at: date,
                policy,
                policy_params,
                timelines: dest_streams,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        } else if !attachments.is_empty() {
            let medias: Vec<Media> = attachments
                .iter()
                .map(|attachment| {
                    let media_type = attachment.must_str("mediaType");
                    Media {
                        media_url: attachment.must_str("url"),
                        media_type: if media_type.is_empty() {
                            "image/png".to_string()
                        } else {
                            media_type
                        },
                        flag: if attachment.must_bool("sensitive") {
                            "sensitive".to_string()
                        } else {
                            String::new()
                        },
                        ..Default::default()
                    }
                })
                .collect();

            let doc = MessageDocument {
                signer: self.config.proxy_ccid.clone(),
                doc_type: "message".to_string(),
                schema: consts::MEDIA_MESSAGE_SCHEMA.to_string(),
                body: MediaMessage {
                    body: content,
                    flag,
                    emojis: Some(emojis),
                    medias: Some(medias),
                    profile_override: Some(profile_override.clone()),
                },
                meta: Some(meta),
                signed_at: date,
                policy,
                policy_params,
                timelines: dest_streams,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        } else {
            if content.is_empty() {
                return Err(AppError::BadRequest("empty content".to_string()));
            }
            let schema = if is_misskey {
                consts::MISSKEY_MESSAGE_SCHEMA
            } else {
                consts::MARKDOWN_MESSAGE_SCHEMA
            };

            let doc = MessageDocument {
                signer: self.config.proxy_ccid.clone(),
                doc_type: "message".to_string(),
                schema: schema.to_string(),
                body: MarkdownMessage {
                    body: content,
                    flag,
                    emojis: Some(emojis),
                    profile_override: Some(profile_override.clone()),
                },
                meta: Some(meta),
                signed_at: date,
                policy,
                policy_params,
                timelines: dest_streams,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        };

        let created: Message = self
            .gateway
            .commit_document(&document, &self.config.proxy_priv, true)
            .await
            .map_err(|e| e.context("bridge/note Commit"))?;

        // surface the inbound interaction to the parent author
        let notify_override = ProfileOverride {
            username,
            avatar: person.must_str("icon.url"),
            link: object.must_str("actor"),
            ..Default::default()
        };

        if let Some((target_id, target_author)) = reply_target {
            let doc = AssociationDocument {
                signer: self.config.proxy_ccid.clone(),
                owner: target_author.clone(),
                doc_type: "association".to_string(),
                schema: consts::REPLY_ASSOCIATION_SCHEMA.to_string(),
                body: ReplyAssociation {
                    message_id: created.id.clone(),
                    message_author: created.author.clone(),
                    profile_override: Some(notify_override),
                },
                meta: None,
                signed_at: date,
                target: target_id,
                variant: String::new(),
                timelines: vec![format!("{}@{target_author}", consts::USER_NOTIFY_STREAM)],
            };
            let document =
                serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?;
            let _: serde_json::Value = self
                .gateway
                .commit_document(&document, &self.config.proxy_priv, true)
                .await
                .map_err(|e| e.context("bridge/note reply association Commit"))?;
        } else if let Some((target_id, target_author)) = reroute_target {
            let doc = AssociationDocument {
                signer: self.config.proxy_ccid.clone(),
                owner: target_author.clone(),
                doc_type: "association".to_string(),
                schema: consts::REROUTE_ASSOCIATION_SCHEMA.to_string(),
                body: RerouteAssociation {
                    message_id: created.id.clone(),
                    message_author: created.author.clone(),
                    profile_override: Some(notify_override),
                },
                meta: None,
                signed_at: date,
                target: target_id,
                variant: String::new(),
                timelines: vec![format!("{}@{target_author}", consts::USER_NOTIFY_STREAM)],
            };
            let document =
                serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?;
            let _: serde_json::Value = self
                .gateway
                .commit_document(&document, &self.config.proxy_priv, true)
                .await
                .map_err(|e| e.context("bridge/note reroute association Commit"))?;
        }

        Ok(created)
    }

    /// Convert a Native message into an AP object.
    ///
    /// Markdown and media messages become a `Note`; replies become a `Note`
    /// with `inReplyTo` and a mention of the parent author; reroutes become
    /// an `Announce` (empty body) or a quote `Note`.
    #[instrument(name = "Bridge.MessageToNote", skip(self))]
    pub async fn message_to_note(&self, message_id: &str) -> AppResult<ApObject> {
        let message = self
            .gateway
            .get_message(message_id, Some(&Options::resolver(&self.config.fqdn)))
            .await
            .map_err(|e| e.context("bridge/message GetMessage"))?;

        let author_entity = self
            .store
            .entities
            .get_by_ccid(&message.author)
            .await
            .map_err(|e| e.context("bridge/message GetEntityByCCID"))?;

        let document: MessageDocument<MediaMessage> = parse_document(&message.document)
            .map_err(|_| AppError::BadRequest("invalid payload".to_string()))?;

        let mut text = document.body.body.clone();
        let mut tags: Vec<Tag> = Vec::new();

        let mut images = extract_images(&text);
        if let Some(medias) = &document.body.medias {
            images.extend(medias.iter().map(|m| m.media_url.clone()));
        }

        // hashtags, canonicalizing @-qualified timeline references
        for hashtag in hashtag_pattern()
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect::<Vec<_>>()
        {
            if hashtag.contains('@') {
                let timeline_fqid = hashtag.trim_start_matches('#');
                let Some((_, host)) = timeline_fqid.split_once('@') else {
                    continue;
                };
                let record = match self
                    .gateway
                    .get_timeline(timeline_fqid, Some(&Options::resolver(host)))
                    .await
                {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(timeline = %timeline_fqid, error = %e, "timeline lookup failed");
                        continue;
                    }
                };
                let timeline: TimelineDocument<CommunityTimeline> =
                    match parse_document(&record.document) {
                        Ok(t) => t,
                        Err(e) => {
                            warn!(timeline = %timeline_fqid, error = %e, "invalid timeline document");
                            continue;
                        }
                    };

                tags.push(Tag {
                    tag_type: "Hashtag".to_string(),
                    name: timeline.body.name.clone(),
                    ..Default::default()
                });
                text = text.replace(&hashtag, &format!("#{}", timeline.body.name));
            } else {
                tags.push(Tag {
                    tag_type: "Hashtag".to_string(),
                    name: hashtag,
                    ..Default::default()
                });
            }
        }

        text = strip_images(&text);

        if let Some(emojis) = &document.body.emojis {
            for (shortcode, emoji) in emojis {
                tags.push(Tag {
                    tag_type: "Emoji".to_string(),
                    id: emoji.image_url.clone(),
                    name: format!(":{shortcode}:"),
                    icon: Some(Icon {
                        icon_type: "Image".to_string(),
                        media_type: "image/png".to_string(),
                        url: emoji.image_url.clone(),
                    }),
                    ..Default::default()
                });
            }
        }

        let (summary, body_text) = extract_content_warning(&text);
        let text = body_text;

        let attachments: Vec<Attachment> = images
            .iter()
            .map(|url| Attachment {
                attachment_type: "Document".to_string(),
                media_type: "image/png".to_string(),
                url: url.clone(),
                sensitive: false,
            })
            .collect();

        let html_text = render_markdown(&text);
        let published = document
            .signed_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let context = json!([
            "https://www.w3.org/ns/activitystreams",
            "https://misskey-hub.net/ns#_misskey_content",
        ]);

        if document.schema == consts::MARKDOWN_MESSAGE_SCHEMA
            || document.schema == consts::MISSKEY_MESSAGE_SCHEMA
            || document.schema == consts::MEDIA_MESSAGE_SCHEMA
        {
            return Ok(ApObject {
                context,
                object_type: "Note".to_string(),
                id: self.note_url(&message.id),
                attributed_to: self.acct_url(&author_entity.id),
                summary,
                content: html_text,
                misskey_content: text,
                published,
                to: vec![AS_PUBLIC.to_string()],
                tag: tags,
                attachment: attachments,
                ..Default::default()
            });
        }

        if document.schema == consts::REPLY_MESSAGE_SCHEMA {
            let reply_document: MessageDocument<ReplyMessage> = parse_document(&message.document)
                .map_err(|_| AppError::BadRequest("invalid payload".to_string()))?;

            let (reference, parent_actor) = self
                .parent_reference(
                    &reply_document.body.reply_to_message_author,
                    &reply_document.body.reply_to_message_id,
                )
                .await?;

            let mut cc = Vec::new();
            if let Some(actor) = parent_actor {
                cc.push(actor.clone());
                tags.push(Tag {
                    tag_type: "Mention".to_string(),
                    href: actor,
                    ..Default::default()
                });
            }

            return Ok(ApObject {
                context,
                object_type: "Note".to_string(),
                id: self.note_url(&message.id),
                attributed_to: self.acct_url(&author_entity.id),
                content: html_text,
                misskey_content: text,
                in_reply_to: reference,
                published,
                to: vec![AS_PUBLIC.to_string()],
                cc,
                tag: tags,
                attachment: attachments,
                ..Default::default()
            });
        }

        if document.schema == consts::REROUTE_MESSAGE_SCHEMA {
            let reroute_document: MessageDocument<RerouteMessage> =
                parse_document(&message.document)
                    .map_err(|_| AppError::BadRequest("invalid payload".to_string()))?;

            let (reference, _) = self
                .parent_reference(
                    &reroute_document.body.reroute_message_author,
                    &reroute_document.body.reroute_message_id,
                )
                .await?;

            if text.is_empty() {
                return Ok(ApObject {
                    context: json!("https://www.w3.org/ns/activitystreams"),
                    object_type: "Announce".to_string(),
                    id: self.note_url(&message.id),
                    object: json!(reference),
                    ..Default::default()
                });
            }

            return Ok(ApObject {
                context,
                object_type: "Note".to_string(),
                id: self.note_url(&message.id),
                attributed_to: self.acct_url(&author_entity.id),
                content: html_text,
                misskey_content: text,
                quote_url: reference,
                published,
                to: vec![AS_PUBLIC.to_string()],
                ..Default::default()
            });
        }

        Err(AppError::BadRequest("invalid schema".to_string()))
    }

    /// Load the parent of a reply/reroute and recover its AP identifiers.
    ///
    /// Returns the parent's `apObjectRef` (synthetic note URL fallback) and
    /// its `apActor` meta when present.
    async fn parent_reference(
        &self,
        parent_author: &str,
        parent_id: &str,
    ) -> AppResult<(String, Option<String>)> {
        let author = self
            .gateway
            .get_entity(parent_author, Some(&Options::resolver(&self.config.fqdn)))
            .await
            .map_err(|e| e.context("bridge/message GetEntity"))?;

        let source = self
            .gateway
            .get_message(parent_id, Some(&Options::resolver(&author.domain)))
            .await
            .map_err(|e| e.context("bridge/message parent GetMessage"))?;

        let source_document: MessageDocument<MarkdownMessage> = parse_document(&source.document)
            .map_err(|_| AppError::BadRequest("invalid payload".to_string()))?;

        let meta = source_document.meta.unwrap_or_default();
        let reference = meta
            .get("apObjectRef")
            .and_then(serde_json::Value::as_str)
            .map_or_else(
                || format!("https://{}/ap/note/{parent_id}", author.domain),
                str::to_string,
            );
        let actor = meta
            .get("apActor")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        Ok((reference, actor))
    }
}

/// Pick the message body: misskey source when present, HTML otherwise.
fn select_content(object: &RawApObj) -> (String, bool) {
    if let Some(content) = object.get_str("_misskey_content") {
        return (content, true);
    }

    let raw = object.must_str("content");
    if raw.is_empty() {
        return (String::new(), false);
    }

    let converted = crate::html::html_to_markdown(&raw);
    (converted.trim_matches('\n').to_string(), false)
}

/// Truncate to the content cap, on a character boundary.
fn cap_content(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_LEN {
        content
    } else {
        content.chars().take(MAX_CONTENT_LEN).collect()
    }
}

fn collect_emojis(object: &RawApObj) -> HashMap<String, Emoji> {
    let mut emojis = HashMap::new();
    for tag in object.get_obj_list("tag") {
        if tag.must_str("type") == "Emoji" {
            let name = tag.must_str("name").trim_matches(':').to_string();
            emojis.insert(
                name,
                Emoji {
                    image_url: tag.must_str("icon.url"),
                },
            );
        }
    }
    emojis
}

/// Content-warning flag: a non-empty `summary` wins over `sensitive`.
fn content_flag(object: &RawApObj) -> String {
    let mut flag = String::new();
    if object.must_bool("sensitive") {
        flag = "sensitive".to_string();
    }
    let summary = object.must_str("summary");
    if !summary.is_empty() {
        flag = summary;
    }
    flag
}

fn parse_published(object: &RawApObj) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&object.must_str("published"))
        .map_or_else(|_| Utc::now(), |d| d.with_timezone(&Utc))
}

fn display_name(person: &RawApObj) -> String {
    let name = person.must_str("name");
    if name.is_empty() {
        person.must_str("preferredUsername")
    } else {
        name
    }
}

fn extract_images(text: &str) -> Vec<String> {
    image_pattern()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn strip_images(text: &str) -> String {
    image_pattern().replace_all(text, "").to_string()
}

/// Split a `<details><summary>X</summary>Y</details>` block into (X, Y).
fn extract_content_warning(text: &str) -> (String, String) {
    cw_pattern().captures(text).map_or_else(
        || (String::new(), text.to_string()),
        |captures| {
            let summary = captures.get(2).map_or("", |m| m.as_str()).to_string();
            let body = captures.get(3).map_or("", |m| m.as_str()).to_string();
            (summary, body)
        },
    )
}

/// Render CommonMark (plus tables and strikethrough) to HTML.
fn render_markdown(text: &str) -> String {
    let mut options = MarkdownOptions::empty();
    options.insert(MarkdownOptions::ENABLE_TABLES);
    options.insert(MarkdownOptions::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered.trim_matches('\n').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawApObj {
        RawApObj::from_value(v)
    }

    #[test]
    fn test_select_content_prefers_misskey_source() {
        let object = raw(json!({
            "_misskey_content": "plain **markdown**",
            "content": "<p>html form</p>"
        }));
        let (content, is_misskey) = select_content(&object);
        assert!(is_misskey);
        assert_eq!(content, "plain **markdown**");
    }

    #[test]
    fn test_select_content_converts_html() {
        let object = raw(json!({
            "content": "<p>hi <a href=\"x\">link</a></p>"
        }));
        let (content, is_misskey) = select_content(&object);
        assert!(!is_misskey);
        assert_eq!(content, "hi [link](x)");
    }

    #[test]
    fn test_cap_content_boundary() {
        let exactly = "a".repeat(4096);
        assert_eq!(cap_content(exactly.clone()).chars().count(), 4096);
        assert_eq!(cap_content(exactly.clone()), exactly);

        let over = "a".repeat(4097);
        assert_eq!(cap_content(over).chars().count(), 4096);
    }

    #[test]
    fn test_cap_content_multibyte_boundary() {
        let over: String = "あ".repeat(4100);
        assert_eq!(cap_content(over).chars().count(), 4096);
    }

    #[test]
    fn test_collect_emojis() {
        let object = raw(json!({
            "tag": [
                {"type": "Emoji", "name": ":party:", "icon": {"url": "https://r/p.png"}},
                {"type": "Mention", "href": "https://r/u"}
            ]
        }));
        let emojis = collect_emojis(&object);
        assert_eq!(emojis.len(), 1);
        assert_eq!(emojis["party"].image_url, "https://r/p.png");
    }

    #[test]
    fn test_content_flag_summary_wins() {
        let object = raw(json!({"sensitive": true, "summary": "CW"}));
        assert_eq!(content_flag(&object), "CW");

        let object = raw(json!({"sensitive": true}));
        assert_eq!(content_flag(&object), "sensitive");

        let object = raw(json!({}));
        assert_eq!(content_flag(&object), "");
    }

    #[test]
    fn test_parse_published_falls_back_to_now() {
        let object = raw(json!({"published": "2024-06-01T12:00:00Z"}));
        let parsed = parse_published(&object);
        assert_eq!(parsed.to_rfc3339_opts(SecondsFormat::Secs, true), "2024-06-01T12:00:00Z");

        let object = raw(json!({"published": "not a date"}));
        let now = Utc::now();
        assert!((parse_published(&object) - now).num_seconds().abs() < 5);
    }

    #[test]
    fn test_extract_and_strip_images() {
        let text = "look ![alt](https://a/1.png) and ![](https://a/2.png)";
        assert_eq!(
            extract_images(text),
            vec!["https://a/1.png", "https://a/2.png"]
        );
        assert_eq!(strip_images(text), "look  and ");
    }

    #[test]
    fn test_extract_content_warning() {
        let text = "<details><summary>CW</summary>hidden body</details>";
        let (summary, body) = extract_content_warning(text);
        assert_eq!(summary, "CW");
        assert_eq!(body, "hidden body");

        let (summary, body) = extract_content_warning("no warning here");
        assert_eq!(summary, "");
        assert_eq!(body, "no warning here");
    }

    #[test]
    fn test_render_markdown() {
        let rendered = render_markdown("hi [link](x)");
        assert_eq!(rendered, "<p>hi <a href=\"x\">link</a></p>");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(
            display_name(&raw(json!({"name": "Bob", "preferredUsername": "bob"}))),
            "Bob"
        );
        assert_eq!(
            display_name(&raw(json!({"preferredUsername": "bob"}))),
            "bob"
        );
    }

    #[test]
    fn test_hashtag_pattern() {
        let found: Vec<&str> = hashtag_pattern()
            .find_iter("a #tag and #music@example.com here")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["#tag", "#music@example.com"]);
    }

    mod visibility {
        use super::*;
        use ccbridge_store::entities::{ap_entity, ap_follow};
        use sea_orm::{DatabaseBackend, MockDatabase};
        use std::sync::Arc;

        fn test_config() -> ApConfig {
            ApConfig {
                fqdn: "bridge.example".to_string(),
                proxy_priv: String::new(),
                proxy_ccid: format!("CC{}", "0".repeat(40)),
            }
        }

        fn bridge_with(db: sea_orm::DatabaseConnection) -> Bridge {
            Bridge::new(
                Store::new(Arc::new(db)),
                GatewayClient::new("gateway.internal"),
                test_config(),
            )
        }

        fn alice() -> ap_entity::Model {
            ap_entity::Model {
                id: "alice".to_string(),
                ccid: format!("CC{}", "a".repeat(40)),
                public_key: String::new(),
                private_key: String::new(),
                also_known_as: json!([]),
                enabled: true,
            }
        }

        #[tokio::test]
        async fn public_sentinel_in_cc_wins() {
            let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
            let bridge = bridge_with(db);

            let object = raw(json!({
                "to": ["https://remote/users/bob/followers"],
                "cc": ["https://www.w3.org/ns/activitystreams#Public"],
            }));

            let resolved = bridge.resolve_visibility(&object).await.unwrap();
            assert_eq!(resolved.visibility, "public");
            assert!(resolved.participants.is_empty());
        }

        #[tokio::test]
        async fn unresolved_addressing_is_rejected() {
            let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
            let bridge = bridge_with(db);

            let object = raw(json!({
                "to": ["https://elsewhere.example/users/nobody"],
                "cc": [],
            }));

            let err = bridge.resolve_visibility(&object).await.unwrap_err();
            assert!(err.to_string().contains("invalid to"));
        }

        #[tokio::test]
        async fn followers_without_local_subscribers_is_rejected() {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ap_follow::Model>::new()])
                .into_connection();
            let bridge = bridge_with(db);

            let object = raw(json!({
                "to": ["https://remote.example/users/bob/followers"],
                "attributedTo": "https://remote.example/users/bob",
            }));

            let err = bridge.resolve_visibility(&object).await.unwrap_err();
            assert!(err.to_string().contains("invalid to"));
        }

        #[tokio::test]
        async fn direct_recipient_overrides_followers() {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ap_follow::Model>::new()])
                .append_query_results([vec![alice()]])
                .into_connection();
            let bridge = bridge_with(db);

            let object = raw(json!({
                "to": [
                    "https://remote.example/users/bob/followers",
                    "https://bridge.example/ap/acct/alice",
                ],
                "attributedTo": "https://remote.example/users/bob",
            }));

            let resolved = bridge.resolve_visibility(&object).await.unwrap();
            assert_eq!(resolved.visibility, "direct");
            assert_eq!(resolved.participants, vec![alice().ccid]);
        }
    }
}
