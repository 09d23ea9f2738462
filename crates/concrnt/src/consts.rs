//! Well-known schema URLs and stream names.

pub const MARKDOWN_MESSAGE_SCHEMA: &str = "https://schema.concrnt.world/m/markdown.json";
pub const MISSKEY_MESSAGE_SCHEMA: &str = "https://schema.concrnt.world/m/mfm.json";
pub const MEDIA_MESSAGE_SCHEMA: &str = "https://schema.concrnt.world/m/media.json";
pub const REPLY_MESSAGE_SCHEMA: &str = "https://schema.concrnt.world/m/reply.json";
pub const REROUTE_MESSAGE_SCHEMA: &str = "https://schema.concrnt.world/m/reroute.json";

pub const LIKE_ASSOCIATION_SCHEMA: &str = "https://schema.concrnt.world/a/like.json";
pub const MENTION_ASSOCIATION_SCHEMA: &str = "https://schema.concrnt.world/a/mention.json";
pub const REPLY_ASSOCIATION_SCHEMA: &str = "https://schema.concrnt.world/a/reply.json";
pub const REROUTE_ASSOCIATION_SCHEMA: &str = "https://schema.concrnt.world/a/reroute.json";
pub const REACTION_ASSOCIATION_SCHEMA: &str = "https://schema.concrnt.world/a/reaction.json";

pub const PROFILE_SCHEMA: &str = "https://schema.concrnt.world/p/main.json";

pub const WHISPER_POLICY: &str = "https://policy.concrnt.world/m/whisper.json";

pub const USER_HOME_STREAM: &str = "world.concrnt.t-home";
pub const USER_NOTIFY_STREAM: &str = "world.concrnt.t-notify";
pub const USER_ASSOC_STREAM: &str = "world.concrnt.t-assoc";
pub const USER_AP_STREAM: &str = "world.concrnt.t-ap";

/// Semantic id of the main profile document.
pub const PROFILE_SEMANTIC_ID: &str = "world.concrnt.p";
