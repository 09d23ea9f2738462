//! Per-entity delivery workers.
//!
//! The reconciler ticks every ten seconds: for each enabled entity it
//! computes the desired listen set (settings override, else the home
//! timeline), resolves it to canonical `{timeline_id}@{fqdn}` channels, and
//! respawns the entity's worker whenever the set changed. Worker and state
//! maps are touched only by the reconciler; workers themselves just consume
//! their subscription until aborted.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;

use ccbridge_bridge::Bridge;
use ccbridge_common::ApConfig;
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::{DeleteDocument, DocumentHead, Event};
use ccbridge_concrnt::{GatewayClient, Options};
use ccbridge_federation::{ApClient, ApObject, AS_PUBLIC};
use ccbridge_store::entities::ap_entity;
use ccbridge_store::Store;
use fred::clients::SubscriberClient;
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use regex::Regex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

fn mention_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\S+@\S+)").expect("valid regex"))
}

/// Desired subscription set of one worker.
#[derive(Debug, Clone, Default)]
pub struct DeliverState {
    pub listens: Vec<String>,
}

impl DeliverState {
    /// Order-insensitive comparison.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if self.listens.len() != other.listens.len() {
            return false;
        }
        self.listens.iter().all(|l| other.listens.contains(l))
    }
}

struct WorkerHandle {
    state: DeliverState,
    handle: JoinHandle<()>,
}

/// Delivery worker orchestrator.
#[derive(Clone)]
pub struct MessageWorker {
    redis: RedisConfig,
    store: Store,
    gateway: GatewayClient,
    apclient: ApClient,
    bridge: Bridge,
    config: ApConfig,
}

impl MessageWorker {
    /// Create a new orchestrator.
    #[must_use]
    pub const fn new(
        redis: RedisConfig,
        store: Store,
        gateway: GatewayClient,
        apclient: ApClient,
        bridge: Bridge,
        config: ApConfig,
    ) -> Self {
        Self {
            redis,
            store,
            gateway,
            apclient,
            bridge,
            config,
        }
    }

    /// Run the reconciliation loop forever.
    pub async fn run(self) {
        info!("message worker started");
        let mut workers: HashMap<String, WorkerHandle> = HashMap::new();

        loop {
            self.reconcile(&mut workers).await;
            tokio::time::sleep(Duration::from_secs(crate::RECONCILE_INTERVAL_SECS)).await;
        }
    }

    async fn reconcile(&self, workers: &mut HashMap<String, WorkerHandle>) {
        let entities = match self.store.entities.find_all_enabled().await {
            Ok(entities) => entities,
            Err(e) => {
                error!(error = %e, "worker/message GetAllEntities");
                return;
            }
        };

        // cancel workers whose entity vanished, was disabled, or whose task
        // died
        let live: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        workers.retain(|id, worker| {
            if !live.contains(id.as_str()) || worker.handle.is_finished() {
                worker.handle.abort();
                info!(entity = %id, "worker cancelled");
                false
            } else {
                true
            }
        });

        for entity in entities {
            let desired = match self.desired_state(&entity).await {
                Some(state) => state,
                None => continue,
            };

            if let Some(existing) = workers.get(&entity.id) {
                if existing.state.equals(&desired) {
                    continue;
                }
                existing.handle.abort();
                workers.remove(&entity.id);
                info!(entity = %entity.id, "worker restarting with new timelines");
            }

            let handle = tokio::spawn(
                DeliverTask {
                    redis: self.redis.clone(),
                    store: self.store.clone(),
                    apclient: self.apclient.clone(),
                    bridge: self.bridge.clone(),
                    config: self.config.clone(),
                    entity: entity.clone(),
                    timelines: desired.listens.clone(),
                }
                .run(),
            );

            workers.insert(
                entity.id.clone(),
                WorkerHandle {
                    state: desired,
                    handle,
                },
            );
        }
    }

    /// Resolve the entity's listen set to canonical pub/sub channels.
    async fn desired_state(&self, entity: &ap_entity::Model) -> Option<DeliverState> {
        let mut listen_timelines = match self.store.settings.find_by_ccid(&entity.ccid).await {
            Ok(Some(settings)) => settings.timelines(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(entity = %entity.id, error = %e, "worker/message GetUserSettings");
                Vec::new()
            }
        };

        if listen_timelines.is_empty() {
            listen_timelines.push(format!("{}@{}", consts::USER_HOME_STREAM, entity.ccid));
        }

        let mut timelines = Vec::new();
        for listen in listen_timelines {
            match self
                .gateway
                .get_timeline(&listen, Some(&Options::resolver(&self.config.fqdn)))
                .await
            {
                Ok(record) => timelines.push(format!("{}@{}", record.id, self.config.fqdn)),
                Err(e) => {
                    warn!(entity = %entity.id, timeline = %listen, error = %e, "worker/message GetTimeline");
                }
            }
        }

        if timelines.is_empty() {
            warn!(entity = %entity.id, "worker/message no timelines to listen");
            return None;
        }

        Some(DeliverState { listens: timelines })
    }
}

/// One entity's delivery task.
struct DeliverTask {
    redis: RedisConfig,
    store: Store,
    apclient: ApClient,
    bridge: Bridge,
    config: ApConfig,
    entity: ap_entity::Model,
    timelines: Vec<String>,
}

impl DeliverTask {
    async fn run(self) {
        let subscriber = SubscriberClient::new(self.redis.clone(), None, None, None);
        if let Err(e) = subscriber.init().await {
            error!(entity = %self.entity.id, error = %e, "worker/message subscriber init");
            return;
        }

        for timeline in &self.timelines {
            if let Err(e) = subscriber.subscribe(timeline.as_str()).await {
                error!(entity = %self.entity.id, timeline = %timeline, error = %e, "worker/message subscribe");
            }
        }
        info!(entity = %self.entity.id, timelines = ?self.timelines, "worker listening");

        let mut rx = subscriber.message_rx();
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let Some(payload) = message.value.as_string() else {
                        continue;
                    };
                    if let Err(e) = self.handle_event(&payload).await {
                        warn!(entity = %self.entity.id, error = %e, "worker/message event");
                    }
                }
                Err(e) => {
                    error!(entity = %self.entity.id, error = %e, "worker/message receive");
                    return;
                }
            }
        }
    }

    async fn handle_event(&self, payload: &str) -> ccbridge_common::AppResult<()> {
        let event: Event = serde_json::from_str(payload)?;
        let head: DocumentHead = serde_json::from_str(&event.document)?;

        if head.signer != self.entity.ccid {
            return Ok(());
        }

        let note_base = format!("https://{}/ap/note/", self.config.fqdn);
        let acct = format!("https://{}/ap/acct/{}", self.config.fqdn, self.entity.id);

        let (mut object, content) = match head.doc_type.as_str() {
            "message" => {
                let message_id = event.item.resource_id.clone();
                let note = self.bridge.message_to_note(&message_id).await?;
                let content = note.content.clone();

                let object = if note.object_type == "Announce" {
                    ApObject {
                        context: json!(["https://www.w3.org/ns/activitystreams"]),
                        object_type: "Announce".to_string(),
                        id: format!("{note_base}{message_id}/activity"),
                        actor: acct,
                        object: note.object,
                        to: vec![AS_PUBLIC.to_string()],
                        ..Default::default()
                    }
                } else {
                    ApObject {
                        context: json!(["https://www.w3.org/ns/activitystreams"]),
                        object_type: "Create".to_string(),
                        id: format!("{note_base}{message_id}/activity"),
                        actor: acct,
                        to: vec![AS_PUBLIC.to_string()],
                        object: serde_json::to_value(&note)
                            .map_err(|e| ccbridge_common::AppError::Internal(e.to_string()))?,
                        ..Default::default()
                    }
                };
                (object, content)
            }
            "delete" => {
                let delete_doc: DeleteDocument = serde_json::from_str(&event.document)?;
                if !delete_doc.target.starts_with('m') {
                    return Ok(());
                }

                let object = ApObject {
                    context: json!("https://www.w3.org/ns/activitystreams"),
                    object_type: "Delete".to_string(),
                    id: format!("{note_base}{}/delete", delete_doc.target),
                    actor: acct,
                    object: json!({
                        "type": "Tombstone",
                        "id": format!("{note_base}{}", delete_doc.target),
                    }),
                    ..Default::default()
                };
                (object, String::new())
            }
            _ => return Ok(()),
        };

        // resolve @user@host mentions into tags, ccs and extra inboxes
        let mut additional_inboxes = Vec::new();
        for capture in mention_pattern().captures_iter(&content) {
            let Some(handle) = capture.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let actor_id = match self.apclient.resolve_actor(handle).await {
                Ok(actor_id) => actor_id,
                Err(e) => {
                    debug!(mention = %handle, error = %e, "worker/message ResolveActor");
                    continue;
                }
            };
            let person = match self.apclient.fetch_person(&actor_id, Some(&self.entity)).await {
                Ok(person) => person,
                Err(e) => {
                    debug!(mention = %handle, error = %e, "worker/message FetchPerson");
                    continue;
                }
            };

            additional_inboxes.push(person.must_str("inbox"));

            if let Value::Object(inner) = &mut object.object {
                let tags = inner.entry("tag").or_insert_with(|| json!([]));
                if let Value::Array(tags) = tags {
                    tags.push(json!({
                        "type": "Mention",
                        "name": handle,
                        "href": person.must_str("id"),
                    }));
                }
                let ccs = inner.entry("cc").or_insert_with(|| json!([]));
                if let Value::Array(ccs) = ccs {
                    ccs.push(json!(person.must_str("id")));
                }
            }
        }

        let followers = self
            .store
            .followers
            .find_by_publisher(&self.entity.id)
            .await?;

        let mut destinations: HashSet<String> = additional_inboxes.into_iter().collect();
        destinations.extend(followers.into_iter().map(|f| f.subscriber_inbox));

        for destination in destinations {
            let apclient = self.apclient.clone();
            let entity = self.entity.clone();
            let object = object.clone();
            tokio::spawn(async move {
                if let Err(e) = apclient.post_to_inbox(&destination, &object, &entity).await {
                    warn!(destination = %destination, error = %e, "worker/message PostToInbox");
                }
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_state_equals_ignores_order() {
        let a = DeliverState {
            listens: vec!["t1@fqdn".to_string(), "t2@fqdn".to_string()],
        };
        let b = DeliverState {
            listens: vec!["t2@fqdn".to_string(), "t1@fqdn".to_string()],
        };
        assert!(a.equals(&b));

        let c = DeliverState {
            listens: vec!["t1@fqdn".to_string()],
        };
        assert!(!a.equals(&c));
        assert!(!c.equals(&a));

        let d = DeliverState {
            listens: vec!["t1@fqdn".to_string(), "t3@fqdn".to_string()],
        };
        assert!(!a.equals(&d));
    }

    #[test]
    fn test_mention_pattern() {
        let captures: Vec<&str> = mention_pattern()
            .captures_iter("hello @bob@remote.example and @amy@other.example!")
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        assert_eq!(captures, vec!["bob@remote.example", "amy@other.example!"]);
    }
}
