use crate::config::NotifierConfig;
use crate::entities::{ItemType, ReasonCode};
use crate::models::Owner;
use serde_json::json;

/// Fire-and-forget event webhook for downstream collaborators (in-app
/// notification fanout, email digests). The ledger never depends on this:
/// delivery runs on a spawned task and failures are only logged — a dead
/// webhook must not roll back a committed transaction.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn balance_changed(&self, owner: Owner, delta: i64, balance_after: i64, reason: ReasonCode) {
        self.send(
            "balance_changed",
            json!({
                "owner_kind": owner.kind.to_string(),
                "owner_id": owner.id,
                "delta": delta,
                "balance_after": balance_after,
                "reason_code": reason.to_string(),
            }),
        );
    }

    pub fn reward_granted(&self, owner: Owner, item_type: ItemType, item_key: &str) {
        self.send(
            "reward_granted",
            json!({
                "owner_kind": owner.kind.to_string(),
                "owner_id": owner.id,
                "item_type": item_type.to_string(),
                "item_key": item_key,
            }),
        );
    }

    fn send(&self, event: &str, payload: serde_json::Value) {
        let Some(url) = self.config.webhook_url.clone() else {
            return;
        };
        let client = self.client.clone();
        let body = json!({ "event": event, "payload": payload });
        let event = event.to_string();
        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    log::warn!("Notifier webhook for {event} returned {}", resp.status());
                }
                Err(e) => {
                    log::warn!("Notifier webhook for {event} failed: {e}");
                }
            }
        });
    }
}
