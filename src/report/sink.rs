// src/report/sink.rs

use super::MetricEvent;
use crate::config::NewRelicConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};
use url::Url;

/// Where finished events go.
pub enum Sink {
    /// Log every event at `info`.
    Log,
    NewRelic(NewRelicSink),
}

impl Sink {
    pub fn from_config(client: Client, new_relic: Option<&NewRelicConfig>) -> Result<Self> {
        match new_relic {
            Some(cfg) => Ok(Sink::NewRelic(NewRelicSink::new(client, cfg)?)),
            None => Ok(Sink::Log),
        }
    }

    /// Record `events` in order.
    pub async fn record_all(&self, events: &[MetricEvent]) -> Result<()> {
        match self {
            Sink::Log => {
                for event in events {
                    info!(event = event.name, fields = ?event.fields, "record");
                }
                Ok(())
            }
            Sink::NewRelic(nr) => nr.send(events).await,
        }
    }
}

/// Posts custom events to the New Relic Event API.
pub struct NewRelicSink {
    client: Client,
    endpoint: Url,
    license_key: String,
    app_name: String,
}

impl NewRelicSink {
    pub fn new(client: Client, cfg: &NewRelicConfig) -> Result<Self> {
        let endpoint = cfg.events_url()?;
        Ok(Self {
            client,
            endpoint,
            license_key: cfg.license_key.clone(),
            app_name: cfg.app_name.clone(),
        })
    }

    /// JSON body for one batch: an array of flat event objects.
    pub fn payload(&self, events: &[MetricEvent]) -> Value {
        Value::Array(
            events
                .iter()
                .map(|event| {
                    let mut obj = Map::new();
                    obj.insert("eventType".into(), json!(event.name));
                    obj.insert("timestamp".into(), json!(event.observed_at.timestamp()));
                    obj.insert("appName".into(), json!(self.app_name));
                    for (k, v) in &event.fields {
                        obj.insert(k.clone(), json!(v));
                    }
                    Value::Object(obj)
                })
                .collect(),
        )
    }

    #[instrument(level = "debug", skip_all, fields(events = events.len()))]
    async fn send(&self, events: &[MetricEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let body = self.payload(events);
        self.client
            .post(self.endpoint.clone())
            .header("Api-Key", &self.license_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.endpoint))?;
        debug!(endpoint = %self.endpoint, "events accepted");
        Ok(())
    }
}
