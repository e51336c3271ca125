use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::record::{FinalizedMatchRecord, RecordSink};

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Posts finished matches as JSON to a remote document store.
#[derive(Debug, Clone)]
pub struct RemoteRecordSink {
    endpoint: String,
    owner: String,
}

impl RemoteRecordSink {
    pub fn new(endpoint: impl Into<String>, owner: impl Into<String>) -> Self {
        RemoteRecordSink {
            endpoint: endpoint.into(),
            owner: owner.into(),
        }
    }
}

impl RecordSink for RemoteRecordSink {
    fn submit(&mut self, record: &FinalizedMatchRecord) -> Result<String> {
        let client = http_client()?;
        let resp = client
            .post(&self.endpoint)
            .header("X-Touchline-Owner", &self.owner)
            .json(record)
            .send()
            .context("record submit request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading submit response")?;
        if !status.is_success() {
            return Err(anyhow!("http {}: {}", status, body));
        }
        Ok(parse_record_id(&body).unwrap_or_else(|| "remote".to_string()))
    }
}

/// Accepts `{"id": "..."}` or `{"id": 12}`; anything else has no id.
fn parse_record_id(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<SubmitResponse>(body).ok()?;
    match parsed.id? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
