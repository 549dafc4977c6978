use std::sync::Arc;

use clicktrail_common::{ClientConfig, Environment, EventRecord, IngestAck};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{DispatchError, Result, Stage};
use crate::mirror::LogMirror;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// The server's acknowledgement message.
    pub message: String,
    /// Newest non-empty log line at the time of the follow-up read.
    pub last_line: Option<String>,
}

/// Sends events to the ingestion server and mirrors the newest log line.
///
/// Requests are independent: nothing queues or orders them, and no timeout is
/// set beyond the transport's defaults.
pub struct Dispatcher {
    client: reqwest::Client,
    endpoint: String,
    environment: Environment,
    mirror: Arc<dyn LogMirror>,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, environment: Environment, mirror: Arc<dyn LogMirror>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            environment,
            mirror,
        }
    }

    /// Send one event, then mirror the newest log line.
    ///
    /// Failures are logged here and returned; nothing is retried.
    pub async fn record(&self, kind: &str, payload: &str) -> Result<Recorded> {
        match self.send(kind, payload).await {
            Ok(recorded) => {
                info!(event_type = kind, message = %recorded.message, "Event recorded");
                Ok(recorded)
            }
            Err(e) => {
                error!(event_type = kind, stage = %e.stage(), error = %e, "Error recording event");
                Err(e)
            }
        }
    }

    /// Detach [`record`](Self::record) onto the runtime so the caller never waits on it.
    pub fn spawn_record(
        self: &Arc<Self>,
        kind: impl Into<String>,
        payload: impl Into<String>,
    ) -> JoinHandle<Result<Recorded>> {
        let dispatcher = Arc::clone(self);
        let kind = kind.into();
        let payload = payload.into();
        tokio::spawn(async move { dispatcher.record(&kind, &payload).await })
    }

    async fn send(&self, kind: &str, payload: &str) -> Result<Recorded> {
        let record = EventRecord::new(kind, payload, &self.environment);

        let resp = self
            .client
            .post(format!("{}/api/events", self.endpoint))
            .json(&record)
            .send()
            .await
            .map_err(|e| DispatchError::transport(Stage::Ingest, e))?;
        let resp = ensure_success(Stage::Ingest, resp).await?;
        let ack: IngestAck = resp
            .json()
            .await
            .map_err(|e| DispatchError::transport(Stage::Ingest, e))?;
        debug!(event_type = kind, message = %ack.message, "Ingest acknowledged");

        let resp = self
            .client
            .get(format!("{}/api/eventLogs", self.endpoint))
            .send()
            .await
            .map_err(|e| DispatchError::transport(Stage::FetchLog, e))?;
        let resp = ensure_success(Stage::FetchLog, resp).await?;
        let log = resp
            .text()
            .await
            .map_err(|e| DispatchError::transport(Stage::FetchLog, e))?;

        let last_line = last_line(&log).map(String::from);
        if let Some(line) = &last_line {
            self.mirror.mirror(&format!("LOG: {line}"));
        }

        Ok(Recorded {
            message: ack.message,
            last_line,
        })
    }
}

async fn ensure_success(stage: Stage, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(DispatchError::from_status(stage, status.as_u16(), message))
}

/// Last non-empty line of a newline-separated log.
pub fn last_line(log: &str) -> Option<&str> {
    log.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .last()
}
