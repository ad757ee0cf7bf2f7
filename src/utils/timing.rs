use std::fmt::Display;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

/// Received/completed bookkeeping for one flow invocation.
#[derive(Debug)]
pub struct FlowTimer {
    flow: String,
    detail: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    completed: bool,
}

impl FlowTimer {
    pub fn start(flow: &str, detail: Option<String>) -> Self {
        let timer = FlowTimer {
            flow: flow.to_string(),
            detail: detail.map(|value| truncate(&value.replace('\n', " "), 300)),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            completed: false,
        };
        info!(
            target: "studio.timing",
            "event=flow_received flow={} received_at={} detail={:?}",
            timer.flow,
            timer.started_at.to_rfc3339(),
            timer.detail
        );
        timer
    }

    pub fn complete(&mut self, status: &str, outcome: Option<&str>) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: "studio.timing",
            "event=flow_completed flow={} started_at={} completed_at={} duration_s={:.3} status={} outcome={}",
            self.flow,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            status,
            outcome.unwrap_or_default()
        );
    }
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    value.chars().take(limit).collect()
}

pub async fn log_llm_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: "studio.timing",
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: "studio.timing",
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}
