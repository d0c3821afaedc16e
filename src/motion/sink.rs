//! HTTP delivery of motion samples.

use std::time::Duration;

use reqwest::Client;
use tracing::trace;

use crate::error::SinkError;

/// Posts each motion score to the ingestion collaborator as a decimal
/// string request body.
pub struct MotionSink {
    client: Client,
    url: String,
}

impl MotionSink {
    /// Build a sink with a bounded per-request timeout.
    pub fn new(url: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Connect(e.to_string()))?;
        Ok(Self { client, url })
    }

    /// Deliver one score. Failures are classified for the caller to
    /// log; they are never retried here.
    pub async fn report(&self, score: f64) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .body(score.to_string())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }
        trace!(score, "Motion sample delivered");
        Ok(())
    }
}

fn classify(err: reqwest::Error) -> SinkError {
    if err.is_timeout() {
        SinkError::Timeout
    } else {
        SinkError::Connect(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_sink_is_a_connect_error() {
        // Port 9 (discard) is refused on any sane test host.
        let sink = MotionSink::new(
            "http://127.0.0.1:9/motion".to_string(),
            Duration::from_millis(500),
        )
        .unwrap();

        let err = sink.report(0.25).await.unwrap_err();
        assert!(matches!(err, SinkError::Connect(_) | SinkError::Timeout));
    }
}
