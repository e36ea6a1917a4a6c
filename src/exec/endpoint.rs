// src/exec/endpoint.rs

//! `docci-wait-for-endpoint` polling.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::exec::directives::EndpointWait;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Up,
    TimedOut,
    Cancelled,
}

/// Poll `wait.url` once per second until any HTTP response arrives.
///
/// Status codes do not matter, only that something answered.
pub async fn wait_for_endpoint(wait: &EndpointWait, cancel: &CancellationToken) -> EndpointStatus {
    let deadline = Instant::now() + wait.timeout;
    let mut attempt = 1u32;

    loop {
        let url = wait.url.clone();
        let attempt_handle = tokio::task::spawn_blocking(move || probe(&url));

        let answered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return EndpointStatus::Cancelled,
            res = attempt_handle => res.unwrap_or(false),
        };

        if answered {
            info!(url = %wait.url, attempt, "endpoint is up");
            return EndpointStatus::Up;
        }
        if Instant::now() >= deadline {
            return EndpointStatus::TimedOut;
        }

        debug!(url = %wait.url, attempt, "endpoint not up yet; retrying");
        attempt += 1;

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = cancel.cancelled() => return EndpointStatus::Cancelled,
        }
    }
}

fn probe(url: &str) -> bool {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(REQUEST_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into();

    match agent.get(url).call() {
        Ok(_) | Err(ureq::Error::StatusCode(_)) => true,
        Err(e) => {
            debug!(url, error = %e, "endpoint probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_times_out() {
        let wait = EndpointWait {
            url: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_millis(10),
        };
        let status = wait_for_endpoint(&wait, &CancellationToken::new()).await;
        assert_eq!(status, EndpointStatus::TimedOut);
    }

    #[tokio::test]
    async fn cancellation_stops_polling() {
        let wait = EndpointWait {
            url: "http://127.0.0.1:9/".to_string(),
            timeout: Duration::from_secs(60),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let status = wait_for_endpoint(&wait, &cancel).await;
        assert_eq!(status, EndpointStatus::Cancelled);
    }

    #[tokio::test]
    async fn any_http_answer_counts_as_up() -> anyhow::Result<()> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            }
        });

        let wait = EndpointWait {
            url: format!("http://{addr}/health"),
            timeout: Duration::from_secs(5),
        };
        let status = wait_for_endpoint(&wait, &CancellationToken::new()).await;
        assert_eq!(status, EndpointStatus::Up);
        Ok(())
    }
}
