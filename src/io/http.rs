use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, bail};

/// How hard [`HttpReader`] tries before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Per-request timeout, body included.
    pub timeout: Duration,
    /// Attempts in total, the first one included.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on every further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 5,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1 << attempt.saturating_sub(1).min(16))
    }
}

/// A remote project or legacy file, downloaded whole with one GET.
///
/// Timeouts, connection failures and 5xx answers are retried; any other
/// non-success status fails immediately.
pub struct HttpReader {
    body: Vec<u8>,
}

impl HttpReader {
    /// Download `url` with the default [`RetryPolicy`].
    pub async fn fetch(url: &str) -> Result<Self> {
        Self::fetch_with(url, &RetryPolicy::default()).await
    }

    pub async fn fetch_with(url: &str, policy: &RetryPolicy) -> Result<Self> {
        let client = Client::builder().timeout(policy.timeout).build()?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match get_body(&client, url).await {
                Ok(body) => {
                    debug!("event=http_fetch url={} bytes={} attempt={}", url, body.len(), attempt);
                    return Ok(Self { body });
                }
                Err(Fetch::Fatal(e)) => return Err(e),
                Err(Fetch::Transient(e)) => e,
            };

            if attempt >= policy.max_attempts {
                bail!("giving up on {url} after {attempt} attempts: {error}");
            }
            let delay = policy.delay(attempt);
            warn!(
                "event=http_fetch status=retry attempt={}/{} delay_ms={} error={}",
                attempt,
                policy.max_attempts,
                delay.as_millis(),
                error
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Bytes received from the network.
    pub fn transferred_bytes(&self) -> u64 {
        self.body.len() as u64
    }
}

enum Fetch {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

impl From<reqwest::Error> for Fetch {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Fetch::Transient(e.into())
        } else {
            Fetch::Fatal(e.into())
        }
    }
}

async fn get_body(client: &Client, url: &str) -> std::result::Result<Vec<u8>, Fetch> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if status.is_server_error() {
        return Err(Fetch::Transient(anyhow::anyhow!("server answered {status}")));
    }
    if status != StatusCode::OK {
        return Err(Fetch::Fatal(anyhow::anyhow!(
            "HTTP request failed with status: {status}"
        )));
    }
    Ok(resp.bytes().await?.to_vec())
}

#[async_trait]
impl ReadAt for HttpReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Some(rest) = usize::try_from(offset)
            .ok()
            .and_then(|offset| self.body.get(offset..))
        else {
            return Ok(0);
        };
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.body.len() as u64
    }
}
