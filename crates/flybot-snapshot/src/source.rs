//! Remote snapshot retrieval.

use std::io::Write;
use std::time::Duration;

use flybot_core::{FlybotError, FlybotResult};
use tracing::debug;

/// Something that can stream snapshot bytes into a sink.
pub trait ISnapshotSource: Send + Sync {
    /// Human-readable origin, used in errors and logs.
    fn location(&self) -> &str;

    /// Write the full snapshot into `sink`, returning the byte count.
    fn fetch_into(&self, sink: &mut dyn Write) -> FlybotResult<u64>;
}

/// Plain HTTP GET of the snapshot file.
pub struct HttpSnapshotSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSnapshotSource {
    /// `timeout` bounds the whole request, body included.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> FlybotResult<Self> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flybot-snapshot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlybotError::Fetch {
                url: url.clone(),
                message: format!("client build: {e}"),
            })?;
        Ok(Self { url, client })
    }

    fn fetch_err(&self, e: reqwest::Error) -> FlybotError {
        let message = if e.is_timeout() {
            format!("timed out: {e}")
        } else {
            e.to_string()
        };
        FlybotError::Fetch {
            url: self.url.clone(),
            message,
        }
    }
}

impl ISnapshotSource for HttpSnapshotSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch_into(&self, sink: &mut dyn Write) -> FlybotResult<u64> {
        let mut response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| self.fetch_err(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlybotError::FetchStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let mut sink = sink;
        let bytes = response.copy_to(&mut sink).map_err(|e| self.fetch_err(e))?;
        debug!(url = %self.url, bytes, "snapshot body received");
        Ok(bytes)
    }
}
