//! Server-sent event plumbing shared by the streaming providers.

use futures::StreamExt;

use crate::error::{Error, Result};

/// Splits a byte stream into `data:` payloads, one per line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes. Returns the payloads of every complete `data:` line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        payloads
    }
}

/// Drive `on_data` with each `data:` payload until the stream ends or it
/// returns `Ok(false)`.
pub async fn for_each_data<F>(
    resp: reqwest::Response,
    service: &'static str,
    mut on_data: F,
) -> Result<()>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut decoder = SseDecoder::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::external(service, e.to_string()))?;
        for payload in decoder.push(&chunk) {
            if !on_data(&payload)? {
                return Ok(());
            }
        }
    }
    Ok(())
}
