#[cfg(test)]
#[path = "chunk_decoder_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::StreamChunk;

/// Splits a streamed run body into chunks. Bodies arrive as newline
/// delimited JSON, as server-sent events with `data:` prefixes, or with
/// several objects packed onto one line. Objects may also span lines.
#[derive(Default)]
pub struct ChunkDecoder {
    buffer: String,
}

impl ChunkDecoder {
    pub fn push_line(&mut self, line: &str) -> Result<Vec<StreamChunk>> {
        let mut line = line.trim();
        if let Some(data) = line.strip_prefix("data:") {
            line = data.trim_start();
        }
        if line.is_empty() || line == "[DONE]" {
            return Ok(vec![]);
        }

        self.buffer.push_str(line);

        let mut chunks = vec![];
        let mut consumed = 0;
        {
            let mut stream =
                serde_json::Deserializer::from_str(&self.buffer).into_iter::<StreamChunk>();
            loop {
                match stream.next() {
                    Some(Ok(chunk)) => {
                        chunks.push(chunk);
                        consumed = stream.byte_offset();
                    }
                    Some(Err(err)) if err.is_eof() => break,
                    Some(Err(err)) => {
                        tracing::error!(error = ?err, body = %self.buffer, "malformed run chunk");
                        bail!(format!("Received a malformed chunk from the agent: {err}"));
                    }
                    None => break,
                }
            }
        }

        self.buffer.drain(..consumed);
        let remainder = self.buffer.trim_start().to_string();
        self.buffer = remainder;

        return Ok(chunks);
    }

    /// Fails when the body ended halfway through an object.
    pub fn finish(&self) -> Result<()> {
        if !self.buffer.trim().is_empty() {
            tracing::error!(body = %self.buffer, "run stream ended mid chunk");
            bail!("The agent stream ended before the last chunk was complete");
        }

        return Ok(());
    }
}
