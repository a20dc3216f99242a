pub mod chunk_decoder;
pub mod playground;
pub mod project;

use anyhow::Result;
use futures::stream::TryStreamExt;
use reqwest::Response;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use self::chunk_decoder::ChunkDecoder;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::Event;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::Scope;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

/// Reads a streamed run body line by line and forwards every decoded chunk,
/// tagged with the local run id.
pub async fn forward_run_stream(
    res: Response,
    run_id: u64,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let stream = res.bytes_stream().map_err(convert_err);
    let mut lines_reader = StreamReader::new(stream).lines();
    let mut decoder = ChunkDecoder::default();

    while let Some(line) = lines_reader.next_line().await? {
        for chunk in decoder.push_line(&line)? {
            tracing::debug!(run_id, event = ?chunk.event, "run chunk");
            tx.send(Event::RunChunk(run_id, chunk))?;
        }
    }

    return decoder.finish();
}

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName) -> Result<BackendBox> {
        if name == BackendName::Project {
            return Ok(Box::new(project::ProjectBackend::new(
                ApiClient::default(),
                Scope::from_config()?,
                &Config::get(ConfigKey::StatusTimeout),
            )));
        }

        return Ok(Box::new(playground::PlaygroundBackend::new(
            ApiClient::default(),
            &Config::get(ConfigKey::StatusTimeout),
        )));
    }
}
