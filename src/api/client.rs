use anyhow::Context;
use flume::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{config::Config, event::events::GlobalEvent};

use super::models::{Song, SongsResponse};

#[derive(Clone)]
pub struct SongsClient {
    client: reqwest::Client,
    url: String,
}

impl SongsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.songs_url(),
        }
    }

    pub async fn fetch_songs(&self) -> anyhow::Result<Vec<Song>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Fetch failed: {}", status.as_u16());
        }

        let body: SongsResponse = response
            .json()
            .await
            .context("playlist body is not valid json")?;

        Ok(body.songs)
    }

    /// Fetches the playlist once in the background and reports the outcome
    /// on `tx`. Nothing is sent once `token` is cancelled.
    pub fn spawn_fetch(
        self,
        tx: Sender<GlobalEvent>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!("playlist fetch cancelled");
                    return;
                }
                result = self.fetch_songs() => result,
            };

            if token.is_cancelled() {
                debug!("dropping playlist response that arrived after teardown");
                return;
            }

            let evt = match result {
                Ok(songs) => {
                    info!("fetched {} songs", songs.len());
                    GlobalEvent::SongsFetched(songs)
                }
                Err(err) => {
                    debug!("playlist fetch failed: {err:?}");
                    GlobalEvent::FetchFailed(format!("{err:#}"))
                }
            };

            if tx.send(evt).is_err() {
                debug!("app is gone, playlist result discarded");
            }
        })
    }
}
