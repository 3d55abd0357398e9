use std::io::Cursor;

use anyhow::Context;

/// Blocking download of a whole media file. Called off the output thread
/// so a stalled request never holds up its command loop.
pub trait Fetch: Clone + Send + 'static {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Downloads whole media files over http.
#[derive(Clone)]
pub struct MediaFetcher {
    client: reqwest::blocking::Client,
}

impl MediaFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Fetch for MediaFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("media request returned {}", status.as_u16());
        }

        let bytes = response.bytes().context("media body was cut short")?;
        if bytes.is_empty() {
            anyhow::bail!("media body is empty");
        }

        Ok(bytes.to_vec())
    }
}

/// Owned copy of a downloaded source. Decoders take a fresh cursor so a
/// finished track can be started again without another download.
#[derive(Clone)]
pub struct MediaBuffer {
    pub url: String,
    bytes: std::sync::Arc<[u8]>,
}

impl MediaBuffer {
    pub fn new(url: String, bytes: Vec<u8>) -> Self {
        Self {
            url,
            bytes: bytes.into(),
        }
    }

    pub fn cursor(&self) -> Cursor<SharedBytes> {
        Cursor::new(SharedBytes(self.bytes.clone()))
    }
}

#[derive(Clone)]
pub struct SharedBytes(std::sync::Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom};

    use super::*;

    #[test]
    fn cursors_are_independent() {
        let buffer = MediaBuffer::new("/a.mp3".into(), vec![1, 2, 3, 4]);

        let mut first = buffer.cursor();
        first.seek(SeekFrom::Start(2)).unwrap();

        let mut rest = Vec::new();
        buffer.cursor().read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![1, 2, 3, 4]);
    }
}
