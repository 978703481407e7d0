//! Test doubles for the controller's storage and fetch seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use emoji_art_core::{
    BackgroundFetcher, DocumentError, DocumentResult, DocumentState, DocumentStorage,
};
use tokio::sync::{oneshot, watch};
use url::Url;

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encode a solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png");
    out
}

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("valid url")
}

/// Wait until `predicate` holds for the published state.
pub async fn wait_for_state<F>(rx: &mut watch::Receiver<DocumentState>, predicate: F) -> DocumentState
where
    F: FnMut(&DocumentState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state reached in time")
        .expect("controller alive")
        .clone()
}

/// In-memory storage that records every write.
#[derive(Default)]
pub struct RecordingStorage {
    initial: Option<Vec<u8>>,
    writes: Mutex<Vec<Vec<u8>>>,
}

impl RecordingStorage {
    pub fn with_initial(data: Vec<u8>) -> Self {
        Self {
            initial: Some(data),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().expect("lock").len()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().expect("lock").last().cloned()
    }
}

impl DocumentStorage for RecordingStorage {
    fn read(&self) -> DocumentResult<Vec<u8>> {
        if let Some(last) = self.last_write() {
            return Ok(last);
        }
        self.initial
            .clone()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound).into())
    }

    fn write(&self, data: &[u8]) -> DocumentResult<()> {
        self.writes.lock().expect("lock").push(data.to_vec());
        Ok(())
    }
}

/// Storage whose writes always fail.
pub struct BrokenStorage;

impl DocumentStorage for BrokenStorage {
    fn read(&self) -> DocumentResult<Vec<u8>> {
        Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into())
    }

    fn write(&self, _data: &[u8]) -> DocumentResult<()> {
        Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into())
    }
}

/// Fetcher that answers every URL with the same bytes and counts calls.
pub struct CountingFetcher {
    body: Vec<u8>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackgroundFetcher for CountingFetcher {
    async fn fetch(&self, _url: &Url) -> DocumentResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Fetcher whose responses are released by the test, one URL at a time.
#[derive(Default)]
pub struct GatedFetcher {
    gates: Mutex<HashMap<Url, oneshot::Receiver<DocumentResult<Vec<u8>>>>>,
    releases: Mutex<HashMap<Url, oneshot::Sender<DocumentResult<Vec<u8>>>>>,
}

impl GatedFetcher {
    /// Prepare a gate for `url`; the fetch blocks until [`GatedFetcher::release`].
    pub fn arm(&self, url: &Url) {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("lock").insert(url.clone(), rx);
        self.releases.lock().expect("lock").insert(url.clone(), tx);
    }

    /// Complete the fetch of `url` with `result`.
    pub fn release(&self, url: &Url, result: DocumentResult<Vec<u8>>) {
        let tx = self
            .releases
            .lock()
            .expect("lock")
            .remove(url)
            .expect("url was armed");
        let _ = tx.send(result);
    }

    pub fn fail(url: &Url) -> DocumentResult<Vec<u8>> {
        Err(DocumentError::Fetch(format!("gate closed for {url}")))
    }
}

#[async_trait]
impl BackgroundFetcher for GatedFetcher {
    async fn fetch(&self, url: &Url) -> DocumentResult<Vec<u8>> {
        let gate = self.gates.lock().expect("lock").remove(url);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DocumentError::Fetch("gate dropped".into()))),
            None => Err(DocumentError::Fetch(format!("unexpected fetch of {url}"))),
        }
    }
}
