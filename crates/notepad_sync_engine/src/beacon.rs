//! Fire-and-forget dispatch for the teardown flush.
//!
//! When the editor is hidden or closed there is no time to wait for a
//! response. A [`Beacon`] queues the current text and returns immediately;
//! delivery happens on a transport that outlives the engine.

use crate::error::{SyncError, SyncResult};
use crate::http::{note_url, HttpClient, HttpMethod};
use notepad_protocol::{SaveRequest, Slug};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Non-blocking save primitive.
pub trait Beacon: Send + Sync {
    /// Queues `content` for `slug`. Returns false if the beacon could not
    /// accept it. Never blocks on the network and never panics.
    fn dispatch(&self, slug: &Slug, content: &str) -> bool;
}

struct BeaconJob {
    url: String,
    body: Vec<u8>,
}

/// HTTP beacon backed by a background worker thread.
///
/// Each dispatch is sent as `POST /api/note/{slug}` with a JSON body.
/// Responses are logged and otherwise ignored. Dropping the beacon closes
/// the queue and waits for the worker to deliver what was already queued.
pub struct HttpBeacon {
    base_url: String,
    sender: Mutex<Option<mpsc::Sender<BeaconJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HttpBeacon {
    /// Starts a beacon worker that sends through `client`.
    pub fn new<C>(base_url: impl Into<String>, client: C) -> SyncResult<Self>
    where
        C: HttpClient + 'static,
    {
        let (sender, receiver) = mpsc::channel::<BeaconJob>();
        let worker = thread::Builder::new()
            .name("notepad-beacon".into())
            .spawn(move || run_worker(client, receiver))
            .map_err(|e| SyncError::transport(format!("cannot start beacon worker: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stops accepting beacons and waits until queued ones are delivered.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::warn!("beacon worker panicked");
            }
        }
    }
}

impl Beacon for HttpBeacon {
    fn dispatch(&self, slug: &Slug, content: &str) -> bool {
        let job = BeaconJob {
            url: note_url(&self.base_url, slug),
            body: SaveRequest::new(content).to_json(),
        };

        let queued = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        };
        if !queued {
            tracing::debug!(slug = %slug, "beacon unavailable, teardown save dropped");
        }
        queued
    }
}

impl Drop for HttpBeacon {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<C: HttpClient>(client: C, receiver: mpsc::Receiver<BeaconJob>) {
    while let Ok(job) = receiver.recv() {
        match client.request(HttpMethod::Post, &job.url, job.body) {
            Ok(response) if response.is_success() => {
                tracing::debug!(url = %job.url, "beacon delivered");
            }
            Ok(response) => {
                tracing::debug!(url = %job.url, status = response.status, "beacon rejected");
            }
            Err(e) => {
                tracing::debug!(url = %job.url, error = %e, "beacon failed");
            }
        }
    }
}

/// A mock beacon for testing.
#[derive(Debug)]
pub struct MockBeacon {
    available: AtomicBool,
    sent: Mutex<Vec<(Slug, String)>>,
}

impl MockBeacon {
    /// Creates an available mock beacon.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes every dispatch fail.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns every accepted dispatch, in order.
    pub fn sent(&self) -> Vec<(Slug, String)> {
        self.sent.lock().clone()
    }
}

impl Default for MockBeacon {
    fn default() -> Self {
        Self::new()
    }
}

impl Beacon for MockBeacon {
    fn dispatch(&self, slug: &Slug, content: &str) -> bool {
        if !self.available.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().push((slug.clone(), content.to_string()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<(HttpMethod, String, Vec<u8>)>>,
        fail: AtomicBool,
    }

    impl HttpClient for RecordingClient {
        fn request(
            &self,
            method: HttpMethod,
            url: &str,
            body: Vec<u8>,
        ) -> Result<HttpResponse, String> {
            if self.fail.load(Ordering::SeqCst) {
                return Err("offline".into());
            }
            self.requests.lock().push((method, url.to_string(), body));
            Ok(HttpResponse::new(200, r#"{"ok":true,"updatedAt":null}"#))
        }
    }

    #[test]
    fn queued_beacons_are_delivered_before_drop_returns() {
        let client = Arc::new(RecordingClient::default());
        let beacon = HttpBeacon::new("http://localhost:3000", Arc::clone(&client)).unwrap();
        let slug = Slug::parse("my-note").unwrap();

        assert!(beacon.dispatch(&slug, "first"));
        assert!(beacon.dispatch(&slug, "second"));
        drop(beacon);

        let requests = client.requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, HttpMethod::Post);
        assert_eq!(requests[0].1, "http://localhost:3000/api/note/my-note");
        assert_eq!(SaveRequest::from_json(&requests[1].2).unwrap().content, "second");
    }

    #[test]
    fn failures_are_swallowed() {
        let client = Arc::new(RecordingClient::default());
        client.fail.store(true, Ordering::SeqCst);
        let beacon = HttpBeacon::new("http://localhost:3000", Arc::clone(&client)).unwrap();

        assert!(beacon.dispatch(&Slug::default_slug(), "text"));
        beacon.shutdown();
        assert!(client.requests.lock().is_empty());
    }

    #[test]
    fn dispatch_after_shutdown_is_rejected() {
        let beacon = HttpBeacon::new("http://localhost:3000", RecordingClient::default()).unwrap();
        beacon.shutdown();
        assert!(!beacon.dispatch(&Slug::default_slug(), "late"));
    }

    #[test]
    fn mock_beacon_records() {
        let beacon = MockBeacon::new();
        let slug = Slug::parse("x").unwrap();

        assert!(beacon.dispatch(&slug, "a"));
        beacon.set_available(false);
        assert!(!beacon.dispatch(&slug, "b"));

        assert_eq!(beacon.sent(), vec![(slug, "a".to_string())]);
    }
}
