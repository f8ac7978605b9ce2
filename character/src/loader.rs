//! Background mesh-variant loading with stale-request cancellation
//!
//! Decoding a model must never stall the tick loop, so each request runs on
//! its own worker thread and completions are drained from the loop. Requests
//! carry a monotonically increasing token per part; when a newer request is
//! issued before an older one finishes, the older result is discarded on
//! arrival instead of being applied out of order.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use md3::Md3Model;

use crate::character::Part;

/// Ticket identifying one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub part: Part,
    pub token: u64,
}

/// A finished load whose request is still the latest for its part
#[derive(Debug)]
pub struct LoadedVariant {
    pub part: Part,
    /// Decode outcome; an `Err` means the part stays on its current mesh
    pub model: md3::Result<Md3Model>,
}

struct LoadResult {
    part: Part,
    token: u64,
    model: md3::Result<Md3Model>,
}

/// Asynchronous model loader for live mesh-variant swaps
pub struct VariantLoader {
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    latest: [u64; 3],
    next_token: u64,
    pending: usize,
}

impl VariantLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            latest: [0; 3],
            next_token: 0,
            pending: 0,
        }
    }

    /// Start decoding a model file on a worker thread
    ///
    /// A newer request for the same part supersedes this one.
    pub fn request(&mut self, part: Part, path: PathBuf) -> LoadTicket {
        self.request_with(part, move || Md3Model::load(&path))
    }

    /// Start a request with a custom producer
    pub fn request_with<F>(&mut self, part: Part, produce: F) -> LoadTicket
    where
        F: FnOnce() -> md3::Result<Md3Model> + Send + 'static,
    {
        self.next_token += 1;
        let token = self.next_token;
        self.latest[part.index()] = token;
        self.pending += 1;

        let tx = self.tx.clone();
        thread::spawn(move || {
            let model = produce();
            // The loader may be gone already; nothing left to do then
            let _ = tx.send(LoadResult { part, token, model });
        });

        LoadTicket { part, token }
    }

    /// Whether any request has not been drained yet
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Drain finished loads without blocking
    ///
    /// Superseded results are dropped here, not surfaced as errors.
    pub fn poll(&mut self) -> Vec<LoadedVariant> {
        let mut out = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if self.is_current(&result) {
                out.push(LoadedVariant {
                    part: result.part,
                    model: result.model,
                });
            } else {
                log::debug!("discarding superseded load for {:?}", result.part);
            }
        }
        out
    }

    /// Block until the next current result arrives, skipping stale ones
    ///
    /// Returns `None` once no request is outstanding.
    pub fn wait(&mut self) -> Option<LoadedVariant> {
        while self.pending > 0 {
            let result = self.rx.recv().ok()?;
            self.pending -= 1;

            if self.is_current(&result) {
                return Some(LoadedVariant {
                    part: result.part,
                    model: result.model,
                });
            }
            log::debug!("discarding superseded load for {:?}", result.part);
        }
        None
    }

    fn is_current(&self, result: &LoadResult) -> bool {
        result.token == self.latest[result.part.index()]
    }
}

impl Default for VariantLoader {
    fn default() -> Self {
        Self::new()
    }
}
