//! Cancellable background regeneration of barcode and QR slots.
//!
//! Whenever the code-bearing fields or the bound record change, the session
//! hands the regenerator the full list of [`CodeRequest`]s the scene needs.
//! Fields whose request changed get a fresh generation task; the rest are
//! left alone.
//!
//! Ordering only matters within one field. Each trigger bumps that field's
//! counter in the [`GenerationLedger`] and tags the task with it, so a result
//! is applied only if it belongs to the latest trigger:
//!
//! ```text
//! trigger A (gen 1) ──────────────────────── done ✗ stale, dropped
//! trigger B (gen 2) ───────── done ✓ applied
//! ```
//!
//! [`CodeRegenerator::cancel_all`] additionally bumps an epoch, so nothing
//! started before a mode switch can land afterwards.

use std::collections::{HashMap, HashSet};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{CodeImage, CodeRequest};
use crate::error::EncodingError;
use crate::render::CodeSlots;

/// Per-field generation counters.
#[derive(Debug, Default)]
pub struct GenerationLedger {
    counters: HashMap<String, u64>,
}

impl GenerationLedger {
    /// Start a new generation for `field_id` and return its number.
    pub fn bump(&mut self, field_id: &str) -> u64 {
        let counter = self.counters.entry(field_id.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn current(&self, field_id: &str) -> Option<u64> {
        self.counters.get(field_id).copied()
    }

    pub fn is_current(&self, field_id: &str, generation: u64) -> bool {
        self.current(field_id) == Some(generation)
    }
}

/// A finished generation, tagged with when it was triggered.
#[derive(Debug)]
struct Completion {
    field_id: String,
    generation: u64,
    epoch: u64,
    request: CodeRequest,
    result: Result<CodeImage, EncodingError>,
}

type Generate = fn(&CodeRequest) -> Result<CodeImage, EncodingError>;

/// Drives asynchronous code generation for one designer session.
pub struct CodeRegenerator {
    runtime: Handle,
    generate: Generate,
    ledger: GenerationLedger,
    epoch: u64,
    /// Latest request triggered per field.
    requested: HashMap<String, CodeRequest>,
    tasks: HashMap<String, JoinHandle<()>>,
    /// Fields whose latest generation has not landed yet.
    pending: HashSet<String>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    slots: CodeSlots,
}

impl CodeRegenerator {
    /// Create a regenerator that spawns its tasks on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self::with_generator(runtime, CodeRequest::generate)
    }

    fn with_generator(runtime: Handle, generate: Generate) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            generate,
            ledger: GenerationLedger::default(),
            epoch: 0,
            requested: HashMap::new(),
            tasks: HashMap::new(),
            pending: HashSet::new(),
            tx,
            rx,
            slots: CodeSlots::default(),
        }
    }

    /// Results applied so far, keyed by field id.
    pub fn slots(&self) -> &CodeSlots {
        &self.slots
    }

    pub fn generation(&self, field_id: &str) -> Option<u64> {
        self.ledger.current(field_id)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of fields still waiting on their latest generation.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Bring the slots in line with the requests the current scene needs.
    ///
    /// Returns how many generations were triggered.
    pub fn sync(&mut self, requests: &[(String, CodeRequest)]) -> usize {
        let wanted: HashSet<&str> = requests.iter().map(|(id, _)| id.as_str()).collect();
        let gone: Vec<String> = self
            .requested
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for field_id in gone {
            self.forget(&field_id);
        }

        let mut triggered = 0;
        for (field_id, request) in requests {
            if self.requested.get(field_id) != Some(request) {
                self.trigger(field_id, request.clone());
                triggered += 1;
            }
        }
        triggered
    }

    /// Start a generation for one field, superseding any in flight.
    pub fn trigger(&mut self, field_id: &str, request: CodeRequest) {
        if let Some(prior) = self.tasks.remove(field_id) {
            prior.abort();
        }
        let generation = self.ledger.bump(field_id);
        let epoch = self.epoch;
        tracing::debug!(field_id, generation, epoch, data = request.data(), "regenerating code");

        self.requested.insert(field_id.to_string(), request.clone());
        self.pending.insert(field_id.to_string());

        let tx = self.tx.clone();
        let id = field_id.to_string();
        let generate = self.generate;
        let task = self.runtime.spawn(async move {
            let job = request.clone();
            // A panicking job still lands, so the field never stays pending.
            let result = match tokio::task::spawn_blocking(move || generate(&job)).await {
                Ok(result) => result,
                Err(e) => Err(EncodingError::new(
                    request.symbology(),
                    request.data(),
                    format!("generation aborted: {}", e),
                )),
            };
            // The receiver only goes away with the regenerator itself.
            let _ = tx.send(Completion {
                field_id: id,
                generation,
                epoch,
                request,
                result,
            });
        });
        self.tasks.insert(field_id.to_string(), task);
    }

    /// Apply every result that has already arrived. Returns how many landed.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until every field's latest generation has landed.
    pub async fn settle(&mut self) {
        while !self.pending.is_empty() {
            match self.rx.recv().await {
                Some(completion) => {
                    self.apply(completion);
                }
                None => break,
            }
        }
    }

    /// Abort all work and drop every slot.
    pub fn cancel_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
        self.epoch += 1;
        self.requested.clear();
        self.pending.clear();
        self.slots.clear();
        // Completions already queued belong to the old epoch.
        while self.rx.try_recv().is_ok() {}
        tracing::debug!(epoch = self.epoch, "code regeneration cancelled");
    }

    fn forget(&mut self, field_id: &str) {
        if let Some(task) = self.tasks.remove(field_id) {
            task.abort();
        }
        self.requested.remove(field_id);
        self.pending.remove(field_id);
        self.slots.remove(field_id);
    }

    fn apply(&mut self, completion: Completion) -> bool {
        let Completion {
            field_id,
            generation,
            epoch,
            request,
            result,
        } = completion;

        if epoch != self.epoch || !self.ledger.is_current(&field_id, generation) {
            tracing::debug!(field_id = %field_id, generation, epoch, "discarding stale code");
            return false;
        }

        if let Err(e) = &result {
            tracing::warn!(field_id = %field_id, error = %e, "code could not be encoded");
        }
        self.tasks.remove(&field_id);
        self.pending.remove(&field_id);
        self.slots.insert(field_id, request, result);
        true
    }
}

impl Drop for CodeRegenerator {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for CodeRegenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRegenerator")
            .field("epoch", &self.epoch)
            .field("requested", &self.requested.len())
            .field("pending", &self.pending)
            .finish()
    }
}
