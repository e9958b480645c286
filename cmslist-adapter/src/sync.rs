use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Mutex;

/// Per-list FIFO of state-mutating operations.
///
/// Each operation holds the gate from its first state read until its render settles, so two
/// operations never interleave. `tokio::sync::Mutex` grants the gate in request order.
#[derive(Debug, Default)]
pub struct OpQueue {
    gate: Mutex<()>,
    waiting: AtomicUsize,
    seq: AtomicU64,
}

impl OpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` once every earlier operation has settled.
    ///
    /// `op` is not polled before the gate is held, so work inside it observes the state left
    /// by its predecessor.
    pub async fn run<F, T>(&self, name: &'static str, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let ahead = self.waiting.fetch_add(1, Ordering::AcqRel);
        if ahead > 0 {
            ltrace!(op = name, ahead, "OpQueue: waiting");
        }
        let _gate = self.gate.lock().await;
        self.waiting.fetch_sub(1, Ordering::AcqRel);
        let seq = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        ldebug!(op = name, seq, "OpQueue: start");
        let out = op.await;
        ltrace!(op = name, seq, "OpQueue: settled");
        out
    }

    /// Resolves once every operation queued so far has settled.
    pub async fn settled(&self) {
        drop(self.gate.lock().await);
    }

    pub fn is_idle(&self) -> bool {
        self.waiting.load(Ordering::Acquire) == 0 && self.gate.try_lock().is_ok()
    }

    /// Operations started so far.
    pub fn started(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }
}
