use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Global "button busy" flag. Not scoped per request: the last writer wins.
pub trait BusySignal: Send + Sync {
    fn set_busy(&self, busy: bool);
    fn is_busy(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BusySignal for BusyFlag {
    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Raises the busy signal for its lifetime and clears it on drop, whichever
/// branch of a submission returns.
pub struct BusyGuard {
    signal: Arc<dyn BusySignal>,
}

impl BusyGuard {
    pub fn raise(signal: Arc<dyn BusySignal>) -> Self {
        signal.set_busy(true);
        Self { signal }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.signal.set_busy(false);
    }
}
