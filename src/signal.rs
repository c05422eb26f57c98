//! Transient sync status badge.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long a badge stays up before it is cleared.
pub const BADGE_CLEAR_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    Success,
    Error,
}

impl SyncSignal {
    pub fn glyph(&self) -> &'static str {
        match self {
            SyncSignal::Success => "✓",
            SyncSignal::Error => "✗",
        }
    }
}

impl std::fmt::Display for SyncSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Wherever the badge is drawn. `None` clears it.
pub trait SignalSink: Send + Sync {
    fn show(&self, signal: Option<SyncSignal>);
}

pub struct LogSink;

impl SignalSink for LogSink {
    fn show(&self, signal: Option<SyncSignal>) {
        match signal {
            Some(signal) => log::info!("[badge] {signal}"),
            None => log::debug!("[badge] cleared"),
        }
    }
}

/// Shows a signal, then clears it after [`BADGE_CLEAR_DELAY`].
///
/// A newer flash takes over the badge; the older pending clear does nothing.
#[derive(Clone)]
pub struct Indicator {
    sink: Arc<dyn SignalSink>,
    generation: Arc<Mutex<u64>>,
}

impl Indicator {
    pub fn new(sink: Arc<dyn SignalSink>) -> Self {
        Self { sink, generation: Arc::new(Mutex::new(0)) }
    }

    /// Must be called from within a tokio runtime.
    pub fn flash(&self, signal: SyncSignal) {
        let generation = {
            let mut current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
            *current += 1;
            self.sink.show(Some(signal));
            *current
        };

        let sink = Arc::clone(&self.sink);
        let current = Arc::clone(&self.generation);
        tokio::spawn(async move {
            tokio::time::sleep(BADGE_CLEAR_DELAY).await;
            let current = current.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == generation {
                sink.show(None);
            }
        });
    }
}
