//! Submission detection.
//!
//! One [`Detector`] lives per page. `arm()` starts an arm cycle:
//! `Idle -> Armed -> (settle delay) -> Observing -> Idle`. While observing,
//! page mutation notifications are debounced and each quiet period triggers a
//! single evaluation of the platform readout. A full pass extracts the record
//! and hands it to the background context; anything else ends the cycle
//! quietly. Every way back to `Idle` drops the mutation subscription and the
//! cycle's timers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::error::Result;
use crate::models::{InboundMessage, Platform, TestTally};

pub mod extract;
pub mod readout;

pub use extract::Extractor;
pub use readout::{PageView, ReadoutProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Armed,
    Observing,
}

/// Cycle timings. `timeout` runs from `arm()`, independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub settle_delay: Duration,
    pub debounce: Duration,
    pub timeout: Duration,
}

impl DetectorConfig {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::LeetCode => Self {
                settle_delay: Duration::from_millis(1_000),
                debounce: Duration::from_millis(1_000),
                timeout: Duration::from_millis(15_000),
            },
            // NeetCode re-renders progressively; give it 3s before looking.
            Platform::NeetCode => Self {
                settle_delay: Duration::from_millis(3_000),
                debounce: Duration::from_millis(1_500),
                timeout: Duration::from_millis(13_000),
            },
        }
    }
}

/// What a single look at the readout found.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// No readout on the page yet.
    Pending,
    /// Readout identical to the one showing when the cycle was armed.
    Stale,
    /// Readout present but not in the `passed / total` shape.
    Ambiguous(String),
    Passed(TestTally),
    Failed(TestTally),
}

pub fn evaluate(probe: &dyn ReadoutProbe, baseline: Option<&str>) -> Evaluation {
    let Some(text) = probe.find_readout() else {
        return Evaluation::Pending;
    };

    if baseline == Some(text.as_str()) {
        return Evaluation::Stale;
    }

    match probe.parse_result(&text) {
        Some(tally) if tally.is_full_pass() => Evaluation::Passed(tally),
        Some(tally) => Evaluation::Failed(tally),
        None => Evaluation::Ambiguous(text),
    }
}

/// How an arm cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEnd {
    /// Full pass; the record was sent.
    Accepted(TestTally),
    /// Full pass, but the page did not yield a complete record.
    Incomplete(TestTally),
    /// Terminal readout below 100%.
    Rejected(TestTally),
    TimedOut,
    /// A newer `arm()` replaced this cycle.
    Superseded,
    Disarmed,
}

struct Shared {
    probe: Arc<dyn ReadoutProbe>,
    extractor: Arc<dyn Extractor>,
    config: DetectorConfig,
    outbox: mpsc::UnboundedSender<InboundMessage>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    phase: Phase,
    subscription: Option<mpsc::UnboundedSender<()>>,
    task: Option<JoinHandle<()>>,
    last_end: Option<CycleEnd>,
}

impl Slot {
    /// Back to `Idle`: drops the subscription and the cycle task.
    fn release(&mut self, end: CycleEnd) {
        self.subscription = None;
        if let Some(task) = self.task.take() {
            // A cycle ending on its own is already returning.
            if matches!(end, CycleEnd::Superseded | CycleEnd::Disarmed) {
                task.abort();
            }
        }
        self.phase = Phase::Idle;
        self.last_end = Some(end);
    }
}

pub struct Detector {
    shared: Arc<Shared>,
}

impl Detector {
    pub fn new(
        probe: Arc<dyn ReadoutProbe>,
        extractor: Arc<dyn Extractor>,
        config: DetectorConfig,
        outbox: mpsc::UnboundedSender<InboundMessage>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                probe,
                extractor,
                config,
                outbox,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn last_end(&self) -> Option<CycleEnd> {
        self.shared.lock().last_end.clone()
    }

    /// Starts a new arm cycle, cancelling any live one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self) {
        let mut slot = self.shared.lock();
        if slot.phase != Phase::Idle {
            log::debug!("[arm] Superseding cycle {}", slot.generation);
            slot.release(CycleEnd::Superseded);
        }

        // Whatever readout is showing now belongs to a previous submission.
        let baseline = self.shared.probe.find_readout();
        log::info!("[arm] Watching for result (baseline: {})", baseline.as_deref().unwrap_or("none"));

        slot.generation += 1;
        slot.phase = Phase::Armed;
        let generation = slot.generation;
        slot.task = Some(tokio::spawn(run_cycle(Arc::clone(&self.shared), generation, baseline)));
    }

    /// Cancels the live cycle, if any, without extracting.
    pub fn disarm(&self) {
        let mut slot = self.shared.lock();
        if slot.phase != Phase::Idle {
            log::debug!("[disarm] Cancelling cycle {}", slot.generation);
            slot.release(CycleEnd::Disarmed);
        }
    }

    /// Page mutation notification. Ignored unless a cycle is observing.
    pub fn notify_mutation(&self) {
        if let Some(subscription) = &self.shared.lock().subscription {
            let _ = subscription.send(());
        }
    }

    /// Extracts and sends right away, outside of any cycle.
    pub fn trigger_now(&self) -> Result<()> {
        log::info!("[trigger_now] Manual sync requested");
        self.shared.deliver()
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `Armed -> Observing`; hands back the mutation subscription.
    fn observe(&self, generation: u64) -> Option<mpsc::UnboundedReceiver<()>> {
        let mut slot = self.lock();
        if slot.generation != generation || slot.phase != Phase::Armed {
            return None;
        }

        let (subscription, mutations) = mpsc::unbounded_channel();
        slot.subscription = Some(subscription);
        slot.phase = Phase::Observing;
        log::debug!("[observe] Cycle {generation} observing page mutations");
        Some(mutations)
    }

    /// Ends cycle `generation` if it is still the live one.
    fn conclude(&self, generation: u64, end: CycleEnd) {
        let mut slot = self.lock();
        if slot.generation != generation || slot.phase == Phase::Idle {
            return;
        }

        let end = match end {
            // Extract under the lock so a concurrent arm() cannot interleave.
            CycleEnd::Accepted(tally) => match self.deliver() {
                Ok(()) => CycleEnd::Accepted(tally),
                Err(_) => CycleEnd::Incomplete(tally),
            },
            other => other,
        };

        log::info!("[conclude] Cycle {generation} ended: {end:?}");
        slot.release(end);
    }

    fn deliver(&self) -> Result<()> {
        let record = self
            .extractor
            .extract()
            .inspect_err(|err| log::warn!("[deliver] Dropping submission: {err}"))?;

        log::info!("[deliver] Sending {} ({}) to background", record.slug, record.platform);
        if self.outbox.send(InboundMessage::SubmissionAccepted(record)).is_err() {
            log::error!("[deliver] Background context is gone; submission lost");
        }
        Ok(())
    }
}

async fn run_cycle(shared: Arc<Shared>, generation: u64, baseline: Option<String>) {
    let config = shared.config;
    let deadline = time::sleep(config.timeout);
    tokio::pin!(deadline);

    tokio::select! {
        _ = time::sleep(config.settle_delay) => {}
        _ = &mut deadline => {
            shared.conclude(generation, CycleEnd::TimedOut);
            return;
        }
    }

    let Some(mut mutations) = shared.observe(generation) else {
        return;
    };

    loop {
        tokio::select! {
            notified = mutations.recv() => {
                if notified.is_none() {
                    return;
                }
            }
            _ = &mut deadline => {
                shared.conclude(generation, CycleEnd::TimedOut);
                return;
            }
        }

        // Wait out the burst.
        loop {
            tokio::select! {
                _ = time::sleep(config.debounce) => break,
                notified = mutations.recv() => {
                    if notified.is_none() {
                        return;
                    }
                }
                _ = &mut deadline => {
                    shared.conclude(generation, CycleEnd::TimedOut);
                    return;
                }
            }
        }

        match evaluate(shared.probe.as_ref(), baseline.as_deref()) {
            Evaluation::Passed(tally) => {
                shared.conclude(generation, CycleEnd::Accepted(tally));
                return;
            }
            Evaluation::Failed(tally) => {
                shared.conclude(generation, CycleEnd::Rejected(tally));
                return;
            }
            Evaluation::Ambiguous(text) => {
                log::debug!("[run_cycle] Could not parse readout {text:?}; still waiting");
            }
            Evaluation::Stale => log::trace!("[run_cycle] Readout unchanged since arm"),
            Evaluation::Pending => log::trace!("[run_cycle] No readout yet"),
        }
    }
}
