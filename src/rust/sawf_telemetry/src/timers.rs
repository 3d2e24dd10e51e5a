//! The two periodic SLA timers. Each runs on its own thread, waking on a
//! tick and sweeping the registry. Dropping the stop channel ends both
//! threads at their next wait.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::EngineInner;

/// Base tick of the per-second timer.
pub(crate) const ONE_SECOND: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TimerKind {
    PerSecond,
    PerNSecond,
}

impl TimerKind {
    fn name(self) -> &'static str {
        match self {
            TimerKind::PerSecond => "sawf-sla-1s",
            TimerKind::PerNSecond => "sawf-sla-ns",
        }
    }

    /// N is read from the configuration every time the timer is re-armed.
    fn period(self, engine: &EngineInner, tick: Duration) -> Duration {
        match self {
            TimerKind::PerSecond => tick,
            TimerKind::PerNSecond => {
                let seconds = engine.config.snapshot().sla_period().seconds.max(1);
                tick.saturating_mul(seconds)
            }
        }
    }
}

pub(crate) struct SlaTimers {
    stop: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
}

impl SlaTimers {
    pub(crate) fn start(engine: Weak<EngineInner>, tick: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let mut timers = Self {
            stop: Some(stop_tx),
            threads: Vec::with_capacity(2),
        };
        for kind in [TimerKind::PerSecond, TimerKind::PerNSecond] {
            let engine = engine.clone();
            let stop = stop_rx.clone();
            // On failure `timers` drops here, which stops anything already running
            let handle = std::thread::Builder::new()
                .name(kind.name().to_string())
                .spawn(move || run_timer(engine, stop, kind, tick))?;
            timers.threads.push(handle);
        }
        info!("SLA timers started");
        Ok(timers)
    }

    /// Stop both timers and wait for any sweep in progress to finish.
    pub(crate) fn stop(mut self) {
        self.shutdown();
        info!("SLA timers stopped");
    }

    fn shutdown(&mut self) {
        self.stop.take();
        let current = std::thread::current().id();
        for handle in self.threads.drain(..) {
            // A notifier running on a timer thread may free the last peer
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("SLA timer thread panicked");
            }
        }
    }
}

impl Drop for SlaTimers {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_timer(engine: Weak<EngineInner>, stop: Receiver<()>, kind: TimerKind, tick: Duration) {
    debug!("{} running", kind.name());
    loop {
        let period = match engine.upgrade() {
            Some(engine) => kind.period(&engine, tick),
            None => break,
        };
        match stop.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(engine) = engine.upgrade() else {
            break;
        };
        match kind {
            TimerKind::PerSecond => engine.per_second_tick(),
            TimerKind::PerNSecond => engine.n_second_tick(),
        }
    }
    debug!("{} exiting", kind.name());
}
