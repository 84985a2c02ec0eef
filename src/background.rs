//! Training on a worker thread with snapshot handoff.
//!
//! The worker owns its [`TrainingSession`] outright. Every `ticks_per_check` ticks it publishes a
//! deep clone of the network into a single-slot mailbox; an unconsumed snapshot is replaced by
//! the newer one. The foreground takes snapshots and owns them exclusively, so no network is ever
//! shared between threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::BackgroundConfig;
use crate::session::TrainingSession;
use crate::{Error, Network, Result};

type Mailbox = Arc<Mutex<Option<Network>>>;

/// Handle to a background training worker.
///
/// Dropping the handle stops and joins the worker.
pub struct BackgroundTrainer {
    running: Arc<AtomicBool>,
    mailbox: Mailbox,
    published: Arc<AtomicU64>,
    handle: Option<JoinHandle<Result<TrainingSession>>>,
}

impl BackgroundTrainer {
    /// Moves `session` onto a new worker thread that calls `tick` until stopped.
    ///
    /// A tick error stops the worker; it is returned from [`BackgroundTrainer::stop`].
    pub fn spawn<F>(session: TrainingSession, config: BackgroundConfig, mut tick: F) -> Result<Self>
    where
        F: FnMut(&mut TrainingSession) -> Result<()> + Send + 'static,
    {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(true));
        let mailbox: Mailbox = Arc::new(Mutex::new(None));
        let published = Arc::new(AtomicU64::new(0));

        let handle = {
            let running = Arc::clone(&running);
            let mailbox = Arc::clone(&mailbox);
            let published = Arc::clone(&published);
            thread::Builder::new()
                .name("antnet-trainer".to_owned())
                .spawn(move || {
                    let mut session = session;
                    info!(
                        neuron_counts = ?session.network().neuron_counts(),
                        ticks_per_check = config.ticks_per_check,
                        "background trainer started"
                    );
                    // Check the flag after each batch so every run publishes at least once.
                    loop {
                        for _ in 0..config.ticks_per_check {
                            if let Err(e) = tick(&mut session) {
                                warn!(error = %e, epoch = session.epoch(), "background tick failed, stopping");
                                running.store(false, Ordering::Release);
                                return Err(e);
                            }
                        }
                        *mailbox.lock() = Some(session.network().clone());
                        published.fetch_add(1, Ordering::AcqRel);
                        if !running.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    info!(epoch = session.epoch(), "background trainer stopped");
                    Ok(session)
                })?
        };

        Ok(Self {
            running,
            mailbox,
            published,
            handle: Some(handle),
        })
    }

    /// Takes the most recent unconsumed snapshot, if any.
    pub fn take_snapshot(&self) -> Option<Network> {
        self.mailbox.lock().take()
    }

    /// Snapshots published since the worker started (consumed or not).
    #[inline]
    pub fn snapshots_published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// True once the worker thread has exited (stopped, failed, or panicked).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Signals the worker, waits for its current tick batch to finish and returns the session.
    ///
    /// The worker always completes its first batch, even when stopped right after spawning.
    pub fn stop(mut self) -> Result<TrainingSession> {
        self.running.store(false, Ordering::Release);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(panic_message)?,
            None => Err(Error::Worker("worker already joined".to_owned())),
        }
    }
}

impl Drop for BackgroundTrainer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("background trainer panicked");
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> Error {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_owned()
    };
    Error::Worker(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    use crate::{NetworkBuilder, TrainerConfig};

    fn xor_session() -> TrainingSession {
        let net = NetworkBuilder::from_sizes(&[2, 3, 1])
            .unwrap()
            .build_with_seed(1)
            .unwrap();
        let config = TrainerConfig {
            learning_rate: 1.0,
            batch_size: 4,
            ..TrainerConfig::default()
        };
        TrainingSession::new(net, config).unwrap()
    }

    fn xor_tick(s: &mut TrainingSession) -> Result<()> {
        for (x, y) in [
            ([0.0, 0.0], 0.0),
            ([0.0, 1.0], 1.0),
            ([1.0, 0.0], 1.0),
            ([1.0, 1.0], 0.0),
        ] {
            s.push(&x, &[y])?;
        }
        Ok(())
    }

    fn wait_for<T>(timeout: Duration, mut f: impl FnMut() -> Option<T>) -> Option<T> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Some(v) = f() {
                return Some(v);
            }
            thread::sleep(Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn publishes_snapshots_and_returns_session() {
        let trainer = BackgroundTrainer::spawn(
            xor_session(),
            BackgroundConfig { ticks_per_check: 5 },
            xor_tick,
        )
        .unwrap();

        let mut snapshot = wait_for(Duration::from_secs(10), || trainer.take_snapshot())
            .expect("no snapshot published");
        assert_eq!(snapshot.neuron_counts(), &[2, 3, 1]);
        assert_eq!(snapshot.scratch_capacity(), 0);
        assert_eq!(snapshot.run(&[1.0, 0.0]).unwrap().len(), 1);
        assert!(trainer.snapshots_published() >= 1);

        let session = trainer.stop().unwrap();
        assert!(session.epoch() >= 5);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn tick_error_stops_worker() {
        let trainer = BackgroundTrainer::spawn(
            xor_session(),
            BackgroundConfig::default(),
            |s: &mut TrainingSession| s.push(&[0.0], &[0.0]).map(|_| ()),
        )
        .unwrap();

        assert!(wait_for(Duration::from_secs(10), || trainer.is_finished().then_some(())).is_some());
        assert!(trainer.take_snapshot().is_none());
        assert!(matches!(trainer.stop(), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn panicking_tick_is_reported() {
        let trainer = BackgroundTrainer::spawn(
            xor_session(),
            BackgroundConfig::default(),
            |_: &mut TrainingSession| -> Result<()> { panic!("tick exploded") },
        )
        .unwrap();
        assert!(wait_for(Duration::from_secs(10), || trainer.is_finished().then_some(())).is_some());
        match trainer.stop() {
            Err(Error::Worker(msg)) => assert!(msg.contains("tick exploded")),
            other => panic!("unexpected result: {:?}", other.map(|s| s.epoch())),
        }
    }

    #[test]
    fn panicking_tick_is_reported_when_stopped_immediately() {
        let trainer = BackgroundTrainer::spawn(
            xor_session(),
            BackgroundConfig::default(),
            |_: &mut TrainingSession| -> Result<()> { panic!("first tick exploded") },
        )
        .unwrap();
        assert!(matches!(trainer.stop(), Err(Error::Worker(_))));
    }

    #[test]
    fn stop_right_after_spawn_still_runs_a_full_batch() {
        let trainer = BackgroundTrainer::spawn(
            xor_session(),
            BackgroundConfig { ticks_per_check: 3 },
            xor_tick,
        )
        .unwrap();
        let session = trainer.stop().unwrap();
        assert!(session.epoch() >= 3);
        assert_eq!(session.epoch() % 3, 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result =
            BackgroundTrainer::spawn(xor_session(), BackgroundConfig { ticks_per_check: 0 }, xor_tick);
        assert!(result.is_err());
    }

    #[test]
    fn drop_joins_worker() {
        let trainer =
            BackgroundTrainer::spawn(xor_session(), BackgroundConfig::default(), xor_tick).unwrap();
        drop(trainer);
    }
}
