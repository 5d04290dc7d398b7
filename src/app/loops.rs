// SPDX-License-Identifier: GPL-3.0-only

//! Recurring session loops
//!
//! Every periodic job (recognition polling, QR polling, the recording
//! timer) is a spawned task that only posts a message back to the session.
//! Each start bumps a generation counter carried in those messages, so a
//! tick that was already queued when its loop stopped is recognized and
//! dropped.

use super::SessionMessage;
use crate::constants::MIN_LOOP_INTERVAL;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

/// A running interval task
///
/// Stopping (or dropping) the handle ends the task before its next tick.
#[derive(Debug)]
pub struct LoopHandle {
    stop_sender: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn a loop calling `on_tick` every `period`
    ///
    /// With `immediate` the first tick fires right away, otherwise after one
    /// period. The loop ends when `on_tick` returns false. Periods below
    /// [`MIN_LOOP_INTERVAL`] are raised to it.
    pub fn spawn_interval<F>(period: Duration, immediate: bool, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let period = period.max(MIN_LOOP_INTERVAL);
        let (stop_sender, mut stop_receiver) = oneshot::channel::<()>();
        let start = if immediate {
            Instant::now()
        } else {
            Instant::now() + period
        };

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_receiver => break,
                    _ = ticker.tick() => {
                        if !on_tick() {
                            break;
                        }
                    }
                }
            }
            trace!("Loop ended");
        });

        Self {
            stop_sender: Some(stop_sender),
            task,
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn halt(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            let _ = sender.send(());
        }
        self.task.abort();
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

/// A restartable loop that posts generation-tagged messages to the session
#[derive(Debug)]
pub struct PollingLoop {
    period: Duration,
    immediate: bool,
    generation: u64,
    handle: Option<LoopHandle>,
}

impl PollingLoop {
    pub fn new(period: Duration, immediate: bool) -> Self {
        Self {
            period,
            immediate,
            generation: 0,
            handle: None,
        }
    }

    /// (Re)start the loop; returns the new generation
    pub fn start<F>(&mut self, tx: &mpsc::UnboundedSender<SessionMessage>, make_message: F) -> u64
    where
        F: Fn(u64) -> SessionMessage + Send + 'static,
    {
        self.stop();
        self.generation += 1;
        let generation = self.generation;
        let tx = tx.clone();
        self.handle = Some(LoopHandle::spawn_interval(
            self.period,
            self.immediate,
            move || tx.send(make_message(generation)).is_ok(),
        ));
        generation
    }

    /// Stop the loop; returns whether it was running
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a tick of `generation` belongs to the running loop
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
