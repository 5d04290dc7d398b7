// SPDX-License-Identifier: GPL-3.0-only

//! Shared recognition loop
//!
//! One polling loop serves faces, objects and text. Whether it runs is
//! recomputed from the whole processor set on every change: it runs iff at
//! least one recognition processor is enabled outside scanner mode.
//!
//! Results carry the epoch of their kind at dispatch time. Disabling a kind
//! (or changing mode) bumps the epoch, so results still in flight are
//! dropped on arrival even if the kind was re-enabled in between.

use super::DetectionKind;
use crate::app::loops::PollingLoop;
use crate::app::state::{CaptureMode, ProcessorSet};
use crate::app::SessionMessage;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What a reconcile did to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopTransition {
    Started,
    Stopped,
    Unchanged,
}

#[derive(Debug)]
pub struct FrameProcessorScheduler {
    polling: PollingLoop,
    epochs: BTreeMap<DetectionKind, u64>,
}

impl FrameProcessorScheduler {
    /// The first tick fires as soon as the loop starts
    pub fn new(interval: Duration) -> Self {
        Self {
            polling: PollingLoop::new(interval, true),
            epochs: DetectionKind::ALL.into_iter().map(|k| (k, 0)).collect(),
        }
    }

    /// Start or stop the loop to match the processor set
    pub fn reconcile(
        &mut self,
        mode: CaptureMode,
        processors: &ProcessorSet,
        tx: &mpsc::UnboundedSender<SessionMessage>,
    ) -> LoopTransition {
        let should_run = mode != CaptureMode::Scanner && processors.polling_count() > 0;

        match (should_run, self.polling.is_running()) {
            (true, false) => {
                let generation = self
                    .polling
                    .start(tx, |generation| SessionMessage::ProcessorTick { generation });
                info!(
                    generation,
                    processors = processors.polling_count(),
                    "Started recognition loop"
                );
                LoopTransition::Started
            }
            (false, true) => {
                self.polling.stop();
                info!("Stopped recognition loop");
                LoopTransition::Stopped
            }
            _ => LoopTransition::Unchanged,
        }
    }

    /// Stop the loop and invalidate every in-flight result
    pub fn cancel(&mut self) -> bool {
        for kind in DetectionKind::ALL {
            self.bump_epoch(kind);
        }
        let was_running = self.polling.stop();
        if was_running {
            debug!("Cancelled recognition loop");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.polling.is_running()
    }

    /// Whether a tick belongs to the running loop
    pub fn is_current(&self, generation: u64) -> bool {
        self.polling.is_current(generation)
    }

    pub fn epoch(&self, kind: DetectionKind) -> u64 {
        self.epochs.get(&kind).copied().unwrap_or(0)
    }

    /// Invalidate in-flight results of one kind
    pub fn bump_epoch(&mut self, kind: DetectionKind) {
        *self.epochs.entry(kind).or_insert(0) += 1;
    }

    /// Apply-time check for a polling result
    pub fn accepts(
        &self,
        kind: DetectionKind,
        epoch: u64,
        mode: CaptureMode,
        processors: &ProcessorSet,
    ) -> bool {
        mode != CaptureMode::Scanner
            && processors.is_enabled(kind.into())
            && epoch == self.epoch(kind)
    }
}
