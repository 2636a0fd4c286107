// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Cancelable deferred task used to coalesce drag gestures.
//!
//! Scheduling again pushes the deadline out, so only the last sample
//! after an idle gap fires. Time is passed in by the caller.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DeferredTask {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DeferredTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Cancel any pending deadline and schedule a new one at `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, if pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns true (and clears the task) once the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clears the task, returning whether it was pending.
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
