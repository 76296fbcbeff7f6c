// SPDX-License-Identifier: GPL-3.0-only

//! The booth's single one-second timer
//!
//! Countdown and preview expiry are both driven from these ticks, so the
//! visible countdown and the shutter cannot drift apart.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub struct BoothTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl BoothTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// (Re)start; the first tick fires one period from now
    pub fn arm(&mut self) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; never completes while disarmed
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
