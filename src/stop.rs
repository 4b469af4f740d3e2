//! # Stop conditions + watchdog
//!
//! Per-source progress tracking and the halt decision that keeps any single source from
//! crawling without bound. All methods take `now` explicitly so the state machine is pure and
//! testable; the connector context feeds it `Instant::now()`.
//!
//! Priority (first true wins): global runtime → source runtime → pages → items →
//! no-new-leads streak (gated by a minimum-items floor) → idle watchdog.

use std::time::{Duration, Instant};

use crate::models::StopReason;

/// The six independent thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopLimits {
    pub global_max_runtime: Duration,
    pub max_runtime: Duration,
    pub max_pages: u32,
    pub max_items: u32,
    pub no_new_leads_limit: u32,
    pub min_items_before_no_new: u32,
    pub watchdog_timeout: Duration,
}

impl Default for StopLimits {
    fn default() -> Self {
        Self {
            global_max_runtime: Duration::from_secs(900),
            max_runtime: Duration::from_secs(120),
            max_pages: 10,
            max_items: 200,
            no_new_leads_limit: 3,
            min_items_before_no_new: 20,
            watchdog_timeout: Duration::from_secs(60),
        }
    }
}

/// Mutable progress of one connector run.
#[derive(Debug, Clone)]
pub struct StopState {
    pub global_start: Instant,
    pub source_start: Instant,
    pub last_progress: Instant,
    pub pages_visited: u32,
    pub items_scanned: u32,
    pub pages_with_zero_new: u32,
    pub leads_count: u32,
    /// First reason `check` reported, if any.
    pub stopped_by: Option<StopReason>,
}

impl StopState {
    pub fn new(global_start: Instant, now: Instant) -> Self {
        Self {
            global_start,
            source_start: now,
            last_progress: now,
            pages_visited: 0,
            items_scanned: 0,
            pages_with_zero_new: 0,
            leads_count: 0,
            stopped_by: None,
        }
    }

    /// Pure decision: `Some(reason)` when the source must halt.
    pub fn evaluate(&self, limits: &StopLimits, now: Instant) -> Option<StopReason> {
        let since = |t: Instant| now.saturating_duration_since(t);

        if since(self.global_start) >= limits.global_max_runtime {
            return Some(StopReason::GlobalMaxRuntime);
        }
        if since(self.source_start) >= limits.max_runtime {
            return Some(StopReason::MaxRuntime);
        }
        if self.pages_visited >= limits.max_pages {
            return Some(StopReason::MaxPages);
        }
        if self.items_scanned >= limits.max_items {
            return Some(StopReason::MaxItems);
        }
        if self.pages_with_zero_new >= limits.no_new_leads_limit
            && self.items_scanned >= limits.min_items_before_no_new
        {
            return Some(StopReason::NoNewLeads);
        }
        if since(self.last_progress) >= limits.watchdog_timeout {
            return Some(StopReason::WatchdogTimeout);
        }
        None
    }

    /// `evaluate` plus bookkeeping: the first fired reason is remembered in `stopped_by`.
    pub fn check(&mut self, limits: &StopLimits, now: Instant) -> Option<StopReason> {
        let reason = self.evaluate(limits, now);
        if let Some(r) = reason {
            if self.stopped_by.is_none() {
                self.stopped_by = Some(r);
            }
        }
        reason
    }

    pub fn record_page_done(&mut self, new_leads: u32, now: Instant) {
        self.pages_visited += 1;
        if new_leads > 0 {
            self.leads_count += new_leads;
            self.last_progress = now;
            self.pages_with_zero_new = 0;
        } else {
            self.pages_with_zero_new += 1;
        }
    }

    /// Scanning is liveness even without a lead, so progress is always refreshed.
    pub fn record_items_scanned(&mut self, n: u32, now: Instant) {
        self.items_scanned += n;
        self.last_progress = now;
    }
}
