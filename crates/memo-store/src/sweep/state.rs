//! Sweep run tracking.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::SweepReport;

/// Tracks what the background sweep has done so far.
#[derive(Debug)]
pub struct SweepState {
    /// When the last sweep finished.
    last_run: RwLock<Option<DateTime<Utc>>>,
    /// The report of the last sweep.
    last_report: RwLock<Option<SweepReport>>,
    /// Number of sweeps run since startup.
    total_runs: RwLock<u64>,
    /// Number of consecutive sweeps with at least one failed pass.
    failure_count: RwLock<u32>,
}

impl SweepState {
    pub fn new() -> Self {
        Self {
            last_run: RwLock::new(None),
            last_report: RwLock::new(None),
            total_runs: RwLock::new(0),
            failure_count: RwLock::new(0),
        }
    }

    /// Records a finished sweep.
    pub fn record_run(&self, report: SweepReport) {
        let mut last_run = self.last_run.write();
        let mut last_report = self.last_report.write();
        let mut total_runs = self.total_runs.write();
        let mut failure_count = self.failure_count.write();

        if report.is_clean() {
            *failure_count = 0;
        } else {
            *failure_count += 1;
        }
        *last_run = Some(Utc::now());
        *last_report = Some(report);
        *total_runs += 1;
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.last_run.read()
    }

    pub fn last_report(&self) -> Option<SweepReport> {
        self.last_report.read().clone()
    }

    pub fn total_runs(&self) -> u64 {
        *self.total_runs.read()
    }

    /// Returns the number of consecutive failing sweeps.
    pub fn failure_count(&self) -> u32 {
        *self.failure_count.read()
    }

    /// True if the last sweep, if any, completed every pass.
    pub fn is_healthy(&self) -> bool {
        *self.failure_count.read() == 0
    }
}

impl Default for SweepState {
    fn default() -> Self {
        Self::new()
    }
}
