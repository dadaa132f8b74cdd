//! Phase timing for API diagnostics
//!
//! Every major call is bracketed with a wall-clock measurement. Samples are
//! grouped by [`Phase`] for the per-phase report sheets, and anything slower
//! than [`SLOW_CALL_THRESHOLD`] is also copied into the issue list.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Calls slower than this are reported as issues
pub const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(5);

/// Subject recorded for the token exchange
pub const TOKEN_SUBJECT: &str = "token";

/// Subject recorded for the job listing
pub const ALL_JOBS_SUBJECT: &str = "GetJobsAPI";

/// Measured stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Token exchange
    Token,
    /// Job listing (all pages)
    AllJobs,
    /// Single job fetched by id
    JobById,
    /// Attribute discovery for one job
    Attributes,
    /// Historical time data for one job
    HistoricalPull,
    /// Current time data for one job
    CurrentPull,
    /// Event data for one job
    EventPull,
    /// Whole per-job pipeline
    TotalProcess,
}

impl Phase {
    /// Every phase, in report order
    pub const ALL: [Phase; 8] = [
        Phase::Token,
        Phase::AllJobs,
        Phase::JobById,
        Phase::Attributes,
        Phase::HistoricalPull,
        Phase::CurrentPull,
        Phase::EventPull,
        Phase::TotalProcess,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Token => "token",
            Phase::AllJobs => "all_jobs",
            Phase::JobById => "job_by_id",
            Phase::Attributes => "attributes",
            Phase::HistoricalPull => "historical_pull",
            Phase::CurrentPull => "current_pull",
            Phase::EventPull => "event_pull",
            Phase::TotalProcess => "total_process",
        };
        write!(f, "{s}")
    }
}

/// One measured call
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    /// Stage that was measured
    pub phase: Phase,
    /// Job id, or an operation name for run-level phases
    pub subject: String,
    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl TimingSample {
    /// Elapsed time in seconds
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Whether the call crossed the slow-call threshold
    pub fn is_slow(&self, threshold: Duration) -> bool {
        self.elapsed > threshold
    }
}

/// Running log of samples for one run
#[derive(Debug, Clone)]
pub struct TimingLog {
    samples: Vec<TimingSample>,
    issues: Vec<TimingSample>,
    threshold: Duration,
}

impl Default for TimingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingLog {
    /// Empty log using [`SLOW_CALL_THRESHOLD`]
    pub fn new() -> Self {
        Self::with_threshold(SLOW_CALL_THRESHOLD)
    }

    /// Empty log with a custom slow-call threshold
    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            samples: Vec::new(),
            issues: Vec::new(),
            threshold,
        }
    }

    /// Record a sample, flagging it when slow
    pub fn record(&mut self, phase: Phase, subject: impl Into<String>, elapsed: Duration) {
        let sample = TimingSample {
            phase,
            subject: subject.into(),
            elapsed,
        };

        debug!(
            "{} for {} took {:.3}s",
            sample.phase,
            sample.subject,
            sample.seconds()
        );

        if sample.is_slow(self.threshold) {
            warn!(
                "Slow call: {} for {} took {:.3}s (threshold {:.1}s)",
                sample.phase,
                sample.subject,
                sample.seconds(),
                self.threshold.as_secs_f64()
            );
            self.issues.push(sample.clone());
        }

        self.samples.push(sample);
    }

    /// Samples of one phase in recording order
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &TimingSample> {
        self.samples.iter().filter(move |s| s.phase == phase)
    }

    /// Every sample in recording order
    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    /// Samples over the threshold
    pub fn issues(&self) -> &[TimingSample] {
        &self.issues
    }

    /// Slow-call threshold in use
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

/// Wall-clock stopwatch for one phase
#[derive(Debug)]
pub struct PhaseTimer {
    phase: Phase,
    started: Instant,
}

impl PhaseTimer {
    /// Start timing `phase`
    pub fn start(phase: Phase) -> Self {
        Self {
            phase,
            started: Instant::now(),
        }
    }

    /// Stop and record into `log`
    pub fn finish(self, log: &mut TimingLog, subject: impl Into<String>) -> Duration {
        let elapsed = self.started.elapsed();
        log.record(self.phase, subject, elapsed);
        elapsed
    }
}
