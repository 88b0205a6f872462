//! Batch collector - main collection orchestration logic
//!
//! This module contains the batch loop that coordinates one run:
//! - Taking the single-writer lock and recovering interrupted runs
//! - Resolving the effective end id (explicit, capped, or located)
//! - Skipping settled ids and probing the rest in increasing order
//! - Extracting and saving existing cases
//! - Recording every outcome before moving on
//! - Stopping early on an excessive run of missing ids

use crate::case::CaseId;
use crate::collector::locator::BoundaryLocator;
use crate::collector::prober::{Extractor, ProbeResponse, Prober};
use crate::collector::scheduler::Throttle;
use crate::config::Config;
use crate::output::{summarize, RunCounters, RunStatistics};
use crate::state::{BoundaryEstimate, IdStatus, Observation};
use crate::storage::{OutcomeStore, RunStatus};
use crate::HarvestError;
use thiserror::Error;

/// Parameters of one batch invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub year: u8,

    /// First id to visit (ids start at 1)
    pub start: u32,

    /// Visit at most this many ids from `start`
    pub max_cases: Option<u32>,

    /// Last id to visit; takes precedence over `max_cases`
    pub end: Option<u32>,

    /// Ignore any cached boundary and locate it again
    pub rediscover: bool,
}

impl BatchRequest {
    pub fn new(year: u8) -> Self {
        Self {
            year,
            start: 1,
            max_cases: None,
            end: None,
            rediscover: false,
        }
    }
}

/// Run-level conditions that curtail a run without failing it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunWarning {
    #[error("boundary for year {year:02} unresolved after {probes} probes, using end id {fallback_end}")]
    BoundaryUnresolved {
        year: u8,
        probes: u32,
        fallback_end: u32,
    },

    #[error("stopped at id {last_id} after {consecutive} consecutive missing ids")]
    ExcessiveGapAbort { last_id: u32, consecutive: u32 },
}

/// Everything a batch run reports back
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub stats: RunStatistics,

    /// The boundary used to resolve the end id, if one was needed
    pub boundary: Option<BoundaryEstimate>,

    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    /// Returns true if the run stopped before its effective end
    pub fn aborted(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, RunWarning::ExcessiveGapAbort { .. }))
    }
}

/// Main collector structure
///
/// Owns the prober, extractor and outcome store for the duration of a
/// process. Probing is strictly sequential.
pub struct Collector<P, X, S> {
    config: Config,
    config_hash: String,
    prober: P,
    extractor: X,
    storage: S,
    throttle: Throttle,
    owner: String,
}

impl<P: Prober, X: Extractor, S: OutcomeStore> Collector<P, X, S> {
    /// Creates a new collector
    ///
    /// # Arguments
    ///
    /// * `config` - The collector configuration
    /// * `prober` - Existence checks against the origin
    /// * `extractor` - Turns fetched documents into case records
    /// * `storage` - The outcome store
    pub fn new(config: Config, prober: P, extractor: X, storage: S) -> Self {
        let throttle = Throttle::new(
            config.collector.min_delay_ms,
            config.collector.max_delay_ms,
        );
        Self {
            config,
            config_hash: String::from("unhashed"),
            prober,
            extractor,
            storage,
            throttle,
            owner: format!("pid:{}", std::process::id()),
        }
    }

    /// Sets the config hash recorded with each run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Locates and stores the boundary for a year, ignoring any cached value
    pub async fn locate(&mut self, year: u8, start_hint: u32) -> Result<BoundaryEstimate, HarvestError> {
        self.lock()?;
        let result = self.discover(year, start_hint).await;
        self.unlock();
        result
    }

    /// Makes a year's failed ids eligible for probing again
    ///
    /// Holds the collector lock so a concurrent run never sees a half-reset year.
    pub fn reset_failed(&mut self, year: u8) -> Result<u64, HarvestError> {
        self.lock()?;
        let result = self.storage.reset_failed(year).map_err(HarvestError::from);
        self.unlock();
        result
    }

    /// Runs one batch over a year's id range
    ///
    /// Per-id failures never abort the run. Only storage failures or a held
    /// lock return an error; every outcome recorded before that is durable.
    /// A storage failure after the run started returns
    /// `HarvestError::RunFailed` carrying the statistics of the covered ids.
    pub async fn run(&mut self, request: &BatchRequest) -> Result<RunReport, HarvestError> {
        if request.start == 0 {
            return Err(HarvestError::InvalidRequest(
                "start id must be at least 1".to_string(),
            ));
        }

        self.lock()?;
        let result = self.run_locked(request).await;
        self.unlock();
        result
    }

    fn lock(&mut self) -> Result<(), HarvestError> {
        let stale_after = chrono::Duration::seconds(self.config.collector.lock_stale_secs as i64);
        match self.storage.acquire_lock(&self.owner, stale_after)? {
            None => Ok(()),
            Some(owner) => Err(HarvestError::Locked { owner }),
        }
    }

    fn unlock(&mut self) {
        if let Err(e) = self.storage.release_lock(&self.owner) {
            tracing::warn!("Failed to release collector lock: {}", e);
        }
    }

    async fn discover(&mut self, year: u8, start_hint: u32) -> Result<BoundaryEstimate, HarvestError> {
        tracing::info!("Locating id boundary for year {:02}", year);
        let locator = BoundaryLocator::new(&self.config.boundary, self.config.collector.retry_limit);
        let estimate = locator
            .locate(
                &mut self.prober,
                &self.storage,
                &mut self.throttle,
                &self.config.collector.prefix,
                year,
                start_hint,
            )
            .await?;
        self.storage.put_boundary(&estimate)?;
        Ok(estimate)
    }

    /// Resolves the last id to visit: `end`, then `start + max_cases - 1`,
    /// then the year's boundary
    async fn resolve_end(
        &mut self,
        request: &BatchRequest,
        warnings: &mut Vec<RunWarning>,
    ) -> Result<(u32, Option<BoundaryEstimate>), HarvestError> {
        if let Some(end) = request.end {
            return Ok((end, None));
        }

        if let Some(max_cases) = request.max_cases {
            let end = (request.start as u64 + max_cases as u64).saturating_sub(1);
            return Ok((end.min(u32::MAX as u64) as u32, None));
        }

        let cached = if request.rediscover {
            None
        } else {
            self.storage.get_boundary(request.year)?
        };

        let estimate = match cached {
            Some(estimate) => {
                tracing::debug!(
                    "Using cached boundary for year {:02}: {}",
                    request.year,
                    estimate.high_water_mark
                );
                estimate
            }
            None => self.discover(request.year, 1).await?,
        };

        let end = estimate.effective_end(self.config.boundary.max_id);
        if !estimate.resolved {
            warnings.push(RunWarning::BoundaryUnresolved {
                year: request.year,
                probes: estimate.probes,
                fallback_end: end,
            });
        }

        Ok((end, Some(estimate)))
    }

    async fn run_locked(&mut self, request: &BatchRequest) -> Result<RunReport, HarvestError> {
        let interrupted = self.storage.mark_interrupted_runs()?;
        if interrupted > 0 {
            tracing::info!("Marked {} interrupted run(s); resuming from stored outcomes", interrupted);
        }

        let mut warnings = Vec::new();
        let (end, boundary) = self.resolve_end(request, &mut warnings).await?;
        let start = request.start;

        let run_id = self
            .storage
            .create_run(request.year, start, &self.config_hash)?;
        tracing::info!(
            "Starting run {} for year {:02}: ids {}..={}",
            run_id,
            request.year,
            start,
            end
        );

        let mut counters = RunCounters::default();
        let mut covered_end = end;
        let swept = self
            .sweep(request, end, &mut counters, &mut covered_end, &mut warnings)
            .await;

        if let Err(e) = swept {
            tracing::error!("Run {} failed at or before id {}: {}", run_id, covered_end, e);
            let stats = summarize(start, covered_end, &counters);
            if let Err(finish_err) = self.storage.finish_run(run_id, RunStatus::Failed, &stats) {
                tracing::warn!("Failed to record run {} as failed: {}", run_id, finish_err);
            }
            return Err(HarvestError::RunFailed {
                run_id,
                stats: Box::new(stats),
                source: Box::new(e),
            });
        }

        let stats = summarize(start, covered_end, &counters);
        let status = if warnings
            .iter()
            .any(|w| matches!(w, RunWarning::ExcessiveGapAbort { .. }))
        {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };
        self.storage.finish_run(run_id, status, &stats)?;

        tracing::info!(
            "Run {} finished ({}): {} total, {} success, {} no record, {} failed, {} skipped, {} unresolved",
            run_id,
            status.to_db_string(),
            stats.total,
            stats.success,
            stats.no_record,
            stats.failed,
            stats.skipped,
            stats.unresolved
        );

        Ok(RunReport {
            run_id,
            stats,
            boundary,
            warnings,
        })
    }

    /// Visits `request.start..=end` in increasing order
    ///
    /// `covered_end` tracks the last id visited so partial statistics stay
    /// accurate when the sweep stops early.
    async fn sweep(
        &mut self,
        request: &BatchRequest,
        end: u32,
        counters: &mut RunCounters,
        covered_end: &mut u32,
        warnings: &mut Vec<RunWarning>,
    ) -> Result<(), HarvestError> {
        let start = request.start;
        let template = CaseId::new(self.config.collector.prefix.as_str(), start, request.year)?;
        let retry_limit = self.config.collector.retry_limit;
        let gap_ceiling = self.config.collector.max_consecutive_no_record;
        let progress_interval = self.config.collector.progress_interval.max(1);

        let mut gap_streak: u32 = 0;
        let mut visited: u64 = 0;

        for number in start..=end {
            let id = template.with_number(number);
            visited += 1;
            *covered_end = number.saturating_sub(1);

            let record = self.storage.get(&id)?;
            if !record.needs_probe(retry_limit) {
                counters.skipped += 1;
                *covered_end = number;
                if record.status == IdStatus::Success {
                    gap_streak = 0;
                }
                tracing::trace!("Skipping settled id {} ({})", id, record.status);
                self.throttle.pause().await;
                continue;
            }

            let observation = self.observe(&id).await?;
            let stored = self.storage.record(&id, &observation)?;
            counters.attempted += 1;
            *covered_end = number;

            match stored.status {
                IdStatus::Success => {
                    counters.success += 1;
                    gap_streak = 0;
                }
                IdStatus::NoRecord => {
                    counters.no_record += 1;
                    gap_streak += 1;
                }
                IdStatus::Failed => {
                    if matches!(observation, Observation::ExtractionFailed(_)) {
                        gap_streak = 0;
                    }
                    if stored.attempts == retry_limit {
                        counters.failed += 1;
                        tracing::warn!(
                            "Escalating {} after {} failed attempts: {}",
                            id,
                            stored.attempts,
                            stored.last_error.as_deref().unwrap_or("unknown error")
                        );
                    } else {
                        counters.pending += 1;
                    }
                }
                IdStatus::Unknown => counters.pending += 1,
            }

            if visited % progress_interval == 0 {
                tracing::info!(
                    "Progress: at {} ({} success, {} no record, {} failed, {} skipped)",
                    id,
                    counters.success,
                    counters.no_record,
                    counters.failed,
                    counters.skipped
                );
            }

            if gap_streak >= gap_ceiling {
                tracing::warn!(
                    "{} consecutive missing ids ending at {}, stopping run",
                    gap_streak,
                    id
                );
                warnings.push(RunWarning::ExcessiveGapAbort {
                    last_id: number,
                    consecutive: gap_streak,
                });
                break;
            }
        }

        Ok(())
    }

    /// Probes one id and, if it exists, extracts and saves the case
    async fn observe(&mut self, id: &CaseId) -> Result<Observation, HarvestError> {
        let response = self.prober.probe(id).await;
        self.throttle.pause().await;

        let observation = match response {
            ProbeResponse::Exists(document) => match self.extractor.extract(&document) {
                Ok(case) => {
                    self.storage.save_case(&case)?;
                    tracing::debug!("Collected {} ({} docket entries)", id, case.docket.len());
                    Observation::Extracted
                }
                Err(e) => {
                    tracing::warn!("Extraction failed for {}: {}", id, e);
                    Observation::ExtractionFailed(e.to_string())
                }
            },
            ProbeResponse::NotFound => {
                tracing::debug!("No record for {}", id);
                Observation::NotFound
            }
            ProbeResponse::TransientError(message) => {
                tracing::warn!("Transient error for {}: {}", id, message);
                Observation::Transient(message)
            }
        };

        Ok(observation)
    }
}
