//! Boundary locator
//!
//! Finds the highest existing id of a year with a bounded number of probes.
//! The existence predicate has interior gaps, so a miss only ends the search
//! once a confirmation probe further up is empty too:
//!
//! 1. Growth: probe `start, 2·start, 4·start, …` until a miss at `H`
//! 2. Confirmation: probe `H + margin`; a hit there means `H` was a gap and
//!    growth resumes from the hit
//! 3. Narrowing: scan down from `H` in strides until a hit above the last
//!    growth hit, then walk up one id at a time until a trailing window of
//!    consecutive misses (or `H + margin`) is reached
//!
//! Running into the id ceiling or the probe budget leaves the estimate
//! unresolved instead of failing.

use crate::case::CaseId;
use crate::collector::prober::{ProbeOutcome, Prober};
use crate::collector::scheduler::Throttle;
use crate::config::BoundaryConfig;
use crate::state::{BoundaryEstimate, IdStatus};
use crate::storage::{OutcomeStore, StorageError};
use crate::HarvestError;
use chrono::Utc;
use std::collections::HashMap;

/// Why a search stopped before confirming a boundary
enum Halt {
    Unresolved,
    Storage(StorageError),
}

impl From<StorageError> for Halt {
    fn from(e: StorageError) -> Self {
        Halt::Storage(e)
    }
}

/// Probe bookkeeping for one locate call
struct Search<'a, P, S: ?Sized> {
    prober: &'a mut P,
    store: &'a S,
    throttle: &'a mut Throttle,
    template: CaseId,
    known: HashMap<u32, bool>,
    probes: u32,
    max_probes: u32,
    retry_limit: u32,
    highest_hit: Option<u32>,
}

impl<P: Prober, S: OutcomeStore + ?Sized> Search<'_, P, S> {
    /// Returns whether `number` exists, probing at most once per search
    async fn exists(&mut self, number: u32) -> Result<bool, Halt> {
        if let Some(&hit) = self.known.get(&number) {
            return Ok(hit);
        }

        let id = self.template.with_number(number);

        // Collected ids are known to exist; no request needed, but the pace holds
        let hit = if self.store.get(&id)?.status == IdStatus::Success {
            self.throttle.pause().await;
            true
        } else {
            self.probe(&id).await?
        };

        self.known.insert(number, hit);
        if hit {
            self.highest_hit = Some(self.highest_hit.map_or(number, |h| h.max(number)));
        }
        Ok(hit)
    }

    async fn probe(&mut self, id: &CaseId) -> Result<bool, Halt> {
        let mut transient = 0;
        loop {
            if self.probes >= self.max_probes {
                return Err(Halt::Unresolved);
            }
            self.probes += 1;

            let outcome = self.prober.probe(id).await.outcome();
            self.throttle.pause().await;
            tracing::debug!("Boundary probe {} -> {:?}", id, outcome);

            match outcome {
                ProbeOutcome::Exists => return Ok(true),
                ProbeOutcome::NotFound => return Ok(false),
                ProbeOutcome::TransientError => {
                    transient += 1;
                    if transient >= self.retry_limit {
                        // Not evidence of existence either way
                        tracing::warn!(
                            "Boundary probe for {} kept failing, treating as missing",
                            id
                        );
                        return Ok(false);
                    }
                }
            }
        }
    }
}

/// Locates the high-water mark of a year's id space
pub struct BoundaryLocator<'a> {
    config: &'a BoundaryConfig,
    retry_limit: u32,
}

impl<'a> BoundaryLocator<'a> {
    pub fn new(config: &'a BoundaryConfig, retry_limit: u32) -> Self {
        Self {
            config,
            retry_limit: retry_limit.max(1),
        }
    }

    /// Runs the search for one year
    ///
    /// # Arguments
    ///
    /// * `prober` - Existence checks against the origin
    /// * `store` - Consulted so already-collected ids are not re-probed
    /// * `throttle` - Pause applied after every probe
    /// * `prefix` / `year` - The id scope to search
    /// * `start_hint` - First id to probe (at least 1)
    ///
    /// # Returns
    ///
    /// The estimate, with `resolved = false` if the ceiling or probe budget
    /// was hit first. Only storage failures are errors.
    pub async fn locate<P: Prober, S: OutcomeStore + ?Sized>(
        &self,
        prober: &mut P,
        store: &S,
        throttle: &mut Throttle,
        prefix: &str,
        year: u8,
        start_hint: u32,
    ) -> Result<BoundaryEstimate, HarvestError> {
        let mut search = Search {
            prober,
            store,
            throttle,
            template: CaseId::new(prefix, 0, year)?,
            known: HashMap::new(),
            probes: 0,
            max_probes: self.config.max_probes,
            retry_limit: self.retry_limit,
            highest_hit: None,
        };

        let start = start_hint.min(self.config.max_id).max(1);

        match self.search(&mut search, start).await {
            Ok((high_water_mark, confidence_upper)) => {
                tracing::info!(
                    "Year {:02}: high-water mark {} (confirmed empty at {}, {} probes)",
                    year,
                    high_water_mark,
                    confidence_upper,
                    search.probes
                );
                Ok(BoundaryEstimate {
                    year,
                    high_water_mark,
                    confidence_upper,
                    probes: search.probes,
                    resolved: true,
                    computed_at: Utc::now(),
                })
            }
            Err(Halt::Unresolved) => {
                let high_water_mark = search.highest_hit.unwrap_or(0);
                tracing::warn!(
                    "Year {:02}: boundary unresolved after {} probes (ceiling {}), last confirmed id {}",
                    year,
                    search.probes,
                    self.config.max_id,
                    high_water_mark
                );
                Ok(BoundaryEstimate {
                    year,
                    high_water_mark,
                    confidence_upper: self.config.max_id,
                    probes: search.probes,
                    resolved: false,
                    computed_at: Utc::now(),
                })
            }
            Err(Halt::Storage(e)) => Err(e.into()),
        }
    }

    /// Returns `(high_water_mark, confirmed_empty)`
    async fn search<P: Prober, S: OutcomeStore + ?Sized>(
        &self,
        search: &mut Search<'_, P, S>,
        start: u32,
    ) -> Result<(u32, u32), Halt> {
        let max_id = self.config.max_id;
        let margin = self.config.confirmation_margin;

        // Growth with confirmation
        let mut last_hit: Option<u32> = None;
        let mut cursor = start;
        let (miss, confirmed_empty) = loop {
            if search.exists(cursor).await? {
                last_hit = Some(cursor);
                if cursor >= max_id {
                    return Err(Halt::Unresolved);
                }
                cursor = cursor.saturating_mul(2).min(max_id);
                continue;
            }

            let confirm = cursor.saturating_add(margin).min(max_id);
            if confirm > cursor && search.exists(confirm).await? {
                // `cursor` was an interior gap
                last_hit = Some(confirm);
                if confirm >= max_id {
                    return Err(Halt::Unresolved);
                }
                cursor = confirm.saturating_mul(2).min(max_id);
                continue;
            }

            break (cursor, confirm);
        };

        // Backward stride scan within (last_hit, miss)
        let lower = last_hit.unwrap_or(start.saturating_sub(1));
        let mut anchor = last_hit;
        let stride = self.config.backward_stride.max(1);
        let mut probe_at = miss.checked_sub(stride);
        while let Some(number) = probe_at {
            if number <= lower {
                break;
            }
            if search.exists(number).await? {
                anchor = Some(number);
                break;
            }
            probe_at = number.checked_sub(stride);
        }

        // Forward refinement up to the trailing window
        let mut best = anchor;
        let mut misses = 0;
        let mut number = anchor.unwrap_or(lower) + 1;
        while number <= confirmed_empty && misses < self.config.trailing_window {
            if search.exists(number).await? {
                best = Some(number);
                misses = 0;
            } else {
                misses += 1;
            }
            number += 1;
        }

        Ok((best.unwrap_or(0), confirmed_empty))
    }
}
