//! Cohort aggregation: per-DMA pre/post log-revenue means.
//!
//! Observations are split by cohort, averaged within each (DMA, period) pair
//! and reduced to one row per DMA. Summaries are persisted as CSV so the
//! estimator can run on its own.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::observation::{Cohort, Observation, Period};

/// One DMA's row in a cohort summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    pub dma: u32,
    pub log_revenue_pre: f64,
    pub log_revenue_post: f64,
    pub log_revenue_diff: f64,
}

/// Per-DMA summary of a single cohort.
#[derive(Debug, Clone)]
pub struct CohortSummary {
    pub cohort: Cohort,
    pub rows: Vec<CohortRow>,
    /// DMAs left out because one of the periods had no observations.
    pub dropped: usize,
}

/// Headline facts about the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub treated_dmas: usize,
    pub untreated_dmas: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl DatasetSummary {
    /// Counts distinct DMAs per cohort and the covered date range.
    /// Returns `None` for empty input.
    pub fn from_observations(observations: &[Observation]) -> Option<Self> {
        let first_date = observations.iter().map(|o| o.date).min()?;
        let last_date = observations.iter().map(|o| o.date).max()?;

        let distinct = |cohort: Cohort| {
            observations
                .iter()
                .filter(|o| o.cohort == cohort)
                .map(|o| o.dma)
                .collect::<BTreeSet<_>>()
                .len()
        };

        Some(Self {
            treated_dmas: distinct(Cohort::Treated),
            untreated_dmas: distinct(Cohort::Control),
            first_date,
            last_date,
        })
    }
}

#[derive(Debug, Default)]
struct Accum {
    sum: f64,
    count: usize,
}

impl Accum {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct PeriodAccum {
    pre: Accum,
    post: Accum,
}

impl PeriodAccum {
    fn slot(&mut self, period: Period) -> &mut Accum {
        match period {
            Period::Pre => &mut self.pre,
            Period::Post => &mut self.post,
        }
    }
}

/// Reduces one cohort's observations to a row per DMA, ordered by DMA id.
///
/// A DMA missing either period is dropped and counted in
/// [`CohortSummary::dropped`].
pub fn summarize_cohort(observations: &[Observation], cohort: Cohort) -> CohortSummary {
    let mut groups: BTreeMap<u32, PeriodAccum> = BTreeMap::new();

    for obs in observations.iter().filter(|o| o.cohort == cohort) {
        groups
            .entry(obs.dma)
            .or_default()
            .slot(obs.period)
            .push(obs.log_revenue());
    }

    let mut rows = Vec::with_capacity(groups.len());
    let mut dropped = 0;

    for (dma, acc) in &groups {
        match (acc.pre.mean(), acc.post.mean()) {
            (Some(pre), Some(post)) => rows.push(CohortRow {
                dma: *dma,
                log_revenue_pre: pre,
                log_revenue_post: post,
                log_revenue_diff: post - pre,
            }),
            (pre, post) => {
                dropped += 1;
                debug!(
                    dma,
                    %cohort,
                    has_pre = pre.is_some(),
                    has_post = post.is_some(),
                    "DMA missing a period"
                );
            }
        }
    }

    if dropped > 0 {
        warn!(%cohort, dropped, kept = rows.len(), "Dropped DMAs without both periods");
    }

    CohortSummary {
        cohort,
        rows,
        dropped,
    }
}

/// Writes a cohort summary table, replacing any previous file.
pub fn write_summary(path: &Path, rows: &[CohortRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Cohort summary written");
    Ok(())
}

/// Reads a cohort summary table written by [`write_summary`].
pub fn read_summary(path: &Path) -> Result<Vec<CohortRow>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open cohort summary {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: CohortRow =
            result.with_context(|| format!("invalid cohort summary {}", path.display()))?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "Cohort summary loaded");
    Ok(rows)
}
