//! Difference-in-differences estimation from two cohort summaries.

use anyhow::{Result, bail, ensure};
use serde::Serialize;
use tracing::debug;

use crate::observation::Cohort;
use crate::preprocess::CohortRow;
use crate::stats::{mean, sample_variance, standard_error};

/// Two-sided 95% critical value of the standard normal.
pub const Z_95: f64 = 1.96;

/// Mean log-revenue change of one cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CohortEstimate {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
    /// Standard error of `mean`.
    pub se: f64,
}

impl CohortEstimate {
    /// Summarizes the `log_revenue_diff` column of a cohort.
    ///
    /// # Errors
    ///
    /// Fails when the cohort has fewer than two DMAs (sample variance is
    /// undefined) or when any diff is not finite.
    pub fn from_rows(cohort: Cohort, rows: &[CohortRow]) -> Result<Self> {
        let diffs: Vec<f64> = rows.iter().map(|r| r.log_revenue_diff).collect();

        if let Some(bad) = rows.iter().find(|r| !r.log_revenue_diff.is_finite()) {
            bail!(
                "{cohort} cohort: DMA {} has non-finite log revenue difference",
                bad.dma
            );
        }

        let n = diffs.len();
        let (Some(avg), Some(variance)) = (mean(&diffs), sample_variance(&diffs)) else {
            bail!("{cohort} cohort has {n} DMA(s); at least 2 are needed for a sample variance");
        };

        Ok(Self {
            n,
            mean: avg,
            variance,
            se: standard_error(variance, n),
        })
    }
}

/// Point estimate, standard error and 95% interval of the treatment effect on
/// the log scale, along with the per-cohort pieces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DidEstimate {
    pub treated: CohortEstimate,
    pub control: CohortEstimate,
    pub gamma_hat: f64,
    pub se: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl DidEstimate {
    pub fn contains(&self, value: f64) -> bool {
        self.ci_lower <= value && value <= self.ci_upper
    }
}

/// Computes the DID estimate from the treated and control summaries.
///
/// `gamma_hat = mean_treated - mean_control`, with the standard error taken
/// under independence across cohorts.
pub fn estimate(treated: &[CohortRow], control: &[CohortRow]) -> Result<DidEstimate> {
    let treated = CohortEstimate::from_rows(Cohort::Treated, treated)?;
    let control = CohortEstimate::from_rows(Cohort::Control, control)?;

    let gamma_hat = treated.mean - control.mean;
    let se = (treated.variance / treated.n as f64 + control.variance / control.n as f64).sqrt();

    ensure!(
        gamma_hat.is_finite() && se.is_finite(),
        "estimate is not finite (gamma_hat = {gamma_hat}, se = {se})"
    );

    debug!(
        n_treated = treated.n,
        n_control = control.n,
        gamma_hat,
        se,
        "DID estimate computed"
    );

    Ok(DidEstimate {
        treated,
        control,
        gamma_hat,
        se,
        ci_lower: gamma_hat - Z_95 * se,
        ci_upper: gamma_hat + Z_95 * se,
    })
}
