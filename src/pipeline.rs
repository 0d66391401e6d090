//! Stage orchestration: preprocess, then estimate and report.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::estimate::{DidEstimate, estimate};
use crate::figures::{daily_totals, log_diff_chart, revenue_chart, write_chart};
use crate::observation::{Cohort, load_observations};
use crate::preprocess::{
    CohortSummary, DatasetSummary, read_summary, summarize_cohort, write_summary,
};
use crate::report::{log_summary, print_pretty, write_latex_table};

/// What the preprocessing stage produced.
#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    pub dataset: DatasetSummary,
    pub treated: CohortSummary,
    pub control: CohortSummary,
}

/// Loads the raw observations, persists both cohort summaries and renders the
/// two diagnostic figures.
#[tracing::instrument(skip_all, fields(input = %config.paths.input.display()))]
pub fn preprocess_stage(config: &Config) -> Result<PreprocessOutcome> {
    let paths = &config.paths;
    let observations = load_observations(&paths.input)?;

    let dataset = DatasetSummary::from_observations(&observations)
        .context("input holds no observations")?;
    info!(
        treated_dmas = dataset.treated_dmas,
        untreated_dmas = dataset.untreated_dmas,
        date_min = %dataset.first_date,
        date_max = %dataset.last_date,
        "Dataset summary"
    );
    debug!("{}", serde_json::to_string(&dataset)?);

    let treated = summarize_cohort(&observations, Cohort::Treated);
    let control = summarize_cohort(&observations, Cohort::Control);

    write_summary(&paths.treated_summary, &treated.rows)?;
    write_summary(&paths.untreated_summary, &control.rows)?;

    let totals = daily_totals(&observations);
    write_chart(&paths.revenue_figure, &revenue_chart(&totals, config.onset))?;
    write_chart(&paths.log_diff_figure, &log_diff_chart(&totals, config.onset))?;

    Ok(PreprocessOutcome {
        dataset,
        treated,
        control,
    })
}

/// Reads the cohort summaries, computes the DID estimate and writes the
/// results table.
#[tracing::instrument(skip_all, fields(table = %config.paths.table.display()))]
pub fn estimate_stage(config: &Config) -> Result<DidEstimate> {
    let paths = &config.paths;
    let treated = read_summary(&paths.treated_summary)?;
    let control = read_summary(&paths.untreated_summary)?;

    let did = estimate(&treated, &control).context("DID estimation failed")?;

    print_pretty(&did);
    log_summary(&did);
    write_latex_table(&paths.table, &did)?;

    Ok(did)
}

/// Runs both stages in order.
pub fn run(config: &Config) -> Result<DidEstimate> {
    preprocess_stage(config)?;
    estimate_stage(config)
}
