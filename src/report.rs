//! Output formatting and persistence for the DID estimate.
//!
//! Supports pretty-printing, JSON logging, and a LaTeX results table.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::estimate::DidEstimate;

/// Logs the estimate using Rust's debug pretty-print format.
pub fn print_pretty(estimate: &DidEstimate) {
    debug!("{:#?}", estimate);
}

/// Logs the estimate as pretty-printed JSON.
pub fn print_json(estimate: &DidEstimate) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(estimate)?);
    Ok(())
}

/// Logs the headline numbers on the log scale.
pub fn log_summary(estimate: &DidEstimate) {
    info!(
        gamma_hat = estimate.gamma_hat,
        std_error = estimate.se,
        ci_lower = estimate.ci_lower,
        ci_upper = estimate.ci_upper,
        "DID Results (Log Scale)"
    );
}

/// Renders the fixed-layout results table.
pub fn render_latex_table(estimate: &DidEstimate) -> String {
    let t = &estimate.treated;
    let c = &estimate.control;

    format!(
        r"\begin{{table}}[h]
\centering
\caption{{Difference-in-Differences Estimate of the Effect of Paid Search on Revenue}}
\begin{{tabular}}{{lcc}}
\hline
 & Mean Log Difference & Standard Error \\
\hline
Treated ($n = {nt}$) & ${tm:.4}$ & ${tse:.4}$ \\
Control ($n = {nc}$) & ${cm:.4}$ & ${cse:.4}$ \\
DID Estimate ($\hat{{\gamma}}$) & ${g:.4}$ & ${se:.4}$ \\
\hline
95\% CI & \multicolumn{{2}}{{c}}{{$[{lo:.4}, \; {hi:.4}]$}} \\
\hline
\end{{tabular}}
\label{{tab:did}}
\end{{table}}
",
        nt = t.n,
        tm = t.mean,
        tse = t.se,
        nc = c.n,
        cm = c.mean,
        cse = c.se,
        g = estimate.gamma_hat,
        se = estimate.se,
        lo = estimate.ci_lower,
        hi = estimate.ci_upper,
    )
}

/// Writes the LaTeX table to `path`, replacing any previous output.
pub fn write_latex_table(path: &Path, estimate: &DidEstimate) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, render_latex_table(estimate))
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "LaTeX table written");
    Ok(())
}
