//! File locations and run parameters shared by the pipeline stages.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "input/PaidSearch.csv";
pub const DEFAULT_TEMP_DIR: &str = "temp";
pub const DEFAULT_TABLE: &str = "output/tables/did_table.tex";
pub const DEFAULT_FIGURES_DIR: &str = "output/figures";

/// Day paid search was switched off in the treated DMAs.
pub const TREATMENT_ONSET: &str = "2012-05-22";

/// Every file the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub input: PathBuf,
    pub treated_summary: PathBuf,
    pub untreated_summary: PathBuf,
    pub table: PathBuf,
    pub revenue_figure: PathBuf,
    pub log_diff_figure: PathBuf,
}

impl Paths {
    pub fn new(
        input: impl Into<PathBuf>,
        temp_dir: &Path,
        table: impl Into<PathBuf>,
        figures_dir: &Path,
    ) -> Self {
        Self {
            input: input.into(),
            treated_summary: temp_dir.join("treated_pivot.csv"),
            untreated_summary: temp_dir.join("untreated_pivot.csv"),
            table: table.into(),
            revenue_figure: figures_dir.join("figure_5_2.svg"),
            log_diff_figure: figures_dir.join("figure_5_3.svg"),
        }
    }

    /// The default layout rooted at `root`.
    pub fn under(root: &Path) -> Self {
        Self::new(
            root.join(DEFAULT_INPUT),
            &root.join(DEFAULT_TEMP_DIR),
            root.join(DEFAULT_TABLE),
            &root.join(DEFAULT_FIGURES_DIR),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: Paths,
    pub onset: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = Paths::under(Path::new(""));
        assert_eq!(paths.input, PathBuf::from("input/PaidSearch.csv"));
        assert_eq!(paths.treated_summary, PathBuf::from("temp/treated_pivot.csv"));
        assert_eq!(paths.untreated_summary, PathBuf::from("temp/untreated_pivot.csv"));
        assert_eq!(paths.table, PathBuf::from("output/tables/did_table.tex"));
        assert_eq!(paths.revenue_figure, PathBuf::from("output/figures/figure_5_2.svg"));
        assert_eq!(paths.log_diff_figure, PathBuf::from("output/figures/figure_5_3.svg"));
    }

    #[test]
    fn test_onset_constant_parses() {
        let onset: NaiveDate = TREATMENT_ONSET.parse().unwrap();
        assert_eq!(onset, NaiveDate::from_ymd_opt(2012, 5, 22).unwrap());
    }
}
