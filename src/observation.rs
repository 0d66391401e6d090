//! Raw per-DMA daily revenue observations and their CSV loader.

use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Date layouts accepted in the `date` column, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%y", "%m/%d/%Y"];

/// Which side of the experiment a DMA belongs to, keyed by `search_stays_on`.
///
/// `0` means paid search was turned off (treated), `1` means it stayed on
/// (control).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Cohort {
    Treated,
    Control,
}

impl Cohort {
    pub fn label(self) -> &'static str {
        match self {
            Cohort::Treated => "treated",
            Cohort::Control => "control",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for Cohort {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Cohort::Treated),
            1 => Ok(Cohort::Control),
            other => Err(format!("search_stays_on must be 0 or 1, got {other}")),
        }
    }
}

impl From<Cohort> for u8 {
    fn from(cohort: Cohort) -> u8 {
        match cohort {
            Cohort::Treated => 0,
            Cohort::Control => 1,
        }
    }
}

/// Position of an observation relative to the intervention, keyed by `treatment_period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Period {
    Pre,
    Post,
}

impl TryFrom<u8> for Period {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Period::Pre),
            1 => Ok(Period::Post),
            other => Err(format!("treatment_period must be 0 or 1, got {other}")),
        }
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> u8 {
        match period {
            Period::Pre => 0,
            Period::Post => 1,
        }
    }
}

/// One row of the input table: revenue of a DMA on a given day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Observation {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub dma: u32,
    pub revenue: f64,
    #[serde(rename = "search_stays_on")]
    pub cohort: Cohort,
    #[serde(rename = "treatment_period")]
    pub period: Period,
}

impl Observation {
    pub fn log_revenue(&self) -> f64 {
        self.revenue.ln()
    }
}

/// Parses a calendar date in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised date {raw:?}")))
}

/// Loads every observation from the CSV file at `path`.
///
/// # Errors
///
/// Fails if the file is missing, a row does not parse, a revenue is not a
/// positive finite number, or the file holds no rows.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    let rows = read_observations(file).with_context(|| format!("invalid input {}", path.display()))?;

    info!(path = %path.display(), rows = rows.len(), "Observations loaded");
    Ok(rows)
}

/// Reads observations from any CSV source with a header row.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = i + 2;
        let obs: Observation = result.with_context(|| format!("line {line}"))?;
        ensure!(
            obs.revenue.is_finite() && obs.revenue > 0.0,
            "line {line}: revenue must be positive, got {}",
            obs.revenue
        );
        rows.push(obs);
    }

    ensure!(!rows.is_empty(), "no observations found");
    debug!(rows = rows.len(), "Parsed observation rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,dma,revenue,search_stays_on,treatment_period\n";

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2012, 5, 22).unwrap();
        assert_eq!(parse_date("2012-05-22"), Some(expected));
        assert_eq!(parse_date("22-May-12"), Some(expected));
        assert_eq!(parse_date("5/22/2012"), Some(expected));
        assert_eq!(parse_date(" 2012-05-22 "), Some(expected));
        assert_eq!(
            parse_date("1-Apr-12"),
            NaiveDate::from_ymd_opt(2012, 4, 1)
        );
        assert_eq!(parse_date("May 22nd"), None);
    }

    #[test]
    fn test_read_valid_rows() {
        let data = format!("{HEADER}2012-04-01,500,1000.0,0,0\n2012-06-01,501,250.5,1,1\n");
        let rows = read_observations(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dma, 500);
        assert_eq!(rows[0].cohort, Cohort::Treated);
        assert_eq!(rows[0].period, Period::Pre);
        assert_eq!(rows[1].cohort, Cohort::Control);
        assert_eq!(rows[1].period, Period::Post);
        assert!((rows[1].log_revenue() - 250.5_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_extra_columns_and_order_ignored() {
        let data = "dma,treatment_period,state,date,search_stays_on,revenue\n\
                    7,1,CA,1-Apr-12,1,12.5\n";
        let rows = read_observations(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dma, 7);
        assert_eq!(rows[0].revenue, 12.5);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let data = format!("{HEADER}2012-04-01,500,1000.0,2,0\n");
        let err = read_observations(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_invalid_period_is_rejected() {
        let data = format!("{HEADER}2012-04-01,500,1000.0,0,3\n");
        assert!(read_observations(data.as_bytes()).is_err());
    }

    #[test]
    fn test_non_positive_revenue_is_rejected() {
        let data = format!("{HEADER}2012-04-01,500,0.0,0,0\n");
        let err = read_observations(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("revenue must be positive"));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let data = format!("{HEADER}yesterday,500,10.0,0,0\n");
        assert!(read_observations(data.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(read_observations(HEADER.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let path = std::env::temp_dir().join("paid_search_did_does_not_exist.csv");
        let err = load_observations(&path).unwrap_err();
        assert!(err.to_string().contains("failed to open input"));
    }

    #[test]
    fn test_cohort_round_trips_through_u8() {
        assert_eq!(u8::from(Cohort::Treated), 0);
        assert_eq!(Cohort::try_from(1u8), Ok(Cohort::Control));
        assert!(Period::try_from(2u8).is_err());
    }
}
