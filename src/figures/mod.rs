//! Diagnostic time-series charts rendered to SVG.
//!
//! Figure 5.2 shows each cohort's daily revenue; figure 5.3 shows the daily
//! log-revenue gap between control and treated DMAs. Both mark the
//! treatment-onset date with a dashed vertical line.

pub mod canvas;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::observation::{Cohort, Observation};
use canvas::{Axis, Canvas, LineStyle, TextAnchor, TextStyle};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 432.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 64.0;

/// Revenue summed over the DMAs of each cohort on one day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyTotals {
    pub treated: f64,
    pub control: f64,
}

/// Sums revenue per day and cohort, ordered by date.
pub fn daily_totals(observations: &[Observation]) -> BTreeMap<NaiveDate, DailyTotals> {
    let mut totals: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for obs in observations {
        let day = totals.entry(obs.date).or_default();
        match obs.cohort {
            Cohort::Treated => day.treated += obs.revenue,
            Cohort::Control => day.control += obs.revenue,
        }
    }
    totals
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub points: Vec<(NaiveDate, f64)>,
}

/// A dated line chart with an optional vertical marker.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub marker: Option<NaiveDate>,
}

/// Figure 5.2: revenue of each cohort over time.
///
/// Each point is the daily sum of revenue over the cohort's DMAs, not an
/// average, hence the title.
pub fn revenue_chart(totals: &BTreeMap<NaiveDate, DailyTotals>, onset: NaiveDate) -> LineChart {
    // revenue is strictly positive, so a zero total means no rows that day
    let series = |label: &str, color, pick: fn(&DailyTotals) -> f64| Series {
        label: label.to_string(),
        color,
        points: totals
            .iter()
            .map(|(d, t)| (*d, pick(t)))
            .filter(|(_, v)| *v > 0.0)
            .collect(),
    };

    LineChart {
        title: "Figure 5.2: Revenue Over Time".to_string(),
        x_label: "Date".to_string(),
        y_label: "Revenue".to_string(),
        series: vec![
            series("Control (search stays on)", "#1f77b4", |t| t.control),
            series("Treatment (search goes off)", "#ff7f0e", |t| t.treated),
        ],
        marker: Some(onset),
    }
}

/// Figure 5.3: `log(control) - log(treated)` of the daily totals.
///
/// This is the log of each cohort's summed revenue, deliberately not the sum
/// of per-DMA log revenues: the latter scales with the number of DMAs in a
/// cohort and would not match the axis label.
pub fn log_diff_chart(totals: &BTreeMap<NaiveDate, DailyTotals>, onset: NaiveDate) -> LineChart {
    let points = totals
        .iter()
        .filter(|(_, t)| t.treated > 0.0 && t.control > 0.0)
        .map(|(d, t)| (*d, t.control.ln() - t.treated.ln()))
        .collect();

    LineChart {
        title: "Figure 5.3: Log Revenue Difference Over Time".to_string(),
        x_label: "Date".to_string(),
        y_label: "log(rev_control) - log(rev_treat)".to_string(),
        series: vec![Series {
            label: "log difference".to_string(),
            color: "#1f77b4",
            points,
        }],
        marker: Some(onset),
    }
}

fn format_tick(v: f64, span: f64) -> String {
    if span >= 100.0 {
        format!("{v:.0}")
    } else if span >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.4}")
    }
}

/// Renders a chart to an SVG document.
pub fn render(chart: &LineChart) -> String {
    let all_points = || chart.series.iter().flat_map(|s| s.points.iter());

    let (Some(first), Some(last)) = (
        all_points().map(|(d, _)| *d).min(),
        all_points().map(|(d, _)| *d).max(),
    ) else {
        return empty_svg(&chart.title);
    };
    let Some(y_axis) = Axis::padded(all_points().map(|(_, v)| *v)) else {
        return empty_svg(&chart.title);
    };

    let days = |d: NaiveDate| (d - first).num_days() as f64;
    let x_axis = Axis {
        min: 0.0,
        max: days(last).max(1.0),
    };

    let left = MARGIN_LEFT;
    let right = WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    let mut canvas = Canvas::new(WIDTH, HEIGHT);
    let axis_style = LineStyle::solid("black", 1.0);
    let grid_style = LineStyle::solid("#dddddd", 0.5);
    let tick_text = TextStyle {
        size: 10.0,
        anchor: TextAnchor::End,
        ..Default::default()
    };

    canvas.text(
        WIDTH / 2.0,
        top - 16.0,
        &chart.title,
        &TextStyle {
            size: 14.0,
            anchor: TextAnchor::Middle,
            bold: true,
        },
    );

    // y ticks and grid
    let span = y_axis.max - y_axis.min;
    for v in y_axis.ticks(5) {
        let py = y_axis.data_to_pixel(v, bottom, top);
        canvas.line(left, py, right, py, &grid_style);
        canvas.line(left - 4.0, py, left, py, &axis_style);
        canvas.text(left - 6.0, py + 3.5, &format_tick(v, span), &tick_text);
    }

    // x ticks at evenly spaced dates
    let x_tick_text = TextStyle {
        anchor: TextAnchor::Middle,
        ..tick_text.clone()
    };
    let mut last_label = None;
    for v in x_axis.ticks(5) {
        let date = first + chrono::Duration::days(v.round() as i64);
        if last_label == Some(date) {
            continue;
        }
        last_label = Some(date);
        let px = x_axis.data_to_pixel(days(date), left, right);
        canvas.line(px, bottom, px, bottom + 4.0, &axis_style);
        canvas.text(px, bottom + 16.0, &date.format("%Y-%m-%d").to_string(), &x_tick_text);
    }

    canvas.line(left, bottom, right, bottom, &axis_style);
    canvas.line(left, top, left, bottom, &axis_style);

    let label_style = TextStyle {
        size: 12.0,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };
    canvas.text((left + right) / 2.0, HEIGHT - 20.0, &chart.x_label, &label_style);
    canvas.text_rotated(20.0, (top + bottom) / 2.0, &chart.y_label, &label_style, -90.0);

    for series in &chart.series {
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|(d, v)| {
                (
                    x_axis.data_to_pixel(days(*d), left, right),
                    y_axis.data_to_pixel(*v, bottom, top),
                )
            })
            .collect();
        canvas.polyline(&points, &LineStyle::solid(series.color, 1.5));
    }

    if let Some(marker) = chart.marker.filter(|m| (first..=last).contains(m)) {
        let px = x_axis.data_to_pixel(days(marker), left, right);
        canvas.line(px, top, px, bottom, &LineStyle::dashed("#555555", 1.0));
    }

    if chart.series.len() > 1 {
        let legend_text = TextStyle {
            size: 10.0,
            ..Default::default()
        };
        for (i, series) in chart.series.iter().enumerate() {
            let y = top + 14.0 + i as f64 * 15.0;
            let swatch = LineStyle::solid(series.color, 2.0);
            canvas.line(left + 10.0, y - 3.5, left + 32.0, y - 3.5, &swatch);
            canvas.text(left + 38.0, y, &series.label, &legend_text);
        }
    }

    canvas.finish_svg()
}

fn empty_svg(title: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="50"><text x="10" y="30">{}: no data</text></svg>
"#,
        canvas::escape_xml(title)
    )
}

/// Renders `chart` and writes it to `path`, creating parent directories.
pub fn write_chart(path: &Path, chart: &LineChart) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, render(chart)).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), title = %chart.title, "Figure written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Period;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, m, d).unwrap()
    }

    fn onset() -> NaiveDate {
        date(5, 22)
    }

    fn obs(d: NaiveDate, dma: u32, revenue: f64, cohort: Cohort) -> Observation {
        let period = if d < onset() { Period::Pre } else { Period::Post };
        Observation {
            date: d,
            dma,
            revenue,
            cohort,
            period,
        }
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs(date(5, 20), 1, 100.0, Cohort::Treated),
            obs(date(5, 20), 2, 50.0, Cohort::Treated),
            obs(date(5, 20), 3, 300.0, Cohort::Control),
            obs(date(5, 25), 1, 80.0, Cohort::Treated),
            obs(date(5, 25), 3, 320.0, Cohort::Control),
            obs(date(5, 28), 3, 310.0, Cohort::Control),
        ]
    }

    #[test]
    fn test_daily_totals() {
        let totals = daily_totals(&sample());
        assert_eq!(totals.len(), 3);
        assert_eq!(
            totals[&date(5, 20)],
            DailyTotals {
                treated: 150.0,
                control: 300.0
            }
        );
        assert_eq!(totals[&date(5, 28)].treated, 0.0);
    }

    #[test]
    fn test_revenue_chart_series() {
        let chart = revenue_chart(&daily_totals(&sample()), onset());
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].points.len(), 3);
        // no treated rows on 5/28
        assert_eq!(chart.series[1].points.len(), 2);
    }

    #[test]
    fn test_log_diff_chart_skips_incomplete_days() {
        let chart = log_diff_chart(&daily_totals(&sample()), onset());
        let points = &chart.series[0].points;
        assert_eq!(points.len(), 2);
        assert!((points[0].1 - (300.0_f64.ln() - 150.0_f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_render_has_marker_and_lines() {
        let svg = render(&revenue_chart(&daily_totals(&sample()), onset()));
        assert!(svg.contains("Figure 5.2"));
        assert!(svg.contains("stroke-dasharray"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("Treatment (search goes off)"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_revenue_chart_plots_daily_sums() {
        let chart = revenue_chart(&daily_totals(&sample()), onset());
        // two treated DMAs on 5/20: 100 + 50
        assert_eq!(chart.series[1].points[0], (date(5, 20), 150.0));
        assert_eq!(chart.series[0].points[0], (date(5, 20), 300.0));
    }

    #[test]
    fn test_log_diff_does_not_depend_on_cohort_size() {
        let data = vec![
            obs(date(5, 20), 1, 100.0, Cohort::Treated),
            obs(date(5, 20), 2, 100.0, Cohort::Treated),
            obs(date(5, 20), 3, 100.0, Cohort::Control),
        ];
        let chart = log_diff_chart(&daily_totals(&data), onset());
        let (_, gap) = chart.series[0].points[0];
        // ln(100) - ln(200), not ln(100) - 2 ln(100)
        assert!((gap + 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_marker_outside_range_is_omitted() {
        let chart = log_diff_chart(&daily_totals(&sample()), date(1, 1));
        assert!(!render(&chart).contains("stroke-dasharray"));
    }

    #[test]
    fn test_empty_chart_renders_placeholder() {
        let chart = log_diff_chart(&BTreeMap::new(), onset());
        let svg = render(&chart);
        assert!(svg.contains("no data"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let chart = log_diff_chart(&daily_totals(&sample()), onset());
        assert_eq!(render(&chart), render(&chart));
    }

    #[test]
    fn test_write_chart() {
        let path = std::env::temp_dir()
            .join("paid_search_did_figures_test")
            .join("figure_5_3.svg");
        let _ = fs::remove_file(&path);

        write_chart(&path, &log_diff_chart(&daily_totals(&sample()), onset())).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("<svg"));

        fs::remove_file(&path).unwrap();
    }
}
