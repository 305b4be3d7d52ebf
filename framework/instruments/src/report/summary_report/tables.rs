use tabled::Tabled;

use crate::snapshot::{CheckSummary, TrendSummary};

#[derive(Tabled)]
pub struct TrendRow {
    pub metric: String,
    pub count: u64,
    pub errors: u64,
    #[tabled(display = "ms")]
    pub min: Option<f64>,
    #[tabled(display = "ms")]
    pub avg: Option<f64>,
    #[tabled(display = "ms")]
    pub med: Option<f64>,
    #[tabled(display = "ms")]
    pub p90: Option<f64>,
    #[tabled(display = "ms")]
    pub p95: Option<f64>,
    #[tabled(display = "ms")]
    pub max: Option<f64>,
}

impl TrendRow {
    pub fn new(metric: &str, summary: &TrendSummary) -> Self {
        let stats = summary.stats.as_ref();
        Self {
            metric: metric.to_string(),
            count: summary.count,
            errors: summary.errors,
            min: stats.map(|s| s.min),
            avg: stats.map(|s| s.mean),
            med: stats.map(|s| s.p50),
            p90: stats.map(|s| s.p90),
            p95: stats.map(|s| s.p95),
            max: stats.map(|s| s.max),
        }
    }
}

#[derive(Tabled)]
pub struct CheckRow {
    pub check: String,
    pub passes: u64,
    pub fails: u64,
    #[tabled(display = "percent")]
    pub pass_rate: f64,
}

impl CheckRow {
    pub fn new(check: &str, summary: &CheckSummary) -> Self {
        Self {
            check: check.to_string(),
            passes: summary.passes,
            fails: summary.fails,
            pass_rate: summary.pass_rate(),
        }
    }
}

fn ms(value: &Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}ms", value),
        None => "-".to_string(),
    }
}

fn percent(rate: &f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
