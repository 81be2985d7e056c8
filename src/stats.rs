//! Statistics report for an analysis run.
//!
//! Summarises the classification, samples the range set and ranks the
//! geolocation labels of the analysed addresses. Nothing here feeds back
//! into the aggregation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

use crate::aggregator::{count_ips, Analysis};
use crate::geo::GeoLookup;
use crate::utils::{format_count, format_count_with_separator, percent_of, truncate};

/// Number of ranges shown in the report sample
const SAMPLE_SIZE: usize = 5;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// A range from the final set with its occupancy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSample {
    pub network: String,
    pub percentage: f64,
}

/// A geolocation label and how many addresses carry it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
    /// Share of all analysed addresses, one decimal
    pub percent: f64,
}

/// Report data structure for JSON serialization
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub in_range: usize,
    pub out_of_range: usize,
    pub rejected: usize,
    pub in_range_percent: f64,
    pub ranges: usize,
    pub covered_ips: u64,
    pub lines_saved: usize,
    pub sample: Vec<RangeSample>,
    /// Country, or continent when the country is unknown
    pub countries: Vec<LabelCount>,
    pub subdivisions: Vec<LabelCount>,
}

impl Statistics {
    /// Build the report. Without a lookup the label rankings stay empty.
    pub fn compute(analysis: &Analysis, geo: Option<&dyn GeoLookup>, top: usize) -> Self {
        let total = analysis.total();

        let mut countries: HashMap<String, usize> = HashMap::new();
        let mut subdivisions: HashMap<String, usize> = HashMap::new();

        if let Some(geo) = geo {
            let mut misses = 0usize;
            for &addr in analysis.in_range.iter().chain(&analysis.out_of_range) {
                let Some(record) = geo.lookup(addr) else {
                    misses += 1;
                    continue;
                };
                if let Some(label) = record.country_label() {
                    *countries.entry(label.to_string()).or_insert(0) += 1;
                }
                if let Some(label) = record.subdivision_label() {
                    *subdivisions.entry(label).or_insert(0) += 1;
                }
            }
            debug!("Geolocation: {} of {} addresses unknown", misses, total);
        }

        Self {
            generated_at: Utc::now(),
            total,
            in_range: analysis.in_range.len(),
            out_of_range: analysis.out_of_range.len(),
            rejected: analysis.rejected,
            in_range_percent: analysis.in_range_percent(),
            ranges: analysis.ranges.len(),
            covered_ips: count_ips(&analysis.ranges),
            lines_saved: analysis.lines_saved(),
            sample: analysis
                .ranges
                .iter()
                .take(SAMPLE_SIZE)
                .map(|r| RangeSample {
                    network: r.network.to_string(),
                    percentage: r.percentage,
                })
                .collect(),
            countries: most_common(countries, total, top),
            subdivisions: most_common(subdivisions, total, top),
        }
    }

    /// Render the report as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the report as text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let rule = "══════════════════════════════════════════════════════════════════";

        // Writing to a String cannot fail
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, " IP RANGE ANALYSIS");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            " Addresses analysed: {}",
            format_count_with_separator(self.total)
        );
        if self.rejected > 0 {
            let _ = writeln!(
                out,
                " Malformed entries skipped: {}",
                format_count_with_separator(self.rejected)
            );
        }
        let _ = writeln!(
            out,
            " In a range: {}",
            format_count_with_separator(self.in_range)
        );
        let _ = writeln!(
            out,
            " Out of range: {}",
            format_count_with_separator(self.out_of_range)
        );
        let _ = writeln!(out, " Percentage: {} %", self.in_range_percent as u64);
        let _ = writeln!(
            out,
            " Ranges: {} covering {} IPs",
            format_count_with_separator(self.ranges),
            format_count(self.covered_ips as usize)
        );
        let _ = writeln!(
            out,
            " Lines saved: {}",
            format_count_with_separator(self.lines_saved)
        );
        let _ = writeln!(out);

        if !self.sample.is_empty() {
            let _ = writeln!(out, " SAMPLE");
            let _ = writeln!(out, " ────────────────── ────────────");
            for range in &self.sample {
                let _ = writeln!(out, " {:<18} {:>11.1}%", range.network, range.percentage);
            }
            let _ = writeln!(out);
        }

        write_ranking(
            &mut out,
            "COUNTRY / CONTINENT (if country not found)",
            &self.countries,
        );
        write_ranking(&mut out, "SUBDIVISIONS", &self.subdivisions);

        let _ = writeln!(out, "{}", rule);
        out
    }
}

fn write_ranking(out: &mut String, title: &str, labels: &[LabelCount]) {
    if labels.is_empty() {
        return;
    }

    let _ = writeln!(out, " {}", title);
    let _ = writeln!(out, " ──────────────────────────── ──────────── ───────");
    for entry in labels {
        let _ = writeln!(
            out,
            " {:<28} {:>12} {:>6.1}%",
            truncate(&entry.label, 28),
            format_count_with_separator(entry.count),
            entry.percent
        );
    }
    let _ = writeln!(out);
}

/// Keep the `top` most frequent labels, ties broken alphabetically.
fn most_common(counts: HashMap<String, usize>, total: usize, top: usize) -> Vec<LabelCount> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(top)
        .map(|(label, count)| LabelCount {
            percent: percent_of(count, total),
            label,
            count,
        })
        .collect()
}
