//! Analyse command implementation.
//!
//! Load the address list, run the aggregation off the async runtime, report
//! statistics and write the blacklist.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::aggregator::{Analysis, RangeAggregator, ScanProgress};
use crate::cli::AnalyseArgs;
use crate::config::Config;
use crate::error::AnalyserError;
use crate::geo::{GeoLookup, GeoTable};
use crate::signal::{ShutdownGuard, ShutdownToken};
use crate::source::{AddressSource, BlacklistSink, FileSink, FileSource, StdoutSink};
use crate::stats::{ReportFormat, Statistics};
use crate::utils::format_count;

/// What a run produced
#[derive(Debug)]
pub struct Outcome {
    pub analysis: Analysis,
    pub statistics: Option<Statistics>,
}

/// Progress bar over the mask levels, stopping on shutdown request.
pub struct ScanBar {
    bar: Option<ProgressBar>,
    token: ShutdownToken,
}

impl ScanBar {
    pub fn new(visible: bool, token: ShutdownToken) -> Self {
        let bar = visible.then(|| {
            let bar = ProgressBar::new(0);
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_style(
                ProgressStyle::with_template(
                    "[{prefix}] {elapsed_precise} {bar:36.cyan/blue} {pos:>2}/{len:2} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("■■□"),
            );
            bar.set_prefix("Finding IP ranges");
            bar
        });
        Self { bar, token }
    }
}

impl ScanProgress for ScanBar {
    fn start(&self, levels: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_length(levels);
        }
    }

    fn level_done(&self, mask: u8, ranges: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("/{} {} ranges", mask, format_count(ranges)));
            bar.inc(1);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ScanBar {
    fn drop(&mut self) {
        // Interrupted scans never reach finish()
        if let Some(ref bar) = self.bar {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}

/// Run the analysis pipeline against its collaborators.
///
/// The configuration is validated before the source is read.
pub fn execute(
    source: &dyn AddressSource,
    config: &Config,
    geo: Option<&dyn GeoLookup>,
    progress: &dyn ScanProgress,
) -> Result<Outcome> {
    config.validate()?;
    let aggregator = RangeAggregator::new(config.analysis)?;

    let entries = source.load().context("Failed to read address list")?;
    info!("Loaded {} entries", format_count(entries.len()));

    let analysis = aggregator.analyse_with(&entries, progress)?;

    let statistics = config
        .stats
        .enabled
        .then(|| Statistics::compute(&analysis, geo, config.stats.top));

    Ok(Outcome {
        analysis,
        statistics,
    })
}

/// Write the blacklist of an outcome to a sink.
pub fn publish(outcome: &Outcome, sink: &dyn BlacklistSink) -> Result<()> {
    let lines = outcome.analysis.blacklist();
    sink.write(&lines).context("Failed to write blacklist")?;
    info!("Blacklist written: {} lines", format_count(lines.len()));
    Ok(())
}

/// Fail with [`AnalyserError::Interrupted`] once a stop was requested.
pub fn ensure_running(token: &ShutdownToken) -> Result<()> {
    if token.is_cancelled() {
        info!("Interrupted, nothing written");
        return Err(AnalyserError::Interrupted.into());
    }
    Ok(())
}

/// Write the addresses covered by a range to a sink.
pub fn publish_in_range(outcome: &Outcome, sink: &dyn BlacklistSink) -> Result<()> {
    let lines = outcome.analysis.in_range_list();
    sink.write(&lines).context("Failed to write in-range addresses")?;
    info!("In-range list written: {} lines", format_count(lines.len()));
    Ok(())
}

/// Run the analyse command
pub async fn run(args: AnalyseArgs, config_path: &Path, quiet: bool) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    args.apply(&mut config);
    config.validate()?;

    let format: ReportFormat = args.format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let geo = match (config.stats.enabled, &config.stats.geo_db) {
        (true, Some(path)) => Some(GeoTable::load(path)?),
        _ => None,
    };

    let _guard = ShutdownGuard::new();
    let token = ShutdownToken::new();
    let progress = ScanBar::new(!quiet && !args.no_progress, token.clone());
    let source = FileSource::new(&args.file);

    let outcome = tokio::task::spawn_blocking(move || {
        execute(
            &source,
            &config,
            geo.as_ref().map(|g| g as &dyn GeoLookup),
            &progress,
        )
    })
    .await
    .context("Analysis task failed")??;

    if let Some(ref statistics) = outcome.statistics {
        match format {
            ReportFormat::Text => eprint!("{}", statistics.to_text()),
            ReportFormat::Json => eprintln!("{}", statistics.to_json()?),
        }
    }

    // A signal after the last mask level still cancels the writes
    ensure_running(&token)?;

    match args.output {
        Some(ref path) => publish(&outcome, &FileSink::new(path))?,
        None => publish(&outcome, &StdoutSink)?,
    }

    if let Some(ref path) = args.in_range_output {
        publish_in_range(&outcome, &FileSink::new(path))?;
    }

    Ok(())
}
