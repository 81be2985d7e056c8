//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "iprange-analyser")]
#[command(author, version, about = "Find dense IPv4 ranges and build compact blacklists")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults are used when it does not exist)
    #[arg(short, long, default_value = "iprange-analyser.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only, no progress bar)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find dense ranges in an address list and write the blacklist
    Analyse(AnalyseArgs),

    /// Show version
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyseArgs {
    /// Input file, one IPv4 address per line
    #[arg(short, long)]
    pub file: PathBuf,

    /// Blacklist destination (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the addresses covered by a range to this file
    #[arg(long, value_name = "FILE")]
    pub in_range_output: Option<PathBuf>,

    /// Minimum occupancy of a dense range, in (0, 1]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Broadest and most specific prefix lengths scanned
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub range: Option<Vec<u8>>,

    /// Print statistics about the result
    #[arg(long)]
    pub stats: bool,

    /// Geolocation table (YAML) used by the statistics
    #[arg(long)]
    pub geo_db: Option<PathBuf>,

    /// Number of entries in each statistics ranking
    #[arg(long)]
    pub top: Option<usize>,

    /// Statistics format (text, json)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl AnalyseArgs {
    /// Override file configuration with the values given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.analysis.threshold = threshold;
        }
        if let Some(&[min_mask, max_mask]) = self.range.as_deref() {
            config.analysis.min_mask = min_mask;
            config.analysis.max_mask = max_mask;
        }
        if self.stats {
            config.stats.enabled = true;
        }
        if let Some(ref geo_db) = self.geo_db {
            config.stats.geo_db = Some(geo_db.clone());
        }
        if let Some(top) = self.top {
            config.stats.top = top;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyse_args(args: &[&str]) -> AnalyseArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Analyse(args) => args,
            _ => panic!("expected analyse"),
        }
    }

    #[test]
    fn test_parse_minimal() {
        let args = analyse_args(&["iprange-analyser", "analyse", "--file", "ips.txt"]);
        assert_eq!(args.file, PathBuf::from("ips.txt"));
        assert!(args.output.is_none());
        assert!(args.in_range_output.is_none());
        assert!(args.threshold.is_none());
        assert!(args.range.is_none());
        assert!(!args.stats);
        assert_eq!(args.format, "text");
    }

    #[test]
    fn test_parse_all_flags() {
        let args = analyse_args(&[
            "iprange-analyser",
            "analyse",
            "-f",
            "ips.txt",
            "-o",
            "out.txt",
            "--in-range-output",
            "covered.txt",
            "-t",
            "0.8",
            "--range",
            "20",
            "28",
            "--stats",
            "--geo-db",
            "geo.yaml",
            "--top",
            "5",
            "--format",
            "json",
            "--no-progress",
        ]);
        assert_eq!(args.output, Some(PathBuf::from("out.txt")));
        assert_eq!(args.in_range_output, Some(PathBuf::from("covered.txt")));
        assert_eq!(args.threshold, Some(0.8));
        assert_eq!(args.range, Some(vec![20, 28]));
        assert!(args.stats);
        assert_eq!(args.geo_db, Some(PathBuf::from("geo.yaml")));
        assert_eq!(args.top, Some(5));
        assert_eq!(args.format, "json");
        assert!(args.no_progress);
    }

    #[test]
    fn test_parse_range_needs_two_values() {
        let result = Cli::try_parse_from(["iprange-analyser", "analyse", "-f", "x", "--range", "20"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_requires_file() {
        assert!(Cli::try_parse_from(["iprange-analyser", "analyse"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "iprange-analyser",
            "analyse",
            "-f",
            "x",
            "-q",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
    }

    #[test]
    fn test_apply_overrides() {
        let args = analyse_args(&[
            "iprange-analyser",
            "analyse",
            "-f",
            "x",
            "-t",
            "0.9",
            "--range",
            "22",
            "29",
            "--stats",
            "--top",
            "3",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.analysis.threshold, 0.9);
        assert_eq!(config.analysis.min_mask, 22);
        assert_eq!(config.analysis.max_mask, 29);
        assert!(config.stats.enabled);
        assert_eq!(config.stats.top, 3);
    }

    #[test]
    fn test_apply_keeps_file_values() {
        let args = analyse_args(&["iprange-analyser", "analyse", "-f", "x"]);
        let mut config = Config::default();
        config.analysis.threshold = 0.5;
        config.stats.enabled = true;
        args.apply(&mut config);
        assert_eq!(config.analysis.threshold, 0.5);
        assert!(config.stats.enabled);
    }
}
