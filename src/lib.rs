//! # iprange-analyser - Dense IPv4 range discovery for blacklists
//!
//! Turns an unordered list of IPv4 addresses into the smallest set of CIDR
//! ranges that densely cover its clusters, plus the addresses left over.
//! The result is a compact blacklist.
//!
//! ## How it works
//!
//! - **Occupancy scan** - at each prefix length, addresses are bucketed by
//!   network and a network is dense when it holds at least `threshold` of
//!   its capacity
//! - **Cross-mask merge** - walking from the most specific mask (/30 by
//!   default) to the broadest one (/18), dense networks absorb the dense
//!   sub-networks found before them
//! - **Classification** - every address is either inside a surviving range
//!   or kept as a single blacklist entry
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     iprange-analyser                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: analyse, version                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── threshold, mask range, statistics                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Source / Sink (FileSystem trait)                           │
//! │    └── line-delimited address list in, blacklist out        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Aggregator (ipnet)                                         │
//! │    └── occupancy scan, merge, classification                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Statistics (GeoLookup trait)                               │
//! │    └── summary and country/subdivision rankings             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use iprange_analyser::aggregator::RangeAggregator;
//! use iprange_analyser::config::AnalyserConfig;
//!
//! let aggregator = RangeAggregator::new(AnalyserConfig::default())?;
//! let analysis = aggregator.analyse(["10.0.0.0", "10.0.0.1", "10.0.0.2", "10.0.0.3", "8.8.8.8"]);
//!
//! assert_eq!(analysis.blacklist(), vec!["10.0.0.0/30", "8.8.8.8"]);
//! # Ok::<(), iprange_analyser::error::AnalyserError>(())
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - Occupancy scan, cross-mask merge and classification
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Library error type
//! - [`fs_abstraction`] - Mockable filesystem access
//! - [`geo`] - Geolocation lookup for statistics
//! - [`signal`] - Interruption between mask levels
//! - [`source`] - Address sources and blacklist sinks
//! - [`stats`] - Statistics report
//! - [`utils`] - Formatting helpers
//! - [`validation`] - Address, mask and threshold validation

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_abstraction;
pub mod geo;
pub mod signal;
pub mod source;
pub mod stats;
pub mod utils;
pub mod validation;

pub use aggregator::{Analysis, CandidateRange, RangeAggregator};
pub use cli::{Cli, Commands};
pub use config::{AnalyserConfig, Config};
pub use error::AnalyserError;
