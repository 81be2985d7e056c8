//! Dense CIDR range discovery for building compact blacklists.
//!
//! Addresses are bucketed by prefix at every mask length between the
//! configured bounds. A prefix whose bucket fills at least `threshold` of
//! the network capacity becomes a candidate range. Walking from the most
//! specific mask towards the broadest one, each level's candidates absorb
//! the surviving ranges they contain, so broad dense networks replace their
//! sub-networks while isolated dense clusters are kept as they are.

use ipnet::Ipv4Net;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::ControlFlow;
use tracing::{debug, info};

use crate::config::AnalyserConfig;
use crate::error::{AnalyserError, Result};
use crate::validation::{capacity, prefix_bits, validate_ipv4};

/// A network proposed as dense at a given mask length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRange {
    /// Network address and prefix length
    pub network: Ipv4Net,
    /// Number of input addresses inside the network
    pub count: usize,
    /// Occupancy of the network, in percent
    pub percentage: f64,
}

impl CandidateRange {
    /// Prefix length the range was discovered at.
    pub fn mask(&self) -> u8 {
        self.network.prefix_len()
    }

    fn bits(&self) -> u32 {
        u32::from(self.network.network())
    }

    /// Check whether `addr` falls inside this range.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        prefix_bits(u32::from(addr), self.mask()) == self.bits()
    }

    /// Network literal paired with its occupancy.
    pub fn rendered(&self) -> (String, f64) {
        (self.network.to_string(), self.percentage)
    }
}

impl fmt::Display for CandidateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.network, self.percentage)
    }
}

/// Bucket `addresses` by their first `mask` bits and keep the buckets whose
/// occupancy reaches `threshold`.
///
/// Addresses are given in their 32-bit form. Buckets are ranked by count
/// (descending, ties broken by ascending prefix) and the walk stops at the
/// first bucket under the threshold, since no later one can qualify.
///
/// # Examples
/// ```
/// use iprange_analyser::aggregator::find_candidate_ranges;
/// use std::net::Ipv4Addr;
///
/// let addrs: Vec<u32> = (0..4).map(|d| u32::from(Ipv4Addr::new(10, 0, 0, d))).collect();
/// let ranges = find_candidate_ranges(&addrs, 30, 0.7);
/// assert_eq!(ranges.len(), 1);
/// assert_eq!(ranges[0].network.to_string(), "10.0.0.0/30");
/// assert_eq!(ranges[0].percentage, 100.0);
/// ```
pub fn find_candidate_ranges(addresses: &[u32], mask: u8, threshold: f64) -> Vec<CandidateRange> {
    let mask = mask.min(32);
    let capacity = capacity(mask) as f64;
    let required = threshold * capacity;

    // Not enough addresses overall to fill a single network
    if (addresses.len() as f64) < required {
        return Vec::new();
    }

    let mut occurrences: HashMap<u32, usize> = HashMap::new();
    for &addr in addresses {
        *occurrences.entry(prefix_bits(addr, mask)).or_insert(0) += 1;
    }

    let mut ranked: Vec<(u32, usize)> = occurrences.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take_while(|&(_, count)| count as f64 >= required)
        .map(|(bits, count)| CandidateRange {
            network: Ipv4Net::new_assert(Ipv4Addr::from(bits), mask),
            count,
            percentage: count as f64 / capacity * 100.0,
        })
        .collect()
}

/// Merge ranges found at `parent_mask` with the ranges surviving from the
/// next, more specific level.
///
/// Every parent survives. A child survives only when its prefix truncated to
/// `parent_mask` bits matches no parent.
pub fn merge_mask(
    parents: Vec<CandidateRange>,
    children: Vec<CandidateRange>,
    parent_mask: u8,
) -> Vec<CandidateRange> {
    let covered: HashSet<u32> = parents.iter().map(CandidateRange::bits).collect();

    let mut merged = parents;
    merged.extend(
        children
            .into_iter()
            .filter(|child| !covered.contains(&prefix_bits(child.bits(), parent_mask))),
    );
    merged
}

/// Calculate the number of addresses covered by a range set.
pub fn count_ips(ranges: &[CandidateRange]) -> u64 {
    ranges.iter().map(|r| capacity(r.mask())).sum()
}

/// Hooks invoked by [`RangeAggregator::analyse_with`] between mask levels.
pub trait ScanProgress {
    /// Called once before the scan with the number of merge levels.
    fn start(&self, _levels: u64) {}

    /// Called after the level at `mask` has been merged.
    fn level_done(&self, _mask: u8, _ranges: usize) {}

    /// Stop the scan before the next level when this returns `true`.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called once the scan completed.
    fn finish(&self) {}
}

/// Progress hooks that do nothing.
pub struct NoProgress;

impl ScanProgress for NoProgress {}

/// Result of a single analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Final range set, in merge order
    pub ranges: Vec<CandidateRange>,
    /// Addresses covered by some range, ascending
    pub in_range: Vec<Ipv4Addr>,
    /// Addresses covered by no range, ascending
    pub out_of_range: Vec<Ipv4Addr>,
    /// Number of input entries dropped as malformed
    pub rejected: usize,
}

impl Analysis {
    /// Number of distinct valid addresses analysed.
    pub fn total(&self) -> usize {
        self.in_range.len() + self.out_of_range.len()
    }

    /// Share of valid addresses covered by a range, in percent.
    pub fn in_range_percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.in_range.len() as f64 / total as f64 * 100.0,
        }
    }

    /// Blacklist lines saved by replacing covered addresses with ranges.
    pub fn lines_saved(&self) -> usize {
        self.in_range.len().saturating_sub(self.ranges.len())
    }

    /// Range literals paired with their occupancy.
    pub fn rendered_ranges(&self) -> Vec<(String, f64)> {
        self.ranges.iter().map(CandidateRange::rendered).collect()
    }

    /// Range literals followed by every out-of-range address.
    pub fn blacklist(&self) -> Vec<String> {
        self.ranges
            .iter()
            .map(|r| r.network.to_string())
            .chain(self.out_of_range.iter().map(Ipv4Addr::to_string))
            .collect()
    }

    /// Every covered address, one per line, ascending.
    pub fn in_range_list(&self) -> Vec<String> {
        self.in_range.iter().map(Ipv4Addr::to_string).collect()
    }
}

/// Runs the full aggregation pipeline for a validated configuration.
#[derive(Debug, Clone)]
pub struct RangeAggregator {
    config: AnalyserConfig,
}

impl RangeAggregator {
    /// Create an aggregator, rejecting an invalid configuration.
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Analyse a list of address strings.
    pub fn analyse<I>(&self, addresses: I) -> Analysis
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let (bits, rejected) = collect_addresses(addresses);
        match self.scan(&bits, |_, _| ControlFlow::<Infallible>::Continue(())) {
            Ok(ranges) => self.finish(&bits, ranges, rejected),
            Err(never) => match never {},
        }
    }

    /// Analyse a list of address strings, reporting progress and checking
    /// for cancellation between mask levels.
    pub fn analyse_with<I, P>(&self, addresses: I, progress: &P) -> Result<Analysis>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        P: ScanProgress + ?Sized,
    {
        let (bits, rejected) = collect_addresses(addresses);

        progress.start(u64::from(self.config.max_mask - self.config.min_mask));
        let ranges = self
            .scan(&bits, |mask, ranges| {
                progress.level_done(mask, ranges);
                if progress.is_cancelled() {
                    ControlFlow::Break(AnalyserError::Interrupted)
                } else {
                    ControlFlow::Continue(())
                }
            })
            .inspect_err(|_| info!("Analysis interrupted between mask levels"))?;
        progress.finish();

        Ok(self.finish(&bits, ranges, rejected))
    }

    /// Walk from `max_mask` to `min_mask`, merging each level into the
    /// ranges found so far. `on_level` runs after every level and may stop
    /// the walk.
    fn scan<B>(
        &self,
        bits: &[u32],
        mut on_level: impl FnMut(u8, usize) -> ControlFlow<B>,
    ) -> std::result::Result<Vec<CandidateRange>, B> {
        let AnalyserConfig {
            threshold,
            min_mask,
            max_mask,
        } = self.config;

        let mut ranges = find_candidate_ranges(bits, max_mask, threshold);
        debug!("/{}: {} candidate ranges", max_mask, ranges.len());

        for mask in (min_mask + 1..=max_mask).rev() {
            if let ControlFlow::Break(reason) = on_level(mask, ranges.len()) {
                return Err(reason);
            }
            let parents = find_candidate_ranges(bits, mask - 1, threshold);
            debug!("/{}: {} candidate ranges", mask - 1, parents.len());
            ranges = merge_mask(parents, ranges, mask - 1);
        }

        Ok(ranges)
    }

    fn finish(&self, bits: &[u32], ranges: Vec<CandidateRange>, rejected: usize) -> Analysis {
        let (in_range, out_of_range) = classify(bits, &ranges);

        info!(
            "Found {} ranges covering {} addresses, {} out of range, {} rejected",
            ranges.len(),
            in_range.len(),
            out_of_range.len(),
            rejected
        );

        Analysis {
            ranges,
            in_range,
            out_of_range,
            rejected,
        }
    }
}

/// Parse, validate and deduplicate addresses into sorted 32-bit values.
/// Returns the values and the number of malformed entries.
fn collect_addresses<I>(addresses: I) -> (Vec<u32>, usize)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut rejected = 0;
    let unique: BTreeSet<u32> = addresses
        .into_iter()
        .filter_map(|entry| match validate_ipv4(entry.as_ref()) {
            Ok(ip) => Some(u32::from(ip)),
            Err(e) => {
                debug!("Skipping entry: {}", e);
                rejected += 1;
                None
            }
        })
        .collect();

    (unique.into_iter().collect(), rejected)
}

/// Split addresses into (in-range, out-of-range).
fn classify(bits: &[u32], ranges: &[CandidateRange]) -> (Vec<Ipv4Addr>, Vec<Ipv4Addr>) {
    let mut by_mask: BTreeMap<u8, HashSet<u32>> = BTreeMap::new();
    for range in ranges {
        by_mask.entry(range.mask()).or_default().insert(range.bits());
    }

    let (inside, outside): (Vec<u32>, Vec<u32>) = bits.iter().partition(|&&addr| {
        by_mask
            .iter()
            .any(|(&mask, prefixes)| prefixes.contains(&prefix_bits(addr, mask)))
    });

    (
        inside.into_iter().map(Ipv4Addr::from).collect(),
        outside.into_iter().map(Ipv4Addr::from).collect(),
    )
}
