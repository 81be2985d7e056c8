//! Centralized validation functions for the range analyser.
//!
//! This module provides unified validation for:
//! - IPv4 addresses read from an address list
//! - Prefix lengths (masks) and mask ranges
//! - Occupancy thresholds
//!
//! It also holds the fixed-width prefix arithmetic shared by the scan and
//! the classification pass.

use std::net::Ipv4Addr;

use crate::error::{AnalyserError, Result};

/// Smallest prefix length accepted for a scan.
pub const MIN_MASK: u8 = 1;

/// Largest prefix length accepted for a scan.
pub const MAX_MASK: u8 = 31;

/// Validate an IPv4 address string and return the parsed address.
///
/// Surrounding whitespace is ignored. The entry must hold exactly four
/// dot-separated decimal octets in `0..=255`. Zero-padded octets such as
/// `010` are accepted, signs are not.
///
/// # Examples
/// ```
/// use iprange_analyser::validation::validate_ipv4;
/// use std::net::Ipv4Addr;
/// assert!(validate_ipv4("192.168.1.1").is_ok());
/// assert_eq!(validate_ipv4("192.168.001.001").unwrap(), Ipv4Addr::new(192, 168, 1, 1));
/// assert!(validate_ipv4("999.1.1.1").is_err());
/// assert!(validate_ipv4("10.0.0").is_err());
/// ```
pub fn validate_ipv4(ip_str: &str) -> Result<Ipv4Addr> {
    let invalid = || AnalyserError::InvalidIp(ip_str.to_string());

    let mut octets = [0u8; 4];
    let mut parts = ip_str.trim().split('.');
    for octet in octets.iter_mut() {
        *octet = parts.next().and_then(parse_octet).ok_or_else(invalid)?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(Ipv4Addr::from(octets))
}

/// Parse one decimal octet, leading zeros allowed.
fn parse_octet(part: &str) -> Option<u8> {
    // u8::from_str would also take a leading '+'
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Validate a single prefix length.
///
/// # Examples
/// ```
/// use iprange_analyser::validation::validate_mask;
/// assert!(validate_mask(24).is_ok());
/// assert!(validate_mask(0).is_err());
/// assert!(validate_mask(32).is_err());
/// ```
pub fn validate_mask(mask: u8) -> Result<()> {
    if !(MIN_MASK..=MAX_MASK).contains(&mask) {
        return Err(AnalyserError::Config(format!(
            "Invalid mask /{}. Must be between {} and {}",
            mask, MIN_MASK, MAX_MASK
        )));
    }
    Ok(())
}

/// Validate the `min max` pair bounding the scan.
///
/// `min_mask` is the broadest network considered and must be strictly
/// smaller than `max_mask`, the most specific one.
pub fn validate_mask_range(min_mask: u8, max_mask: u8) -> Result<()> {
    validate_mask(min_mask)?;
    validate_mask(max_mask)?;
    if min_mask >= max_mask {
        return Err(AnalyserError::Config(format!(
            "Invalid mask range {} {}. Minimum must be lower than maximum",
            min_mask, max_mask
        )));
    }
    Ok(())
}

/// Validate an occupancy threshold, which must lie in `(0, 1]`.
///
/// # Examples
/// ```
/// use iprange_analyser::validation::validate_threshold;
/// assert!(validate_threshold(0.7).is_ok());
/// assert!(validate_threshold(1.0).is_ok());
/// assert!(validate_threshold(0.0).is_err());
/// assert!(validate_threshold(1.5).is_err());
/// ```
pub fn validate_threshold(threshold: f64) -> Result<()> {
    // NaN fails both comparisons
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(AnalyserError::Config(format!(
            "Invalid threshold {}. Must be greater than 0 and at most 1",
            threshold
        )));
    }
    Ok(())
}

/// Keep the first `mask` bits of `addr`, zeroing the host part.
#[inline]
pub fn prefix_bits(addr: u32, mask: u8) -> u32 {
    match mask {
        0 => 0,
        m if m >= 32 => addr,
        m => addr & (u32::MAX << (32 - m)),
    }
}

/// Number of addresses a network of length `mask` can hold.
#[inline]
pub fn capacity(mask: u8) -> u64 {
    1u64 << (32 - u32::from(mask.min(32)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ipv4_valid() {
        let result = validate_ipv4("192.168.1.1");
        assert_eq!(result.unwrap(), Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn test_validate_ipv4_whitespace() {
        let result = validate_ipv4("  10.0.0.1\t");
        assert_eq!(result.unwrap(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_validate_ipv4_edges() {
        assert!(validate_ipv4("0.0.0.0").is_ok());
        assert!(validate_ipv4("255.255.255.255").is_ok());
    }

    #[test]
    fn test_validate_ipv4_zero_padded() {
        assert_eq!(
            validate_ipv4("010.000.000.001").unwrap(),
            Ipv4Addr::new(10, 0, 0, 1)
        );
        assert_eq!(
            validate_ipv4("192.168.001.001").unwrap(),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert_eq!(validate_ipv4("0000255.0.0.00").unwrap(), Ipv4Addr::new(255, 0, 0, 0));
        assert!(validate_ipv4("0256.0.0.0").is_err());
    }

    #[test]
    fn test_validate_ipv4_rejects_signs_and_empty_octets() {
        assert!(validate_ipv4("+1.2.3.4").is_err());
        assert!(validate_ipv4("1.-2.3.4").is_err());
        assert!(validate_ipv4("1..3.4").is_err());
        assert!(validate_ipv4("1.2.3.4.").is_err());
        assert!(validate_ipv4("1.2. 3.4").is_err());
    }

    #[test]
    fn test_validate_ipv4_octet_out_of_range() {
        let result = validate_ipv4("999.1.1.1");
        assert!(matches!(result, Err(AnalyserError::InvalidIp(_))));
        assert!(validate_ipv4("256.0.0.0").is_err());
        assert!(validate_ipv4("-1.0.0.0").is_err());
    }

    #[test]
    fn test_validate_ipv4_wrong_octet_count() {
        assert!(validate_ipv4("1.2.3").is_err());
        assert!(validate_ipv4("1.2.3.4.5").is_err());
        assert!(validate_ipv4("").is_err());
    }

    #[test]
    fn test_validate_ipv4_non_numeric() {
        assert!(validate_ipv4("a.b.c.d").is_err());
        assert!(validate_ipv4("hello").is_err());
    }

    #[test]
    fn test_validate_ipv4_rejects_cidr_and_v6() {
        assert!(validate_ipv4("10.0.0.0/24").is_err());
        assert!(validate_ipv4("::1").is_err());
    }

    #[test]
    fn test_validate_ipv4_error_message() {
        let err = validate_ipv4("not-an-ip").unwrap_err().to_string();
        assert!(err.contains("Invalid IP"));
        assert!(err.contains("not-an-ip"));
    }

    #[test]
    fn test_validate_mask() {
        assert!(validate_mask(1).is_ok());
        assert!(validate_mask(18).is_ok());
        assert!(validate_mask(31).is_ok());
        assert!(validate_mask(0).is_err());
        assert!(validate_mask(32).is_err());
    }

    #[test]
    fn test_validate_mask_range() {
        assert!(validate_mask_range(18, 30).is_ok());
        assert!(validate_mask_range(29, 30).is_ok());
        assert!(validate_mask_range(30, 30).is_err());
        assert!(validate_mask_range(30, 18).is_err());
        assert!(validate_mask_range(0, 30).is_err());
        assert!(validate_mask_range(18, 32).is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0.7).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(0.01).is_ok());
        assert!(validate_threshold(0.0).is_err());
        assert!(validate_threshold(-0.5).is_err());
        assert!(validate_threshold(1.0001).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_prefix_bits() {
        let addr = u32::from(Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(prefix_bits(addr, 30), u32::from(Ipv4Addr::new(10, 0, 0, 0)));
        assert_eq!(prefix_bits(addr, 31), u32::from(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(prefix_bits(addr, 8), u32::from(Ipv4Addr::new(10, 0, 0, 0)));
        assert_eq!(prefix_bits(addr, 32), addr);
        assert_eq!(prefix_bits(addr, 0), 0);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(capacity(30), 4);
        assert_eq!(capacity(24), 256);
        assert_eq!(capacity(18), 16_384);
        assert_eq!(capacity(1), 1u64 << 31);
        assert_eq!(capacity(32), 1);
    }
}
