//! Fee Oracle (C5): computes the minimum fee a DID transaction must carry.
//!
//! `fee = (A·B·C·M + E) · F` — see §4.5. Each factor is a small, pure,
//! independently testable function; `compute_minimum_fee` just composes them.

use chrono::{DateTime, Utc};
use tidal_core::constants::{
    LENGTH_FACTOR_LONG_MAX, LENGTH_FACTOR_MID_MAX, SECONDS_PER_YEAR, SIZE_FACTOR_MID_MAX,
    SIZE_FACTOR_SMALL_MAX, VALIDITY_CLAMP_SECS,
};
use tidal_core::types::{ControllerSet, Operation};

/// A (identifier length factor), piecewise by UTF-8 length.
pub fn length_factor(n: usize) -> f64 {
    match n {
        0 => 0.3,
        1 => 6400.0,
        2 => 3200.0,
        3 => 1200.0,
        n if n <= LENGTH_FACTOR_MID_MAX => 100.0 - (n as f64 - 1.0) / 8.0,
        n if n <= LENGTH_FACTOR_LONG_MAX => 93.0 + (n as f64 - 1.0) / 8.0,
        n => 100.0 * (n as f64 - 59.0) / 2.0,
    }
}

/// B (validity factor). `expires` is clamped to at least 180 days beyond
/// `median_time_past`.
pub fn validity_factor(expires: DateTime<Utc>, median_time_past: DateTime<Utc>) -> f64 {
    let clamp_floor = median_time_past + chrono::Duration::seconds(VALIDITY_CLAMP_SECS);
    let effective_expires = expires.max(clamp_floor);

    let delta_secs = (effective_expires - median_time_past).num_seconds() as f64;
    let y = delta_secs / SECONDS_PER_YEAR;

    if y > 0.0 {
        y * (100.0 - 3.0 * y.max(1.0).log2()) / 100.0
    } else {
        1.0
    }
}

/// C (operation factor).
pub fn operation_factor(op: Operation) -> f64 {
    match op {
        Operation::Create => 1.0,
        Operation::Update => 0.8,
        Operation::Transfer => 1.2,
        Operation::Deactivate => 0.3,
        Operation::Declare => 1.0,
        Operation::Revoke => 0.3,
    }
}

/// M (controller factor).
pub fn controller_factor(controller: Option<&ControllerSet>) -> f64 {
    match controller {
        None => 0.0,
        Some(c) if c.len() <= 1 => 1.0,
        Some(c) => 2.0 * (c.len() as f64 + 3.0),
    }
}

/// E (size factor) over the encoded payload length in bytes.
pub fn size_factor(payload_len: usize) -> f64 {
    if payload_len <= SIZE_FACTOR_SMALL_MAX {
        1.0
    } else if payload_len <= SIZE_FACTOR_MID_MAX {
        let ratio = payload_len as f64 / SIZE_FACTOR_SMALL_MAX as f64;
        ratio.log10() / 2.0 + 1.0
    } else {
        let ratio = payload_len as f64 / SIZE_FACTOR_SMALL_MAX as f64;
        ratio * 0.9 * ratio.log10() - 33.4
    }
}

/// F (rate): the governance-published rate wins when non-zero.
pub fn rate(governance_rate: u64, default_rate: u64) -> u64 {
    if governance_rate != 0 {
        governance_rate
    } else {
        default_rate
    }
}

/// All the inputs `compute_minimum_fee` needs, gathered by the caller from
/// the transaction and chain context.
pub struct FeeContext<'a> {
    pub identifier: &'a str,
    pub expires: DateTime<Utc>,
    pub operation: Operation,
    pub controller: Option<&'a ControllerSet>,
    pub payload_len: usize,
    pub median_time_past: DateTime<Utc>,
    pub governance_rate: u64,
    pub default_rate: u64,
}

pub fn compute_minimum_fee(ctx: FeeContext<'_>) -> u64 {
    let a = length_factor(ctx.identifier.chars().count());
    let b = validity_factor(ctx.expires, ctx.median_time_past);
    let c = operation_factor(ctx.operation);
    let m = controller_factor(ctx.controller);
    let e = size_factor(ctx.payload_len);
    let f = rate(ctx.governance_rate, ctx.default_rate) as f64;

    ((a * b * c * m + e) * f).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_factor_breakpoints() {
        assert_eq!(length_factor(0), 0.3);
        assert_eq!(length_factor(1), 6400.0);
        assert_eq!(length_factor(2), 3200.0);
        assert_eq!(length_factor(3), 1200.0);
        assert!((length_factor(4) - (100.0 - 3.0 / 8.0)).abs() < 1e-9);
        assert!((length_factor(32) - (100.0 - 31.0 / 8.0)).abs() < 1e-9);
        assert!((length_factor(33) - (93.0 + 32.0 / 8.0)).abs() < 1e-9);
        assert!((length_factor(64) - (93.0 + 63.0 / 8.0)).abs() < 1e-9);
        assert!((length_factor(65) - (100.0 * 6.0 / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn validity_factor_clamps_short_horizons() {
        let mtp = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let soon = mtp + chrono::Duration::days(10);
        let far = mtp + chrono::Duration::days(3650);
        // Both should be clamped/compute to a sensible positive factor, and
        // a far-future expiry should cost no less than the 180-day floor.
        assert!(validity_factor(soon, mtp) > 0.0);
        assert!(validity_factor(far, mtp) >= validity_factor(soon, mtp));
    }

    #[test]
    fn controller_factor_breakpoints() {
        assert_eq!(controller_factor(None), 0.0);
        assert_eq!(
            controller_factor(Some(&ControllerSet::Single("did:elastos:a".into()))),
            1.0
        );
        let three = ControllerSet::Many(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(controller_factor(Some(&three)), 2.0 * (3.0 + 3.0));
    }

    #[test]
    fn size_factor_breakpoints() {
        assert_eq!(size_factor(1024), 1.0);
        assert_eq!(size_factor(512), 1.0);
        assert!(size_factor(32768) > 1.0);
        assert!(size_factor(65536) > size_factor(32768));
    }

    #[test]
    fn rate_prefers_governance_when_nonzero() {
        assert_eq!(rate(500, 10_000), 500);
        assert_eq!(rate(0, 10_000), 10_000);
    }
}
