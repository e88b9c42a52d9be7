//! ─── DID Protocol Constants ─────────────────────────────────────────────────
//!
//! Wire literals, height gates, and fee-formula breakpoints. These are
//! policy, not physics — a deployment may override the height gates and
//! rate via `DidParams`; only the wire-format literals below are fixed.

// ── Wire format ──────────────────────────────────────────────────────────────

/// The `header.specification` literal expected on every DID envelope.
pub const DID_SPECIFICATION: &str = "elastos/did/1.0";

/// Prefix every identifier must carry.
pub const DID_PREFIX: &str = "did:elastos:";

// ── Height gates (§9) ────────────────────────────────────────────────────────

/// Below this height, register-DID verification falls back to the looser
/// address-match rule instead of requiring Authentication-role resolution.
pub const DEFAULT_CHECK_REGISTER_DID_HEIGHT: u32 = 0;

/// Credentials are only validated at or above this height, so that replay
/// of historical blocks mined before credential support existed does not
/// spuriously reject.
pub const DEFAULT_VERIFIABLE_CREDENTIAL_HEIGHT: u32 = 0;

/// Fallback fee rate (in sela per byte-equivalent unit) used when the
/// governance-published rate is zero.
pub const DEFAULT_CUSTOM_ID_FEE_RATE: u64 = 10_000;

// ── Fee Oracle breakpoints (§4.5) ────────────────────────────────────────────

/// Identifier-length factor breakpoints (A).
pub const LENGTH_FACTOR_SHORT_MAX: usize = 3;
pub const LENGTH_FACTOR_MID_MAX: usize = 32;
pub const LENGTH_FACTOR_LONG_MAX: usize = 64;

/// Validity-horizon clamp: 180 days, expressed in seconds.
pub const VALIDITY_CLAMP_SECS: i64 = 180 * 24 * 3600;

/// A Julian year in seconds, used to convert the validity horizon into `y`.
pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Size-factor breakpoints (E), in bytes.
pub const SIZE_FACTOR_SMALL_MAX: usize = 1024;
pub const SIZE_FACTOR_MID_MAX: usize = 32_768;
