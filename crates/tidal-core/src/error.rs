use thiserror::Error;

/// Every way a DID transaction can fail validation.
///
/// Variants are grouped by the phase of `tidal-validator::validate` that
/// raises them; the variant name itself should make the failing phase
/// obvious in a log line even without the context fields.
#[derive(Debug, Error)]
pub enum ValidationError {
    // ── Syntax / shape ───────────────────────────────────────────────────────
    #[error("malformed transaction: {0}")]
    Malformed(String),

    // ── Lifecycle / state machine ───────────────────────────────────────────
    #[error("lifecycle violation: {0}")]
    LifecycleViolation(String),

    // ── Key resolution ───────────────────────────────────────────────────────
    #[error("no key satisfies the required role: {0}")]
    AuthorityMissing(String),

    // ── Signature verification ───────────────────────────────────────────────
    #[error("signature verification failed")]
    SignatureInvalid,

    // ── Multisig ─────────────────────────────────────────────────────────────
    #[error("multisig threshold not met: need {need}, got {got}")]
    ThresholdUnmet { need: u32, got: u32 },

    // ── Fee ───────────────────────────────────────────────────────────────────
    #[error("fee insufficient: need at least {need}, got {got}")]
    FeeInsufficient { need: u64, got: u64 },

    // ── Policy (reserved IDs, height gates, uniqueness) ─────────────────────
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    // ── Collaborator failure (store / SPV bridge) ───────────────────────────
    #[error("store failure: {0}")]
    StoreFailure(String),
}
