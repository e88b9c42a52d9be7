use chrono::{DateTime, Utc};
use tidal_core::error::ValidationError;
use tidal_core::types::{DidDocument, DocumentProof, KeyRole, OuterProof};
use tidal_state::DidStore;

pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::Malformed(format!("invalid RFC3339 timestamp {s}: {e}")))
}

/// The outer payload proof is conceptually a single `{verificationMethod,
/// signature}` pair; `ProofSet` only exists because the wire format allows
/// a bare object or a one-element array interchangeably.
pub fn single_outer_proof(
    proof: &tidal_core::types::ProofSet<OuterProof>,
) -> Result<&OuterProof, ValidationError> {
    let proofs = proof.as_slice_vec();
    match proofs.as_slice() {
        [single] => Ok(single),
        _ => Err(ValidationError::Malformed(
            "outer proof must contain exactly one entry".into(),
        )),
    }
}

/// Verify every document/ticket proof whose `creator`/`verificationMethod`
/// resolves under `role` within `verification_doc`, returning the count of
/// *distinct signers* that verified successfully. Repeating the same
/// controller's proof must not count twice toward an M-of-N threshold, so
/// duplicate resolved keys are only counted once. Callers enforce the
/// required threshold.
pub fn count_valid_document_proofs(
    verification_doc: &DidDocument,
    body: &[u8],
    proofs: &[DocumentProof],
    role: KeyRole,
    store: &dyn DidStore,
) -> u32 {
    let mut seen = std::collections::HashSet::new();
    for proof in proofs {
        let Ok(pubkey) = tidal_resolve::resolve(&proof.creator, role, verification_doc, store)
        else {
            continue;
        };
        let Ok(sig) = tidal_crypto::base64url_decode_signature(&proof.signature_value) else {
            continue;
        };
        if tidal_crypto::verify_signature(body, &pubkey, &sig).is_ok() {
            seen.insert(pubkey);
        }
    }
    seen.len() as u32
}
