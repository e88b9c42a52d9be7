use tidal_core::error::ValidationError;
use tidal_core::types::{DidDocument, DidTxRecord, Header, KeyRole, Operation};
use tidal_crypto::{base64url_decode_signature, encode_document, encode_envelope, verify_signature};
use tidal_state::{check_create_preconditions, check_update_preconditions};

use crate::context::ValidationContext;
use crate::credential::check_verifiable_credentials;
use crate::support::{count_valid_document_proofs, parse_rfc3339, single_outer_proof};

/// §4.6.1 — create/update of a primitive DID.
pub fn register_did_path(
    header: &Header,
    payload_b64: &str,
    proof: &tidal_core::types::ProofSet<tidal_core::types::OuterProof>,
    doc: &DidDocument,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    let id = doc.id.as_str();

    let minimum_fee = tidal_fee::compute_minimum_fee(tidal_fee::FeeContext {
        identifier: doc.id.suffix(),
        expires: parse_rfc3339(&doc.expires)?,
        operation: header.operation,
        controller: doc.controller.as_ref(),
        payload_len: payload_b64.len(),
        median_time_past: ctx.median_time_past,
        governance_rate: ctx.spv.rate_of_custom_id_fee()?,
        default_rate: ctx.params.custom_id_fee_rate,
    });
    if ctx.fee_paid < minimum_fee {
        return Err(ValidationError::FeeInsufficient {
            need: minimum_fee,
            got: ctx.fee_paid,
        });
    }

    let previous: Option<DidTxRecord> = match header.operation {
        Operation::Create => {
            check_create_preconditions(id, ctx.store)?;
            None
        }
        Operation::Update => {
            Some(check_update_preconditions(id, header.previous_txid.as_deref(), ctx.store)?)
        }
        other => {
            return Err(ValidationError::Malformed(format!(
                "register-DID path invoked for unsupported operation {other}"
            )))
        }
    };
    let _ = previous;

    parse_rfc3339(&doc.expires)?;

    let outer = single_outer_proof(proof)?;
    let resolved_key = if ctx.height < ctx.params.check_register_did_height {
        // Pre-gate compatibility: accept any key whose derived address
        // matches the document id, without requiring authentication
        // membership (the stricter rule below).
        let fragment = outer
            .verification_method
            .rsplit('#')
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| {
                ValidationError::Malformed(format!(
                    "invalid verification method URI: {}",
                    outer.verification_method
                ))
            })?;
        let entry = doc
            .public_key
            .iter()
            .find(|e| e.id.ends_with(&format!("#{fragment}")) || e.id == fragment)
            .ok_or_else(|| {
                ValidationError::AuthorityMissing(format!(
                    "no publicKey entry for fragment #{fragment}"
                ))
            })?;
        let raw = tidal_crypto::base58_decode_public_key(&entry.public_key_base58)?;
        if tidal_crypto::address_from_public_key(&raw) != doc.id.suffix() {
            return Err(ValidationError::AuthorityMissing(
                "legacy register-DID key does not match document identifier".into(),
            ));
        }
        raw
    } else {
        let key = tidal_resolve::resolve(
            &outer.verification_method,
            KeyRole::Authentication,
            doc,
            ctx.store,
        )?;
        if tidal_crypto::address_from_public_key(&key) != doc.id.suffix() {
            return Err(ValidationError::AuthorityMissing(
                "register-DID key does not match document identifier".into(),
            ));
        }
        key
    };

    let envelope_bytes = encode_envelope(header, payload_b64);
    let outer_sig = base64url_decode_signature(&outer.signature)?;
    verify_signature(&envelope_bytes, &resolved_key, &outer_sig)?;

    if ctx.height >= ctx.params.verifiable_credential_height {
        check_verifiable_credentials(doc, ctx.store)?;
    }

    let document_bytes = encode_document(doc)?;
    let document_proofs = doc.proof.as_slice_vec();
    let document_proofs: Vec<tidal_core::types::DocumentProof> =
        document_proofs.into_iter().cloned().collect();
    let valid = count_valid_document_proofs(
        doc,
        &document_bytes,
        &document_proofs,
        KeyRole::Default,
        ctx.store,
    );
    if valid < 1 {
        return Err(ValidationError::ThresholdUnmet { need: 1, got: valid });
    }

    tracing::info!(id, operation = %header.operation, "accepted register-DID transaction");
    Ok(())
}
