use tidal_core::error::ValidationError;
use tidal_core::types::{DidPayload, Operation};

use crate::context::ValidationContext;
use crate::customized::customized_did_path;
use crate::deactivate::deactivate_path;
use crate::credential::credential_path;
use crate::register::register_did_path;
use crate::support::single_outer_proof;

/// Top-level entry point (§4.6). Parses and syntax-checks the envelope,
/// then routes on `header.operation` to the lifecycle-specific path.
///
/// Unknown operation literals never reach here: `Operation` is a closed
/// enum, so the host's JSON deserialization rejects them before a
/// `DidPayload` can be constructed at all.
pub fn validate(tx: &DidPayload, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
    let outer = single_outer_proof(&tx.proof)?;
    if outer.verification_method.is_empty() {
        return Err(ValidationError::Malformed(
            "outer proof verificationMethod must not be empty".into(),
        ));
    }
    if outer.signature.is_empty() {
        return Err(ValidationError::Malformed(
            "outer proof signature must not be empty".into(),
        ));
    }
    if let Some(doc) = &tx.did_doc {
        if doc.authentication.is_empty() {
            return Err(ValidationError::Malformed(
                "document must declare at least one authentication entry".into(),
            ));
        }
        if doc.expires.is_empty() {
            return Err(ValidationError::Malformed(
                "document must declare an expires timestamp".into(),
            ));
        }
    }

    match tx.header.operation {
        Operation::Create | Operation::Update => {
            let doc = tx.did_doc.as_ref().ok_or_else(|| {
                ValidationError::Malformed(format!(
                    "{} requires an embedded didDoc",
                    tx.header.operation
                ))
            })?;
            if tidal_crypto::is_primitive_document(doc) {
                register_did_path(&tx.header, &tx.payload, &tx.proof, doc, ctx)
            } else {
                customized_did_path(tx, ctx)
            }
        }
        Operation::Transfer => customized_did_path(tx, ctx),
        Operation::Deactivate => deactivate_path(tx, ctx),
        Operation::Declare | Operation::Revoke => {
            let credential_doc = tx.credential_doc.as_ref().ok_or_else(|| {
                ValidationError::Malformed(format!(
                    "{} requires an embedded credentialDoc",
                    tx.header.operation
                ))
            })?;
            credential_path(&tx.header, &tx.payload, &tx.proof, credential_doc, ctx)
        }
    }
}
