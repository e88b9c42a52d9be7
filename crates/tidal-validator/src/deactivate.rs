use tidal_core::error::ValidationError;
use tidal_core::types::{DidPayload, KeyRole};
use tidal_crypto::{base64url_decode_signature, encode_envelope, verify_signature};
use tidal_state::check_deactivate_preconditions;

use crate::context::ValidationContext;
use crate::support::single_outer_proof;

/// §4.6.3 — deactivation. Primitive DIDs are deactivated by an Authorization-
/// role key (third-party deactivation rights); customized DIDs go through
/// the controller's Default key.
pub fn deactivate_path(tx: &DidPayload, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
    let identifier = tx
        .did_doc
        .as_ref()
        .map(|d| d.id.as_str().to_string())
        .ok_or_else(|| ValidationError::Malformed("deactivate requires a didDoc naming the target".into()))?;

    let last = check_deactivate_preconditions(&identifier, ctx.store)?;

    let is_primitive = ctx.store.is_primitive_did(&identifier)?;
    let role = if is_primitive {
        KeyRole::Authorization
    } else {
        KeyRole::Default
    };

    let outer = single_outer_proof(&tx.proof)?;
    let key = tidal_resolve::resolve(&outer.verification_method, role, &last.did_doc, ctx.store)?;
    let envelope_bytes = encode_envelope(&tx.header, &tx.payload);
    let sig = base64url_decode_signature(&outer.signature)?;
    verify_signature(&envelope_bytes, &key, &sig)?;

    tracing::info!(id = %identifier, "accepted deactivate transaction");
    Ok(())
}
