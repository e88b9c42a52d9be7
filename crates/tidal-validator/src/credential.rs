use tidal_core::error::ValidationError;
use tidal_core::types::{
    CredentialDocument, DidDocument, Header, KeyRole, Operation, OuterProof, ProofSet,
    VerifiableCredential,
};
use tidal_crypto::{
    base64url_decode_signature, encode_credential, encode_envelope, expand_compact,
    verify_signature,
};
use tidal_state::{check_declare_preconditions, check_revoke_preconditions, DidStore};

use crate::context::ValidationContext;
use crate::support::{parse_rfc3339, single_outer_proof};

/// §4.6.5 — validate every credential embedded in `owner_doc`. Every entry
/// in the list is checked (not just the first — a strict reimplementation
/// of the upstream behavior this protocol evolved from).
pub fn check_verifiable_credentials(
    owner_doc: &DidDocument,
    store: &dyn DidStore,
) -> Result<(), ValidationError> {
    for cred in &owner_doc.verifiable_credential {
        check_one_credential(cred, owner_doc.id.as_str(), owner_doc, store)?;
    }
    Ok(())
}

fn check_one_credential(
    cred: &VerifiableCredential,
    owner_did: &str,
    owner_doc: &DidDocument,
    store: &dyn DidStore,
) -> Result<(), ValidationError> {
    let raw_issuer = cred
        .issuer
        .clone()
        .or_else(|| cred.subject_id().map(str::to_string))
        .unwrap_or_else(|| owner_did.to_string());
    let effective_issuer = expand_compact(owner_did, &raw_issuer);

    let issuer_doc_owned;
    let issuer_doc: &DidDocument = if effective_issuer == owner_did {
        owner_doc
    } else {
        let last = store.last_did_tx(&effective_issuer)?.ok_or_else(|| {
            ValidationError::AuthorityMissing(format!(
                "no on-chain document for credential issuer {effective_issuer}"
            ))
        })?;
        issuer_doc_owned = last.did_doc;
        &issuer_doc_owned
    };

    let key = tidal_resolve::resolve(
        &cred.proof.verification_method,
        KeyRole::Authentication,
        issuer_doc,
        store,
    )?;
    let body = encode_credential(cred, owner_did)?;
    let sig = base64url_decode_signature(&cred.proof.signature)?;
    verify_signature(&body, &key, &sig)
}

/// §4.6.4 — top-level dispatch for `declare`/`revoke` transactions.
pub fn credential_path(
    header: &Header,
    payload_b64: &str,
    outer_proof: &ProofSet<OuterProof>,
    credential_doc: &CredentialDocument,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    match header.operation {
        Operation::Declare => declare_path(header, payload_b64, outer_proof, credential_doc, ctx),
        Operation::Revoke => revoke_path(header, payload_b64, outer_proof, credential_doc, ctx),
        other => Err(ValidationError::Malformed(format!(
            "credential path invoked for unsupported operation {other}"
        ))),
    }
}

fn resolve_subject_document(
    subject_id: &str,
    ctx: &ValidationContext<'_>,
) -> Result<DidDocument, ValidationError> {
    ctx.store
        .last_did_tx(subject_id)?
        .map(|record| record.did_doc)
        .ok_or_else(|| {
            ValidationError::AuthorityMissing(format!(
                "no on-chain document for credential subject {subject_id}"
            ))
        })
}

fn declare_path(
    header: &Header,
    payload_b64: &str,
    outer_proof: &ProofSet<OuterProof>,
    credential_doc: &CredentialDocument,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    if credential_doc.verifiable_credential.is_empty() {
        return Err(ValidationError::Malformed(
            "declare transaction carries no credentials".into(),
        ));
    }
    for cred in &credential_doc.verifiable_credential {
        parse_rfc3339(&cred.expiration_date)?;
        check_declare_preconditions(&cred.id, ctx.store)?;
    }

    let subject_id = credential_doc.verifiable_credential[0]
        .subject_id()
        .unwrap_or_else(|| credential_doc.id.as_str());
    let subject_doc = resolve_subject_document(subject_id, ctx)?;
    let is_primitive = ctx.store.is_primitive_did(subject_id)?;

    let outer = single_outer_proof(outer_proof)?;
    let envelope_bytes = encode_envelope(header, payload_b64);
    let outer_sig = base64url_decode_signature(&outer.signature)?;

    if is_primitive {
        let key = tidal_resolve::resolve(
            &outer.verification_method,
            KeyRole::Authentication,
            &subject_doc,
            ctx.store,
        )?;
        verify_signature(&envelope_bytes, &key, &outer_sig)?;
    } else {
        if !tidal_resolve::is_custom_id_default_key(&outer.verification_method, &subject_doc, ctx.store) {
            return Err(ValidationError::AuthorityMissing(
                "declare outer proof must use a default key of the customized DID".into(),
            ));
        }
        let key = tidal_resolve::resolve(
            &outer.verification_method,
            KeyRole::Default,
            &subject_doc,
            ctx.store,
        )?;
        verify_signature(&envelope_bytes, &key, &outer_sig)?;
    }

    for cred in &credential_doc.verifiable_credential {
        check_one_credential(cred, subject_id, &subject_doc, ctx.store)?;
    }

    tracing::info!(subject = subject_id, "accepted credential declare transaction");
    Ok(())
}

fn revoke_path(
    header: &Header,
    payload_b64: &str,
    outer_proof: &ProofSet<OuterProof>,
    credential_doc: &CredentialDocument,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    let cred = credential_doc.verifiable_credential.first().ok_or_else(|| {
        ValidationError::Malformed("revoke transaction names no credential".into())
    })?;
    check_revoke_preconditions(&cred.id, ctx.store)?;

    let subject_id = cred.subject_id().unwrap_or_else(|| credential_doc.id.as_str());
    let issuer_id = cred.issuer.as_deref().unwrap_or(subject_id);

    let outer = single_outer_proof(outer_proof)?;
    let envelope_bytes = encode_envelope(header, payload_b64);
    let outer_sig = base64url_decode_signature(&outer.signature)?;

    let candidates: Vec<DidDocument> = [
        resolve_subject_document(subject_id, ctx),
        resolve_subject_document(issuer_id, ctx),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect();

    let mut verified = false;
    let mut last_err: Option<ValidationError> = None;
    for doc in &candidates {
        match tidal_resolve::resolve(
            &outer.verification_method,
            KeyRole::Authentication,
            doc,
            ctx.store,
        )
        .and_then(|key| verify_signature(&envelope_bytes, &key, &outer_sig))
        {
            Ok(()) => {
                verified = true;
                break;
            }
            Err(e) => last_err = Some(e),
        }
    }

    if !verified {
        return Err(last_err
            .unwrap_or_else(|| ValidationError::AuthorityMissing("revoke signer unresolved".into())));
    }

    tracing::info!(credential = %cred.id, "accepted credential revoke transaction");
    Ok(())
}
