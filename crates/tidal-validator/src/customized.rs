use tidal_core::constants::DID_PREFIX;
use tidal_core::error::ValidationError;
use tidal_core::types::{DidDocument, DidPayload, KeyRole, Operation};
use tidal_crypto::{base64url_decode_signature, encode_document, encode_envelope, verify_signature};
use tidal_state::{check_create_preconditions, check_update_preconditions};

use crate::context::ValidationContext;
use crate::credential::check_verifiable_credentials;
use crate::support::{count_valid_document_proofs, parse_rfc3339, single_outer_proof};

fn suffix_of(did: &str) -> &str {
    did.strip_prefix(DID_PREFIX).unwrap_or(did)
}

fn owner_part(verification_method: &str) -> &str {
    verification_method.split('#').next().unwrap_or(verification_method)
}

/// §4.6.2 step 1 — reserved/received custom-id availability.
///
/// Preserved bit-exact per the policy's own open question: the received
/// address must appear *exactly once* among controllers and *exactly once*
/// among document proof creators — zero occurrences and duplicate
/// occurrences are both rejected.
fn check_customized_id_available(
    doc: &DidDocument,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    let reserved = ctx.spv.reserved_custom_ids()?;
    if !reserved.contains(doc.id.as_str()) {
        return Ok(());
    }
    let received = ctx.spv.received_custom_ids()?;
    let address = received.get(doc.id.as_str()).ok_or_else(|| {
        ValidationError::PolicyViolation(format!(
            "{} is reserved but has no received custom-id address",
            doc.id
        ))
    })?;

    let controller_hits = doc
        .controller
        .as_ref()
        .map(|c| c.iter().filter(|did| suffix_of(did) == address).count())
        .unwrap_or(0);
    if controller_hits != 1 {
        return Err(ValidationError::PolicyViolation(format!(
            "received address for {} must appear exactly once among controllers (found {controller_hits})",
            doc.id
        )));
    }

    let proof_hits = doc
        .proof
        .as_slice_vec()
        .iter()
        .filter(|p| suffix_of(owner_part(&p.creator)) == address)
        .count();
    if proof_hits != 1 {
        return Err(ValidationError::PolicyViolation(format!(
            "received address for {} must appear exactly once among document proofs (found {proof_hits})",
            doc.id
        )));
    }

    Ok(())
}

/// §4.6.2 — create/update/transfer of a customized DID.
pub fn customized_did_path(tx: &DidPayload, ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
    let header = &tx.header;
    let new_doc = tx
        .did_doc
        .as_ref()
        .ok_or_else(|| ValidationError::Malformed("missing didDoc".into()))?;
    let identifier = new_doc.id.as_str().to_string();

    if header.operation == Operation::Create {
        check_customized_id_available(new_doc, ctx)?;
    }

    let minimum_fee = tidal_fee::compute_minimum_fee(tidal_fee::FeeContext {
        identifier: new_doc.id.suffix(),
        expires: parse_rfc3339(&new_doc.expires)?,
        operation: header.operation,
        controller: new_doc.controller.as_ref(),
        payload_len: tx.payload.len(),
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

    let last_record = match header.operation {
        Operation::Create => {
            check_create_preconditions(&identifier, ctx.store)?;
            None
        }
        Operation::Update | Operation::Transfer => Some(check_update_preconditions(
            &identifier,
            header.previous_txid.as_deref(),
            ctx.store,
        )?),
        other => {
            return Err(ValidationError::Malformed(format!(
                "customized-DID path invoked for unsupported operation {other}"
            )))
        }
    };

    // Verification document per §4.6.2 step 4: embedded for create/transfer,
    // the last on-chain document for update.
    let verification_doc: &DidDocument = match header.operation {
        Operation::Update => &last_record.as_ref().expect("update always has a prior record").did_doc,
        _ => new_doc,
    };

    let outer = single_outer_proof(&tx.proof)?;
    if !tidal_resolve::is_custom_id_default_key(&outer.verification_method, verification_doc, ctx.store) {
        return Err(ValidationError::AuthorityMissing(
            "outer proof must use a default key of the verification document".into(),
        ));
    }
    let outer_key = tidal_resolve::resolve(
        &outer.verification_method,
        KeyRole::Default,
        verification_doc,
        ctx.store,
    )?;
    let envelope_bytes = encode_envelope(header, &tx.payload);
    let outer_sig = base64url_decode_signature(&outer.signature)?;
    verify_signature(&envelope_bytes, &outer_key, &outer_sig)?;

    if header.operation == Operation::Transfer {
        let ticket = tx
            .ticket
            .as_ref()
            .ok_or_else(|| ValidationError::Malformed("transfer requires a ticket".into()))?;
        let old_doc_record = last_record.as_ref().expect("transfer always has a prior record");
        validate_transfer_ticket(ticket, new_doc, old_doc_record, ctx)?;
    }

    let policy = verification_doc.multisig_policy()?;
    let document_bytes = encode_document(new_doc)?;
    let document_proofs: Vec<tidal_core::types::DocumentProof> =
        new_doc.proof.as_slice_vec().into_iter().cloned().collect();
    let valid = count_valid_document_proofs(
        verification_doc,
        &document_bytes,
        &document_proofs,
        KeyRole::Authentication,
        ctx.store,
    );
    if valid < policy.m {
        return Err(ValidationError::ThresholdUnmet {
            need: policy.m,
            got: valid,
        });
    }

    if ctx.height >= ctx.params.verifiable_credential_height {
        check_verifiable_credentials(new_doc, ctx.store)?;
    }

    tracing::info!(id = %identifier, operation = %header.operation, "accepted customized-DID transaction");
    Ok(())
}

fn validate_transfer_ticket(
    ticket: &tidal_core::types::Ticket,
    new_doc: &DidDocument,
    old_record: &tidal_core::types::DidTxRecord,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    if ticket.custom_id != new_doc.id.as_str() {
        return Err(ValidationError::PolicyViolation(
            "ticket customId does not match the transferred identifier".into(),
        ));
    }
    if ticket.transaction_id != old_record.txid_hex {
        return Err(ValidationError::PolicyViolation(
            "ticket transactionId does not match the identifier's last transaction".into(),
        ));
    }

    let new_controller = new_doc.controller.as_ref().ok_or_else(|| {
        ValidationError::PolicyViolation("transfer requires a new controller set".into())
    })?;
    let to_in_controllers = new_controller.iter().filter(|c| *c == ticket.to).count();
    if to_in_controllers != 1 {
        return Err(ValidationError::PolicyViolation(format!(
            "ticket.to must appear exactly once in the new controller set (found {to_in_controllers})"
        )));
    }
    let to_in_proofs = new_doc
        .proof
        .as_slice_vec()
        .iter()
        .filter(|p| owner_part(&p.creator) == ticket.to)
        .count();
    if to_in_proofs != 1 {
        return Err(ValidationError::PolicyViolation(format!(
            "ticket.to must appear exactly once among new document proofs (found {to_in_proofs})"
        )));
    }

    let policy = old_record.did_doc.multisig_policy()?;
    let ticket_proofs: Vec<tidal_core::types::TicketProof> =
        ticket.proof.as_slice_vec().into_iter().cloned().collect();
    // Repeating the same old controller's proof must not count twice
    // toward the threshold, so distinct signers are tracked by resolved key.
    let mut seen = std::collections::HashSet::new();
    for proof in &ticket_proofs {
        let Ok(key) = tidal_resolve::resolve(
            &proof.verification_method,
            KeyRole::Authentication,
            &old_record.did_doc,
            ctx.store,
        ) else {
            continue;
        };
        let Ok(sig) = base64url_decode_signature(&proof.signature) else {
            continue;
        };
        let ticket_bytes = tidal_crypto::encode_ticket(ticket);
        if verify_signature(&ticket_bytes, &key, &sig).is_ok() {
            seen.insert(key);
        }
    }
    let valid = seen.len() as u32;
    if valid < policy.m {
        return Err(ValidationError::ThresholdUnmet {
            need: policy.m,
            got: valid,
        });
    }
    Ok(())
}
