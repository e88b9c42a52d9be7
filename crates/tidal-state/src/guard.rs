use tidal_core::error::ValidationError;
use tidal_core::types::{DidTxRecord, Operation};

use crate::store::DidStore;

/// Reverse the byte order of a lowercase-hex transaction hash (§6: `previousTxid`
/// is hex of the *reverse* byte order of the prior transaction hash).
pub fn reverse_hex(hash_hex: &str) -> Result<String, ValidationError> {
    let bytes = hex::decode(hash_hex)
        .map_err(|e| ValidationError::Malformed(format!("invalid tx hash hex: {e}")))?;
    Ok(hex::encode(bytes.iter().rev().copied().collect::<Vec<u8>>()))
}

/// `create` requires no prior record for the identifier and no prior
/// deactivation.
pub fn check_create_preconditions(id: &str, store: &dyn DidStore) -> Result<(), ValidationError> {
    if store.is_deactivated(id)? {
        return Err(ValidationError::LifecycleViolation(format!(
            "identifier {id} is deactivated"
        )));
    }
    if store.last_did_tx(id)?.is_some() {
        return Err(ValidationError::LifecycleViolation(format!(
            "identifier {id} already has a prior transaction"
        )));
    }
    Ok(())
}

/// `update`/`transfer` require a prior record, no deactivation, and a
/// `previousTxid` chaining to the store's last transaction hash.
pub fn check_update_preconditions(
    id: &str,
    previous_txid: Option<&str>,
    store: &dyn DidStore,
) -> Result<DidTxRecord, ValidationError> {
    if store.is_deactivated(id)? {
        return Err(ValidationError::LifecycleViolation(format!(
            "identifier {id} is deactivated"
        )));
    }
    let last = store.last_did_tx(id)?.ok_or_else(|| {
        ValidationError::LifecycleViolation(format!("identifier {id} has no prior transaction"))
    })?;
    let expected = reverse_hex(&last.txid_hex)?;
    match previous_txid {
        Some(given) if given == expected => Ok(last),
        _ => Err(ValidationError::LifecycleViolation(format!(
            "previousTxid does not chain to the last transaction for {id}"
        ))),
    }
}

/// `deactivate` requires a prior record and no prior deactivation.
pub fn check_deactivate_preconditions(
    id: &str,
    store: &dyn DidStore,
) -> Result<DidTxRecord, ValidationError> {
    if store.is_deactivated(id)? {
        return Err(ValidationError::LifecycleViolation(format!(
            "identifier {id} is already deactivated"
        )));
    }
    store.last_did_tx(id)?.ok_or_else(|| {
        ValidationError::LifecycleViolation(format!("identifier {id} has no prior transaction"))
    })
}

/// `declare` requires the credential id to be unseen.
pub fn check_declare_preconditions(
    credential_id: &str,
    store: &dyn DidStore,
) -> Result<(), ValidationError> {
    if store.last_credential_tx(credential_id)?.is_some() {
        return Err(ValidationError::LifecycleViolation(format!(
            "credential {credential_id} already declared"
        )));
    }
    Ok(())
}

/// `revoke` requires a prior declare with no prior revoke.
pub fn check_revoke_preconditions(
    credential_id: &str,
    store: &dyn DidStore,
) -> Result<(), ValidationError> {
    let last = store.last_credential_tx(credential_id)?.ok_or_else(|| {
        ValidationError::LifecycleViolation(format!(
            "credential {credential_id} was never declared"
        ))
    })?;
    match last.operation {
        Operation::Declare => Ok(()),
        Operation::Revoke => Err(ValidationError::LifecycleViolation(format!(
            "credential {credential_id} already revoked"
        ))),
        other => Err(ValidationError::LifecycleViolation(format!(
            "credential {credential_id} has unexpected prior operation {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use tidal_core::types::{DidDocument, Identifier, ProofSet};

    fn stub_doc(id: &str) -> DidDocument {
        DidDocument {
            id: Identifier(id.to_string()),
            public_key: vec![],
            authentication: vec![],
            authorization: vec![],
            controller: None,
            multisig: None,
            expires: "2030-01-01T00:00:00Z".into(),
            verifiable_credential: vec![],
            proof: ProofSet::Many(vec![]),
        }
    }

    #[test]
    fn reverse_hex_swaps_byte_order() {
        assert_eq!(reverse_hex("00112233").unwrap(), "33221100");
    }

    #[test]
    fn create_rejects_existing_identifier() {
        let store = MemoryStore::new();
        store.record_did_tx(
            "did:elastos:abc",
            DidTxRecord {
                txid_hex: "00112233".into(),
                operation: Operation::Create,
                did_doc: stub_doc("did:elastos:abc"),
            },
            true,
        );
        assert!(matches!(
            check_create_preconditions("did:elastos:abc", &store),
            Err(ValidationError::LifecycleViolation(_))
        ));
    }

    #[test]
    fn update_requires_chained_previous_txid() {
        let store = MemoryStore::new();
        store.record_did_tx(
            "did:elastos:abc",
            DidTxRecord {
                txid_hex: "00112233".into(),
                operation: Operation::Create,
                did_doc: stub_doc("did:elastos:abc"),
            },
            true,
        );
        let expected = reverse_hex("00112233").unwrap();
        assert!(check_update_preconditions("did:elastos:abc", Some(&expected), &store).is_ok());
        assert!(check_update_preconditions("did:elastos:abc", Some("ffffffff"), &store).is_err());
    }
}
