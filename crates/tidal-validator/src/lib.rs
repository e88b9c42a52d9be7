pub mod context;
pub mod credential;
pub mod customized;
pub mod deactivate;
pub mod dispatch;
pub mod register;
pub mod support;

pub use context::ValidationContext;
pub use dispatch::validate;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tidal_core::types::{
        ControllerSet, DidDocument, DidParams, DidPayload, Header, KeyReference, KeyRole,
        Operation, OuterProof, ProofSet, PublicKeyEntry,
    };
    use tidal_state::MemoryStore;

    fn sample_doc(id: &str, pubkey_b58: &str) -> DidDocument {
        DidDocument {
            id: id.to_string().into(),
            controller: None,
            multisig: None,
            public_key: vec![PublicKeyEntry {
                id: format!("{id}#primary"),
                key_type: "ECDSAsecp256r1".into(),
                controller: id.to_string(),
                public_key_base58: pubkey_b58.to_string(),
            }],
            authentication: vec![KeyReference::Uri(format!("{id}#primary"))],
            authorization: Vec::new(),
            expires: "2099-01-01T00:00:00Z".into(),
            verifiable_credential: Vec::new(),
            proof: ProofSet::One(tidal_core::types::DocumentProof {
                creator: format!("{id}#primary"),
                created: "2026-01-01T00:00:00Z".into(),
                signature_value: String::new(),
            }),
        }
    }

    #[test]
    fn validate_rejects_malformed_envelope() {
        let store = MemoryStore::default();
        let params = DidParams::default();
        let tx = DidPayload {
            header: Header {
                specification: "elastos/did/1.0".into(),
                operation: Operation::Create,
                previous_txid: None,
            },
            payload: "e30".into(),
            proof: ProofSet::One(OuterProof {
                verification_method: String::new(),
                signature: String::new(),
            }),
            did_doc: None,
            credential_doc: None,
            ticket: None,
        };
        let ctx = ValidationContext {
            height: 0,
            median_time_past: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            fee_paid: 0,
            params: &params,
            store: &store,
            spv: &store,
        };
        let err = validate(&tx, &ctx).unwrap_err();
        assert!(matches!(err, tidal_core::error::ValidationError::Malformed(_)));
    }

    #[test]
    fn sample_doc_builds_without_panicking() {
        let doc = sample_doc("did:elastos:abc123", "02aabbcc");
        assert_eq!(doc.authentication.len(), 1);
        let _ = ControllerSet::Single("did:elastos:def456".into());
    }
}
