pub mod codec;
pub mod encode;
pub mod verify;

pub use codec::{
    address_from_public_key, base58_decode_public_key, base58_encode_public_key,
    base64url_decode_payload, base64url_decode_signature, base64url_encode_payload,
    base64url_encode_signature,
};
pub use encode::{encode_credential, encode_document, encode_envelope, encode_ticket, expand_compact};
pub use verify::verify_signature;

use tidal_core::types::DidDocument;

/// A document is a *primitive DID* iff some `publicKey` entry's derived
/// address equals the identifier's own suffix (§3).
pub fn is_primitive_document(doc: &DidDocument) -> bool {
    let suffix = doc.id.suffix();
    doc.public_key.iter().any(|entry| {
        base58_decode_public_key(&entry.public_key_base58)
            .map(|raw| address_from_public_key(&raw) == suffix)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::types::{DocumentProof, Identifier, ProofSet, PublicKeyEntry};

    #[test]
    fn non_matching_keys_are_not_primitive() {
        let doc = DidDocument {
            id: Identifier("did:elastos:somealias".into()),
            public_key: vec![PublicKeyEntry {
                id: "did:elastos:somealias#primary".into(),
                key_type: "ECDSAsecp256r1".into(),
                controller: "did:elastos:somealias".into(),
                public_key_base58: base58_encode_public_key(&[2u8; 33]),
            }],
            authentication: vec![],
            authorization: vec![],
            controller: None,
            multisig: None,
            expires: "2030-01-01T00:00:00Z".into(),
            verifiable_credential: vec![],
            proof: ProofSet::One(DocumentProof {
                creator: "did:elastos:somealias#primary".into(),
                created: "2020-01-01T00:00:00Z".into(),
                signature_value: "00".into(),
            }),
        };
        assert!(!is_primitive_document(&doc));
    }
}
