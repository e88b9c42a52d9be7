use serde::Serialize;
use tidal_core::error::ValidationError;
use tidal_core::types::{
    ControllerSet, DidDocument, Header, KeyReference, PublicKeyEntry, Ticket, VerifiableCredential,
};

/// Mirrors `DidDocument` field-for-field, minus `proof`, so the struct
/// declaration order — not host map order — drives the signed byte layout.
#[derive(Serialize)]
struct SignableDocument<'a> {
    id: &'a str,
    #[serde(rename = "publicKey")]
    public_key: &'a [PublicKeyEntry],
    authentication: &'a [KeyReference],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authorization: &'a [KeyReference],
    #[serde(skip_serializing_if = "Option::is_none")]
    controller: &'a Option<ControllerSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multisig: &'a Option<String>,
    expires: &'a str,
    #[serde(
        rename = "verifiableCredential",
        skip_serializing_if = "Vec::is_empty"
    )]
    verifiable_credential: &'a [VerifiableCredential],
}

/// Produce the exact byte sequence a document's proofs are computed over.
pub fn encode_document(doc: &DidDocument) -> Result<Vec<u8>, ValidationError> {
    let signable = SignableDocument {
        id: doc.id.as_str(),
        public_key: &doc.public_key,
        authentication: &doc.authentication,
        authorization: &doc.authorization,
        controller: &doc.controller,
        multisig: &doc.multisig,
        expires: &doc.expires,
        verifiable_credential: &doc.verifiable_credential,
    };
    serde_json::to_vec(&signable)
        .map_err(|e| ValidationError::Malformed(format!("failed to canonicalize document: {e}")))
}

/// Produce the concatenation `specification || operation || previousTxid? || payload`.
pub fn encode_envelope(header: &Header, payload_b64: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(header.specification.as_bytes());
    buf.extend_from_slice(header.operation.to_string().as_bytes());
    if header.operation.requires_previous_txid() {
        if let Some(prev) = &header.previous_txid {
            buf.extend_from_slice(prev.as_bytes());
        }
    }
    buf.extend_from_slice(payload_b64.as_bytes());
    buf
}

#[derive(Serialize)]
struct SignableCredential<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    types: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer: &'a Option<String>,
    #[serde(
        rename = "issuanceDate",
        skip_serializing_if = "Option::is_none"
    )]
    issuance_date: &'a Option<String>,
    #[serde(rename = "expirationDate")]
    expiration_date: &'a str,
    #[serde(rename = "credentialSubject")]
    credential_subject: &'a serde_json::Map<String, serde_json::Value>,
}

/// Expand a compact fragment form (`"#name"`) into `"<owner_did>#name"`.
pub fn expand_compact(owner_did: &str, value: &str) -> String {
    if let Some(fragment) = value.strip_prefix('#') {
        format!("{owner_did}#{fragment}")
    } else {
        value.to_string()
    }
}

/// Canonicalize a credential for signature verification. `issuer` (and the
/// credential `id`, if compact) are expanded against `owner_did` before
/// encoding, so a credential signed compactly and later stored in expanded
/// form verifies identically.
pub fn encode_credential(
    cred: &VerifiableCredential,
    owner_did: &str,
) -> Result<Vec<u8>, ValidationError> {
    let expanded_id = expand_compact(owner_did, &cred.id);
    let expanded_issuer = cred.issuer.as_ref().map(|i| expand_compact(owner_did, i));

    let signable = SignableCredential {
        id: &expanded_id,
        types: &cred.types,
        issuer: &expanded_issuer,
        issuance_date: &cred.issuance_date,
        expiration_date: &cred.expiration_date,
        credential_subject: &cred.credential_subject,
    };
    serde_json::to_vec(&signable)
        .map_err(|e| ValidationError::Malformed(format!("failed to canonicalize credential: {e}")))
}

#[derive(Serialize)]
struct SignableTicket<'a> {
    #[serde(rename = "customId")]
    custom_id: &'a str,
    to: &'a str,
    #[serde(rename = "transactionId")]
    transaction_id: &'a str,
}

pub fn encode_ticket(ticket: &Ticket) -> Vec<u8> {
    let signable = SignableTicket {
        custom_id: &ticket.custom_id,
        to: &ticket.to,
        transaction_id: &ticket.transaction_id,
    };
    // A ticket's fields are all plain strings; canonicalization cannot fail.
    serde_json::to_vec(&signable).expect("ticket fields are always serializable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::types::{DocumentProof, Identifier, ProofSet};

    fn sample_doc() -> DidDocument {
        DidDocument {
            id: Identifier("did:elastos:abc".into()),
            public_key: vec![],
            authentication: vec![],
            authorization: vec![],
            controller: None,
            multisig: None,
            expires: "2030-01-01T00:00:00Z".into(),
            verifiable_credential: vec![],
            proof: ProofSet::Many(vec![DocumentProof {
                creator: "did:elastos:abc#primary".into(),
                created: "2020-01-01T00:00:00Z".into(),
                signature_value: "deadbeef".into(),
            }]),
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let doc = sample_doc();
        let a = encode_document(&doc).unwrap();
        let b = encode_document(&doc).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn encoding_excludes_proof_bytes() {
        let doc = sample_doc();
        let encoded = encode_document(&doc).unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert!(!text.contains("deadbeef"));
    }

    #[test]
    fn compact_fragment_expands() {
        assert_eq!(expand_compact("did:elastos:abc", "#primary"), "did:elastos:abc#primary");
        assert_eq!(
            expand_compact("did:elastos:abc", "did:elastos:xyz#k1"),
            "did:elastos:xyz#k1"
        );
    }
}
