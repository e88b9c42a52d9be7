use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use tidal_core::error::ValidationError;

/// Verify an ECDSA-over-SECP256R1 signature against a canonical payload.
///
/// `pubkey` is a 33-byte compressed SEC1 point; `signature` is a raw
/// 64-byte `r || s` pair (no DER framing). The underlying curve operation
/// hashes `message` with SHA-256 before verifying, matching the P2PKH-style
/// redeem script convention described for this protocol.
pub fn verify_signature(
    message: &[u8],
    pubkey: &[u8; 33],
    signature: &[u8; 64],
) -> Result<(), ValidationError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(pubkey)
        .map_err(|_| ValidationError::Malformed("invalid SECP256R1 public key".into()))?;
    let sig = Signature::from_slice(signature)
        .map_err(|_| ValidationError::Malformed("invalid ECDSA signature encoding".into()))?;
    verifying_key
        .verify(message, &sig)
        .map_err(|_| ValidationError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    fn generate_keypair() -> (SigningKey, [u8; 33]) {
        let signing_key = SigningKey::from_bytes(&[0x11u8; 32].into()).unwrap();
        let verifying_key = VerifyingKey::from(&signing_key);
        let encoded = verifying_key.to_encoded_point(true);
        let mut pubkey = [0u8; 33];
        pubkey.copy_from_slice(encoded.as_bytes());
        (signing_key, pubkey)
    }

    #[test]
    fn valid_signature_verifies() {
        let (signing_key, pubkey) = generate_keypair();
        let message = b"did:elastos:canonical-bytes";
        let sig: Signature = signing_key.sign(message);
        let sig_bytes: [u8; 64] = sig.to_bytes().into();
        assert!(verify_signature(message, &pubkey, &sig_bytes).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let (signing_key, pubkey) = generate_keypair();
        let sig: Signature = signing_key.sign(b"original");
        let sig_bytes: [u8; 64] = sig.to_bytes().into();
        assert!(verify_signature(b"tampered", &pubkey, &sig_bytes).is_err());
    }
}
