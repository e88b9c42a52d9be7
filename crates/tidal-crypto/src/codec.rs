use sha2::{Digest, Sha256};
use tidal_core::error::ValidationError;

/// Sign-type byte prefixed onto a standard (single-key) program hash, mirroring
/// the P2PKH-style redeem-script convention described in §4.3.
const STANDARD_PROGRAM_PREFIX: u8 = 0x21;

/// CHECKSIG-equivalent opcode appended to the redeem script before hashing.
const STANDARD_CHECKSIG_OPCODE: u8 = 0xac;

pub fn base58_decode_public_key(s: &str) -> Result<[u8; 33], ValidationError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| ValidationError::Malformed(format!("invalid base58 public key: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ValidationError::Malformed("public key must decode to 33 bytes".into()))
}

pub fn base58_encode_public_key(pubkey: &[u8; 33]) -> String {
    bs58::encode(pubkey).into_string()
}

pub fn base64url_decode_signature(s: &str) -> Result<[u8; 64], ValidationError> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| ValidationError::Malformed(format!("invalid base64url signature: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ValidationError::Malformed("signature must decode to 64 bytes".into()))
}

pub fn base64url_encode_signature(sig: &[u8; 64]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sig)
}

pub fn base64url_decode_payload(s: &str) -> Result<Vec<u8>, ValidationError> {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| ValidationError::Malformed(format!("invalid base64url payload: {e}")))
}

pub fn base64url_encode_payload(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn hash160(data: &[u8]) -> [u8; 20] {
    use ripemd::Ripemd160;
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

fn program_hash(pubkey: &[u8; 33]) -> [u8; 21] {
    let mut redeem_script = Vec::with_capacity(35);
    redeem_script.push(pubkey.len() as u8);
    redeem_script.extend_from_slice(pubkey);
    redeem_script.push(STANDARD_CHECKSIG_OPCODE);

    let mut out = [0u8; 21];
    out[0] = STANDARD_PROGRAM_PREFIX;
    out[1..].copy_from_slice(&hash160(&redeem_script));
    out
}

/// Derive the base58check address a primitive DID's suffix must equal.
pub fn address_from_public_key(pubkey: &[u8; 33]) -> String {
    let payload = program_hash(pubkey);
    let checksum = Sha256::digest(Sha256::digest(payload));
    let mut buf = Vec::with_capacity(25);
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&checksum[..4]);
    bs58::encode(buf).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_derivation_is_deterministic() {
        let pubkey = [3u8; 33];
        assert_eq!(address_from_public_key(&pubkey), address_from_public_key(&pubkey));
    }

    #[test]
    fn signature_round_trips_through_base64url() {
        let sig = [7u8; 64];
        let encoded = base64url_encode_signature(&sig);
        assert!(!encoded.contains('='));
        assert_eq!(base64url_decode_signature(&encoded).unwrap(), sig);
    }
}
