use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ── Identifier ───────────────────────────────────────────────────────────────

/// A DID string of the form `did:elastos:<suffix>`.
///
/// Whether an identifier is primitive or customized is never cached here —
/// it is derived from a document's `publicKey` array (see
/// `tidal_crypto::is_primitive_document`), so this type stays a thin
/// wrapper over the wire string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(pub String);

const DID_PREFIX: &str = "did:elastos:";

impl Identifier {
    pub fn suffix(&self) -> &str {
        self.0.strip_prefix(DID_PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Operation ────────────────────────────────────────────────────────────────

/// The exact wire literals from the operation header field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Transfer,
    Deactivate,
    Declare,
    Revoke,
}

impl Operation {
    /// `previousTxid` is mandatory iff the operation is update or transfer.
    pub fn requires_previous_txid(self) -> bool {
        matches!(self, Operation::Update | Operation::Transfer)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Transfer => "transfer",
            Operation::Deactivate => "deactivate",
            Operation::Declare => "declare",
            Operation::Revoke => "revoke",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "transfer" => Ok(Operation::Transfer),
            "deactivate" => Ok(Operation::Deactivate),
            "declare" => Ok(Operation::Declare),
            "revoke" => Ok(Operation::Revoke),
            other => Err(ValidationError::Malformed(format!(
                "unknown operation: {other}"
            ))),
        }
    }
}

// ── KeyRole ──────────────────────────────────────────────────────────────────

/// The role under which a verification method must resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRole {
    Default,
    Authentication,
    Authorization,
}

// ── Polymorphic JSON fields (§9) ─────────────────────────────────────────────

/// `controller` is absent, a bare string, or an array of strings on the wire.
/// Reimplemented as a tagged variant with one normalizing accessor, never by
/// dynamic introspection of the deserialized value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControllerSet {
    Single(String),
    Many(Vec<String>),
}

impl ControllerSet {
    pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            ControllerSet::Single(s) => Box::new(std::iter::once(s.as_str())),
            ControllerSet::Many(v) => Box::new(v.iter().map(String::as_str)),
        }
    }

    pub fn contains(&self, did: &str) -> bool {
        self.iter().any(|c| c == did)
    }

    pub fn len(&self) -> usize {
        match self {
            ControllerSet::Single(_) => 1,
            ControllerSet::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `authentication`/`authorization` entries are either a bare verification
/// method URI or an inline key record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyReference {
    Uri(String),
    Embedded(PublicKeyEntry),
}

/// `proof` is either a bare object or an array of objects, depending on the
/// signable container.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofSet<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> ProofSet<T> {
    pub fn as_slice_vec(&self) -> Vec<&T> {
        match self {
            ProofSet::One(p) => vec![p],
            ProofSet::Many(v) => v.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProofSet::One(_) => 1,
            ProofSet::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── MultisigPolicy ───────────────────────────────────────────────────────────

/// Parsed form of the `"M:N"` literal. Defaults to `1:1` when absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultisigPolicy {
    pub m: u32,
    pub n: u32,
}

impl MultisigPolicy {
    pub const SINGLE: MultisigPolicy = MultisigPolicy { m: 1, n: 1 };
}

impl fmt::Display for MultisigPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.m, self.n)
    }
}

impl FromStr for MultisigPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (m_str, n_str) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::Malformed(format!("invalid multisig literal: {s}")))?;
        let m = m_str
            .parse::<u32>()
            .map_err(|_| ValidationError::Malformed(format!("invalid multisig literal: {s}")))?;
        let n = n_str
            .parse::<u32>()
            .map_err(|_| ValidationError::Malformed(format!("invalid multisig literal: {s}")))?;
        Ok(MultisigPolicy { m, n })
    }
}

// ── Public keys ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicKeyEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub controller: String,
    #[serde(rename = "publicKeyBase58")]
    pub public_key_base58: String,
}

// ── Proofs ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OuterProof {
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    pub signature: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentProof {
    pub creator: String,
    pub created: String,
    #[serde(rename = "signatureValue")]
    pub signature_value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketProof {
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    pub signature: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialProof {
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    pub signature: String,
}

// ── Ticket ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "customId")]
    pub custom_id: String,
    pub to: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub proof: ProofSet<TicketProof>,
}

// ── Verifiable Credential ────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifiableCredential {
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(
        default,
        rename = "issuanceDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub issuance_date: Option<String>,
    #[serde(rename = "expirationDate")]
    pub expiration_date: String,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: serde_json::Map<String, serde_json::Value>,
    pub proof: CredentialProof,
}

impl VerifiableCredential {
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(|v| v.as_str())
    }
}

// ── DID Document ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DidDocument {
    pub id: Identifier,
    #[serde(rename = "publicKey")]
    pub public_key: Vec<PublicKeyEntry>,
    pub authentication: Vec<KeyReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization: Vec<KeyReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisig: Option<String>,
    pub expires: String,
    #[serde(
        default,
        rename = "verifiableCredential",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verifiable_credential: Vec<VerifiableCredential>,
    pub proof: ProofSet<DocumentProof>,
}

impl DidDocument {
    pub fn multisig_policy(&self) -> Result<MultisigPolicy, ValidationError> {
        match &self.multisig {
            Some(s) => s.parse(),
            None => Ok(MultisigPolicy::SINGLE),
        }
    }
}

// ── Transaction Envelope ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Header {
    pub specification: String,
    pub operation: Operation,
    #[serde(
        default,
        rename = "previousTxid",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_txid: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialDocument {
    pub id: Identifier,
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<VerifiableCredential>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DidPayload {
    pub header: Header,
    pub payload: String,
    pub proof: ProofSet<OuterProof>,
    #[serde(default, rename = "didDoc", skip_serializing_if = "Option::is_none")]
    pub did_doc: Option<DidDocument>,
    #[serde(
        default,
        rename = "credentialDoc",
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_doc: Option<CredentialDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

// ── Store record shapes (§6) ─────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct DidTxRecord {
    pub txid_hex: String,
    pub operation: Operation,
    pub did_doc: DidDocument,
}

#[derive(Clone, Debug)]
pub struct CredentialTxRecord {
    pub txid_hex: String,
    pub operation: Operation,
}

/// Deployment-tunable governance parameters (§4.5, §9 height gates).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DidParams {
    pub check_register_did_height: u32,
    pub verifiable_credential_height: u32,
    pub custom_id_fee_rate: u64,
}

impl Default for DidParams {
    fn default() -> Self {
        Self {
            check_register_did_height: crate::constants::DEFAULT_CHECK_REGISTER_DID_HEIGHT,
            verifiable_credential_height: crate::constants::DEFAULT_VERIFIABLE_CREDENTIAL_HEIGHT,
            custom_id_fee_rate: crate::constants::DEFAULT_CUSTOM_ID_FEE_RATE,
        }
    }
}

/// `reservedCustomIds` / `receivedCustomIds` as returned by the SPV bridge.
pub type ReservedCustomIds = std::collections::HashSet<String>;
pub type ReceivedCustomIds = HashMap<String, String>;
