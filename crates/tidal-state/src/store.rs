use tidal_core::error::ValidationError;
use tidal_core::types::{CredentialTxRecord, DidTxRecord};

/// Read-only view of prior on-chain state for an identifier (§6, §4.4).
///
/// The validator only ever reads through this trait; all mutation happens
/// downstream, after a transaction is accepted. Implementations are assumed
/// to provide snapshot-isolated reads at a fixed height — the validator
/// issues no retries and caches nothing across calls.
pub trait DidStore: Send + Sync {
    fn last_did_tx(&self, id: &str) -> Result<Option<DidTxRecord>, ValidationError>;
    fn last_credential_tx(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialTxRecord>, ValidationError>;
    fn is_deactivated(&self, id: &str) -> Result<bool, ValidationError>;
    fn is_primitive_did(&self, id: &str) -> Result<bool, ValidationError>;
}

/// SPV bridge to the main chain (§6): reserved/received custom-id maps and
/// the governance-published fee rate. Entirely out of this crate's control —
/// a real deployment backs this with cached RPC reads against the mainchain.
pub trait SpvBridge: Send + Sync {
    fn reserved_custom_ids(&self) -> Result<tidal_core::types::ReservedCustomIds, ValidationError>;
    fn received_custom_ids(&self) -> Result<tidal_core::types::ReceivedCustomIds, ValidationError>;
    fn rate_of_custom_id_fee(&self) -> Result<u64, ValidationError>;
}
