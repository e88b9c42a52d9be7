use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tidal_core::error::ValidationError;
use tidal_core::types::{
    CredentialTxRecord, DidTxRecord, ReceivedCustomIds, ReservedCustomIds,
};

use crate::store::{DidStore, SpvBridge};

/// In-memory reference implementation of [`DidStore`] and [`SpvBridge`],
/// used by tests and the demo CLI. A production deployment backs these
/// traits with its own disk-resident ledger index instead.
#[derive(Default)]
pub struct MemoryStore {
    did_txs: RwLock<HashMap<String, DidTxRecord>>,
    credential_txs: RwLock<HashMap<String, CredentialTxRecord>>,
    deactivated: RwLock<HashSet<String>>,
    primitive_dids: RwLock<HashSet<String>>,
    reserved_custom_ids: RwLock<ReservedCustomIds>,
    received_custom_ids: RwLock<ReceivedCustomIds>,
    custom_id_fee_rate: RwLock<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_did_tx(&self, id: &str, record: DidTxRecord, is_primitive: bool) {
        self.did_txs
            .write()
            .expect("lock poisoned")
            .insert(id.to_string(), record);
        if is_primitive {
            self.primitive_dids
                .write()
                .expect("lock poisoned")
                .insert(id.to_string());
        }
    }

    pub fn record_credential_tx(&self, credential_id: &str, record: CredentialTxRecord) {
        self.credential_txs
            .write()
            .expect("lock poisoned")
            .insert(credential_id.to_string(), record);
    }

    pub fn mark_deactivated(&self, id: &str) {
        self.deactivated
            .write()
            .expect("lock poisoned")
            .insert(id.to_string());
    }

    pub fn set_reserved_custom_ids(&self, ids: ReservedCustomIds) {
        *self.reserved_custom_ids.write().expect("lock poisoned") = ids;
    }

    pub fn set_received_custom_ids(&self, ids: ReceivedCustomIds) {
        *self.received_custom_ids.write().expect("lock poisoned") = ids;
    }

    pub fn set_custom_id_fee_rate(&self, rate: u64) {
        *self.custom_id_fee_rate.write().expect("lock poisoned") = rate;
    }
}

impl DidStore for MemoryStore {
    fn last_did_tx(&self, id: &str) -> Result<Option<DidTxRecord>, ValidationError> {
        Ok(self.did_txs.read().expect("lock poisoned").get(id).cloned())
    }

    fn last_credential_tx(
        &self,
        credential_id: &str,
    ) -> Result<Option<CredentialTxRecord>, ValidationError> {
        Ok(self
            .credential_txs
            .read()
            .expect("lock poisoned")
            .get(credential_id)
            .cloned())
    }

    fn is_deactivated(&self, id: &str) -> Result<bool, ValidationError> {
        Ok(self.deactivated.read().expect("lock poisoned").contains(id))
    }

    fn is_primitive_did(&self, id: &str) -> Result<bool, ValidationError> {
        Ok(self
            .primitive_dids
            .read()
            .expect("lock poisoned")
            .contains(id))
    }
}

impl SpvBridge for MemoryStore {
    fn reserved_custom_ids(&self) -> Result<ReservedCustomIds, ValidationError> {
        Ok(self.reserved_custom_ids.read().expect("lock poisoned").clone())
    }

    fn received_custom_ids(&self) -> Result<ReceivedCustomIds, ValidationError> {
        Ok(self.received_custom_ids.read().expect("lock poisoned").clone())
    }

    fn rate_of_custom_id_fee(&self) -> Result<u64, ValidationError> {
        Ok(*self.custom_id_fee_rate.read().expect("lock poisoned"))
    }
}
