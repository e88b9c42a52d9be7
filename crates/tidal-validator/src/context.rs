use chrono::{DateTime, Utc};
use tidal_core::types::DidParams;
use tidal_state::{DidStore, SpvBridge};

/// Everything the dispatcher needs beyond the transaction itself.
pub struct ValidationContext<'a> {
    pub height: u32,
    pub median_time_past: DateTime<Utc>,
    pub fee_paid: u64,
    pub params: &'a DidParams,
    pub store: &'a dyn DidStore,
    pub spv: &'a dyn SpvBridge,
}
