pub mod guard;
pub mod memory;
pub mod store;

pub use guard::{
    check_create_preconditions, check_deactivate_preconditions, check_declare_preconditions,
    check_revoke_preconditions, check_update_preconditions, reverse_hex,
};
pub use memory::MemoryStore;
pub use store::{DidStore, SpvBridge};
