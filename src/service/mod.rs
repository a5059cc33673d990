pub mod linked_item;
pub mod token_exchange;

pub use linked_item::{PersistReport, PersistenceError, persist_linked_item};
pub use token_exchange::TokenExchangeWorkflow;
