pub mod link;

pub use link::{ExchangeRequest, LinkAccount, LinkDecodeError, LinkInstitution};
