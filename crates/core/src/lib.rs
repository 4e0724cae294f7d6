pub mod config;
pub mod rlp;
pub mod signer;
pub mod types;
pub mod validation;

pub use config::{ChainConfig, Fork};
pub use signer::{make_signer, SignatureError, Signer};
pub use types::transaction::Transaction;
pub use validation::{Fixture, VerifyError};
