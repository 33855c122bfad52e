mod genesis;
mod payload;
mod transaction;
mod tx_fields;

pub use genesis::*;
pub use payload::*;
pub use transaction::*;
pub use tx_fields::*;
