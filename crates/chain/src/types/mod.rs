//! Chain object types and serialization.

pub mod block;
pub mod header;
pub mod opcode;
pub mod script;
pub mod taproot;
pub mod transactions;
pub mod txin;
pub mod txout;
pub mod witness;

pub use block::Block;
pub use header::Header;
pub use opcode::Opcode;
pub use script::{Operation, Script};
pub use taproot::{TaprootSighashArgs, TapscriptExt};
pub use transactions::{
    Coverage, LegacySighashArgs, Sighash, SighashCache, Transaction, TxError, TxResult,
    WitnessSighashArgs,
};
pub use txin::{Outpoint, Prevout, TxInput, Vin};
pub use txout::{TxOut, Vout};
pub use witness::{Witness, WitnessStackItem};
