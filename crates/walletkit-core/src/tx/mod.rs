/*
[INPUT]:  Transfer requests, wallet records, network collaborators
[OUTPUT]: Signed and submitted transactions per chain family
[POS]:    Transaction layer - one-way Built -> Signed -> Submitted state machines
[UPDATE]: When adding a chain family or transaction type
*/

pub mod evm;
pub mod solana;

pub use evm::{BuiltEvmTransaction, EvmTransactionBuilder, SignedEvmTransaction, TRANSFER_GAS};
pub use solana::{
    BuiltSolanaTransaction, LAMPORTS_PER_SOL, Message, SignedSolanaTransaction, SolanaTransactionBuilder,
};
