/*
[INPUT]:  Endpoint URLs and client configuration
[OUTPUT]: HTTP implementations of the collaborator traits
[POS]:    HTTP layer - JSON-RPC nodes and the wallet backend
[UPDATE]: When adding collaborator clients or changing transport behavior
*/

pub mod backend;
pub mod client;
pub mod evm;
pub mod solana;

pub use backend::BackendClient;
pub use client::{ClientConfig, JsonRpcClient};
pub use evm::EvmJsonRpc;
pub use solana::SolanaJsonRpc;
