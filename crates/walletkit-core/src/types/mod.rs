/*
[INPUT]:  Wallet, transaction and collaborator schema requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - shared type definitions
[UPDATE]: When collaborator wire shapes change or new types are added
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::*;
pub use models::*;
pub use requests::*;
pub use responses::*;
