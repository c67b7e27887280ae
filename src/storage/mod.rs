//! Storage traits for the security flows.
//!
//! These traits define the narrow contract the flows need from a record
//! store. Implement them for your database layer (SeaORM, SQLx, etc.).

pub mod reset;
pub mod user;

pub use reset::ResetTokenStore;
pub use user::{UserCreator, UserStore};
