//! User storage
//!
//! The authentication flow talks to storage only through [`UserStore`].
//! [`MemoryUserStore`] is the in-process implementation used by the server
//! and the tests.

pub mod memory;
pub mod store;

pub use memory::MemoryUserStore;
pub use store::{Credential, NewUser, StoreError, UserStore};
