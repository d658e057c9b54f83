//! Link storage
//!
//! - `link_store`: the in-memory token → record mapping and its decay rules
//! - `token`: random token generation
//! - `snapshot`: durable JSON snapshots of the store
//! - `models`: the record types shared with the HTTP layer

mod link_store;
pub mod models;
pub mod snapshot;
pub mod token;

pub use link_store::LinkStore;
pub use models::{FetchOutcome, LinkRecord};
pub use snapshot::{SnapshotFile, SnapshotLoad};
pub use token::{ThreadRngSource, TokenSource};
