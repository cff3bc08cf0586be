//! Wayfarer Environment Abstraction Layer
//!
//! This crate keeps the playback and planning code independent of the
//! world it runs in. Two things are intercepted:
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Storage (`get()`, `set()`, `remove()` on a string key-value store)
//!
//! Production code uses [`TokioContext`] and [`SledStore`]; tests and the
//! headless simulator swap in a virtual clock and [`MemoryStore`] without
//! touching the playback logic.
//!
//! # Example
//!
//! ```ignore
//! use wayfarer_env::{KeyValueStore, MemoryStore, WayfarerContext};
//!
//! async fn remember<Ctx: WayfarerContext, S: KeyValueStore>(ctx: &Ctx, store: &S) {
//!     ctx.sleep(Duration::from_millis(800)).await;
//!     store.set("latestItinerary", "{}").ok();
//! }
//! ```

mod context;
mod error;
mod memory_impl;
mod sled_impl;
mod store;
mod tokio_impl;

pub use context::WayfarerContext;
pub use error::StoreError;
pub use memory_impl::MemoryStore;
pub use sled_impl::SledStore;
pub use store::KeyValueStore;
pub use tokio_impl::TokioContext;
