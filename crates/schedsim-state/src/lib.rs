//! schedsim-state — embedded cluster store for the scheduler simulator.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for every tracked resource kind plus the active scheduler
//! configuration. [`ClusterStore`] implements `ResourcePort<K>` for every
//! kind and [`SchedulerStore`] implements `SchedulerControl`, so the snapshot
//! orchestrator can run against it directly.
//!
//! # Architecture
//!
//! All objects are JSON-serialized into redb's `&[u8]` value columns, one
//! table per kind. Apply is a single write transaction: it assigns a fresh
//! uid on create, keeps the uid on update, and bumps a store-wide resource
//! version counter.
//!
//! Both stores are `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod scheduler;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use scheduler::SchedulerStore;
pub use store::ClusterStore;
