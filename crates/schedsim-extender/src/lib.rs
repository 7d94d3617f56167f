//! schedsim-extender — what the scheduler extenders decided, per pod.
//!
//! - [`types`] — extender call arguments and results
//! - [`store`] — [`ResultStore`], the per-pod decision record
//! - [`service`] — [`ExtenderService`], forwards calls to extenders and
//!   records their answers
//! - [`annotation`] — annotation keys the recorded results are exported under

pub mod annotation;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use annotation::ExtenderPhase;
pub use error::{ExtenderError, ExtenderResult};
pub use service::{ExtenderClient, ExtenderService};
pub use store::{Decision, DecisionKey, DecisionRecord, ResultStore};
