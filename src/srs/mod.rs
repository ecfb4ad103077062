//! Spaced-repetition scheduling (SM-2 variant).
//!
//! `scheduler` holds the pure review arithmetic and status-transition
//! policy; `config` holds the policy constants. Nothing in here touches the
//! store: callers load a record, apply the pure functions and persist the
//! result.

pub mod config;
pub mod scheduler;

pub use config::SrsConfig;
pub use scheduler::Quality;
