//! # Reqsync Core
//!
//! Core types for the reqsync asynchronous request-state store.
//!
//! A request store tracks a single asynchronous operation (a search, a page
//! load, an upload) through a small finite-state machine and exposes the
//! result to presentation code. This crate holds the pure data side of that
//! pattern:
//!
//! - [`Phase`]: the discrete request lifecycle (`Idle`/`Loading`/`Saving`/
//!   `Loaded`/`Saved`/`Error`)
//! - [`RequestState`]: phase plus last payload and classified error, with
//!   invariant-preserving transitions
//! - [`ErrorKind`] and [`StatusCoded`]: classification of raw failures at
//!   the boundary
//! - [`Trigger`]: a request description with optional completion callbacks
//! - [`Operation`]: the contract for the external async operation
//! - [`policy`]: per-instance concurrency and failure-retention policies
//!
//! The coordinator that drives operations and applies the concurrency
//! policies lives in the `reqsync-runtime` crate; this crate performs no I/O.
//!
//! ## State machine
//!
//! ```text
//! Idle --trigger--> Loading/Saving
//! Loading/Saving --success--> Loaded/Saved
//! Loading/Saving --failure--> Error
//! Loaded/Saved --trigger--> Loading/Saving
//! Error --trigger--> Loading/Saving
//! (any) --reset--> Idle
//! ```
//!
//! There is no terminal state: a store is reused for the lifetime of the
//! component that owns it.

pub mod classify;
pub mod operation;
pub mod phase;
pub mod policy;
pub mod state;
pub mod trigger;

pub use classify::{ErrorKind, StatusCoded, classify_status};
pub use operation::{FnOperation, Operation, from_fn};
pub use phase::Phase;
pub use policy::{ConcurrencyPolicy, FailurePolicy, OperationKind};
pub use state::RequestState;
pub use trigger::{Trigger, TriggerOutcome};
