//! Core primitives for gridbind.
//!
//! This crate provides the building blocks the binding engine is made of:
//!
//! - **Signal/Slot System**: type-safe notifications with scoped
//!   [`Subscription`] handles
//! - **Flush Queue**: deferred "run before flush" tasks used to coalesce
//!   notifications within one processing turn
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Example
//!
//! ```
//! use gridbind_core::{FlushQueue, Signal};
//! use std::sync::Arc;
//!
//! let queue = Arc::new(FlushQueue::new());
//! let size_changed = Arc::new(Signal::<usize>::new());
//!
//! let _subscription = size_changed.subscribe(|size| println!("size: {}", size));
//!
//! let signal = size_changed.clone();
//! queue.post(move || {
//!     signal.emit(10);
//! });
//! queue.flush();
//! ```

mod flush;
pub mod logging;
pub mod signal;

pub use flush::{FlushQueue, TaskId};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal, Subscription};
