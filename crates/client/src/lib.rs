//! Client side of pantry.
//!
//! This crate provides the network transport, the fetch interception engine,
//! the worker lifecycle and the push boundary, on top of the cache store in
//! `pantry-core`.

pub mod engine;
pub mod fetch;
pub mod push;
pub mod worker;

#[cfg(test)]
mod testing;

pub use engine::{FetchEngine, FetchOutcome, ResponseSource};
pub use fetch::{FetchConfig, HttpTransport, Transport, TransportError};
pub use push::{ClickOutcome, Notification, PushPayload, WindowClient};
pub use worker::{BackgroundTasks, ControlMessage, MessageReply, Phase, Worker, WorkerState};
