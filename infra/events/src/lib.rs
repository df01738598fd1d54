//! # Event Bus
//!
//! A type-safe, asynchronous event bus connecting decoupled slices.
//!
//! ## Overview
//!
//! Provides a centralized `EventBus` with two channel kinds — `broadcast`
//! (fan-out) and `watch` (latest value) — built on `tokio` primitives with
//! minimal overhead. Events are identified by their Rust type; the first
//! subscribe or publish of a type fixes its channel kind.
//!
//! # Example
//!
//! ```rust
//! use cmesh_events::{EventBus, EventBusError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct ProtocolChanged { id: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     let mut rx = bus.subscribe::<ProtocolChanged>()?;
//!     bus.publish(ProtocolChanged { id: "KEY-1234".into() })?;
//!
//!     if let Ok(event) = rx.recv().await {
//!         assert_eq!(event.id, "KEY-1234");
//!     }
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{ChannelKind, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
