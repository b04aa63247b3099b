//! External collaborator contracts.
//!
//! The inference service, object store and pub/sub broker are opaque
//! external systems; the core only sees the narrow traits defined here.
//! Each trait ships with an in-memory implementation used for local runs
//! and tests.

pub mod broker;
pub mod inference;
pub mod store;

pub use broker::{Broker, Delivery, MemoryBroker, Subscription};
pub use inference::{ChunkStream, HttpInference, InferenceService, InvokeRequest, ACCEPT_HEADER};
pub use store::{MemoryStore, ObjectStore};
