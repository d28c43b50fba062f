//! Model resource: the seam to the external reconstruction model
//!
//! The model itself is an external collaborator. This module defines the
//! trait the worker calls through, the guarded lazily-initialized resource
//! that owns the loaded handle, an HTTP bridge backend for the real model,
//! and a deterministic mock for tests and bridge-less local runs.

pub mod backend;
pub mod bridge;
pub mod mock;
pub mod resource;

pub use backend::{InferenceResult, ReconstructionModel};
pub use bridge::BridgeModel;
pub use mock::MockModel;
pub use resource::ModelResource;
