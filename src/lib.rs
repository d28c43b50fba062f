//! recon3d - Serverless image-to-3D reconstruction worker
//!
//! Wraps a third-party 3D-reconstruction model behind a job handler: one job
//! describing an image (and optional mask) in, one base64-encoded 3D asset
//! out.
//!
//! # Architecture
//!
//! - `checkpoint`: ensures model weights exist locally, downloading and
//!   relocating them on first use
//! - `model`: the guarded lazily-initialized model resource and the backends
//!   behind it (HTTP bridge to the real model, deterministic mock)
//! - `assets`: resolves image/mask references into in-memory rasters
//! - `encoder` + `export`: serializes meshes and point clouds into
//!   transport-safe base64 payloads with scoped temp files
//! - `handler`: drives one job through validate, init, fetch, infer, encode,
//!   and converts every failure into a structured error response

pub mod assets;
pub mod checkpoint;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod geometry;
pub mod handler;
pub mod job;
pub mod model;

pub use error::{Result, WorkerError};
