//! Job request and response wire types
//!
//! The host runtime delivers one JSON job per invocation and expects exactly
//! one of three response shapes: a mesh payload, an empty object when no mesh
//! was produced, or `{"error": ...}`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkerError};

/// Requested serialization format for the reconstructed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Glb,
    Obj,
    Fbx,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Obj => "obj",
            Self::Fbx => "fbx",
        }
    }

    /// File extension used for the scoped export file.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_seed() -> u64 {
    42
}

/// One unit of work: an image, an optional mask, and output preferences.
///
/// `image_url` is optional at the serde layer so that its absence surfaces as
/// a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRequest {
    /// URL or local path of the input image. Required.
    pub image_url: Option<String>,

    /// URL or local path of an optional mask image.
    #[serde(default)]
    pub mask_url: Option<String>,

    /// Inference seed; the model is deterministic under a fixed seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Mesh serialization format.
    #[serde(default)]
    pub format: OutputFormat,

    /// When set, a produced point cloud is returned as a second payload.
    #[serde(default)]
    pub include_point_cloud: bool,
}

impl JobRequest {
    /// Validate required fields, returning the image reference.
    pub fn validate(&self) -> Result<&str> {
        match self.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(WorkerError::Validation {
                reason: "missing 'image_url' in input".to_string(),
            }),
        }
    }
}

/// Response returned to the host runtime.
///
/// Unset fields are omitted from the JSON, so the serialized shapes are
/// `{"mesh_base64":..,"format":..}`, `{}` (no mesh produced), and
/// `{"error":..}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_base64: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_cloud_base64: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_cloud_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    /// Success response with no payload (inference produced no mesh).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failure(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
