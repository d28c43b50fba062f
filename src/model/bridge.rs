//! HTTP bridge backend
//!
//! Talks to the reconstruction model through a sidecar inference service.
//! The bridge owns the loaded pipeline; this side only ships the inputs
//! (PNG-encoded image, optional PNG mask, seed) and maps the JSON reply back
//! into structured output.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::{MaskBuffer, PixelImage};
use crate::error::{Result, WorkerError};
use crate::geometry::{Mesh, PointCloud};
use crate::model::backend::{InferenceResult, ReconstructionModel};

/// Request sent to the inference bridge.
#[derive(Debug, Serialize)]
struct BridgeRequest {
    image_png_base64: String,
    mask_png_base64: Option<String>,
    seed: u64,
}

/// Response from the inference bridge.
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    success: bool,
    #[serde(default)]
    mesh: Option<BridgeMesh>,
    #[serde(default)]
    point_cloud: Option<BridgePointCloud>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeMesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
}

#[derive(Debug, Deserialize)]
struct BridgePointCloud {
    points: Vec<[f32; 3]>,
    #[serde(default)]
    colors: Option<Vec<[u8; 3]>>,
}

/// Backend reaching the real model over HTTP.
pub struct BridgeModel {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl BridgeModel {
    /// `url` is the bridge base URL; one inference call may take minutes, so
    /// `timeout` bounds the whole request.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Initialization {
                reason: format!("failed to build bridge client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/infer", url.trim_end_matches('/')),
        })
    }

    fn encode_mask(mask: &MaskBuffer) -> Result<String> {
        let pixels: Vec<u8> = mask.data.iter().map(|&b| if b { 255 } else { 0 }).collect();
        let buffer: image::GrayImage =
            image::ImageBuffer::from_raw(mask.width, mask.height, pixels).ok_or_else(|| {
                WorkerError::AssetDecode {
                    reason: "mask dimensions do not match buffer length".to_string(),
                }
            })?;
        let mut bytes = Vec::new();
        buffer
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| WorkerError::AssetDecode {
                reason: format!("mask PNG encoding failed: {e}"),
            })?;
        Ok(BASE64.encode(bytes))
    }
}

impl ReconstructionModel for BridgeModel {
    fn name(&self) -> &str {
        "bridge"
    }

    fn infer(
        &self,
        image: &PixelImage,
        mask: Option<&MaskBuffer>,
        seed: u64,
    ) -> Result<InferenceResult> {
        let request = BridgeRequest {
            image_png_base64: BASE64.encode(image.to_png_bytes()?),
            mask_png_base64: mask.map(Self::encode_mask).transpose()?,
            seed,
        };

        debug!(endpoint = %self.endpoint, seed, "sending inference request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| WorkerError::Inference {
                reason: format!("bridge unreachable: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Inference {
                reason: format!("bridge returned HTTP {status}"),
            });
        }

        let reply: BridgeResponse = response.json().map_err(|e| WorkerError::Inference {
            reason: format!("malformed bridge response: {e}"),
        })?;

        if !reply.success {
            return Err(WorkerError::Inference {
                reason: reply
                    .error
                    .unwrap_or_else(|| "bridge reported failure without detail".to_string()),
            });
        }

        Ok(InferenceResult {
            mesh: reply.mesh.map(|m| Mesh::new(m.vertices, m.faces)),
            point_cloud: reply.point_cloud.map(|pc| PointCloud {
                points: pc.points,
                colors: pc.colors,
            }),
        })
    }
}
