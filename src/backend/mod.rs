//! HTTP client for the Stable Diffusion WebUI `sdapi/v1` REST surface.

pub mod traits;

use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use reqwest::Client;

use crate::codec;
use crate::compositor;
use crate::config::BackendConfig;
use crate::error::{OutpaintError, Result};
use crate::models::{
    ExpansionJob, Img2ImgRequest, Img2ImgResponse, NameKind, NamedEntry, ProgressResponse,
};

pub use traits::GenerationBackend;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7860/sdapi/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 60 * 30;

/// Assembles the wire payload for one expansion job: pads the cropped
/// source into the square canvas, computes the companion mask and encodes
/// both as base64 PNG.
///
/// The mask band is `crop_extent - mask_blur * 2` wide. That formula is
/// an external contract with the backend; an oversized blur is rejected,
/// never clamped.
pub fn build_img2img_payload(job: &ExpansionJob) -> Result<Img2ImgRequest> {
    job.validate()?;
    let (width, height) = job.source.dimensions();
    let extent = if job.direction.is_horizontal() {
        width
    } else {
        height
    };
    let mask_width = extent
        .checked_sub(job.options.mask_blur * 2)
        .filter(|w| *w > 0)
        .ok_or_else(|| {
            OutpaintError::InvalidArgument(format!(
                "mask blur {} leaves no mask inside a {}px crop",
                job.options.mask_blur, extent
            ))
        })?;

    let padded = compositor::pad_image(&job.source, job.direction, job.canvas_size)?;
    let mask = compositor::generate_mask(mask_width, job.direction, job.canvas_size)?;

    Ok(Img2ImgRequest {
        init_images: vec![codec::image_to_base64(&padded)?],
        mask: codec::mask_to_base64(&mask)?,
        restore_faces: false,
        tiling: false,
        denoising_strength: 1,
        inpainting_fill: 0,
        width: job.canvas_size,
        height: job.canvas_size,
        options: job.options.clone(),
    })
}

/// Client for one WebUI instance. The inner `reqwest::Client` is shared
/// and safe for concurrent use by the progress poller and an in-flight
/// submission.
pub struct SdWebuiClient {
    client: Client,
    base_url: String,
    submit_timeout: Duration,
}

impl SdWebuiClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout = Duration::from_secs(
            config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        let submit_timeout = Duration::from_secs(
            config
                .submit_timeout_secs
                .unwrap_or(DEFAULT_SUBMIT_TIMEOUT_SECS),
        );
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| OutpaintError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            submit_timeout,
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(BackendConfig::new().with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl GenerationBackend for SdWebuiClient {
    async fn submit(&self, job: &ExpansionJob) -> Result<RgbImage> {
        let payload = build_img2img_payload(job)?;
        log::debug!(
            "submitting img2img job: direction={}, canvas={}px, strip={}px",
            job.direction,
            job.canvas_size,
            job.generate_width
        );

        let response = self
            .client
            .post(self.endpoint("img2img"))
            .timeout(self.submit_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OutpaintError::RequestError(format!("img2img request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutpaintError::BackendError {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: Img2ImgResponse = response.json().await.map_err(|e| {
            OutpaintError::ResponseError(format!("malformed img2img response: {}", e))
        })?;
        let first = decoded.images.first().ok_or_else(|| {
            OutpaintError::ResponseError("img2img response contained no images".into())
        })?;
        codec::base64_to_image(first)
    }

    async fn interrupt(&self) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("interrupt"))
            .send()
            .await
            .map_err(|e| OutpaintError::RequestError(format!("interrupt request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutpaintError::BackendError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn progress(&self) -> Result<Option<f64>> {
        let response = self
            .client
            .get(self.endpoint("progress"))
            .query(&[("skip_current_image", "true")])
            .send()
            .await
            .map_err(|e| OutpaintError::RequestError(format!("progress request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutpaintError::BackendError {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: ProgressResponse = response.json().await.map_err(|e| {
            OutpaintError::ResponseError(format!("malformed progress response: {}", e))
        })?;
        // The backend reports 0.0 when nothing is running.
        if decoded.progress > 0.0 {
            Ok(Some(decoded.progress))
        } else {
            Ok(None)
        }
    }

    async fn option_names(&self, kind: NameKind) -> Vec<String> {
        let response = match self.client.get(self.endpoint(kind.as_path())).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::warn!("{} listing returned HTTP {}", kind, response.status());
                return Vec::new();
            }
            Err(e) => {
                log::warn!("{} listing failed: {}", kind, e);
                return Vec::new();
            }
        };
        match response.json::<Vec<NamedEntry>>().await {
            Ok(entries) => entries.into_iter().map(|entry| entry.name).collect(),
            Err(e) => {
                log::warn!("{} listing returned a malformed body: {}", kind, e);
                Vec::new()
            }
        }
    }
}
