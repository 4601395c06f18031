use serde::{Deserialize, Serialize};

use crate::error::{OutpaintError, Result};

pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, blur, up close";
pub const DEFAULT_STEPS: u32 = 30;
pub const DEFAULT_CFG_SCALE: u32 = 7;
pub const DEFAULT_MASK_BLUR: u32 = 8;
pub const DEFAULT_SAMPLER: &str = "Heun";
pub const DEFAULT_SCHEDULER: &str = "Automatic";

/// User-tunable generation options, forwarded verbatim to the backend
/// alongside the fixed technical parameters of [`Img2ImgRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub cfg_scale: u32,
    pub mask_blur: u32,
    pub sampler_name: String,
    pub scheduler: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            prompt: String::new(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            mask_blur: DEFAULT_MASK_BLUR,
            sampler_name: DEFAULT_SAMPLER.to_string(),
            scheduler: DEFAULT_SCHEDULER.to_string(),
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_cfg_scale(mut self, cfg_scale: u32) -> Self {
        self.cfg_scale = cfg_scale;
        self
    }

    pub fn with_mask_blur(mut self, mask_blur: u32) -> Self {
        self.mask_blur = mask_blur;
        self
    }

    pub fn with_sampler(mut self, sampler_name: impl Into<String>) -> Self {
        self.sampler_name = sampler_name.into();
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=200).contains(&self.steps) {
            return Err(OutpaintError::InvalidArgument(format!(
                "steps {} outside 1-200",
                self.steps
            )));
        }
        if !(1..=100).contains(&self.cfg_scale) {
            return Err(OutpaintError::InvalidArgument(format!(
                "cfg_scale {} outside 1-100",
                self.cfg_scale
            )));
        }
        if self.mask_blur > 256 {
            return Err(OutpaintError::InvalidArgument(format!(
                "mask_blur {} outside 0-256",
                self.mask_blur
            )));
        }
        Ok(())
    }
}

/// Wire payload of `POST img2img`. The fixed fields pin the backend into
/// pure outpainting mode; the user options are flattened in beside them.
#[derive(Debug, Serialize)]
pub struct Img2ImgRequest {
    pub init_images: Vec<String>,
    pub mask: String,
    pub restore_faces: bool,
    pub tiling: bool,
    pub denoising_strength: u32,
    pub inpainting_fill: u32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
pub struct Img2ImgResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    pub progress: f64,
}

#[derive(Debug, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Which option-name listing to request from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Samplers,
    Schedulers,
}

impl NameKind {
    pub fn as_path(self) -> &'static str {
        match self {
            NameKind::Samplers => "samplers",
            NameKind::Schedulers => "schedulers",
        }
    }
}

impl std::fmt::Display for NameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = GenerationOptions::default();
        assert_eq!(options.prompt, "");
        assert_eq!(options.negative_prompt, "blurry, blur, up close");
        assert_eq!(options.steps, 30);
        assert_eq!(options.cfg_scale, 7);
        assert_eq!(options.mask_blur, 8);
        assert_eq!(options.sampler_name, "Heun");
        assert_eq!(options.scheduler, "Automatic");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation_bounds() {
        assert!(GenerationOptions::new().with_steps(0).validate().is_err());
        assert!(GenerationOptions::new().with_steps(201).validate().is_err());
        assert!(GenerationOptions::new().with_cfg_scale(0).validate().is_err());
        assert!(GenerationOptions::new()
            .with_mask_blur(257)
            .validate()
            .is_err());
        assert!(GenerationOptions::new()
            .with_steps(200)
            .with_cfg_scale(100)
            .with_mask_blur(256)
            .validate()
            .is_ok());
    }

    #[test]
    fn options_flatten_into_the_payload() {
        let request = Img2ImgRequest {
            init_images: vec!["abc".into()],
            mask: "def".into(),
            restore_faces: false,
            tiling: false,
            denoising_strength: 1,
            inpainting_fill: 0,
            width: 512,
            height: 512,
            options: GenerationOptions::default().with_prompt("a forest"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "a forest");
        assert_eq!(value["sampler_name"], "Heun");
        assert_eq!(value["mask_blur"], 8);
        assert_eq!(value["denoising_strength"], 1);
        assert_eq!(value["inpainting_fill"], 0);
        assert_eq!(value["restore_faces"], false);
        assert_eq!(value["width"], 512);
        assert!(value.get("options").is_none());
    }
}
