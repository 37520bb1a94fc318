use image::RgbaImage;
use serde::Serialize;
use tracing::debug;

use crate::core::params::PipelineStep;
use crate::core::processing::cleanup::{key_dark_background, trim_to_content};
use crate::core::processing::denoise::clean;
use crate::core::processing::normalize::{Offset, center_in_place, normalize};
use crate::error::Result;

/// Noteworthy side information produced by a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "note", rename_all = "snake_case")]
pub enum StepNote {
    /// Nothing opaque was left to place; the step produced a blank canvas or
    /// left the image as it was.
    FullyTransparent { step: String },
    Denoised { removed: usize },
    Recentered { offset: Offset },
    Keyed { pixels: usize },
}

impl StepNote {
    pub fn is_warning(&self) -> bool {
        matches!(self, StepNote::FullyTransparent { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    pub image: RgbaImage,
    pub notes: Vec<StepNote>,
}

impl StepOutput {
    pub fn has_warnings(&self) -> bool {
        self.notes.iter().any(StepNote::is_warning)
    }
}

/// Run `steps` in order over `image`.
pub fn apply_steps(image: RgbaImage, steps: &[PipelineStep]) -> Result<StepOutput> {
    let mut current = image;
    let mut notes = Vec::new();

    for step in steps {
        debug!(
            "Applying {} to {}x{}",
            step,
            current.width(),
            current.height()
        );
        current = match step {
            PipelineStep::Denoise(params) => {
                let (cleaned, removed) = clean(&current, params)?;
                if removed > 0 {
                    notes.push(StepNote::Denoised { removed });
                }
                cleaned
            }
            PipelineStep::Normalize(canvas) => {
                let normalized = normalize(&current, canvas)?;
                if normalized.is_blank() {
                    notes.push(StepNote::FullyTransparent {
                        step: step.to_string(),
                    });
                }
                normalized.image
            }
            PipelineStep::Recenter => {
                let recentered = center_in_place(&current)?;
                match recentered.offset {
                    Some(offset) => notes.push(StepNote::Recentered { offset }),
                    None => notes.push(StepNote::FullyTransparent {
                        step: step.to_string(),
                    }),
                }
                recentered.image
            }
            PipelineStep::KeyBackground { threshold } => {
                let pixels = key_dark_background(&mut current, *threshold);
                notes.push(StepNote::Keyed { pixels });
                current
            }
            PipelineStep::TrimToContent { padding } => trim_to_content(&current, *padding),
        };
    }

    Ok(StepOutput {
        image: current,
        notes,
    })
}
