//! miljo-report: the impure shell around miljo-core. Talks to the Gemini
//! API, falls back to the local classifier, draws the PDF and exposes the
//! end-to-end pipeline the upload handler calls.

pub mod classifier;
pub mod gemini;
pub mod pdf;
pub mod pipeline;

pub use classifier::{Classifier, ClassifierConfig};
pub use gemini::{GeminiClient, ModelClient};
pub use pdf::{RenderError, render_pdf};
pub use pipeline::{Pipeline, PipelineError, UploadMeta};
