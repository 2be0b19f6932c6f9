//! Theme engine and template rendering.
//!
//! Provides Tera-based page rendering against a shared [`TemplateData`]
//! envelope.

mod data;
mod engine;

pub use data::TemplateData;
pub use engine::{RenderError, ThemeEngine, human_date};
