//! Core template processing for stencil.
//!
//! Templates carry two kinds of markers:
//!
//! - **scalar**: `{{name}}`, replaced by the display string of a payload value
//! - **loop**: `{{#name}} ... {{/name}}`, a section repeated once per item of a
//!   payload list, with the item's fields substituted into each copy
//!
//! A name is any run of one or more characters other than `}`.
//!
//! ## Key Abstractions
//!
//! - **`scanner`**: the shared marker patterns and loop-pair matching
//! - **`TemplateAnalyzer`**: discovers variables and loops and synthesizes sample data
//! - **`SubstitutionEngine`**: expands loops and replaces scalars against a payload

pub mod analyzer;
pub mod error;
pub mod scanner;
pub mod substitution;

pub use analyzer::{TemplateAnalyzer, sample_value};
pub use error::TemplateError;
pub use scanner::{LoopSpan, Marker, MarkerKind};
pub use substitution::{RenderOptions, Rendered, SubstitutionEngine, render};
