pub mod analysis;
pub mod diagnostics;
pub mod payload;
pub mod template;

pub use analysis::AnalysisResult;
pub use diagnostics::Diagnostic;
pub use payload::{DataPayload, DataValue, LoopItem, PayloadError, ScalarValue};
pub use template::{GenerationRequest, TemplateKind, TemplateKindError, TemplateRecord};
