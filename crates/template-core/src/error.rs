use thiserror::Error;

/// Errors that abort a render. Only raised in strict mode, or when loop
/// expansion runs away.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Loop '{0}' expects a list of items but the payload holds a scalar")]
    LoopValueNotList(String),

    #[error("Loop marker without a matching partner: {{{{{0}}}}}")]
    MalformedLoopPair(String),

    #[error("Loop '{outer}' contains nested loop '{inner}', which is not supported")]
    NestedLoop { outer: String, inner: String },

    #[error("Loop expansion exceeded {0} iterations; payload values may be re-introducing loop markers")]
    ExpansionLimitExceeded(usize),
}
