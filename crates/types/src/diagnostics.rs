use serde::Serialize;
use std::fmt;

/// A non-fatal condition observed while rendering or filling a template.
///
/// Diagnostics never block a result; they are returned next to it and logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A loop marker had no data key, so the section rendered empty.
    MissingLoopData { name: String },
    /// A loop marker's data key held a scalar instead of a list; the section rendered empty.
    LoopValueNotList { name: String },
    /// A loop open or close marker without a matching partner, left as literal text.
    MalformedLoopPair { marker: String },
    /// A loop body containing another loop's open marker. Nested loops are not supported.
    NestedLoop { outer: String, inner: String },
    /// A scalar marker left in the output because no data was supplied for it.
    UnresolvedPlaceholder { name: String },
    /// A payload key with no matching field in a form template.
    UnknownFormField { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingLoopData { name } => write!(f, "No data found for loop: {}", name),
            Diagnostic::LoopValueNotList { name } => {
                write!(f, "Data for loop '{}' is not a list; section omitted", name)
            }
            Diagnostic::MalformedLoopPair { marker } => {
                write!(f, "Loop marker without a matching partner: {{{{{}}}}}", marker)
            }
            Diagnostic::NestedLoop { outer, inner } => write!(
                f,
                "Loop '{}' contains nested loop '{}', which is not supported",
                outer, inner
            ),
            Diagnostic::UnresolvedPlaceholder { name } => {
                write!(f, "Unreplaced template variable found: {}", name)
            }
            Diagnostic::UnknownFormField { name } => write!(f, "Field not found in PDF form: {}", name),
        }
    }
}
