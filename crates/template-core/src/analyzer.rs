//! Template analysis: which names a template expects and a payload that fills them.

use crate::scanner::{self, MarkerKind};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use stencil_types::{AnalysisResult, DataPayload, DataValue, LoopItem, ScalarValue};

/// Name fragments that pick a sample value, checked in order. The first
/// fragment contained in the lowercased name wins.
const SAMPLE_RULES: &[(&[&str], &str)] = &[
    (&["date"], "2024-03-15"),
    (&["time"], "14:30:00"),
    (&["amount", "price", "total"], "1000.00"),
    (&["email"], "user@example.com"),
    (&["phone"], "+1-234-567-8900"),
    (&["number"], "12345"),
    (&["name"], "John Doe"),
    (&["address"], "123 Main St, City, Country"),
];

/// A representative value for a variable, chosen from its name.
///
/// ```
/// use stencil_template_core::sample_value;
///
/// assert_eq!(sample_value("invoiceDate").to_string(), "2024-03-15");
/// assert_eq!(sample_value("colour").to_string(), "Sample colour");
/// ```
pub fn sample_value(variable: &str) -> ScalarValue {
    let lowered = variable.to_lowercase();
    SAMPLE_RULES
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| lowered.contains(f)))
        .map(|(_, sample)| ScalarValue::from(*sample))
        .unwrap_or_else(|| ScalarValue::Text(format!("Sample {}", variable)))
}

fn default_loop_item(loop_name: &str) -> LoopItem {
    LoopItem::new()
        .with("id", 1i64)
        .with("value", format!("Sample {} item", loop_name))
}

/// Reports the variables and loops of a template.
///
/// Analysis never fails; content without markers yields an empty result.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAnalyzer;

impl TemplateAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes marker-bearing template text.
    ///
    /// Names are trimmed. Scalar markers inside a well-formed loop body are
    /// reported as that loop's fields rather than as top-level variables.
    pub fn analyze(&self, content: &str) -> AnalysisResult {
        let spans = scanner::loop_spans(content);
        let in_loop_body = |offset: usize| spans.iter().any(|span| span.body.contains(&offset));

        let variables: BTreeSet<String> = scanner::markers(content)
            .filter(|m| m.kind == MarkerKind::Scalar && !in_loop_body(m.range.start))
            .map(|m| m.raw.trim())
            .filter(|name| !name.is_empty() && !name.starts_with('#') && !name.starts_with('/'))
            .map(str::to_string)
            .collect();

        let loops: BTreeSet<String> = scanner::loop_open_names(content)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        let mut loop_fields: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for span in &spans {
            let fields = loop_fields.entry(span.name.trim().to_string()).or_default();
            fields.extend(
                scanner::markers(span.body_text(content))
                    .filter(|m| m.kind == MarkerKind::Scalar)
                    .map(|m| m.raw.trim())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }

        debug!(
            "Analyzed template: {} variable(s), {} loop(s)",
            variables.len(),
            loops.len()
        );

        let sample_data = build_sample_data(&variables, &loops, &loop_fields);
        AnalysisResult { variables, loops, loop_fields, sample_data }
    }

    /// Analyzes a fillable form, whose variables are its field names.
    pub fn analyze_fields<I, S>(&self, field_names: I) -> AnalysisResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let variables: BTreeSet<String> = field_names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let sample_data = build_sample_data(&variables, &BTreeSet::new(), &BTreeMap::new());
        AnalysisResult { variables, sample_data, ..AnalysisResult::default() }
    }
}

fn build_sample_data(
    variables: &BTreeSet<String>,
    loops: &BTreeSet<String>,
    loop_fields: &BTreeMap<String, BTreeSet<String>>,
) -> DataPayload {
    let mut sample = DataPayload::new();
    for variable in variables {
        sample.insert(variable.clone(), DataValue::Scalar(sample_value(variable)));
    }
    for name in loops {
        let item: LoopItem = match loop_fields.get(name) {
            Some(fields) if !fields.is_empty() => {
                fields.iter().map(|field| (field.clone(), sample_value(field))).collect()
            }
            _ => default_loop_item(name),
        };
        sample.insert(name.clone(), vec![item]);
    }
    sample
}
