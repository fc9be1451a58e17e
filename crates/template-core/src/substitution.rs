//! Substitution of payload values into template text.
//!
//! Rendering runs in three phases over a single working buffer:
//!
//! 1. **Loops**: the first well-formed loop section is replaced by its expansion
//!    and the scan restarts from the top, until no section remains.
//! 2. **Scalars**: each non-list payload value replaces every `{{key}}`.
//! 3. **Leftovers**: any marker still present is reported as a diagnostic.

use crate::error::TemplateError;
use crate::scanner::{self, MarkerKind};
use log::{debug, warn};
use stencil_types::{DataPayload, DataValue, Diagnostic, LoopItem};

/// Upper bound on loop sections replaced in one render. Only reachable when
/// payload values themselves contain loop markers.
pub const MAX_LOOP_EXPANSIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Turn loop-shape problems into errors instead of diagnostics.
    pub strict: bool,
}

impl RenderOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Output text plus everything noticed while producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct SubstitutionEngine {
    options: RenderOptions,
}

impl SubstitutionEngine {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Renders `content` against `data`.
    ///
    /// In the default mode the only error is [`TemplateError::ExpansionLimitExceeded`].
    /// Strict mode additionally rejects scalar loop values, nested loops and
    /// unpaired loop markers.
    pub fn render(&self, content: &str, data: &DataPayload) -> Result<Rendered, TemplateError> {
        let mut buffer = content.to_string();
        let mut diagnostics = Vec::new();

        self.expand_loops(&mut buffer, data, &mut diagnostics)?;

        if self.options.strict {
            if let Some(marker) = scanner::markers(&buffer).find(|m| m.kind != MarkerKind::Scalar) {
                return Err(TemplateError::MalformedLoopPair(marker.raw.to_string()));
            }
        }

        for (key, value) in data.scalars() {
            let Some(replacement) = value.display_string() else {
                continue;
            };
            let count = replace_advancing(&mut buffer, &scanner::scalar_marker(key), &replacement);
            if count > 0 {
                debug!("Replaced {} occurrence(s) of '{}'", count, key);
            }
        }

        for marker in scanner::markers(&buffer) {
            let diagnostic = match marker.kind {
                MarkerKind::Scalar => Diagnostic::UnresolvedPlaceholder { name: marker.raw.to_string() },
                MarkerKind::LoopOpen | MarkerKind::LoopClose => {
                    Diagnostic::MalformedLoopPair { marker: marker.raw.to_string() }
                }
            };
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        }

        Ok(Rendered { output: buffer, diagnostics })
    }

    fn expand_loops(
        &self,
        buffer: &mut String,
        data: &DataPayload,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), TemplateError> {
        let mut expansions = 0usize;
        loop {
            let Some(span) = scanner::find_first_loop(buffer) else {
                return Ok(());
            };
            expansions += 1;
            if expansions > MAX_LOOP_EXPANSIONS {
                return Err(TemplateError::ExpansionLimitExceeded(MAX_LOOP_EXPANSIONS));
            }

            let name = span.name.to_string();
            let range = span.range.clone();
            let body = span.body_text(buffer).to_string();

            for inner in scanner::loop_open_names(&body) {
                if self.options.strict {
                    return Err(TemplateError::NestedLoop { outer: name, inner: inner.to_string() });
                }
                let diagnostic = Diagnostic::NestedLoop { outer: name.clone(), inner: inner.to_string() };
                warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }

            let expansion = match data.get(&name) {
                Some(DataValue::List(items)) => {
                    debug!("Expanding loop '{}' with {} item(s)", name, items.len());
                    expand_items(&body, items)
                }
                Some(DataValue::Scalar(_)) => {
                    if self.options.strict {
                        return Err(TemplateError::LoopValueNotList(name));
                    }
                    let diagnostic = Diagnostic::LoopValueNotList { name };
                    warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                    String::new()
                }
                None => {
                    let diagnostic = Diagnostic::MissingLoopData { name };
                    warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                    String::new()
                }
            };

            buffer.replace_range(range, &expansion);
        }
    }
}

/// Renders with default options.
pub fn render(content: &str, data: &DataPayload) -> Result<Rendered, TemplateError> {
    SubstitutionEngine::default().render(content, data)
}

/// One copy of `body` per item, each with that item's fields substituted.
/// Fields the item lacks are left for the scalar phase.
fn expand_items(body: &str, items: &[LoopItem]) -> String {
    let mut expanded = String::with_capacity(body.len() * items.len());
    for item in items {
        let mut copy = body.to_string();
        for (key, value) in item.iter() {
            if let Some(replacement) = value.display_string() {
                copy = copy.replace(&scanner::scalar_marker(key), &replacement);
            }
        }
        expanded.push_str(&copy);
    }
    expanded
}

/// Replaces every occurrence of `placeholder`, resuming the search after each
/// inserted replacement so replacements are never rescanned.
fn replace_advancing(buffer: &mut String, placeholder: &str, replacement: &str) -> usize {
    let mut count = 0;
    let mut cursor = 0;
    while let Some(offset) = buffer[cursor..].find(placeholder) {
        let at = cursor + offset;
        buffer.replace_range(at..at + placeholder.len(), replacement);
        cursor = at + replacement.len();
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stencil_types::LoopItem;

    fn payload(value: serde_json::Value) -> DataPayload {
        DataPayload::from_json(value).unwrap()
    }

    fn render_ok(content: &str, data: &DataPayload) -> Rendered {
        render(content, data).unwrap()
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    #[test]
    fn test_scalar_substitution() {
        let out = render_ok("Hello {{name}}", &payload(json!({ "name": "Ann" })));
        assert_eq!(out.output, "Hello Ann");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let out = render_ok("{{a}}-{{a}}-{{a}}", &payload(json!({ "a": 1 })));
        assert_eq!(out.output, "1-1-1");
    }

    #[test]
    fn test_replacement_text_is_not_rescanned() {
        let out = render_ok("{{a}} {{b}}", &payload(json!({ "a": "{{a}}", "b": "x" })));
        assert_eq!(out.output, "{{a}} x");
    }

    #[test]
    fn test_numbers_and_booleans_use_display_form() {
        let out = render_ok(
            "{{n}} {{f}} {{ok}}",
            &payload(json!({ "n": 42, "f": 1.5, "ok": true })),
        );
        assert_eq!(out.output, "42 1.5 true");
    }

    #[test]
    fn test_null_values_leave_marker_in_place() {
        let out = render_ok("[{{gone}}]", &payload(json!({ "gone": null })));
        assert_eq!(out.output, "[{{gone}}]");
        assert_eq!(out.diagnostics, vec![Diagnostic::UnresolvedPlaceholder { name: "gone".into() }]);
    }

    #[test]
    fn test_marker_names_are_matched_literally() {
        let out = render_ok("{{ name }} {{name}}", &payload(json!({ "name": "Ann" })));
        assert_eq!(out.output, "{{ name }} Ann");
    }

    #[test]
    fn test_unresolved_placeholder_is_retained_and_reported() {
        let out = render_ok("{{missing}}", &DataPayload::new());
        assert_eq!(out.output, "{{missing}}");
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::UnresolvedPlaceholder { name: "missing".into() }]
        );
    }

    #[test]
    fn test_text_without_markers_is_identity() {
        let text = "<p>Plain { text } with braces}}</p>";
        let out = render_ok(text, &payload(json!({ "x": 1 })));
        assert_eq!(out.output, text);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_multibyte_text_around_markers() {
        let out = render_ok("Grüße, {{name}}! ✓", &payload(json!({ "name": "Jürgen" })));
        assert_eq!(out.output, "Grüße, Jürgen! ✓");
    }

    // ========================================================================
    // Loops
    // ========================================================================

    #[test]
    fn test_loop_expands_once_per_item() {
        let data = payload(json!({ "items": [{ "n": "A" }, { "n": "B" }] }));
        let out = render_ok("{{#items}}- {{n}}\n{{/items}}", &data);
        assert_eq!(out.output, "- A\n- B\n");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_loop_data_removes_section() {
        let out = render_ok("before{{#items}}x{{/items}}after", &DataPayload::new());
        assert_eq!(out.output, "beforeafter");
        assert_eq!(out.diagnostics, vec![Diagnostic::MissingLoopData { name: "items".into() }]);
    }

    #[test]
    fn test_empty_list_removes_section_without_diagnostic() {
        let out = render_ok("a{{#items}}x{{/items}}b", &payload(json!({ "items": [] })));
        assert_eq!(out.output, "ab");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_scalar_loop_value_removes_section_with_diagnostic() {
        let out = render_ok("a{{#items}}x{{/items}}b", &payload(json!({ "items": "nope" })));
        assert_eq!(out.output, "ab");
        assert_eq!(out.diagnostics, vec![Diagnostic::LoopValueNotList { name: "items".into() }]);
    }

    #[test]
    fn test_repeated_loop_sections_each_expand() {
        let data = payload(json!({ "r": [{ "v": 1 }, { "v": 2 }] }));
        let out = render_ok("{{#r}}{{v}}{{/r}}|{{#r}}<{{v}}>{{/r}}", &data);
        assert_eq!(out.output, "12|<1><2>");
    }

    #[test]
    fn test_absent_item_field_falls_through_to_scalar_phase() {
        let data = DataPayload::new()
            .with("label", "L")
            .with("items", vec![LoopItem::new().with("value", 1i64)]);
        let out = render_ok("{{#items}}{{label}}: {{value}}; {{other}}{{/items}}", &data);
        assert_eq!(out.output, "L: 1; {{other}}");
        assert_eq!(out.diagnostics, vec![Diagnostic::UnresolvedPlaceholder { name: "other".into() }]);
    }

    #[test]
    fn test_loop_and_scalars_together() {
        let data = payload(json!({
            "customer": "Ann",
            "lines": [{ "sku": "A1", "qty": 2 }, { "sku": "B2", "qty": 1 }]
        }));
        let template = "<h1>{{customer}}</h1><ul>{{#lines}}<li>{{sku}} x{{qty}}</li>{{/lines}}</ul>";
        let out = render_ok(template, &data);
        assert_eq!(out.output, "<h1>Ann</h1><ul><li>A1 x2</li><li>B2 x1</li></ul>");
    }

    #[test]
    fn test_unpaired_loop_marker_is_reported_and_kept() {
        let out = render_ok("{{#items}} no close", &payload(json!({ "items": [] })));
        assert_eq!(out.output, "{{#items}} no close");
        assert_eq!(out.diagnostics, vec![Diagnostic::MalformedLoopPair { marker: "#items".into() }]);
    }

    #[test]
    fn test_nested_loop_is_reported_in_default_mode() {
        let data = payload(json!({ "a": [{ "x": 1 }] }));
        let out = render_ok("{{#a}}[{{#b}}{{x}}{{/b}}]{{/a}}", &data);
        assert!(out.diagnostics.contains(&Diagnostic::NestedLoop { outer: "a".into(), inner: "b".into() }));
    }

    #[test]
    fn test_self_reintroducing_loop_hits_expansion_limit() {
        let data = payload(json!({ "a": [{ "f": "{{#a}}{{f}}{{/a}}" }] }));
        let result = render("{{#a}}{{f}}{{/a}}", &data);
        assert_eq!(result, Err(TemplateError::ExpansionLimitExceeded(MAX_LOOP_EXPANSIONS)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let data = payload(json!({ "b": 2, "a": 1, "rows": [{ "x": "y" }] }));
        let template = "{{a}}{{b}}{{#rows}}{{x}}{{/rows}}{{c}}";
        assert_eq!(render_ok(template, &data), render_ok(template, &data));
    }

    // ========================================================================
    // Strict mode
    // ========================================================================

    #[test]
    fn test_strict_rejects_scalar_loop_value() {
        let engine = SubstitutionEngine::new(RenderOptions::strict());
        let result = engine.render("{{#items}}x{{/items}}", &payload(json!({ "items": 3 })));
        assert_eq!(result, Err(TemplateError::LoopValueNotList("items".into())));
    }

    #[test]
    fn test_strict_rejects_unpaired_marker() {
        let engine = SubstitutionEngine::new(RenderOptions::strict());
        let result = engine.render("x{{/items}}", &DataPayload::new());
        assert_eq!(result, Err(TemplateError::MalformedLoopPair("/items".into())));
    }

    #[test]
    fn test_strict_rejects_nested_loop() {
        let engine = SubstitutionEngine::new(RenderOptions::strict());
        let result = engine.render("{{#a}}{{#b}}{{/b}}{{/a}}", &DataPayload::new());
        assert!(matches!(result, Err(TemplateError::NestedLoop { .. })));
    }

    #[test]
    fn test_strict_still_tolerates_missing_data() {
        let engine = SubstitutionEngine::new(RenderOptions::strict());
        let out = engine.render("{{#items}}x{{/items}}{{name}}", &DataPayload::new()).unwrap();
        assert_eq!(out.output, "{{name}}");
        assert_eq!(out.diagnostics.len(), 2);
    }

    #[test]
    fn test_replace_advancing_counts() {
        let mut buffer = String::from("{{x}}{{x}}");
        assert_eq!(replace_advancing(&mut buffer, "{{x}}", "{{x}}{{x}}"), 2);
        assert_eq!(buffer, "{{x}}{{x}}{{x}}{{x}}");
    }
}
