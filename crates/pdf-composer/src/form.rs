//! AcroForm field discovery and value writing.
//!
//! Fields are addressed by their fully-qualified name: the partial names (`T`)
//! of the field and its ancestors joined with `.`. Only terminal fields, the
//! ones that carry a value, are exposed.

use crate::error::ComposerError;
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashSet;

/// Field values treated as "checked" for button fields.
const TRUTHY: [&str; 5] = ["true", "yes", "on", "1", "x"];
const OFF_STATE: &str = "Off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_type(field_type: Option<&[u8]>) -> Self {
        match field_type {
            Some(b"Tx") => FieldKind::Text,
            Some(b"Btn") => FieldKind::Button,
            Some(b"Ch") => FieldKind::Choice,
            Some(b"Sig") => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    /// Object holding the field's value.
    pub id: ObjectId,
    /// Widget annotations that display the field.
    pub widgets: Vec<ObjectId>,
    /// Appearance state names other than `Off`, for button fields.
    pub on_states: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum AcroFormLocation {
    Object(ObjectId),
    InCatalog(ObjectId),
}

/// A loaded PDF together with its form fields.
#[derive(Debug)]
pub struct FormDocument {
    doc: Document,
    acroform: Option<AcroFormLocation>,
    fields: Vec<FormField>,
}

/// Decodes a PDF text string (UTF-16BE with BOM, otherwise PDFDocEncoding
/// read as Latin-1).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xfe, 0xff];
        bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    TRUTHY.iter().any(|t| value.eq_ignore_ascii_case(t))
}

fn partial_name(dict: &Dictionary) -> Option<String> {
    match dict.get(b"T") {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

impl FormDocument {
    /// Loads a PDF and indexes its form fields.
    pub fn load(bytes: &[u8]) -> Result<Self, ComposerError> {
        let doc = Document::load_mem(bytes)?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: Document) -> Result<Self, ComposerError> {
        if doc.is_encrypted() {
            return Err(ComposerError::UnsupportedForm("the template is encrypted".to_string()));
        }
        let mut form = Self { doc, acroform: None, fields: Vec::new() };
        form.index_fields()?;
        debug!("Indexed {} form field(s)", form.fields.len());
        Ok(form)
    }

    fn index_fields(&mut self) -> Result<(), ComposerError> {
        let catalog_id = self.doc.trailer.get(b"Root")?.as_reference()?;
        let catalog = self.doc.get_object(catalog_id)?.as_dict()?;

        let (location, acroform) = match catalog.get(b"AcroForm") {
            Ok(Object::Reference(id)) => (AcroFormLocation::Object(*id), self.doc.get_object(*id)?.as_dict()?),
            Ok(Object::Dictionary(dict)) => (AcroFormLocation::InCatalog(catalog_id), dict),
            _ => return Ok(()),
        };

        let roots: Vec<ObjectId> = match acroform.get(b"Fields") {
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            Ok(Object::Reference(id)) => self
                .doc
                .get_object(*id)?
                .as_array()?
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect(),
            _ => Vec::new(),
        };

        let mut fields = Vec::new();
        let mut visited = HashSet::new();
        for root in roots {
            self.collect_fields(root, None, None, &mut visited, &mut fields)?;
        }

        self.acroform = Some(location);
        self.fields = fields;
        Ok(())
    }

    fn collect_fields(
        &self,
        id: ObjectId,
        parent_name: Option<&str>,
        inherited_type: Option<&[u8]>,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<FormField>,
    ) -> Result<(), ComposerError> {
        if !visited.insert(id) {
            return Ok(());
        }
        let dict = self.doc.get_object(id)?.as_dict()?;

        let name = match (parent_name, partial_name(dict)) {
            (Some(parent), Some(partial)) => format!("{}.{}", parent, partial),
            (Some(parent), None) => parent.to_string(),
            (None, Some(partial)) => partial,
            (None, None) => String::new(),
        };
        let field_type = dict.get(b"FT").and_then(Object::as_name).ok().or(inherited_type);

        let kids: Vec<ObjectId> = match dict.get(b"Kids") {
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => Vec::new(),
        };
        let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) = kids.into_iter().partition(|kid| {
            self.doc
                .get_object(*kid)
                .and_then(Object::as_dict)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        });

        for child in child_fields {
            self.collect_fields(child, Some(&name), field_type, visited, out)?;
        }

        // Terminal: no children with names of their own.
        let is_terminal = !dict.has(b"Kids") || !widgets.is_empty();
        if is_terminal && !name.is_empty() {
            let widgets = if widgets.is_empty() { vec![id] } else { widgets };
            let on_states = self.appearance_states(&widgets);
            out.push(FormField {
                name,
                kind: FieldKind::from_type(field_type),
                id,
                widgets,
                on_states,
            });
        }
        Ok(())
    }

    fn appearance_states(&self, widgets: &[ObjectId]) -> Vec<String> {
        let mut states = Vec::new();
        for widget in widgets {
            let Ok(dict) = self.doc.get_object(*widget).and_then(Object::as_dict) else {
                continue;
            };
            let normal = dict
                .get(b"AP")
                .and_then(|ap| self.resolve_dict(ap))
                .and_then(|ap| ap.get(b"N"))
                .and_then(|n| self.resolve_dict(n));
            if let Ok(normal) = normal {
                for (key, _) in normal.iter() {
                    let state = String::from_utf8_lossy(key).into_owned();
                    if state != OFF_STATE && !states.contains(&state) {
                        states.push(state);
                    }
                }
            }
        }
        states
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> lopdf::Result<&'a Dictionary> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id)?.as_dict(),
            other => other.as_dict(),
        }
    }

    pub fn has_form(&self) -> bool {
        self.acroform.is_some()
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Writes a value into the named field. Returns `Ok(false)` when the form
    /// has no such field.
    pub fn set_field_value(&mut self, name: &str, value: &str) -> Result<bool, ComposerError> {
        let Some(field) = self.field(name).cloned() else {
            return Ok(false);
        };

        match field.kind {
            FieldKind::Button => {
                let state = if field.on_states.iter().any(|s| s == value) {
                    value.to_string()
                } else if is_truthy(value) {
                    field.on_states.first().cloned().unwrap_or_else(|| "Yes".to_string())
                } else {
                    OFF_STATE.to_string()
                };
                self.doc
                    .get_object_mut(field.id)?
                    .as_dict_mut()?
                    .set("V", Object::Name(state.clone().into_bytes()));
                for widget in &field.widgets {
                    let shows_state = self.widget_has_state(*widget, &state);
                    let widget_dict = self.doc.get_object_mut(*widget)?.as_dict_mut()?;
                    let appearance = if shows_state { state.as_str() } else { OFF_STATE };
                    widget_dict.set("AS", Object::Name(appearance.as_bytes().to_vec()));
                }
            }
            _ => {
                self.doc.get_object_mut(field.id)?.as_dict_mut()?.set("V", encode_text_string(value));
                for widget in &field.widgets {
                    // Stale appearances would keep showing the old value.
                    self.doc.get_object_mut(*widget)?.as_dict_mut()?.remove(b"AP");
                }
            }
        }

        self.mark_need_appearances()?;
        debug!("Set form field '{}'", name);
        Ok(true)
    }

    fn widget_has_state(&self, widget: ObjectId, state: &str) -> bool {
        self.appearance_states(&[widget]).iter().any(|s| s == state)
    }

    fn mark_need_appearances(&mut self) -> Result<(), ComposerError> {
        let acroform = match self.acroform {
            Some(AcroFormLocation::Object(id)) => self.doc.get_object_mut(id)?.as_dict_mut()?,
            Some(AcroFormLocation::InCatalog(catalog_id)) => self
                .doc
                .get_object_mut(catalog_id)?
                .as_dict_mut()?
                .get_mut(b"AcroForm")?
                .as_dict_mut()?,
            None => return Ok(()),
        };
        acroform.set("NeedAppearances", Object::Boolean(true));
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }
}
