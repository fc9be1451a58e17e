use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream, dictionary};

/// An invoice with scalars, one loop section and a table
pub const INVOICE_MARKUP: &str = r#"<html>
<head><title>Invoice {{invoiceNumber}}</title><style>p { color: red; }</style></head>
<body>
<h1>Invoice {{invoiceNumber}}</h1>
<p>Customer: {{customerName}}</p>
<p>Date: {{invoiceDate}}</p>
<table>
<tr><th>Item</th><th>Price</th></tr>
{{#lines}}<tr><td>{{linesName}}</td><td>{{linesPrice}}</td></tr>
{{/lines}}</table>
<p><b>Total:</b> {{total}}</p>
</body>
</html>"#;

fn text_widget(doc: &mut LopdfDocument, page_id: ObjectId, name: &str, y: i64) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal(name),
        "Rect" => vec![150.into(), y.into(), 400.into(), (y + 20).into()],
        "P" => page_id,
    })
}

/// Builder for small AcroForm PDFs
pub struct AcroFormBuilder {
    doc: LopdfDocument,
    pages_id: ObjectId,
    page_id: ObjectId,
    annots: Vec<Object>,
    fields: Vec<Object>,
    next_y: i64,
}

impl AcroFormBuilder {
    pub fn new() -> Self {
        let mut doc = LopdfDocument::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        Self { doc, pages_id, page_id, annots: Vec::new(), fields: Vec::new(), next_y: 720 }
    }

    fn next_row(&mut self) -> i64 {
        self.next_y -= 40;
        self.next_y
    }

    pub fn text_field(mut self, name: &str) -> Self {
        let y = self.next_row();
        let id = text_widget(&mut self.doc, self.page_id, name, y);
        self.annots.push(id.into());
        self.fields.push(id.into());
        self
    }

    /// A parent field `group` whose single kid is the text field `child`.
    pub fn grouped_text_field(mut self, group: &str, child: &str) -> Self {
        let y = self.next_row();
        let parent_id = self.doc.new_object_id();
        let child_id = text_widget(&mut self.doc, self.page_id, child, y);
        self.doc
            .get_object_mut(child_id)
            .and_then(Object::as_dict_mut)
            .map(|dict| dict.set("Parent", parent_id))
            .ok();
        self.doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal(group),
                "Kids" => vec![child_id.into()],
            }),
        );
        self.annots.push(child_id.into());
        self.fields.push(parent_id.into());
        self
    }

    /// A checkbox whose "on" appearance state is `on_state`.
    pub fn checkbox(mut self, name: &str, on_state: &str) -> Self {
        let y = self.next_row();
        let on_id = self.doc.add_object(Stream::new(dictionary! {}, b"0 g 0 0 12 12 re f".to_vec()));
        let off_id = self.doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let id = self.doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal(name),
            "V" => "Off",
            "AS" => "Off",
            "Rect" => vec![150.into(), y.into(), 162.into(), (y + 12).into()],
            "P" => self.page_id,
            "AP" => dictionary! { "N" => dictionary! { on_state => on_id, "Off" => off_id } },
        });
        self.annots.push(id.into());
        self.fields.push(id.into());
        self
    }

    pub fn build(mut self) -> LopdfDocument {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 14.into()]),
                Operation::new("Td", vec![50.into(), 760.into()]),
                Operation::new("Tj", vec![Object::string_literal("Application form")]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().unwrap_or_default();
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));
        let font_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        self.doc.objects.insert(
            self.page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Annots" => self.annots,
            }),
        );
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![self.page_id.into()],
                "Count" => 1,
            }),
        );
        let acroform_id = self.doc.add_object(dictionary! { "Fields" => self.fields });
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
            "AcroForm" => acroform_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    pub fn build_bytes(self) -> Vec<u8> {
        let mut doc = self.build();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture PDF must serialize");
        bytes
    }
}

/// The application form used across form-fill tests:
/// `customer_name`, `order.total` and the checkbox `newsletter` (on state `On`).
pub fn application_form() -> Vec<u8> {
    AcroFormBuilder::new()
        .text_field("customer_name")
        .grouped_text_field("order", "total")
        .checkbox("newsletter", "On")
        .build_bytes()
}
