use crate::error::RenderError;
use crate::fonts::{FontFace, encode_win_ansi};
use crate::layout::{DrawOp, PageContent, PageSettings};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

pub const PRODUCER: &str = "stencil";

/// A PDF text string: PDFDocEncoding-compatible ASCII as a literal, anything
/// else as UTF-16BE with a byte order mark.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xfe, 0xff];
        bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn font_resources() -> Dictionary {
    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        };
        fonts.set(face.resource_name(), Object::Dictionary(font));
    }
    fonts
}

fn page_operations(page: &PageContent) -> Vec<Operation> {
    let mut operations = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, face, size, text } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec![face.resource_name().into(), (*size).into()]));
                operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line { from, to, width } => {
                operations.push(Operation::new("w", vec![(*width).into()]));
                operations.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
                operations.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
                operations.push(Operation::new("S", vec![]));
            }
            DrawOp::Rect { x, y, width, height, line_width } => {
                operations.push(Operation::new("w", vec![(*line_width).into()]));
                operations.push(Operation::new(
                    "re",
                    vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()],
                ));
                operations.push(Operation::new("S", vec![]));
            }
        }
    }
    operations
}

/// Builds a complete document from laid-out pages.
pub fn write_document(
    pages: &[PageContent],
    settings: &PageSettings,
    title: Option<&str>,
) -> Result<Document, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = doc.add_object(dictionary! { "Font" => font_resources() });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content { operations: page_operations(page) };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.0.into(), 0.0.into(), settings.width().into(), settings.height().into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! { "Producer" => Object::string_literal(PRODUCER) };
    if let Some(title) = title {
        info.set("Title", text_string(title));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_page(text: &str) -> PageContent {
        PageContent {
            ops: vec![DrawOp::Text { x: 50.0, y: 700.0, face: FontFace::Regular, size: 11.0, text: text.into() }],
        }
    }

    #[test]
    fn test_writes_pages_and_fonts() {
        let pages = vec![text_page("first"), text_page("second")];
        let mut doc = write_document(&pages, &PageSettings::default(), Some("Report")).unwrap();
        assert_eq!(doc.get_pages().len(), 2);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        let first_page = *reloaded.get_pages().get(&1).unwrap();
        let content = reloaded.get_page_content(first_page).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(first) Tj"));

        let raw = String::from_utf8_lossy(&bytes);
        for face in FontFace::ALL {
            assert!(raw.contains(&format!("/{}", face.base_font())), "missing {}", face.base_font());
        }
    }

    #[test]
    fn test_info_title() {
        let doc = write_document(&[text_page("x")], &PageSettings::default(), Some("Grüße")).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        match info.get(b"Title").unwrap() {
            Object::String(bytes, _) => assert_eq!(&bytes[..2], &[0xfe, 0xff]),
            other => panic!("unexpected title object {:?}", other),
        }
    }

    #[test]
    fn test_text_string_ascii_is_literal() {
        match text_string("Plain") {
            Object::String(bytes, StringFormat::Literal) => assert_eq!(bytes, b"Plain"),
            other => panic!("unexpected object {:?}", other),
        }
    }
}
