//! A tolerant HTML reader that reduces markup to a flat list of blocks.
//!
//! Only structure that affects text flow is kept: headings, paragraphs, list
//! items, preformatted text, rules and simple tables, with bold, italic and
//! monospace runs inside them. Unknown elements are treated as inline
//! containers. `head`, `style` and `script` content is dropped apart from the
//! document title.

use crate::error::RenderError;
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("BUG: invalid ENTITY_RE regex literal")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub mono: bool,
}

/// A run of text in one style. A span whose text is `"\n"` is a hard line break.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn is_break(&self) -> bool {
        self.text == "\n"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    /// `marker` is empty for text that continues an item after a nested list.
    ListItem { marker: String, depth: usize, spans: Vec<Span> },
    Preformatted(String),
    Rule,
    /// Rows of cells; every cell is a run of spans.
    Table { rows: Vec<Vec<Vec<Span>>> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupDocument {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

impl MarkupDocument {
    /// Concatenated visible text, for diagnostics and tests.
    pub fn plain_text(&self) -> String {
        fn spans_text(spans: &[Span]) -> String {
            spans.iter().map(|s| s.text.as_str()).collect()
        }
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { spans, .. } | Block::Paragraph(spans) => spans_text(spans),
                Block::ListItem { marker, spans, .. } => format!("{} {}", marker, spans_text(spans)),
                Block::Preformatted(text) => text.clone(),
                Block::Rule => String::new(),
                Block::Table { rows } => rows
                    .iter()
                    .map(|row| row.iter().map(|cell| spans_text(cell)).collect::<Vec<_>>().join(" | "))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug)]
struct ListFrame {
    ordered: bool,
    counter: usize,
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<Vec<Span>>>,
    row: Option<Vec<Vec<Span>>>,
    cell: Option<Vec<Span>>,
}

impl TableBuilder {
    fn finish_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.row.get_or_insert_with(Vec::new).push(trim_spans(cell));
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if let Some(row) = self.row.take()
            && !row.is_empty()
        {
            self.rows.push(row);
        }
    }
}

#[derive(Debug, Default)]
struct BlockCollector {
    document: MarkupDocument,
    spans: Vec<Span>,
    bold: usize,
    italic: usize,
    mono: usize,
    skip: usize,
    in_head: bool,
    title: Option<String>,
    heading: Option<u8>,
    lists: Vec<ListFrame>,
    item_marker: Option<String>,
    table: Option<TableBuilder>,
    table_depth: usize,
    pre: Option<String>,
}

impl BlockCollector {
    fn style(&self) -> SpanStyle {
        SpanStyle { bold: self.bold > 0, italic: self.italic > 0, mono: self.mono > 0 }
    }

    fn target_spans(&mut self) -> &mut Vec<Span> {
        match self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            Some(cell) => cell,
            None => &mut self.spans,
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.skip > 0 {
            return;
        }
        if let Some(title) = self.title.as_mut() {
            title.push_str(text);
            return;
        }
        if self.in_head {
            return;
        }
        if let Some(pre) = self.pre.as_mut() {
            pre.push_str(text);
            return;
        }
        if self.table.as_ref().is_some_and(|t| t.cell.is_none()) {
            // Whitespace between table rows and cells.
            return;
        }

        let style = self.style();
        let spans = self.target_spans();
        let at_line_start = spans
            .last()
            .map(|s| s.is_break() || s.text.ends_with(' '))
            .unwrap_or(true);
        let mut collapsed = collapse_whitespace(text);
        if at_line_start {
            collapsed = collapsed.trim_start().to_string();
        }
        if collapsed.is_empty() {
            return;
        }
        match spans.last_mut() {
            Some(last) if last.style == style && !last.is_break() => last.text.push_str(&collapsed),
            _ => spans.push(Span { text: collapsed, style }),
        }
    }

    fn push_break(&mut self) {
        if self.skip > 0 || self.in_head {
            return;
        }
        if let Some(pre) = self.pre.as_mut() {
            pre.push('\n');
            return;
        }
        let style = self.style();
        self.target_spans().push(Span { text: "\n".to_string(), style });
    }

    /// Closes the pending run of inline content as a block.
    fn flush(&mut self) {
        if self.table.is_some() {
            return;
        }
        let spans = trim_spans(std::mem::take(&mut self.spans));
        if spans.is_empty() {
            return;
        }
        let block = if let Some(level) = self.heading {
            Block::Heading { level, spans }
        } else if let Some(marker) = self.item_marker.take() {
            self.item_marker = Some(String::new());
            Block::ListItem { marker, depth: self.lists.len().max(1), spans }
        } else {
            Block::Paragraph(spans)
        };
        self.document.blocks.push(block);
    }

    fn start(&mut self, name: &str) {
        match name {
            "style" | "script" | "noscript" | "template" => self.skip += 1,
            "head" => self.in_head = true,
            "title" => self.title = Some(String::new()),
            _ if self.skip > 0 || self.in_head => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.heading = name[1..].parse().ok();
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "blockquote"
            | "address" | "figure" | "nav" | "aside" | "body" => self.flush(),
            "br" => self.push_break(),
            "hr" => {
                self.flush();
                if self.table.is_none() {
                    self.document.blocks.push(Block::Rule);
                }
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.push(ListFrame { ordered: name == "ol", counter: 0 });
            }
            "li" => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(frame) if frame.ordered => {
                        frame.counter += 1;
                        format!("{}.", frame.counter)
                    }
                    _ => "\u{2022}".to_string(),
                };
                self.item_marker = Some(marker);
            }
            "pre" => {
                self.flush();
                if self.table.is_none() {
                    self.pre = Some(String::new());
                }
                self.mono += 1;
            }
            "table" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.flush();
                    self.table = Some(TableBuilder::default());
                }
            }
            "tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                    table.row = Some(Vec::new());
                }
            }
            "td" | "th" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                    table.cell = Some(Vec::new());
                }
                if name == "th" {
                    self.bold += 1;
                }
            }
            "b" | "strong" => self.bold += 1,
            "i" | "em" | "cite" | "var" => self.italic += 1,
            "code" | "kbd" | "samp" | "tt" => self.mono += 1,
            _ => {}
        }
    }

    fn end(&mut self, name: &str) {
        match name {
            "style" | "script" | "noscript" | "template" => self.skip = self.skip.saturating_sub(1),
            "head" => self.in_head = false,
            "title" => {
                if let Some(title) = self.title.take() {
                    let title = collapse_whitespace(&title).trim().to_string();
                    if !title.is_empty() && self.document.title.is_none() {
                        self.document.title = Some(title);
                    }
                }
            }
            _ if self.skip > 0 || self.in_head => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.heading = None;
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "blockquote"
            | "address" | "figure" | "nav" | "aside" | "body" => self.flush(),
            "li" => {
                self.flush();
                self.item_marker = None;
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.item_marker = None;
                }
            }
            "pre" => {
                self.mono = self.mono.saturating_sub(1);
                if let Some(pre) = self.pre.take() {
                    let text = pre.strip_prefix('\n').unwrap_or(&pre).trim_end().to_string();
                    if !text.is_empty() {
                        self.document.blocks.push(Block::Preformatted(text));
                    }
                }
            }
            "td" | "th" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                }
                if name == "th" {
                    self.bold = self.bold.saturating_sub(1);
                }
            }
            "tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                }
            }
            "table" => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0
                    && let Some(mut table) = self.table.take()
                {
                    table.finish_row();
                    if !table.rows.is_empty() {
                        self.document.blocks.push(Block::Table { rows: table.rows });
                    }
                }
            }
            "b" | "strong" => self.bold = self.bold.saturating_sub(1),
            "i" | "em" | "cite" | "var" => self.italic = self.italic.saturating_sub(1),
            "code" | "kbd" | "samp" | "tt" => self.mono = self.mono.saturating_sub(1),
            _ => {}
        }
    }

    fn finish(mut self) -> MarkupDocument {
        if let Some(mut table) = self.table.take() {
            table.finish_row();
            if !table.rows.is_empty() {
                self.document.blocks.push(Block::Table { rows: table.rows });
            }
        }
        if let Some(pre) = self.pre.take()
            && !pre.trim().is_empty()
        {
            self.document.blocks.push(Block::Preformatted(pre.trim_end().to_string()));
        }
        self.flush();
        self.document
    }
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "br" | "hr" | "img" | "meta" | "link" | "input" | "col" | "area" | "base" | "wbr" | "source"
    )
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Drops leading and trailing whitespace and breaks from a run of spans.
fn trim_spans(mut spans: Vec<Span>) -> Vec<Span> {
    while spans.first().is_some_and(|s| s.is_break()) {
        spans.remove(0);
    }
    while spans.last().is_some_and(|s| s.is_break()) {
        spans.pop();
    }
    if let Some(last) = spans.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
    }
    spans.retain(|s| !s.text.is_empty());
    if spans.iter().all(|s| s.is_break() || s.text.trim().is_empty()) {
        spans.clear();
    }
    spans
}

/// Escapes `&` characters that do not start an entity reference.
fn escape_stray_ampersands(markup: &str) -> Cow<'_, str> {
    if !markup.contains('&') {
        return Cow::Borrowed(markup);
    }
    let mut out = String::with_capacity(markup.len() + 16);
    let mut last = 0;
    for (index, _) in markup.match_indices('&') {
        let is_entity = ENTITY_RE.find_at(markup, index).is_some_and(|m| m.start() == index);
        if !is_entity {
            out.push_str(&markup[last..index]);
            out.push_str("&amp;");
            last = index + 1;
        }
    }
    out.push_str(&markup[last..]);
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "bull" => '•',
        "euro" => '€',
        "laquo" => '«',
        "raquo" => '»',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "middot" => '·',
        "deg" => '°',
        "times" => '×',
        _ => return None,
    };
    Some(ch.to_string())
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Parses markup into blocks.
///
/// Mismatched and unclosed tags are tolerated. Text that is not markup at all
/// becomes a single paragraph.
pub fn parse_markup(markup: &str) -> Result<MarkupDocument, RenderError> {
    let source = escape_stray_ampersands(markup);
    let mut reader = Reader::from_str(&source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut collector = BlockCollector::default();
    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => {
                let name = element_name(e.local_name().as_ref());
                collector.start(&name);
                if is_void_element(&name) {
                    collector.end(&name);
                }
            }
            XmlEvent::Empty(e) => {
                let name = element_name(e.local_name().as_ref());
                collector.start(&name);
                collector.end(&name);
            }
            XmlEvent::End(e) => {
                let name = element_name(e.local_name().as_ref());
                if !is_void_element(&name) {
                    collector.end(&name);
                }
            }
            XmlEvent::Text(e) => collector.push_text(&String::from_utf8_lossy(&e)),
            XmlEvent::CData(e) => collector.push_text(&String::from_utf8_lossy(&e)),
            XmlEvent::GeneralRef(e) => {
                let name = String::from_utf8_lossy(&e).into_owned();
                match resolve_entity(&name) {
                    Some(text) => collector.push_text(&text),
                    None => collector.push_text(&format!("&{};", name)),
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    Ok(collector.finish())
}
