//! Line breaking and pagination of parsed markup blocks.
//!
//! Coordinates are PDF user space: origin bottom-left, y growing upwards.

use crate::fonts::FontFace;
use crate::markup::{Block, Span};
use serde::{Deserialize, Serialize};

/// Line height as a multiple of the font size.
pub const LEADING: f32 = 1.3;
const LIST_INDENT: f32 = 18.0;
const CELL_PADDING: f32 = 4.0;
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSettings {
    pub size: PageSize,
    /// Margin on every side, in points.
    pub margins: f32,
    /// Body text size, in points. Headings scale from it.
    pub font_size: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self { size: PageSize::A4, margins: 50.0, font_size: 11.0 }
    }
}

impl PageSettings {
    pub fn width(&self) -> f32 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> f32 {
        self.size.dimensions().1
    }

    pub fn content_width(&self) -> f32 {
        (self.width() - 2.0 * self.margins).max(self.font_size)
    }

    fn top(&self) -> f32 {
        self.height() - self.margins
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text placed with its baseline at `y`.
    Text { x: f32, y: f32, face: FontFace, size: f32, text: String },
    Line { from: (f32, f32), to: (f32, f32), width: f32 },
    Rect { x: f32, y: f32, width: f32, height: f32, line_width: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub ops: Vec<DrawOp>,
}

impl PageContent {
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub face: FontFace,
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub fragments: Vec<Fragment>,
    pub width: f32,
}

struct LineBreaker {
    size: f32,
    max_width: f32,
    lines: Vec<Line>,
    current: Line,
    pending_space: Option<FontFace>,
}

impl LineBreaker {
    fn new(size: f32, max_width: f32) -> Self {
        Self { size, max_width, lines: Vec::new(), current: Line::default(), pending_space: None }
    }

    fn append(&mut self, text: &str, face: FontFace) {
        let width = face.text_width(text, self.size);
        self.current.width += width;
        match self.current.fragments.last_mut() {
            Some(last) if last.face == face => {
                last.text.push_str(text);
                last.width += width;
            }
            _ => self.current.fragments.push(Fragment { text: text.to_string(), face, width }),
        }
    }

    fn finish_line(&mut self) {
        self.pending_space = None;
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn push_space(&mut self, face: FontFace) {
        if !self.current.fragments.is_empty() {
            self.pending_space = Some(face);
        }
    }

    fn push_word(&mut self, word: &str, face: FontFace) {
        let word_width = face.text_width(word, self.size);
        let space_width = self.pending_space.map_or(0.0, |f| f.text_width(" ", self.size));

        if !self.current.fragments.is_empty() && self.current.width + space_width + word_width > self.max_width {
            self.finish_line();
        }

        if let Some(space_face) = self.pending_space.take() {
            self.append(" ", space_face);
        }

        if word_width <= self.max_width || !self.current.fragments.is_empty() {
            self.append(word, face);
            return;
        }

        // A single word wider than the line: break it between characters.
        let mut chunk = String::new();
        for ch in word.chars() {
            chunk.push(ch);
            if face.text_width(&chunk, self.size) > self.max_width && chunk.chars().count() > 1 {
                chunk.pop();
                self.append(&chunk, face);
                self.finish_line();
                chunk.clear();
                chunk.push(ch);
            }
        }
        if !chunk.is_empty() {
            self.append(&chunk, face);
        }
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.current.fragments.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }
}

/// Greedy line breaking of styled spans.
///
/// `force_bold` renders every span in its bold variant.
pub fn wrap_spans(spans: &[Span], size: f32, max_width: f32, force_bold: bool) -> Vec<Line> {
    let mut breaker = LineBreaker::new(size, max_width);
    for span in spans {
        if span.is_break() {
            breaker.finish_line();
            continue;
        }
        let face = FontFace::select(span.style.bold || force_bold, span.style.italic, span.style.mono);
        for (index, word) in span.text.split(' ').enumerate() {
            if index > 0 {
                breaker.push_space(face);
            }
            if !word.is_empty() {
                breaker.push_word(word, face);
            }
        }
    }
    breaker.finish()
}

/// Breaks a preformatted line between characters only.
fn hard_wrap(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if face.text_width(&current, size) > max_width && current.chars().count() > 1 {
            current.pop();
            lines.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    lines.push(current);
    lines
}

fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 2.0,
        2 => 1.6,
        3 => 1.35,
        4 => 1.15,
        5 => 1.0,
        _ => 0.9,
    }
}

/// Places blocks on pages.
pub struct PageLayouter<'a> {
    settings: &'a PageSettings,
    pages: Vec<PageContent>,
    current: PageContent,
    cursor_y: f32,
}

impl<'a> PageLayouter<'a> {
    pub fn new(settings: &'a PageSettings) -> Self {
        Self { settings, pages: Vec::new(), current: PageContent::default(), cursor_y: settings.top() }
    }

    fn at_page_top(&self) -> bool {
        self.cursor_y >= self.settings.top()
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor_y = self.settings.top();
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor_y - height < self.settings.margins && !self.at_page_top() {
            self.new_page();
        }
    }

    fn gap(&mut self, amount: f32) {
        if !self.at_page_top() {
            self.cursor_y -= amount;
        }
    }

    fn emit_line(&mut self, line: &Line, x: f32, size: f32) -> f32 {
        let line_height = size * LEADING;
        self.ensure_space(line_height);
        let baseline = self.cursor_y - size;
        let mut offset = x;
        for fragment in &line.fragments {
            self.current.ops.push(DrawOp::Text {
                x: offset,
                y: baseline,
                face: fragment.face,
                size,
                text: fragment.text.clone(),
            });
            offset += fragment.width;
        }
        self.cursor_y -= line_height;
        baseline
    }

    pub fn push_block(&mut self, block: &Block) {
        let base = self.settings.font_size;
        let left = self.settings.margins;
        let width = self.settings.content_width();

        match block {
            Block::Paragraph(spans) => {
                for line in wrap_spans(spans, base, width, false) {
                    self.emit_line(&line, left, base);
                }
                self.gap(base * 0.5);
            }
            Block::Heading { level, spans } => {
                let size = base * heading_scale(*level);
                self.gap(size * 0.4);
                for line in wrap_spans(spans, size, width, true) {
                    self.emit_line(&line, left, size);
                }
                self.gap(size * 0.3);
            }
            Block::ListItem { marker, depth, spans } => {
                let indent = LIST_INDENT * *depth as f32;
                let lines = wrap_spans(spans, base, (width - indent).max(base), false);
                for (index, line) in lines.iter().enumerate() {
                    let baseline = self.emit_line(line, left + indent, base);
                    if index == 0 && !marker.is_empty() {
                        let marker_width = FontFace::Regular.text_width(marker, base);
                        self.current.ops.push(DrawOp::Text {
                            x: left + indent - marker_width - base * 0.4,
                            y: baseline,
                            face: FontFace::Regular,
                            size: base,
                            text: marker.clone(),
                        });
                    }
                }
                self.gap(base * 0.25);
            }
            Block::Preformatted(text) => {
                let size = base * 0.9;
                for raw_line in text.split('\n') {
                    let expanded = raw_line.replace('\t', &" ".repeat(TAB_WIDTH));
                    for piece in hard_wrap(&expanded, FontFace::Mono, size, width) {
                        let line = Line {
                            width: FontFace::Mono.text_width(&piece, size),
                            fragments: vec![Fragment {
                                width: FontFace::Mono.text_width(&piece, size),
                                text: piece,
                                face: FontFace::Mono,
                            }],
                        };
                        self.emit_line(&line, left, size);
                    }
                }
                self.gap(base * 0.5);
            }
            Block::Rule => {
                self.ensure_space(base);
                let y = self.cursor_y - base * 0.5;
                self.current.ops.push(DrawOp::Line { from: (left, y), to: (left + width, y), width: 0.75 });
                self.cursor_y -= base;
            }
            Block::Table { rows } => self.push_table(rows),
        }
    }

    fn push_table(&mut self, rows: &[Vec<Vec<Span>>]) {
        let base = self.settings.font_size;
        let left = self.settings.margins;
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let column_width = self.settings.content_width() / columns as f32;
        let line_height = base * LEADING;

        for row in rows {
            let wrapped: Vec<Vec<Line>> = row
                .iter()
                .map(|cell| wrap_spans(cell, base, (column_width - 2.0 * CELL_PADDING).max(base), false))
                .collect();
            let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
            let row_height = line_count as f32 * line_height + 2.0 * CELL_PADDING;

            self.ensure_space(row_height);
            let row_top = self.cursor_y;

            for column in 0..columns {
                let x = left + column as f32 * column_width;
                self.current.ops.push(DrawOp::Rect {
                    x,
                    y: row_top - row_height,
                    width: column_width,
                    height: row_height,
                    line_width: 0.5,
                });
                let Some(lines) = wrapped.get(column) else {
                    continue;
                };
                for (index, line) in lines.iter().enumerate() {
                    let baseline = row_top - CELL_PADDING - index as f32 * line_height - base;
                    let mut offset = x + CELL_PADDING;
                    for fragment in &line.fragments {
                        self.current.ops.push(DrawOp::Text {
                            x: offset,
                            y: baseline,
                            face: fragment.face,
                            size: base,
                            text: fragment.text.clone(),
                        });
                        offset += fragment.width;
                    }
                }
            }
            self.cursor_y = row_top - row_height;
        }
        self.gap(base * 0.5);
    }

    /// Finishes layout. There is always at least one page.
    pub fn finish(mut self) -> Vec<PageContent> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

pub fn layout_blocks(blocks: &[Block], settings: &PageSettings) -> Vec<PageContent> {
    let mut layouter = PageLayouter::new(settings);
    for block in blocks {
        layouter.push_block(block);
    }
    layouter.finish()
}
