use super::markdown::{Block, RenderedDocument, RichText, Span};
use crate::error::{Result, TravelError};
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, ObjectId, Stream,
};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN_X: f32 = 56.0;
const BODY_TOP: f32 = PAGE_HEIGHT - 90.0;
const BODY_BOTTOM: f32 = 60.0;
const HEADER_Y: f32 = PAGE_HEIGHT - 45.0;
const FOOTER_Y: f32 = 30.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const HEADER_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 8.0;
const LINE_SPACING: f32 = 1.35;
const BULLET_INDENT: f32 = 14.0;
const SPACER_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone)]
struct Run {
    font: Font,
    text: String,
}

#[derive(Debug, Clone)]
struct Line {
    x: f32,
    y: f32,
    size: f32,
    runs: Vec<Run>,
}

/// Paginated layout of a rendered document
#[derive(Debug, Default)]
struct Layout {
    pages: Vec<Vec<Line>>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: BODY_TOP,
        }
    }

    fn advance(&mut self, height: f32) -> f32 {
        if self.cursor - height < BODY_BOTTOM {
            self.pages.push(Vec::new());
            self.cursor = BODY_TOP;
        }
        self.cursor -= height;
        self.cursor
    }

    fn push_line(&mut self, x: f32, size: f32, runs: Vec<Run>) {
        let y = self.advance(size * LINE_SPACING);
        if let Some(page) = self.pages.last_mut() {
            page.push(Line { x, y, size, runs });
        }
    }

    fn skip(&mut self, height: f32) {
        if self.cursor - height >= BODY_BOTTOM {
            self.cursor -= height;
        }
    }

    fn push_wrapped(&mut self, text: &RichText, size: f32, x: f32, hanging: f32) {
        let mut first = true;
        for runs in wrap(text, size, PAGE_WIDTH - MARGIN_X - x) {
            let indent = if first { 0.0 } else { hanging };
            self.push_line(x + indent, size, runs);
            first = false;
        }
    }
}

/// Lay out `document` on A4 pages and encode it as PDF bytes.
///
/// Every page carries `header` centred at the top and a `Page N` footer.
pub fn write_pdf(document: &RenderedDocument, header: &str) -> Result<Vec<u8>> {
    let layout = layout_document(document);
    encode(&layout, header)
}

fn layout_document(document: &RenderedDocument) -> Layout {
    let mut layout = Layout::new();

    for block in document.blocks() {
        match block {
            Block::Title(title) => {
                layout.push_wrapped(&single(title, true), TITLE_SIZE, MARGIN_X, 0.0);
                layout.skip(SPACER_HEIGHT);
            }
            Block::Heading(heading) => {
                layout.skip(BODY_SIZE * 0.5);
                layout.push_wrapped(&single(heading, true), HEADING_SIZE, MARGIN_X, 0.0);
            }
            Block::Body(text) => layout.push_wrapped(text, BODY_SIZE, MARGIN_X, 0.0),
            Block::BulletGroup(items) => {
                let hanging = text_width("• ", BODY_SIZE, Font::Regular);
                for item in items {
                    layout.push_wrapped(item, BODY_SIZE, MARGIN_X + BULLET_INDENT, hanging);
                }
            }
            Block::Spacer => layout.skip(SPACER_HEIGHT),
        }
    }

    layout
}

fn single(text: &str, bold: bool) -> RichText {
    let mut rich = RichText::new();
    rich.push(Span {
        text: text.to_string(),
        bold,
    });
    rich
}

#[derive(Debug)]
struct Piece {
    font: Font,
    text: String,
    space_before: bool,
}

// Break spans into words, remembering whether whitespace preceded each one so
// "**Total**:" stays glued together across the style change.
fn pieces(text: &RichText) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut pending_space = false;

    for span in text.spans() {
        let font = if span.bold { Font::Bold } else { Font::Regular };
        let mut current = String::new();
        let mut current_space = pending_space;

        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    pieces.push(Piece {
                        font,
                        text: std::mem::take(&mut current),
                        space_before: current_space,
                    });
                }
                pending_space = true;
                current_space = true;
            } else {
                if current.is_empty() {
                    current_space = pending_space;
                }
                pending_space = false;
                current.push(ch);
            }
        }

        if !current.is_empty() {
            pieces.push(Piece {
                font,
                text: current,
                space_before: current_space,
            });
        }
    }

    pieces
}

fn wrap(text: &RichText, size: f32, max_width: f32) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut width = 0.0;
    let space = text_width(" ", size, Font::Regular);

    for piece in split_overlong(pieces(text), size, max_width) {
        let piece_width = text_width(&piece.text, size, piece.font);
        let gap = if piece.space_before && !line.is_empty() {
            space
        } else {
            0.0
        };

        if !line.is_empty() && width + gap + piece_width > max_width {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
            append(&mut line, piece.font, &piece.text);
            width += piece_width;
            continue;
        }

        if gap > 0.0 {
            append(&mut line, piece.font, " ");
        }
        append(&mut line, piece.font, &piece.text);
        width += gap + piece_width;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_overlong(pieces: Vec<Piece>, size: f32, max_width: f32) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if text_width(&piece.text, size, piece.font) <= max_width {
            out.push(piece);
            continue;
        }
        let mut chunk = String::new();
        let mut space_before = piece.space_before;
        for ch in piece.text.chars() {
            chunk.push(ch);
            if text_width(&chunk, size, piece.font) > max_width && chunk.chars().count() > 1 {
                chunk.pop();
                out.push(Piece {
                    font: piece.font,
                    text: std::mem::take(&mut chunk),
                    space_before,
                });
                space_before = true;
                chunk.push(ch);
            }
        }
        if !chunk.is_empty() {
            out.push(Piece {
                font: piece.font,
                text: chunk,
                space_before,
            });
        }
    }
    out
}

fn append(line: &mut Vec<Run>, font: Font, text: &str) {
    match line.last_mut() {
        Some(run) if run.font == font => run.text.push_str(text),
        _ => line.push(Run {
            font,
            text: text.to_string(),
        }),
    }
}

// Approximate Helvetica advance widths in 1/1000 em.
fn char_width(ch: char, font: Font) -> f32 {
    let base = match ch {
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' | 'I' | 'f' | 't' => 278.0,
        'r' | '(' | ')' | '-' | '[' | ']' => 333.0,
        'm' | 'M' | 'W' => 833.0,
        'w' => 722.0,
        '•' => 350.0,
        '0'..='9' | '$' | '€' => 556.0,
        c if c.is_ascii_uppercase() => 667.0,
        _ => 556.0,
    };
    match font {
        Font::Bold => base * 1.06,
        Font::Regular | Font::Italic => base,
    }
}

fn text_width(text: &str, size: f32, font: Font) -> f32 {
    text.chars().map(|ch| char_width(ch, font)).sum::<f32>() * size / 1000.0
}

/// Encode text for the standard fonts' WinAnsiEncoding; unsupported
/// characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|ch| match ch {
            '\t' => Some(b' '),
            c if (c as u32) < 0x20 => None,
            c if (c as u32) < 0x7F => Some(c as u8),
            c if (0xA0..=0xFF).contains(&(c as u32)) => Some(c as u32 as u8),
            '€' => Some(0x80),
            '…' => Some(0x85),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '™' => Some(0x99),
            _ => Some(b'?'),
        })
        .collect()
}

fn text_operations(x: f32, y: f32, size: f32, runs: &[Run]) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
    ];
    for run in runs {
        ops.push(Operation::new(
            "Tf",
            vec![run.font.resource_name().into(), Object::Real(size)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&run.text))],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn centred(text: &str, size: f32, font: Font, y: f32) -> Vec<Operation> {
    let x = ((PAGE_WIDTH - text_width(text, size, font)) / 2.0).max(MARGIN_X / 2.0);
    text_operations(
        x,
        y,
        size,
        &[Run {
            font,
            text: text.to_string(),
        }],
    )
}

fn font_dictionary(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn encode(layout: &Layout, header: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = font_dictionary(&mut doc, "Helvetica");
    let bold = font_dictionary(&mut doc, "Helvetica-Bold");
    let italic = font_dictionary(&mut doc, "Helvetica-Oblique");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
            "F3" => italic,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for (idx, page) in layout.pages.iter().enumerate() {
        let mut operations = centred(header, HEADER_SIZE, Font::Bold, HEADER_Y);
        for line in page {
            operations.extend(text_operations(line.x, line.y, line.size, &line.runs));
        }
        operations.extend(centred(
            &format!("Page {}", idx + 1),
            FOOTER_SIZE,
            Font::Italic,
            FOOTER_Y,
        ));

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|err| TravelError::Export(format!("failed to encode page content: {err}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
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
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|err| TravelError::Export(format!("failed to write PDF: {err}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markdown::render;

    #[test]
    fn test_wrap_keeps_styles_glued() {
        let text = crate::render::markdown::translate_bold("**Total**: $100");
        let lines = wrap(&text, BODY_SIZE, 400.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[0][0].text, "Total");
        assert_eq!(lines[0][0].font, Font::Bold);
        assert_eq!(lines[0][1].text, ": $100");
    }

    #[test]
    fn test_wrap_breaks_long_lines() {
        let long = "word ".repeat(200);
        let lines = wrap(&single(&long, false), BODY_SIZE, 200.0);
        assert!(lines.len() > 10);
        for line in &lines {
            let width: f32 = line
                .iter()
                .map(|run| text_width(&run.text, BODY_SIZE, run.font))
                .sum();
            assert!(width <= 200.0 + 0.01);
        }
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        let url = "x".repeat(500);
        let lines = wrap(&single(&url, false), BODY_SIZE, 100.0);
        assert!(lines.len() > 1);
        let rebuilt: String = lines.iter().flatten().map(|r| r.text.as_str()).collect();
        assert_eq!(rebuilt.replace(' ', ""), url);
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("a•b"), vec![b'a', 0x95, b'b']);
        assert_eq!(encode_win_ansi("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("東"), vec![b'?']);
    }

    #[test]
    fn test_long_document_paginates() {
        let mut text = String::from("# Itinerary\n");
        for day in 0..200 {
            text.push_str(&format!("- Day {} visit the old town and the harbour\n", day));
        }
        let layout = layout_document(&render(&text, "Plan"));
        assert!(layout.pages.len() > 1);
        for page in &layout.pages {
            for line in page {
                assert!(line.y >= BODY_BOTTOM && line.y <= BODY_TOP);
            }
        }
    }

    // Literal strings drawn with `Tj` on each page, in page order.
    fn page_strings(doc: &Document) -> Vec<Vec<Vec<u8>>> {
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| match op.operands.first() {
                        Some(Object::String(bytes, _)) => Some(bytes.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_every_page_has_header_and_page_number() {
        let mut text = String::from("# Itinerary\n");
        for day in 0..120 {
            text.push_str(&format!("- Day {} visit the old town and the harbour\n", day));
        }
        let header = "Travel Plan – Rome";
        let bytes = write_pdf(&render(&text, "Rome"), header).unwrap();
        let parsed = Document::load_mem(&bytes).unwrap();

        let pages = page_strings(&parsed);
        assert!(pages.len() >= 2);

        let encoded_header = encode_win_ansi(header);
        for (idx, strings) in pages.iter().enumerate() {
            assert_eq!(strings.first(), Some(&encoded_header), "header on page {}", idx + 1);
            let footer = format!("Page {}", idx + 1).into_bytes();
            assert_eq!(strings.last(), Some(&footer));
            assert_eq!(strings.iter().filter(|s| **s == encoded_header).count(), 1);
        }
    }

    #[test]
    fn test_write_pdf_produces_pdf_bytes() {
        let doc = render("# Overview\n**Rome** is lovely\n- Colosseum", "Rome");
        let bytes = write_pdf(&doc, "Travel Plan – Rome").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }
}
