use super::emoji::strip_emoji;
use serde::{Deserialize, Serialize};

/// Glyph placed in front of every bullet item
pub const BULLET_GLYPH: &str = "•";

const BOLD_DELIMITER: &str = "**";

/// A run of text with a single emphasis style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Inline text made of styled spans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span, merging it into the previous one when the style matches.
    pub fn push(&mut self, span: Span) {
        if span.text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.bold == span.bold => last.text.push_str(&span.text),
            _ => self.spans.push(span),
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Text without any emphasis markers
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Text with `<b>...</b>` around bold spans
    pub fn markup(&self) -> String {
        self.spans
            .iter()
            .map(|span| {
                if span.bold {
                    format!("<b>{}</b>", span.text)
                } else {
                    span.text.clone()
                }
            })
            .collect()
    }

    /// Bold spans only, in order
    pub fn bold_segments(&self) -> Vec<&str> {
        self.spans
            .iter()
            .filter(|s| s.bold)
            .map(|s| s.text.as_str())
            .collect()
    }
}

/// One styled block of a rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Block {
    Title(String),
    Heading(String),
    Body(RichText),
    /// Consecutive bullet lines, each already prefixed with [`BULLET_GLYPH`]
    BulletGroup(Vec<RichText>),
    Spacer,
}

/// Sequence of blocks consumed by the document writers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    blocks: Vec<Block>,
}

impl RenderedDocument {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn title(&self) -> Option<&str> {
        self.blocks.iter().find_map(|block| match block {
            Block::Title(title) => Some(title.as_str()),
            _ => None,
        })
    }

    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn bullet_groups(&self) -> Vec<&[RichText]> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::BulletGroup(items) => Some(items.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn bodies(&self) -> Vec<&RichText> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Body(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

/// Turn loosely structured plan text into styled blocks.
///
/// Text is split on `#`; everything before the first marker is dropped and
/// each following fragment becomes a heading plus its body lines. Consecutive
/// `-` lines are grouped into one bullet block. Never fails: malformed markup
/// only lowers formatting quality.
pub fn render(plan_text: &str, title: &str) -> RenderedDocument {
    let mut blocks = vec![Block::Title(strip_emoji(title))];

    for fragment in plan_text.split('#').skip(1) {
        let mut lines = fragment.lines();
        let heading = strip_emoji(lines.next().unwrap_or_default());
        let body: Vec<&str> = lines.collect();

        // "##" leaves an empty fragment between the two markers
        if heading.is_empty() && body.iter().all(|line| line.trim().is_empty()) {
            continue;
        }

        if !heading.is_empty() {
            blocks.push(Block::Heading(heading));
        }

        let mut bullets: Vec<RichText> = Vec::new();
        for line in body {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_rule(trimmed) {
                continue;
            }

            let cleaned = strip_emoji(trimmed);
            if let Some(item) = cleaned.strip_prefix('-') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                let mut text = RichText::new();
                text.push(Span::plain(format!("{} ", BULLET_GLYPH)));
                for span in translate_bold(item).spans {
                    text.push(span);
                }
                bullets.push(text);
            } else {
                flush_bullets(&mut bullets, &mut blocks);
                let text = translate_bold(&cleaned);
                if !text.is_empty() {
                    blocks.push(Block::Body(text));
                }
            }
        }

        flush_bullets(&mut bullets, &mut blocks);
        blocks.push(Block::Spacer);
    }

    RenderedDocument { blocks }
}

fn flush_bullets(bullets: &mut Vec<RichText>, blocks: &mut Vec<Block>) {
    if !bullets.is_empty() {
        blocks.push(Block::BulletGroup(std::mem::take(bullets)));
    }
}

// Horizontal rules such as "---" or "***"
fn is_rule(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-')
            || line.chars().all(|c| c == '*')
            || line.chars().all(|c| c == '_'))
}

/// Split on `**`; odd segments are bold. An unpaired trailing delimiter is
/// kept as literal text.
pub fn translate_bold(text: &str) -> RichText {
    let parts: Vec<&str> = text.split(BOLD_DELIMITER).collect();
    let unpaired = parts.len() % 2 == 0;
    let last = parts.len() - 1;

    let mut rich = RichText::new();
    for (idx, part) in parts.iter().enumerate() {
        if unpaired && idx == last {
            rich.push(Span::plain(format!("{}{}", BOLD_DELIMITER, part)));
        } else if idx % 2 == 1 {
            rich.push(Span::bold(*part));
        } else {
            rich.push(Span::plain(*part));
        }
    }
    rich
}
