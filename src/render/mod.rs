//! Plan rendering: markdown-like text to styled blocks, and the text and PDF exports

pub mod emoji;
pub mod export;
pub mod markdown;
pub mod pdf;

pub use emoji::strip_emoji;
pub use export::{
    document_header, export_file_stem, pdf_export, save_exports, text_export, ExportPaths,
};
pub use markdown::{render, translate_bold, Block, RenderedDocument, RichText, Span, BULLET_GLYPH};
pub use pdf::write_pdf;
