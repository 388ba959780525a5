//! Transcript document rendering.
//!
//! After a successful run the full transcript can be rendered to a PDF in the
//! documents collection. Rendering is best-effort: a failure here is logged
//! and the run still completes. Naming is deterministic (derived from the
//! originating upload's base name), so re-transcribing an identically-named
//! upload overwrites the prior document.

use crate::defaults;
use crate::error::{ChunkscribeError, Result};
use crate::storage::{ArtifactStore, Collection};
use chrono::Utc;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const BODY_TOP_MM: f32 = 260.0;
const BODY_BOTTOM_MM: f32 = 20.0;
const MAX_LINE_CHARS: usize = 90;

/// Render the transcript to `documents/{base name}.pdf`.
///
/// # Returns
/// The document's file name (not path) for inclusion in the terminal event.
pub fn render_document(
    store: &ArtifactStore,
    upload: &Path,
    transcription: &str,
) -> Result<String> {
    let file_name = document_name(upload);
    let dir = store.collection_dir(Collection::Documents);
    std::fs::create_dir_all(&dir)?;
    let target = dir.join(&file_name);

    let source = upload
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let (doc, page, layer) = PdfDocument::new("Transcript", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;

    let mut current = doc.get_page(page).get_layer(layer);

    // Provenance header
    current.use_text(
        format!("Transcript: {}", source),
        14.0,
        Mm(MARGIN_MM),
        Mm(280.0),
        &font_bold,
    );
    current.use_text(
        format!("Generated: {}", Utc::now().to_rfc3339()),
        9.0,
        Mm(MARGIN_MM),
        Mm(272.0),
        &font,
    );

    let mut y = BODY_TOP_MM;
    for line in wrap_text(transcription, MAX_LINE_CHARS) {
        if y < BODY_BOTTOM_MM {
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        current.use_text(line, 11.0, Mm(MARGIN_MM), Mm(y), &font);
        y -= LINE_HEIGHT_MM;
    }

    let file = File::create(&target)?;
    doc.save(&mut BufWriter::new(file)).map_err(render_err)?;
    Ok(file_name)
}

/// Derive the document name from the originating upload.
///
/// Stored uploads carry a `{millis}-` uniqueness prefix; that prefix is
/// stripped so the document keeps the user-visible base name and re-uploads of
/// the same file map to the same document.
pub fn document_name(upload: &Path) -> String {
    let stem = upload
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());
    let base = match stem.split_once('-') {
        Some((prefix, rest)) if !rest.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stem,
    };
    format!("{}.{}", base, defaults::DOCUMENT_EXT)
}

/// Greedy word wrap; words longer than the limit are hard-split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let (head, tail) = split_at_char_boundary(word, max_chars);
            lines.push(head.to_string());
            word = tail;
        }
        if line.is_empty() {
            line.push_str(word);
        } else if line.len() + 1 + word.len() <= max_chars {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_at_char_boundary(s: &str, max: usize) -> (&str, &str) {
    let mut idx = max.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    s.split_at(idx)
}

fn render_err(e: impl std::fmt::Display) -> ChunkscribeError {
    ChunkscribeError::RenderingFailed {
        message: e.to_string(),
    }
}
