// src/services/prompts.rs
use std::path::Path;

use anyhow::{Context, anyhow};
use pdfium_render::prelude::Pdfium;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unknown template slot `{0}`")]
    UnknownSlot(String),

    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

/// The three instruction templates, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Sent verbatim after the style corpus.
    pub start_game: String,
    /// Suspect interrogation template.
    pub ask: String,
    /// Narrator arbitration template.
    pub narrator: String,
}

impl PromptTemplates {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read prompt template {}", path.display()))
        };
        Ok(Self {
            start_game: read("startgame.txt")?,
            ask: read("ask.txt")?,
            narrator: read("narrator.txt")?,
        })
    }
}

/// Where and how much of the style reference to read.
#[derive(Debug, Clone)]
pub struct StyleSource<'a> {
    pub path: &'a Path,
    /// Page cap for PDF references.
    pub max_pages: usize,
    pub max_chars: usize,
    /// Directory holding the pdfium shared library; the system library is used when unset.
    pub pdfium_dir: Option<&'a Path>,
}

/// Reads the style reference: PDF text (first `max_pages` pages) or a plain
/// text file, keeping at most `max_chars` characters.
pub fn load_style_text(source: &StyleSource<'_>) -> anyhow::Result<String> {
    let path = source.path;
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let pages = pdf_pages(path, source.max_pages, source.pdfium_dir)
            .with_context(|| format!("failed to read style reference {}", path.display()))?;
        join_pages(pages, source.max_pages)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read style reference {}", path.display()))?
    };
    Ok(truncate_chars(text, source.max_chars))
}

fn pdf_pages(
    path: &Path,
    max_pages: usize,
    pdfium_dir: Option<&Path>,
) -> anyhow::Result<Vec<String>> {
    let bindings = match pdfium_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| anyhow!("failed to load the pdfium library: {e:?}"))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| anyhow!("not a readable PDF: {e:?}"))?;

    let mut pages = Vec::new();
    for page in document.pages().iter().take(max_pages) {
        let text = page
            .text()
            .map_err(|e| anyhow!("failed to extract page text: {e:?}"))?;
        pages.push(text.all());
    }
    Ok(pages)
}

/// One line per page, at most `max_pages` pages.
fn join_pages(pages: impl IntoIterator<Item = String>, max_pages: usize) -> String {
    pages.into_iter().take(max_pages).fold(String::new(), |mut text, page| {
        text.push_str(&page);
        text.push('\n');
        text
    })
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

/// Fills `{slot}` placeholders. `{{` and `}}` are literal braces.
pub fn render(template: &str, slots: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, n)| n == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(TemplateError::UnbalancedBrace(pos)),
                        Some((_, ch)) => name.push(ch),
                    }
                }
                let value = slots
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or(TemplateError::UnknownSlot(name))?;
                out.push_str(value);
            }
            '}' => {
                if chars.next_if(|&(_, n)| n == '}').is_none() {
                    return Err(TemplateError::UnbalancedBrace(pos));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}
