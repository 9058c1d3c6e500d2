//! Inline document context built from reference files.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use crate::types::{FileId, ReferenceFile};

/// Combined context shorter than this is treated as unprocessed files.
pub const MIN_CONTEXT_CHARS: usize = 100;

/// Documents among `files` whose id is in `ids` and that carry extracted
/// text, in listing order.
#[must_use]
pub fn select_documents<'a>(files: &'a [ReferenceFile], ids: &[FileId]) -> Vec<&'a ReferenceFile> {
    files
        .iter()
        .filter(|f| ids.contains(&f.id) && f.text().is_some())
        .collect()
}

/// Concatenate documents, each under a numbered banner naming the file.
#[must_use]
pub fn combine_documents(docs: &[&ReferenceFile]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "\n\n=== DOCUMENT {}: {} ===\n{}",
                i + 1,
                doc.file_name,
                doc.text().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether a combined context, banners included, is long enough to send.
#[must_use]
pub fn has_enough_content(context: &str) -> bool {
    context.chars().count() >= MIN_CONTEXT_CHARS
}
