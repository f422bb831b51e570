//! Paginated PDF generation for billing documents.
//!
//! Two document kinds share one rendering pipeline: single-client invoices
//! and filtered billing reports. Line items flow through an A4 page layout
//! with context-driven column elision, and every generated file closes with
//! the total amount spelled out in words.

mod error;
mod fonts;
mod model;
mod pdf;
mod words;

use std::path::{Path, PathBuf};

pub use error::Error;
pub use model::{
    ColumnContext, Document, DocumentInput, DocumentKind, Filters, Homogeneity, IssuerDirectory,
    IssuerProfile, LineItem, Party, RawLine, Status, Totals, build_document,
};
pub use words::amount_in_words;

/// Render a built document to PDF bytes.
///
/// The issuer directory supplies logos and contact lines; an empty directory
/// is valid and yields a document without branding.
pub fn render(doc: &Document, issuers: &IssuerDirectory) -> Result<Vec<u8>, Error> {
    let start = std::time::Instant::now();
    let bytes = pdf::render(doc, issuers)?;
    log::info!(
        "Rendered {} {} ({} line(s), {} bytes) in {:.1}ms",
        doc.kind.slug(),
        doc.identifier,
        doc.lines.len(),
        bytes.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(bytes)
}

/// Conventional file name for a document: `facture-{id}.pdf` for invoices,
/// `rapport_{issue-date}.pdf` for reports.
pub fn document_file_name(doc: &Document) -> String {
    match doc.kind {
        DocumentKind::Invoice => format!("{}-{}.pdf", doc.kind.slug(), doc.identifier),
        DocumentKind::Report => {
            format!("{}_{}.pdf", doc.kind.slug(), doc.issue_date.format("%Y-%m-%d"))
        }
    }
}

/// Render a document and write it under `dir` with its conventional name.
/// Returns the full path of the written file.
pub fn render_to_file(
    doc: &Document,
    issuers: &IssuerDirectory,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let bytes = render(doc, issuers)?;
    let path = dir.join(document_file_name(doc));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
