pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod extractor;
pub mod lsp;
pub mod model;
pub mod server;
pub mod terminal;

use std::path::Path;

pub use controller::{Activation, Controller, EditorHost, InboundMessage, InputSurface, OutboundMessage};
pub use document::{DocumentId, Position, SourceDocument, TextDocument};
pub use error::{MqmError, Result};
pub use extractor::{Extractor, MediaQueryEntry, SourceRange};
pub use model::{ListModel, ListView, RevealTarget, TreeItem, TreeSurface};

/// Extract the `@media` blocks of a CSS source string with default settings.
pub fn extract(source: &str) -> Vec<MediaQueryEntry> {
    Extractor::default().extract(source)
}

/// Extract and keep only entries whose label contains `filter`,
/// case-insensitively. An empty filter keeps everything.
pub fn extract_filtered(extractor: &Extractor, source: &str, filter: &str) -> Vec<MediaQueryEntry> {
    let mut model = ListModel::new(());
    model.replace(None, extractor.extract(source), filter);
    model.visible_entries().into_iter().cloned().collect()
}

/// Read a file and load it as a document identified by its path.
pub fn load_document(path: &Path) -> Result<SourceDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| MqmError::io(path, e))?;
    Ok(SourceDocument::new(
        DocumentId::new(path.display().to_string()),
        text,
    ))
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn end_to_end_default_extract() {
        let css = "@media only screen and (max-width: 768px) {\n  nav { display: none; }\n}\n";
        let entries = extract(css);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "(max-width: 768px) (Line 1)");
    }

    #[test]
    fn filtered_extract() {
        let css = "@media (min-width: 1px) {}\n@media print {}\n";
        let kept = extract_filtered(&Extractor::default(), css, "PRINT");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line, 2);
        assert_eq!(extract_filtered(&Extractor::default(), css, "").len(), 2);
    }

    #[test]
    fn load_missing_document_errors() {
        let err = load_document(Path::new("/definitely/not/here.css")).unwrap_err();
        assert!(matches!(err, MqmError::Io { .. }));
    }

    #[test]
    fn load_document_uses_path_as_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.css");
        std::fs::write(&path, "@media print {}").unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.id().as_str(), path.display().to_string());
        assert_eq!(extract(doc.text()).len(), 1);
    }
}
