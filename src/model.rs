//! The list behind the panel: every block of the active document, an
//! optional filter, and the surface that gets told to re-render.

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::extractor::{MediaQueryEntry, SourceRange};

/// Activation payload of a tree item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTarget {
    pub document: DocumentId,
    pub range: SourceRange,
}

/// One row of the flat tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub label: String,
    pub line: usize,
    pub target: RevealTarget,
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct ListView<'a> {
    pub document: Option<&'a DocumentId>,
    pub entries: Vec<&'a MediaQueryEntry>,
    /// `false` means `entries` is the full list.
    pub filtering: bool,
    pub revision: u64,
}

impl ListView<'_> {
    /// Rows for a tree surface. Empty when there is no document.
    pub fn items(&self) -> Vec<TreeItem> {
        let Some(document) = self.document else {
            return Vec::new();
        };
        self.entries
            .iter()
            .map(|e| TreeItem {
                label: e.label.clone(),
                line: e.line,
                target: RevealTarget {
                    document: document.clone(),
                    range: e.range,
                },
            })
            .collect()
    }
}

/// Renders the list. Called once after every model mutation.
pub trait TreeSurface {
    fn data_changed(&mut self, view: &ListView<'_>);
}

/// A surface that renders nothing.
impl TreeSurface for () {
    fn data_changed(&mut self, _view: &ListView<'_>) {}
}

pub struct ListModel<S> {
    document: Option<DocumentId>,
    entries: Vec<MediaQueryEntry>,
    /// Lowercased; `None` when filtering is off.
    filter: Option<String>,
    revision: u64,
    surface: S,
}

impl<S: TreeSurface> ListModel<S> {
    pub fn new(surface: S) -> Self {
        Self {
            document: None,
            entries: Vec::new(),
            filter: None,
            revision: 0,
            surface,
        }
    }

    /// Replace the entries wholesale.
    pub fn set_entries(&mut self, entries: Vec<MediaQueryEntry>) {
        self.entries = entries;
        self.notify();
    }

    /// Set the filter text. Empty text turns filtering off.
    pub fn set_filter(&mut self, text: &str) {
        self.filter = normalize_filter(text);
        self.notify();
    }

    /// Swap document, entries and filter in a single mutation.
    pub fn replace(
        &mut self,
        document: Option<DocumentId>,
        entries: Vec<MediaQueryEntry>,
        filter: &str,
    ) {
        self.document = document;
        self.entries = entries;
        self.filter = normalize_filter(filter);
        self.notify();
    }

    /// No active document: nothing to list, nothing to filter.
    pub fn clear(&mut self) {
        self.replace(None, Vec::new(), "");
    }

    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    pub fn all_entries(&self) -> &[MediaQueryEntry] {
        &self.entries
    }

    pub fn filter_text(&self) -> &str {
        self.filter.as_deref().unwrap_or("")
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn visible_entries(&self) -> Vec<&MediaQueryEntry> {
        visible(&self.entries, self.filter.as_deref())
    }

    pub fn view(&self) -> ListView<'_> {
        ListView {
            document: self.document.as_ref(),
            entries: self.visible_entries(),
            filtering: self.is_filtering(),
            revision: self.revision,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn notify(&mut self) {
        self.revision += 1;
        let view = ListView {
            document: self.document.as_ref(),
            entries: visible(&self.entries, self.filter.as_deref()),
            filtering: self.filter.is_some(),
            revision: self.revision,
        };
        self.surface.data_changed(&view);
    }
}

fn normalize_filter(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_lowercase())
    }
}

fn visible<'a>(entries: &'a [MediaQueryEntry], filter: Option<&str>) -> Vec<&'a MediaQueryEntry> {
    match filter {
        None => entries.iter().collect(),
        Some(needle) => entries
            .iter()
            .filter(|e| e.label.to_lowercase().contains(needle))
            .collect(),
    }
}
