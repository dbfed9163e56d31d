//! Event wiring between the host editor, the list and the filter box.
//!
//! Every handler runs to completion before the next event is delivered;
//! hosts serialize delivery (a single channel, a mutex, or the LSP
//! dispatcher), so the controller itself holds no locks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{DocumentId, Position, TextDocument};
use crate::extractor::Extractor;
use crate::model::{ListModel, RevealTarget, TreeSurface};

/// The editor that owns the documents.
pub trait EditorHost {
    type Document: TextDocument;

    /// The focused document, if any.
    fn active_document(&self) -> Option<&Self::Document>;

    /// Scroll `document` so the range is centred and select it. Only called
    /// for the active document.
    fn reveal(&mut self, document: &DocumentId, start: Position, end: Position);

    /// Informational popup requested by the filter panel.
    fn show_information(&mut self, _text: &str) {}
}

/// The isolated filter panel. Delivery is fire-and-forget.
pub trait InputSurface {
    fn post(&mut self, message: OutboundMessage);
}

impl InputSurface for () {
    fn post(&mut self, _message: OutboundMessage) {}
}

/// Panel -> controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InboundMessage {
    FilterText { value: String },
    Alert { text: String },
}

/// Controller -> panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutboundMessage {
    Clear,
}

/// Outcome of an entry activation. Hosts may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Revealed,
    /// The entry's document is not active any more, or has shrunk.
    Stale,
}

pub struct Controller<H, T, I> {
    host: H,
    model: ListModel<T>,
    input: I,
    extractor: Extractor,
}

impl<H, T, I> Controller<H, T, I>
where
    H: EditorHost,
    T: TreeSurface,
    I: InputSurface,
{
    pub fn new(host: H, tree: T, input: I, extractor: Extractor) -> Self {
        Self {
            host,
            model: ListModel::new(tree),
            input,
            extractor,
        }
    }

    /// Focus moved to another document, or away from all of them.
    pub fn on_active_document_changed(&mut self) {
        self.input.post(OutboundMessage::Clear);
        match self.host.active_document() {
            Some(doc) => {
                debug!(document = %doc.id(), "active document changed");
                let entries = self.extractor.extract(doc.text());
                self.model.replace(Some(doc.id().clone()), entries, "");
            }
            None => {
                debug!("no active document");
                self.model.clear();
            }
        }
    }

    /// The active document's text changed. The filter is kept.
    pub fn on_document_edited(&mut self) {
        let same_document = match (self.host.active_document(), self.model.document()) {
            (Some(doc), Some(listed)) => doc.id() == listed,
            _ => false,
        };
        if !same_document {
            self.on_active_document_changed();
            return;
        }
        if let Some(doc) = self.host.active_document() {
            let entries = self.extractor.extract(doc.text());
            let filter = self.model.filter_text().to_string();
            self.model.replace(Some(doc.id().clone()), entries, &filter);
        }
    }

    /// The user picked a tree item.
    pub fn on_entry_activated(&mut self, target: &RevealTarget) -> Activation {
        let (document, start, end) = match self.host.active_document() {
            Some(doc)
                if doc.id() == &target.document
                    && !target.range.is_empty()
                    && target.range.end <= doc.text().len() =>
            {
                (
                    doc.id().clone(),
                    doc.position_at(target.range.start),
                    doc.position_at(target.range.end),
                )
            }
            _ => {
                debug!(document = %target.document, "ignoring stale activation");
                return Activation::Stale;
            }
        };
        self.host.reveal(&document, start, end);
        Activation::Revealed
    }

    /// A message from the filter panel.
    pub fn on_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::FilterText { value } => self.on_filter_text_changed(&value),
            InboundMessage::Alert { text } => self.host.show_information(&text),
        }
    }

    /// New filter text. The active document is scanned again rather than
    /// filtering the previous result.
    pub fn on_filter_text_changed(&mut self, text: &str) {
        debug!(filter = text, "filter changed");
        match self.host.active_document() {
            Some(doc) => {
                let entries = self.extractor.extract(doc.text());
                self.model.replace(Some(doc.id().clone()), entries, text);
            }
            None => self.model.replace(None, Vec::new(), text),
        }
    }

    pub fn model(&self) -> &ListModel<T> {
        &self.model
    }

    pub fn tree_mut(&mut self) -> &mut T {
        self.model.surface_mut()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Swap the extractor. Takes effect from the next scan.
    pub fn set_extractor(&mut self, extractor: Extractor) {
        self.extractor = extractor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceDocument;

    #[derive(Default)]
    struct FakeHost {
        active: Option<SourceDocument>,
        revealed: Vec<(DocumentId, Position, Position)>,
        info: Vec<String>,
    }

    impl EditorHost for FakeHost {
        type Document = SourceDocument;

        fn active_document(&self) -> Option<&SourceDocument> {
            self.active.as_ref()
        }

        fn reveal(&mut self, document: &DocumentId, start: Position, end: Position) {
            self.revealed.push((document.clone(), start, end));
        }

        fn show_information(&mut self, text: &str) {
            self.info.push(text.to_string());
        }
    }

    impl InputSurface for Vec<OutboundMessage> {
        fn post(&mut self, message: OutboundMessage) {
            self.push(message);
        }
    }

    type TestController = Controller<FakeHost, (), Vec<OutboundMessage>>;

    fn controller(id: &str, text: &str) -> TestController {
        let host = FakeHost {
            active: Some(SourceDocument::new(DocumentId::new(id), text)),
            ..FakeHost::default()
        };
        let mut c = Controller::new(host, (), Vec::new(), Extractor::default());
        c.on_active_document_changed();
        c
    }

    const CSS: &str = "@media (min-width: 600px) {\n}\n@media (max-width: 400px) {\n}\n";

    #[test]
    fn document_change_scans_and_clears_panel() {
        let c = controller("a.css", CSS);
        assert_eq!(c.model().all_entries().len(), 2);
        assert_eq!(c.input(), &vec![OutboundMessage::Clear]);
        assert_eq!(c.model().document().map(|d| d.as_str()), Some("a.css"));
    }

    #[test]
    fn no_document_empties_list() {
        let mut c = controller("a.css", CSS);
        c.host_mut().active = None;
        c.on_active_document_changed();
        assert!(c.model().all_entries().is_empty());
        assert!(c.model().document().is_none());
    }

    #[test]
    fn filter_message_rescans_and_narrows() {
        let mut c = controller("a.css", CSS);
        c.on_message(InboundMessage::FilterText {
            value: "MAX".to_string(),
        });
        let visible = c.model().visible_entries();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].condition, "(max-width: 400px)");
    }

    #[test]
    fn filter_sees_unsaved_edits() {
        let mut c = controller("a.css", CSS);
        if let Some(doc) = c.host_mut().active.as_mut() {
            doc.set_text("@media (max-height: 10px) { }");
        }
        c.on_filter_text_changed("max");
        let conditions: Vec<_> = c.model().visible_entries().iter().map(|e| e.condition.clone()).collect();
        assert_eq!(conditions, vec!["(max-height: 10px)"]);
    }

    #[test]
    fn document_change_resets_filter() {
        let mut c = controller("a.css", CSS);
        c.on_filter_text_changed("min");
        c.host_mut().active = Some(SourceDocument::new(
            DocumentId::new("b.css"),
            "@media print { }\n@media (min-width: 1px) { }",
        ));
        c.on_active_document_changed();
        assert_eq!(c.model().filter_text(), "");
        assert_eq!(c.model().visible_entries().len(), 2);
        assert_eq!(c.input().len(), 2);
    }

    #[test]
    fn edit_keeps_filter() {
        let mut c = controller("a.css", CSS);
        c.on_filter_text_changed("min");
        if let Some(doc) = c.host_mut().active.as_mut() {
            doc.set_text("@media (min-width: 1px) { }\n@media (min-width: 2px) { }\n@media print { }");
        }
        c.on_document_edited();
        assert_eq!(c.model().filter_text(), "min");
        assert_eq!(c.model().visible_entries().len(), 2);
        assert_eq!(c.input().len(), 1, "edits do not clear the panel");
    }

    #[test]
    fn activation_reveals_range() {
        let mut c = controller("a.css", CSS);
        let target = c.model().view().items()[1].target.clone();
        assert_eq!(c.on_entry_activated(&target), Activation::Revealed);
        let (doc, start, end) = &c.host().revealed[0];
        assert_eq!(doc.as_str(), "a.css");
        assert_eq!(*start, Position { line: 2, column: 0 });
        assert_eq!(*end, Position { line: 3, column: 1 });
    }

    #[test]
    fn activation_of_other_document_is_ignored() {
        let mut c = controller("a.css", CSS);
        let target = c.model().view().items()[0].target.clone();
        c.host_mut().active = Some(SourceDocument::new(DocumentId::new("b.css"), CSS));
        assert_eq!(c.on_entry_activated(&target), Activation::Stale);
        assert!(c.host().revealed.is_empty());
    }

    #[test]
    fn activation_past_end_of_shrunk_document_is_ignored() {
        let mut c = controller("a.css", CSS);
        let target = c.model().view().items()[1].target.clone();
        if let Some(doc) = c.host_mut().active.as_mut() {
            doc.set_text("");
        }
        assert_eq!(c.on_entry_activated(&target), Activation::Stale);
    }

    #[test]
    fn activation_of_empty_range_is_ignored() {
        let mut c = controller("a.css", CSS);
        let mut target = c.model().view().items()[0].target.clone();
        target.range.end = target.range.start;
        assert_eq!(c.on_entry_activated(&target), Activation::Stale);
        assert!(c.host().revealed.is_empty());
    }

    #[test]
    fn alert_is_passed_through() {
        let mut c = controller("a.css", CSS);
        c.on_message(InboundMessage::Alert {
            text: "Hello".to_string(),
        });
        assert_eq!(c.host().info, vec!["Hello".to_string()]);
    }

    #[test]
    fn messages_use_kind_tags() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"kind":"filter-text","value":"min"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::FilterText {
                value: "min".to_string()
            }
        );
        assert_eq!(
            serde_json::to_string(&OutboundMessage::Clear).unwrap(),
            r#"{"kind":"clear"}"#
        );
    }
}
