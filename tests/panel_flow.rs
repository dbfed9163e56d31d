//! Controller flows as a host editor drives them.

use media_query_manager::{
    Activation, Controller, DocumentId, EditorHost, Extractor, InboundMessage, InputSurface,
    ListView, OutboundMessage, Position, SourceDocument, TextDocument, TreeItem, TreeSurface,
};

#[derive(Default)]
struct Editor {
    open: Vec<SourceDocument>,
    active: Option<usize>,
    revealed: Vec<(DocumentId, Position, Position)>,
}

impl Editor {
    fn focus(&mut self, id: &str) {
        self.active = self.open.iter().position(|d| d.id().as_str() == id);
    }
}

impl EditorHost for Editor {
    type Document = SourceDocument;

    fn active_document(&self) -> Option<&SourceDocument> {
        self.active.and_then(|i| self.open.get(i))
    }

    fn reveal(&mut self, document: &DocumentId, start: Position, end: Position) {
        self.revealed.push((document.clone(), start, end));
    }
}

/// Keeps every render so tests can check what the tree was told.
#[derive(Default)]
struct Tree {
    renders: Vec<Vec<TreeItem>>,
}

impl TreeSurface for Tree {
    fn data_changed(&mut self, view: &ListView<'_>) {
        self.renders.push(view.items());
    }
}

#[derive(Default)]
struct FilterBox {
    value: String,
    received: Vec<OutboundMessage>,
}

impl InputSurface for FilterBox {
    fn post(&mut self, message: OutboundMessage) {
        if message == OutboundMessage::Clear {
            self.value.clear();
        }
        self.received.push(message);
    }
}

type Panel = Controller<Editor, Tree, FilterBox>;

const A: &str = "\
.x { color: red }
@media (min-width: 600px) {
  .a { color: blue; }
}
@media (max-width: 400px) {
  .b { color: green; }
}
";

const B: &str = "@media print {\n  nav { display: none; }\n}\n";

fn panel() -> Panel {
    let editor = Editor {
        open: vec![
            SourceDocument::new(DocumentId::new("a.css"), A),
            SourceDocument::new(DocumentId::new("b.css"), B),
        ],
        active: Some(0),
        revealed: Vec::new(),
    };
    let mut panel = Controller::new(editor, Tree::default(), FilterBox::default(), Extractor::default());
    panel.on_active_document_changed();
    panel
}

fn type_filter(panel: &mut Panel, text: &str) {
    panel.input_mut().value = text.to_string();
    panel.on_message(InboundMessage::FilterText {
        value: text.to_lowercase(),
    });
}

fn last_render(panel: &Panel) -> Vec<String> {
    panel
        .model()
        .surface()
        .renders
        .last()
        .map(|items| items.iter().map(|i| i.label.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn typing_narrows_the_tree() {
    let mut p = panel();
    type_filter(&mut p, "MIN");
    assert_eq!(last_render(&p), vec!["(min-width: 600px) (Line 2)"]);
}

#[test]
fn clearing_the_box_restores_the_full_list() {
    let mut p = panel();
    let full = last_render(&p);
    type_filter(&mut p, "max");
    type_filter(&mut p, "max");
    assert_eq!(last_render(&p), vec!["(max-width: 400px) (Line 5)"]);
    type_filter(&mut p, "");
    assert_eq!(last_render(&p), full);
    assert!(!p.model().is_filtering());
}

#[test]
fn switching_documents_resets_filter_and_box() {
    let mut p = panel();
    type_filter(&mut p, "min");
    p.host_mut().focus("b.css");
    p.on_active_document_changed();

    assert_eq!(p.model().filter_text(), "");
    assert_eq!(p.input().value, "");
    assert_eq!(p.input().received.last(), Some(&OutboundMessage::Clear));
    assert_eq!(last_render(&p), vec!["print (Line 1)"]);
    let fresh = Extractor::default().extract(B);
    let visible: Vec<_> = p.model().visible_entries().into_iter().cloned().collect();
    assert_eq!(visible, fresh);
}

#[test]
fn no_editor_means_empty_tree() {
    let mut p = panel();
    p.host_mut().active = None;
    p.on_active_document_changed();
    assert!(last_render(&p).is_empty());
    // Filtering with no editor stays empty and does not panic.
    type_filter(&mut p, "min");
    assert!(last_render(&p).is_empty());
}

#[test]
fn clicking_an_item_reveals_its_block() {
    let mut p = panel();
    let item = p.model().surface().renders.last().unwrap()[0].clone();
    assert_eq!(p.on_entry_activated(&item.target), Activation::Revealed);
    let (doc, start, end) = p.host().revealed[0].clone();
    assert_eq!(doc.as_str(), "a.css");
    assert_eq!(start, Position { line: 1, column: 0 });
    assert_eq!(end, Position { line: 3, column: 1 });
}

#[test]
fn clicking_after_switching_documents_does_nothing() {
    let mut p = panel();
    let item = p.model().surface().renders.last().unwrap()[0].clone();
    p.host_mut().focus("b.css");
    assert_eq!(p.on_entry_activated(&item.target), Activation::Stale);
    assert!(p.host().revealed.is_empty());
}

#[test]
fn one_render_per_event() {
    let mut p = panel();
    let before = p.model().surface().renders.len();
    type_filter(&mut p, "m");
    p.on_document_edited();
    p.host_mut().focus("b.css");
    p.on_active_document_changed();
    assert_eq!(p.model().surface().renders.len(), before + 3);
}
