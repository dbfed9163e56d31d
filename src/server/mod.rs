//! `mqm serve`: the panel in a browser.
//!
//! The file on disk is the active document. The page is the filter box
//! and the list; it talks to the controller with JSON messages. A file
//! watcher re-scans on change and live-reloads the page.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use notify::{Event, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tower_livereload::LiveReloadLayer;
use tracing::{debug, info};

use crate::controller::{Activation, Controller, EditorHost, InboundMessage, InputSurface, OutboundMessage};
use crate::document::{DocumentId, Position, SourceDocument, TextDocument};
use crate::extractor::Extractor;
use crate::model::{ListView, RevealTarget, TreeItem, TreeSurface};

mod page;
mod util;

// ── Host adapters ─────────────────────────────────────────────────────

/// The file being served, plus what the page asked the editor to do.
pub struct BrowserHost {
    path: PathBuf,
    document: Option<SourceDocument>,
    selection: Option<Selection>,
    notices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub document: DocumentId,
    pub start: Position,
    pub end: Position,
    pub text: String,
}

impl BrowserHost {
    pub fn open(path: PathBuf) -> Self {
        let mut host = Self {
            path,
            document: None,
            selection: None,
            notices: Vec::new(),
        };
        host.reload();
        host
    }

    /// Re-read the file. Returns whether it exists.
    pub fn reload(&mut self) -> bool {
        self.document = std::fs::read_to_string(&self.path).ok().map(|text| {
            SourceDocument::new(DocumentId::new(self.path.display().to_string()), text)
        });
        self.document.is_some()
    }
}

impl EditorHost for BrowserHost {
    type Document = SourceDocument;

    fn active_document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    fn reveal(&mut self, document: &DocumentId, start: Position, end: Position) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let text = doc.text()[doc.offset_at(start)..doc.offset_at(end)].to_string();
        self.selection = Some(Selection {
            document: document.clone(),
            start,
            end,
            text,
        });
    }

    fn show_information(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}

/// The list as last rendered, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub document: Option<DocumentId>,
    pub filtering: bool,
    pub revision: u64,
    pub items: Vec<TreeItem>,
}

#[derive(Default)]
pub struct PanelTree {
    list: Option<ListResponse>,
}

impl TreeSurface for PanelTree {
    fn data_changed(&mut self, view: &ListView<'_>) {
        self.list = Some(ListResponse {
            document: view.document.cloned(),
            filtering: view.filtering,
            revision: view.revision,
            items: view.items(),
        });
    }
}

/// Messages for the page, collected until its next request.
#[derive(Default)]
pub struct Outbox(Vec<OutboundMessage>);

impl InputSurface for Outbox {
    fn post(&mut self, message: OutboundMessage) {
        self.0.push(message);
    }
}

pub type PanelController = Controller<BrowserHost, PanelTree, Outbox>;

type SharedPanel = Arc<Mutex<PanelController>>;

fn lock(state: &SharedPanel) -> MutexGuard<'_, PanelController> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Request handling ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub list: ListResponse,
    pub outbound: Vec<OutboundMessage>,
    pub notices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RevealResponse {
    pub selection: Option<Selection>,
}

pub fn current_list(controller: &PanelController) -> ListResponse {
    match &controller.model().surface().list {
        Some(list) => list.clone(),
        None => {
            let view = controller.model().view();
            ListResponse {
                document: view.document.cloned(),
                filtering: view.filtering,
                revision: view.revision,
                items: view.items(),
            }
        }
    }
}

pub fn handle_message(controller: &mut PanelController, message: InboundMessage) -> MessageResponse {
    controller.on_message(message);
    MessageResponse {
        list: current_list(controller),
        outbound: std::mem::take(&mut controller.input_mut().0),
        notices: std::mem::take(&mut controller.host_mut().notices),
    }
}

pub fn handle_reveal(controller: &mut PanelController, target: &RevealTarget) -> RevealResponse {
    controller.host_mut().selection = None;
    match controller.on_entry_activated(target) {
        Activation::Revealed => RevealResponse {
            selection: controller.host().selection.clone(),
        },
        Activation::Stale => RevealResponse { selection: None },
    }
}

/// A fresh page load, including a livereload: the page's filter box
/// starts empty, so the list drops any filter left from the last page.
pub fn handle_page_load(controller: &mut PanelController) -> ListResponse {
    if controller.model().is_filtering() {
        controller.on_filter_text_changed("");
    }
    current_list(controller)
}

/// A change on disk: re-scan, or switch documents if the file appeared or
/// disappeared.
pub fn handle_file_change(controller: &mut PanelController) {
    let had_document = controller.host().active_document().is_some();
    let has_document = controller.host_mut().reload();
    if had_document && has_document {
        controller.on_document_edited();
    } else {
        controller.on_active_document_changed();
    }
}

pub fn new_panel(path: PathBuf, extractor: Extractor) -> PanelController {
    let mut controller = Controller::new(
        BrowserHost::open(path),
        PanelTree::default(),
        Outbox::default(),
        extractor,
    );
    controller.on_active_document_changed();
    // The page starts empty anyway.
    controller.input_mut().0.clear();
    controller
}

// ── Server ────────────────────────────────────────────────────────────

/// Serve the panel for `path` on localhost.
pub async fn run_panel_server(path: PathBuf, port: u16, extractor: Extractor) -> anyhow::Result<()> {
    let state: SharedPanel = Arc::new(Mutex::new(new_panel(path.clone(), extractor)));

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let file_name = path.file_name().map(|n| n.to_os_string());
    let watch_state = state.clone();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if ours && (event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                debug!(kind = ?event.kind, "file changed");
                handle_file_change(&mut lock(&watch_state));
                reloader.reload();
            }
        }
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    let app = Router::new()
        .route("/", get(serve_panel))
        .route("/entries", get(serve_entries))
        .route("/message", post(serve_message))
        .route("/reveal", post(serve_reveal))
        .layer(livereload)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(file = %path.display(), %addr, "media query panel");
    eprintln!("media query panel");
    eprintln!("  file:    {}", path.display());
    eprintln!("  panel:   http://localhost:{port}/");
    eprintln!("  entries: http://localhost:{port}/entries");
    eprintln!("  watching for changes...");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    drop(watcher);
    Ok(())
}

async fn serve_panel(State(state): State<SharedPanel>) -> Html<String> {
    let mut controller = lock(&state);
    let list = handle_page_load(&mut controller);
    Html(page::build_panel_page(
        &list,
        controller.model().filter_text(),
        &util::nonce(),
    ))
}

async fn serve_entries(State(state): State<SharedPanel>) -> Json<ListResponse> {
    Json(current_list(&lock(&state)))
}

async fn serve_message(
    State(state): State<SharedPanel>,
    Json(message): Json<InboundMessage>,
) -> Json<MessageResponse> {
    Json(handle_message(&mut lock(&state), message))
}

async fn serve_reveal(
    State(state): State<SharedPanel>,
    Json(target): Json<RevealTarget>,
) -> Json<RevealResponse> {
    Json(handle_reveal(&mut lock(&state), &target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const CSS: &str = "@media screen and (min-width: 600px) {\n  .a {}\n}\n@media print {\n}\n";

    fn panel(dir: &Path) -> (PathBuf, PanelController) {
        let path = dir.join("site.css");
        std::fs::write(&path, CSS).unwrap();
        (path.clone(), new_panel(path, Extractor::default()))
    }

    #[test]
    fn initial_list() {
        let dir = tempfile::tempdir().unwrap();
        let (_, c) = panel(dir.path());
        let list = current_list(&c);
        assert!(!list.filtering);
        let labels: Vec<_> = list.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["(min-width: 600px) (Line 1)", "print (Line 4)"]);
    }

    #[test]
    fn filter_message_narrows_list() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        let res = handle_message(
            &mut c,
            InboundMessage::FilterText {
                value: "print".to_string(),
            },
        );
        assert!(res.list.filtering);
        assert_eq!(res.list.items.len(), 1);
        assert!(res.outbound.is_empty());
    }

    #[test]
    fn page_load_starts_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        handle_message(
            &mut c,
            InboundMessage::FilterText {
                value: "min".to_string(),
            },
        );
        assert!(current_list(&c).filtering);

        let list = handle_page_load(&mut c);
        assert!(!list.filtering);
        assert_eq!(list.items.len(), 2);
        assert_eq!(c.model().filter_text(), "");

        let html = page::build_panel_page(&list, c.model().filter_text(), "n");
        assert!(html.contains(r#"value="""#), "filter box should be empty");
        assert!(!html.contains(r#"value="min""#));
    }

    #[test]
    fn page_load_without_filter_does_not_rescan() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        let before = current_list(&c).revision;
        assert_eq!(handle_page_load(&mut c).revision, before);
    }

    #[test]
    fn alert_becomes_notice() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        let res = handle_message(
            &mut c,
            InboundMessage::Alert {
                text: "Hello from the panel".to_string(),
            },
        );
        assert_eq!(res.notices, vec!["Hello from the panel".to_string()]);
        let again = handle_message(&mut c, InboundMessage::FilterText { value: String::new() });
        assert!(again.notices.is_empty());
    }

    #[test]
    fn reveal_returns_block_text() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        let target = current_list(&c).items[1].target.clone();
        let res = handle_reveal(&mut c, &target);
        let selection = res.selection.expect("should reveal");
        assert_eq!(selection.text, "@media print {\n}");
        assert_eq!(selection.start, Position { line: 3, column: 0 });
    }

    #[test]
    fn stale_reveal_has_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut c) = panel(dir.path());
        let target = RevealTarget {
            document: DocumentId::new("other.css"),
            range: current_list(&c).items[0].target.range,
        };
        assert!(handle_reveal(&mut c, &target).selection.is_none());
    }

    #[test]
    fn file_replaced_resets_filter_and_queues_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut c) = panel(dir.path());
        handle_message(&mut c, InboundMessage::FilterText { value: "min".to_string() });

        std::fs::remove_file(&path).unwrap();
        handle_file_change(&mut c);
        assert!(current_list(&c).items.is_empty());
        assert!(current_list(&c).document.is_none());

        std::fs::write(&path, "@media (hover: hover) {}").unwrap();
        handle_file_change(&mut c);
        let res = handle_message(&mut c, InboundMessage::FilterText { value: String::new() });
        assert_eq!(res.list.items.len(), 1);
        assert_eq!(res.outbound, vec![OutboundMessage::Clear, OutboundMessage::Clear]);
    }

    #[test]
    fn file_edit_keeps_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (path, mut c) = panel(dir.path());
        handle_message(&mut c, InboundMessage::FilterText { value: "min".to_string() });
        std::fs::write(&path, "@media (min-width: 1px) {}\n@media (min-width: 9px) {}\n").unwrap();
        handle_file_change(&mut c);
        let list = current_list(&c);
        assert!(list.filtering);
        assert_eq!(list.items.len(), 2);
    }
}
