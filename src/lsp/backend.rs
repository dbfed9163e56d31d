use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info};

use super::protocol::{
    ActiveEditorParams, DidChangeList, Effect, FilterInput, ListParams, CMD_FILTER, CMD_LIST,
    CMD_REVEAL,
};
use crate::config::Settings;
use crate::controller::{Activation, Controller, EditorHost, InboundMessage, InputSurface, OutboundMessage};
use crate::document::{DocumentId, SourceDocument};
use crate::extractor::{Extractor, MediaQueryEntry};
use crate::model::{ListView, RevealTarget, TreeSurface};

// ── Host adapters ─────────────────────────────────────────────────────

/// Open documents as synced by the client, and the one it says is focused.
#[derive(Default)]
pub struct LspHost {
    documents: HashMap<Url, SourceDocument>,
    active: Option<Url>,
    effects: Vec<Effect>,
}

impl LspHost {
    pub fn open(&mut self, uri: Url, text: String) {
        let id = DocumentId::new(uri.as_str());
        self.documents.insert(uri, SourceDocument::new(id, text));
    }

    pub fn update(&mut self, uri: &Url, text: String) {
        match self.documents.get_mut(uri) {
            Some(doc) => doc.set_text(text),
            None => self.open(uri.clone(), text),
        }
    }

    pub fn close(&mut self, uri: &Url) {
        self.documents.remove(uri);
        if self.active.as_ref() == Some(uri) {
            self.active = None;
        }
    }

    pub fn set_active(&mut self, uri: Option<Url>) {
        self.active = uri;
    }

    pub fn is_active(&self, uri: &Url) -> bool {
        self.active.as_ref() == Some(uri)
    }

    pub fn document(&self, uri: &Url) -> Option<&SourceDocument> {
        self.documents.get(uri)
    }
}

impl EditorHost for LspHost {
    type Document = SourceDocument;

    fn active_document(&self) -> Option<&SourceDocument> {
        self.active.as_ref().and_then(|uri| self.documents.get(uri))
    }

    fn reveal(&mut self, document: &DocumentId, start: crate::Position, end: crate::Position) {
        let Ok(uri) = Url::parse(document.as_str()) else {
            return;
        };
        self.effects.push(Effect::Reveal {
            uri,
            range: Range {
                start: to_lsp_position(start),
                end: to_lsp_position(end),
            },
        });
    }

    fn show_information(&mut self, text: &str) {
        self.effects.push(Effect::ShowMessage(text.to_string()));
    }
}

/// Queues a `mediaQueries/didChangeList` per model change.
#[derive(Default)]
pub struct LspTree {
    effects: Vec<Effect>,
}

impl TreeSurface for LspTree {
    fn data_changed(&mut self, view: &ListView<'_>) {
        self.effects.push(Effect::ListChanged(list_params(view)));
    }
}

/// Queues `mediaQueries/filterInput` messages for the client's filter box.
#[derive(Default)]
pub struct LspInput {
    effects: Vec<Effect>,
}

impl InputSurface for LspInput {
    fn post(&mut self, message: OutboundMessage) {
        self.effects.push(Effect::FilterInput(message));
    }
}

pub type LspController = Controller<LspHost, LspTree, LspInput>;

pub fn new_controller(extractor: Extractor) -> LspController {
    Controller::new(
        LspHost::default(),
        LspTree::default(),
        LspInput::default(),
        extractor,
    )
}

/// Everything queued by the last handler, host effects first.
pub fn drain_effects(controller: &mut LspController) -> Vec<Effect> {
    let mut effects = std::mem::take(&mut controller.host_mut().effects);
    effects.append(&mut controller.tree_mut().effects);
    effects.append(&mut controller.input_mut().effects);
    effects
}

fn list_params(view: &ListView<'_>) -> ListParams {
    ListParams {
        uri: view.document.and_then(|d| Url::parse(d.as_str()).ok()),
        filtering: view.filtering,
        revision: view.revision,
        items: view.items(),
    }
}

fn to_lsp_position(pos: crate::Position) -> Position {
    Position {
        line: pos.line,
        character: pos.column,
    }
}

/// Flat symbols for a document's media queries.
#[allow(deprecated)]
pub fn media_query_symbols(doc: &SourceDocument, entries: &[MediaQueryEntry]) -> Vec<DocumentSymbol> {
    use crate::document::TextDocument;

    entries
        .iter()
        .map(|e| {
            let range = Range {
                start: to_lsp_position(doc.position_at(e.range.start)),
                end: to_lsp_position(doc.position_at(e.range.end)),
            };
            let header_end = doc.text()[e.range.start..]
                .find('{')
                .map(|i| e.range.start + i)
                .unwrap_or(e.range.end);
            DocumentSymbol {
                name: e.condition.clone(),
                detail: Some(format!("line {}", e.line)),
                kind: SymbolKind::NAMESPACE,
                tags: None,
                deprecated: None,
                range,
                selection_range: Range {
                    start: range.start,
                    end: to_lsp_position(doc.position_at(header_end)),
                },
                children: None,
            }
        })
        .collect()
}

/// Run a `workspace/executeCommand` against the controller.
pub fn execute(controller: &mut LspController, command: &str, arguments: Vec<Value>) -> Result<Option<Value>> {
    match command {
        CMD_FILTER => {
            let text = match arguments.first() {
                Some(Value::String(s)) => s.clone(),
                None | Some(Value::Null) => String::new(),
                Some(other) => {
                    return Err(Error::invalid_params(format!(
                        "{CMD_FILTER} expects a string, got {other}"
                    )))
                }
            };
            controller.on_filter_text_changed(&text);
            Ok(Some(list_json(controller)))
        }
        CMD_LIST => Ok(Some(list_json(controller))),
        CMD_REVEAL => {
            let target: RevealTarget = arguments
                .into_iter()
                .next()
                .and_then(|v| serde_json::from_value(v).ok())
                .ok_or_else(|| Error::invalid_params(format!("{CMD_REVEAL} expects a reveal target")))?;
            let revealed = controller.on_entry_activated(&target) == Activation::Revealed;
            Ok(Some(Value::Bool(revealed)))
        }
        other => Err(Error::invalid_params(format!("unknown command: {other}"))),
    }
}

fn list_json(controller: &LspController) -> Value {
    serde_json::to_value(list_params(&controller.model().view())).unwrap_or(Value::Null)
}

// ── Server ────────────────────────────────────────────────────────────

/// The LSP backend for CSS media query navigation.
pub struct MediaQueryBackend {
    client: Client,
    controller: Mutex<LspController>,
}

impl MediaQueryBackend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            controller: Mutex::new(new_controller(Extractor::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LspController> {
        self.controller.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on the controller, then deliver whatever it queued.
    async fn with_controller<R>(&self, f: impl FnOnce(&mut LspController) -> R) -> R {
        let (result, effects) = {
            let mut controller = self.lock();
            let result = f(&mut *controller);
            (result, drain_effects(&mut controller))
        };
        self.deliver(effects).await;
        result
    }

    async fn deliver(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Reveal { uri, range } => {
                    let params = ShowDocumentParams {
                        uri,
                        external: Some(false),
                        take_focus: Some(true),
                        selection: Some(range),
                    };
                    if let Err(e) = self.client.show_document(params).await {
                        debug!("showDocument failed: {e}");
                    }
                }
                Effect::ShowMessage(text) => {
                    self.client.show_message(MessageType::INFO, text).await;
                }
                Effect::ListChanged(params) => {
                    self.client.send_notification::<DidChangeList>(params).await;
                }
                Effect::FilterInput(message) => {
                    self.client.send_notification::<FilterInput>(message).await;
                }
            }
        }
    }

    /// `mediaQueries/didChangeActiveEditor`
    pub async fn did_change_active_editor(&self, params: ActiveEditorParams) {
        debug!(uri = ?params.uri, "active editor changed");
        self.with_controller(|c| {
            c.host_mut().set_active(params.uri);
            c.on_active_document_changed();
        })
        .await;
    }

    /// `mediaQueries/panelMessage`
    pub async fn panel_message(&self, message: InboundMessage) {
        self.with_controller(|c| c.on_message(message)).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for MediaQueryBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let settings = Settings::from_json(params.initialization_options);
        self.lock().set_extractor(Extractor::new(settings.extractor));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                document_symbol_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        CMD_FILTER.to_string(),
                        CMD_LIST.to_string(),
                        CMD_REVEAL.to_string(),
                    ],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "mqm-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("media query LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "media query LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        self.with_controller(|c| {
            c.host_mut().open(uri.clone(), text);
            c.host_mut().set_active(Some(uri));
            c.on_active_document_changed();
        })
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // FULL sync: the last change is the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.with_controller(|c| {
                c.host_mut().update(&uri, change.text);
                if c.host().is_active(&uri) {
                    c.on_document_edited();
                }
            })
            .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.with_controller(|c| {
            let was_active = c.host().is_active(&uri);
            c.host_mut().close(&uri);
            if was_active {
                c.on_active_document_changed();
            }
        })
        .await;
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let controller = self.lock();
        let Some(doc) = controller.host().document(&params.text_document.uri) else {
            return Ok(None);
        };
        let entries = controller.extractor().extract(crate::TextDocument::text(doc));
        Ok(Some(DocumentSymbolResponse::Nested(media_query_symbols(
            doc, &entries,
        ))))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        self.with_controller(|c| execute(c, &params.command, params.arguments))
            .await
    }
}
