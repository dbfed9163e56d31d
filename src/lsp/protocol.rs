use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{Range, Url};

use crate::controller::OutboundMessage;
use crate::model::TreeItem;

pub const CMD_FILTER: &str = "mediaQueries.filter";
pub const CMD_LIST: &str = "mediaQueries.list";
pub const CMD_REVEAL: &str = "mediaQueries.reveal";

pub const ACTIVE_EDITOR_METHOD: &str = "mediaQueries/didChangeActiveEditor";
pub const PANEL_MESSAGE_METHOD: &str = "mediaQueries/panelMessage";

/// Client -> server: focus moved. `uri: null` means no editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEditorParams {
    pub uri: Option<Url>,
}

/// Server -> client: the tree must re-render with these items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub uri: Option<Url>,
    pub filtering: bool,
    pub revision: u64,
    pub items: Vec<TreeItem>,
}

pub enum DidChangeList {}

impl Notification for DidChangeList {
    type Params = ListParams;
    const METHOD: &'static str = "mediaQueries/didChangeList";
}

/// Server -> client: a message for the filter box.
pub enum FilterInput {}

impl Notification for FilterInput {
    type Params = OutboundMessage;
    const METHOD: &'static str = "mediaQueries/filterInput";
}

/// Work the backend has to do on the client after a handler ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Reveal { uri: Url, range: Range },
    ShowMessage(String),
    ListChanged(ListParams),
    FilterInput(OutboundMessage),
}
