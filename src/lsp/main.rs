use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use media_query_manager::lsp::backend::MediaQueryBackend;
use media_query_manager::lsp::protocol::{ACTIVE_EDITOR_METHOD, PANEL_MESSAGE_METHOD};

// stdout carries the protocol, so logs go to stderr.

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("MQM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(MediaQueryBackend::new)
        .custom_method(ACTIVE_EDITOR_METHOD, MediaQueryBackend::did_change_active_editor)
        .custom_method(PANEL_MESSAGE_METHOD, MediaQueryBackend::panel_message)
        .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}
