//! `mqm watch`: the panel as a terminal session.
//!
//! The watched file is the active document, stdout is the tree, and stdin
//! lines are the filter box. File events and input lines share one
//! channel, so they are handled strictly one after another.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use notify::{RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::controller::{Controller, EditorHost, InputSurface, OutboundMessage};
use crate::document::{DocumentId, Position, SourceDocument, TextDocument};
use crate::error::Result;
use crate::extractor::Extractor;
use crate::model::{ListView, TreeItem, TreeSurface};

/// A file on disk as the only document.
pub struct FileHost<W> {
    path: PathBuf,
    document: Option<SourceDocument>,
    out: W,
}

impl<W: Write> FileHost<W> {
    pub fn open(path: impl Into<PathBuf>, out: W) -> Self {
        let mut host = Self {
            path: path.into(),
            document: None,
            out,
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

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> EditorHost for FileHost<W> {
    type Document = SourceDocument;

    fn active_document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    fn reveal(&mut self, document: &DocumentId, start: Position, end: Position) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let _ = writeln!(self.out, "── {document}:{}", start.line + 1);
        let lines = doc
            .text()
            .lines()
            .enumerate()
            .skip(start.line as usize)
            .take((end.line - start.line) as usize + 1);
        for (i, line) in lines {
            let _ = writeln!(self.out, "{:>5} │ {line}", i + 1);
        }
        let _ = self.out.flush();
    }

    fn show_information(&mut self, text: &str) {
        let _ = writeln!(self.out, "info: {text}");
    }
}

/// Prints the numbered list after every change.
pub struct TerminalTree<W> {
    items: Vec<TreeItem>,
    out: W,
}

impl<W: Write> TerminalTree<W> {
    pub fn new(out: W) -> Self {
        Self {
            items: Vec::new(),
            out,
        }
    }

    /// Rows as last rendered; `:N` picks `items()[N - 1]`.
    pub fn items(&self) -> &[TreeItem] {
        &self.items
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> TreeSurface for TerminalTree<W> {
    fn data_changed(&mut self, view: &ListView<'_>) {
        self.items = view.items();
        match view.document {
            Some(doc) => {
                let n = self.items.len();
                let noun = if n == 1 { "query" } else { "queries" };
                let _ = writeln!(self.out, "── {doc}: {n} media {noun}");
            }
            None => {
                let _ = writeln!(self.out, "── no document");
            }
        }
        for (i, item) in self.items.iter().enumerate() {
            let _ = writeln!(self.out, "  [{}] {}", i + 1, item.label);
        }
        let _ = self.out.flush();
    }
}

/// Stdin has no display to reset, so a clear is just announced.
pub struct TerminalInput<W> {
    out: W,
}

impl<W: Write> TerminalInput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> InputSurface for TerminalInput<W> {
    fn post(&mut self, message: OutboundMessage) {
        match message {
            OutboundMessage::Clear => {
                let _ = writeln!(self.out, "(filter cleared)");
            }
        }
    }
}

pub type TerminalController<W> = Controller<FileHost<W>, TerminalTree<W>, TerminalInput<W>>;

/// What a line typed on stdin means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filter(String),
    Activate(usize),
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed {
        ":q" | ":quit" => Command::Quit,
        ":clear" => Command::Filter(String::new()),
        _ => match trimmed.strip_prefix(':').and_then(|n| n.parse::<usize>().ok()) {
            Some(n) => Command::Activate(n),
            None => Command::Filter(trimmed.to_string()),
        },
    }
}

#[derive(Debug)]
pub enum WatchEvent {
    /// The watched file was written, created or removed.
    FileChanged,
    Input(String),
    Quit,
}

/// Handle one event. Returns `false` when the session should end.
pub fn dispatch<W: Write>(controller: &mut TerminalController<W>, event: WatchEvent) -> bool {
    match event {
        WatchEvent::FileChanged => {
            let had_document = controller.host().active_document().is_some();
            let has_document = controller.host_mut().reload();
            if had_document && has_document {
                controller.on_document_edited();
            } else {
                controller.on_active_document_changed();
            }
            true
        }
        WatchEvent::Input(line) => match parse_command(&line) {
            Command::Quit => false,
            Command::Filter(text) => {
                controller.on_filter_text_changed(&text);
                true
            }
            Command::Activate(n) => {
                let target = n
                    .checked_sub(1)
                    .and_then(|i| controller.model().surface().items().get(i))
                    .map(|item| item.target.clone());
                match target {
                    Some(target) => {
                        controller.on_entry_activated(&target);
                    }
                    None => debug!(index = n, "no such entry"),
                }
                true
            }
        },
        WatchEvent::Quit => false,
    }
}

/// Watch `path` and run the interactive session on stdin/stdout.
pub fn run_watch(path: PathBuf, extractor: Extractor) -> Result<()> {
    let (tx, rx) = mpsc::channel::<WatchEvent>();

    let file_name = path.file_name().map(|n| n.to_os_string());
    let watch_tx = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if ours && (event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                let _ = watch_tx.send(WatchEvent::FileChanged);
            }
        }
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(WatchEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(WatchEvent::Quit);
    });

    info!(path = %path.display(), "watching");
    eprintln!("type to filter, :N to show entry N, :clear to reset, :q to quit");

    let mut controller = Controller::new(
        FileHost::open(&path, io::stdout()),
        TerminalTree::new(io::stdout()),
        TerminalInput::new(io::stdout()),
        extractor,
    );
    controller.on_active_document_changed();

    for event in rx {
        if !dispatch(&mut controller, event) {
            break;
        }
    }

    drop(watcher);
    Ok(())
}
