//! `@media` block scanner.
//!
//! A single left-to-right pass over the document text. Headers are found
//! with a regex that is allowed to cross line breaks, each header is
//! re-located from the end of the previous block, and the block body runs
//! to the brace that closes the header's `{`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ExtractorOptions;
use crate::document::line_number_at;

/// `@media` up to the first `{` after it, newlines included.
static MEDIA_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)@media.*?\{").unwrap());

/// Byte span of a block, `@media` through its closing `}` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One matched `@media` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQueryEntry {
    /// Condition text with boilerplate stripped, e.g. `(min-width: 600px)`.
    pub condition: String,
    /// What a list shows and what filters match against,
    /// e.g. `(min-width: 600px) (Line 42)`.
    pub label: String,
    pub range: SourceRange,
    /// 1-based line of the `@media` keyword.
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// Scan `text` and return its blocks in source order.
    ///
    /// Blocks without a closing brace are dropped; scanning continues with
    /// the next header.
    pub fn extract(&self, text: &str) -> Vec<MediaQueryEntry> {
        let mut entries = Vec::new();
        let mut search_position = 0usize;

        for header in MEDIA_HEADER.find_iter(text) {
            let header = header.as_str();
            let start = match text[search_position..].find(header) {
                Some(i) => search_position + i,
                // Header sits inside an already consumed block and has no
                // later twin.
                None => continue,
            };

            let open = start + header.len() - 1;
            let end = match closing_brace(text, open) {
                Some(close) => close + 1,
                None => {
                    warn!(
                        line = line_number_at(text, start),
                        "dropping @media block without a closing brace"
                    );
                    continue;
                }
            };

            let line = line_number_at(text, start);
            let condition = self.condition(&text[start..open]);
            let label = if self.options.annotate_lines {
                format!("{condition} (Line {line})")
            } else {
                condition.clone()
            };

            entries.push(MediaQueryEntry {
                condition,
                label,
                range: SourceRange { start, end },
                line,
            });
            search_position = end;
        }

        debug!(count = entries.len(), "extracted media queries");
        entries
    }

    /// Turn a raw header (`@media ... ` without the brace) into its
    /// display condition.
    fn condition(&self, header: &str) -> String {
        let mut label = header.split_whitespace().collect::<Vec<_>>().join(" ");
        for prefix in &self.options.strip_prefixes {
            label = label.replacen(prefix.as_str(), "", 1).trim().to_string();
        }
        label
            .strip_prefix("@media")
            .unwrap_or(&label)
            .trim()
            .to_string()
    }
}

/// Byte index of the `}` that closes the `{` at `open`.
fn closing_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
