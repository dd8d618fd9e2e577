//! Recovers files from loosely structured worker output.
//!
//! Workers announce files in several competing markdown conventions. The
//! extractor splits the text into fenced code blocks and names each block by
//! the first convention that applies:
//!
//! 1. a `language:path` tag on the opening fence;
//! 2. a bold filename line (`**path**` or `__path__`) just before the fence;
//! 3. a bare filename line (`path.ext`) just before the fence.
//!
//! The first block to claim a path keeps it. Blocks without a discoverable
//! name are dropped.

use crate::artifact::domain::ExtractedFileSet;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Payload keys that may carry generated files, in lookup order.
pub const OUTPUT_KEYS: [&str; 6] = [
    "response",
    "generated_code",
    "code",
    "files",
    "output",
    "basic_files",
];

const FENCE: &str = "```";

#[expect(clippy::expect_used, reason = "pattern is a fixed literal")]
static TAGGED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w+#-]+:\s*(\S.*?)\s*$").expect("tagged fence pattern compiles")
});

#[expect(clippy::expect_used, reason = "pattern is a fixed literal")]
static BOLD_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\*\*|__)\s*`?([^\s*`]+\.[A-Za-z]\w*)`?\s*(?:\*\*|__)\s*:?\s*$")
        .expect("bold filename pattern compiles")
});

#[expect(clippy::expect_used, reason = "pattern is a fixed literal")]
static BARE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*`?([A-Za-z0-9_./-]+\.[A-Za-z]\w*)`?\s*:?\s*$")
        .expect("bare filename pattern compiles")
});

/// A fenced code block with the line that introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FencedBlock<'a> {
    info: &'a str,
    heading: Option<&'a str>,
    body: String,
}

/// Splits `text` into terminated fenced blocks.
///
/// `heading` is the last non-blank line between the previous block (or the
/// start of the text) and the opening fence.
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut heading: Option<&str> = None;
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(info) = line.trim_start().strip_prefix(FENCE) else {
            if !line.trim().is_empty() {
                heading = Some(line);
            }
            continue;
        };

        let mut body = Vec::new();
        let mut terminated = false;
        for inner in lines.by_ref() {
            if inner.trim_start().starts_with(FENCE) {
                terminated = true;
                break;
            }
            body.push(inner);
        }
        if terminated {
            blocks.push(FencedBlock {
                info: info.trim(),
                heading: heading.take(),
                body: tidy(&body),
            });
        }
        heading = None;
    }
    blocks
}

/// Drops surrounding blank lines and trailing whitespace; keeps interior
/// text and first-line indentation.
fn tidy(lines: &[&str]) -> String {
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match (first, last) {
        (Some(start), Some(end)) => lines
            .get(start..=end)
            .map(|kept| kept.join("\n").trim_end().to_owned())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn capture<'t>(pattern: &Regex, haystack: &'t str) -> Option<&'t str> {
    pattern
        .captures(haystack)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().trim())
        .filter(|found| !found.is_empty())
}

/// Parses worker output into an [`ExtractedFileSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactExtractor;

impl ArtifactExtractor {
    /// Creates an extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extracts named code blocks from markdown-like text.
    #[must_use]
    pub fn extract(&self, text: &str) -> ExtractedFileSet {
        let blocks = fenced_blocks(text);
        let mut claimed = vec![false; blocks.len()];
        let mut files = ExtractedFileSet::new();

        let passes: [fn(&FencedBlock<'_>) -> Option<String>; 3] = [
            |block| capture(&TAGGED_FENCE, block.info).map(str::to_owned),
            |block| {
                block
                    .heading
                    .and_then(|heading| capture(&BOLD_FILENAME, heading))
                    .map(str::to_owned)
            },
            |block| {
                block
                    .heading
                    .and_then(|heading| capture(&BARE_FILENAME, heading))
                    .map(str::to_owned)
            },
        ];

        for name_of in passes {
            for (block, taken) in blocks.iter().zip(claimed.iter_mut()) {
                if *taken {
                    continue;
                }
                if let Some(path) = name_of(block) {
                    *taken = true;
                    files.insert_if_absent(path, block.body.clone());
                }
            }
        }

        let dropped = claimed.iter().filter(|taken| !**taken).count();
        if dropped > 0 {
            tracing::debug!(dropped, "skipped code blocks without a filename");
        }
        files
    }

    /// Extracts files from a worker payload.
    ///
    /// A string payload is parsed as text. For an object payload each of
    /// [`OUTPUT_KEYS`] is inspected: string values are parsed as text, and
    /// objects whose values are all strings are taken as ready-made
    /// `path -> content` mappings. Ready-made mappings win over text on the
    /// same path.
    #[must_use]
    pub fn parse_worker_output(&self, payload: &Value) -> ExtractedFileSet {
        match payload {
            Value::String(text) => self.extract(text),
            Value::Object(fields) => self.parse_fields(fields),
            _ => ExtractedFileSet::new(),
        }
    }

    fn parse_fields(&self, fields: &Map<String, Value>) -> ExtractedFileSet {
        let mut textual = ExtractedFileSet::new();
        let mut structured = ExtractedFileSet::new();

        for value in OUTPUT_KEYS.iter().filter_map(|key| fields.get(*key)) {
            match value {
                Value::String(text) => textual.absorb(self.extract(text)),
                Value::Object(entries) => {
                    if let Some(mapping) = structured_files(entries) {
                        structured.absorb(mapping);
                    }
                }
                _ => {}
            }
        }

        textual.overlay(structured);
        textual
    }
}

fn structured_files(entries: &Map<String, Value>) -> Option<ExtractedFileSet> {
    entries
        .iter()
        .map(|(path, content)| content.as_str().map(|text| (path.as_str(), text)))
        .collect()
}
