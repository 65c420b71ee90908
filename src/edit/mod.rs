//! TextEditEngine - declarative edits applied to file content
//!
//! Three modes: regex find/replace, replacement of a block delimited by
//! two patterns, and replacement of a line range. Content is normalized to
//! `\n` line endings before matching so positions and line numbers mean
//! the same thing regardless of the source file's convention. A file is
//! only rewritten when at least one match was found.

use std::path::Path;

use regex::{Captures, Regex, RegexBuilder, Replacer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::text::Encoding;

/// One edit operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditSpec {
    /// Regex replace of the first match, or of every match when `all` is set
    FindReplace { pattern: String, replacement: String, all: bool },

    /// Replace the span between the first `start` match and the next `end` match
    Block {
        start: String,
        end: String,
        replacement: String,
        include_markers: bool,
    },

    /// Replace 1-based lines `start_line..=end_line` (or `..end_line` when not inclusive)
    LineRange {
        start_line: i64,
        end_line: i64,
        replacement: String,
        inclusive: bool,
    },
}

impl EditSpec {
    /// Wire name of the mode
    pub fn mode(&self) -> &'static str {
        match self {
            EditSpec::FindReplace { .. } => "find_replace",
            EditSpec::Block { .. } => "block",
            EditSpec::LineRange { .. } => "line_range",
        }
    }
}

/// Result of applying an edit to in-memory content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Content after the edit (the normalized original when nothing matched)
    pub content: String,
    /// Matches replaced, or source lines removed for `line_range`
    pub matches: usize,
}

/// Errors from the edit engine
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert `\r\n` and lone `\r` to `\n`
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Apply `spec` to `content` without touching the filesystem
pub fn apply(content: &str, spec: &EditSpec) -> Result<EditOutcome, EditError> {
    debug!(mode = spec.mode(), "apply: called");
    let normalized = normalize_line_endings(content);

    match spec {
        EditSpec::FindReplace {
            pattern,
            replacement,
            all,
        } => find_replace(normalized, pattern, replacement, *all),
        EditSpec::Block {
            start,
            end,
            replacement,
            include_markers,
        } => block(normalized, start, end, replacement, *include_markers),
        EditSpec::LineRange {
            start_line,
            end_line,
            replacement,
            inclusive,
        } => Ok(line_range(normalized, *start_line, *end_line, replacement, *inclusive)),
    }
}

/// Read `path`, apply `spec`, and write the result back when anything matched
///
/// A zero-match edit leaves the file byte-for-byte unchanged.
pub async fn edit_file(path: &Path, spec: &EditSpec, encoding: Encoding) -> Result<EditOutcome, EditError> {
    debug!(?path, mode = spec.mode(), ?encoding, "edit_file: called");
    let raw = tokio::fs::read(path).await?;
    let content = encoding.decode(raw)?;

    let outcome = apply(&content, spec)?;
    if outcome.matches > 0 {
        tokio::fs::write(path, encoding.encode(&outcome.content)).await?;
        debug!(matches = outcome.matches, "edit_file: file rewritten");
    } else {
        debug!("edit_file: no matches, file untouched");
    }
    Ok(outcome)
}

fn compile(pattern: &str, multi_line: bool) -> Result<Regex, EditError> {
    RegexBuilder::new(pattern)
        .multi_line(multi_line)
        .build()
        .map_err(|source| EditError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn find_replace(content: String, pattern: &str, replacement: &str, all: bool) -> Result<EditOutcome, EditError> {
    let regex = compile(pattern, false)?;
    let limit = if all { 0 } else { 1 };

    let matches = if all {
        regex.find_iter(&content).count()
    } else {
        usize::from(regex.is_match(&content))
    };
    if matches == 0 {
        return Ok(EditOutcome { content, matches });
    }

    let replaced = regex.replacen(&content, limit, Template(replacement)).into_owned();
    Ok(EditOutcome {
        content: replaced,
        matches,
    })
}

/// Replacement text with `$1`..`$99`, `$&` and `$$` references
///
/// Any other `$` sequence, including `${name}` and references to groups the
/// pattern does not have, is copied through literally.
struct Template<'a>(&'a str);

impl Replacer for Template<'_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        expand_template(self.0, caps, dst);
    }
}

fn expand_template(template: &str, caps: &Captures<'_>, dst: &mut String) {
    let groups = caps.len() - 1;
    let group = |n: usize| caps.get(n).map_or("", |m| m.as_str());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        dst.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let bytes = after.as_bytes();

        rest = match bytes.first() {
            Some(b'$') => {
                dst.push('$');
                &after[1..]
            }
            Some(b'&') => {
                dst.push_str(group(0));
                &after[1..]
            }
            Some(d) if d.is_ascii_digit() => {
                let one = usize::from(d - b'0');
                let two = bytes
                    .get(1)
                    .filter(|c| c.is_ascii_digit())
                    .map(|c| one * 10 + usize::from(c - b'0'));
                // Prefer the two-digit reference when that group exists
                match two {
                    Some(n) if (1..=groups).contains(&n) => {
                        dst.push_str(group(n));
                        &after[2..]
                    }
                    _ if (1..=groups).contains(&one) => {
                        dst.push_str(group(one));
                        &after[1..]
                    }
                    _ => {
                        dst.push('$');
                        after
                    }
                }
            }
            _ => {
                dst.push('$');
                after
            }
        };
    }
    dst.push_str(rest);
}

fn block(
    content: String,
    start: &str,
    end: &str,
    replacement: &str,
    include_markers: bool,
) -> Result<EditOutcome, EditError> {
    let start_re = compile(start, true)?;
    let end_re = compile(end, true)?;

    let Some(start_match) = start_re.find(&content) else {
        return Ok(EditOutcome { content, matches: 0 });
    };
    let after_start = start_match.end();
    // Search strictly after the start marker
    let Some(end_match) = end_re.find_at(&content, after_start) else {
        return Ok(EditOutcome { content, matches: 0 });
    };

    let (span_start, span_end) = if include_markers {
        (start_match.start(), end_match.end())
    } else {
        (after_start, end_match.start())
    };

    let mut replaced = String::with_capacity(content.len() + replacement.len());
    replaced.push_str(&content[..span_start]);
    replaced.push_str(replacement);
    replaced.push_str(&content[span_end..]);
    Ok(EditOutcome {
        content: replaced,
        matches: 1,
    })
}

fn line_range(content: String, start_line: i64, end_line: i64, replacement: &str, inclusive: bool) -> EditOutcome {
    let mut lines: Vec<&str> = content.split('\n').collect();
    let start_idx = start_line.saturating_sub(1).max(0);
    let end_idx = if inclusive {
        end_line.saturating_sub(1)
    } else {
        end_line.saturating_sub(2)
    };

    if end_idx >= lines.len() as i64 || start_idx > end_idx {
        debug!(%start_line, %end_line, line_count = lines.len(), "line_range: out of bounds");
        return EditOutcome { content, matches: 0 };
    }

    let (start_idx, end_idx) = (start_idx as usize, end_idx as usize);
    let replacement = normalize_line_endings(replacement);
    lines.splice(start_idx..=end_idx, replacement.split('\n'));
    let removed = end_idx - start_idx + 1;

    EditOutcome {
        content: lines.join("\n"),
        matches: removed,
    }
}
