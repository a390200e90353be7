//! Style-preserving YAML read/write.
//!
//! Pipeline and pipeline-run files in the wild are hand-edited, and teams
//! disagree on whether block sequences sit at the same indentation as their
//! parent key or are indented further in. Round-tripping a file through a
//! plain serializer normalizes that away and produces a diff nobody asked
//! for. This module detects the indentation a file already uses and
//! reproduces it on write.

use crate::error::{MigrateError, Result};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;


/// How many block sequences were found at each indentation delta (the
/// number of extra spaces a `-` sits in from its parent key), in the order
/// each distinct delta was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSequenceIndentation {
    entries: Vec<(usize, usize)>,
}

impl BlockSequenceIndentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an indentation profile directly from delta/count pairs,
    /// mainly for constructing an explicit style in tests or config.
    pub fn from_counts(counts: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            entries: counts.into_iter().collect(),
        }
    }

    fn record(&mut self, delta: usize) {
        match self.entries.iter_mut().find(|(d, _)| *d == delta) {
            Some(entry) => entry.1 += 1,
            None => self.entries.push((delta, 1)),
        }
    }

    /// The distinct deltas observed, in first-seen order.
    pub fn levels(&self) -> Vec<usize> {
        self.entries.iter().map(|(d, _)| *d).collect()
    }

    /// Delta -> number of block sequences found at that delta.
    pub fn indentations(&self) -> HashMap<usize, usize> {
        self.entries.iter().copied().collect()
    }

    /// True when every block sequence in the file used the same delta.
    pub fn is_consistent(&self) -> bool {
        self.entries.len() <= 1
    }

    /// The most common delta, defaulting to 0 (sequences indentless, at the
    /// same column as their parent key) when nothing was recorded.
    pub fn dominant_delta(&self) -> usize {
        self.entries
            .iter()
            .max_by_key(|(_, count)| *count)
            .map(|(delta, _)| *delta)
            .unwrap_or(0)
    }
}

/// The formatting conventions detected in an existing YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YAMLStyle {
    pub indentation: BlockSequenceIndentation,
}

impl YAMLStyle {
    /// Reads `path` and detects its block-sequence indentation style.
    pub fn detect(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MigrateError::io_with_source(format!("failed to read {}", path.display()), e))?;
        Ok(Self::detect_str(&text))
    }

    /// Detects block-sequence indentation style directly from YAML text.
    pub fn detect_str(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let mut indentation = BlockSequenceIndentation::new();

        for i in 0..lines.len() {
            let line = lines[i];
            let trimmed = line.trim_start();
            if !is_bare_mapping_key(trimmed) {
                continue;
            }
            let key_indent = line.len() - trimmed.len();

            let Some(next) = lines[i + 1..].iter().find(|l| !l.trim().is_empty()) else {
                continue;
            };
            let next_trimmed = next.trim_start();
            let next_indent = next.len() - next_trimmed.len();
            if next_indent >= key_indent && is_sequence_item(next_trimmed) {
                indentation.record(next_indent - key_indent);
            }
        }

        Self { indentation }
    }
}

fn is_bare_mapping_key(trimmed: &str) -> bool {
    trimmed.ends_with(':') && !trimmed.starts_with('-') && !trimmed.starts_with('#')
}

fn is_sequence_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Reads and parses `path`, returning the parsed document alongside the
/// block-sequence indentation style detected in its raw text.
pub fn load(path: &Path) -> Result<(Value, YAMLStyle)> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MigrateError::io_with_source(format!("failed to read {}", path.display()), e))?;
    let style = YAMLStyle::detect_str(&text);
    let value: Value = serde_yaml::from_str(&text)
        .map_err(|e| MigrateError::yaml_with_source(format!("failed to parse {}", path.display()), e))?;
    Ok((value, style))
}

/// Serializes `value` to a YAML string, honoring `style`'s block-sequence
/// indentation. With no style (or a style with no recorded sequences at
/// all), sequences come out indentless, matching the serializer's default.
pub fn dump_to_string(value: &Value, style: Option<&YAMLStyle>) -> Result<String> {
    let base = serde_yaml::to_string(value)
        .map_err(|e| MigrateError::yaml_with_source("failed to serialize YAML document", e))?;

    let delta = style.map(|s| s.indentation.dominant_delta()).unwrap_or(0);
    if delta == 0 {
        Ok(base)
    } else {
        Ok(reindent_sequences(&base, delta))
    }
}

/// Serializes `value` to `path`, honoring `style`'s block-sequence
/// indentation. See [`dump_to_string`].
pub fn dump(path: &Path, value: &Value, style: Option<&YAMLStyle>) -> Result<()> {
    let text = dump_to_string(value, style)?;
    std::fs::write(path, text)
        .map_err(|e| MigrateError::io_with_source(format!("failed to write {}", path.display()), e))
}

/// Re-indents an indentless-sequence YAML document so that every block
/// sequence's `-` sits `delta` spaces in from its parent key, including
/// sequences nested inside other sequences' items.
fn reindent_sequences(text: &str, delta: usize) -> String {
    let mut active_levels: Vec<usize> = Vec::new();
    let mut out = String::with_capacity(text.len() + 64);

    for line in text.lines() {
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }

        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        let is_dash = is_sequence_item(trimmed);

        while active_levels.last().is_some_and(|lvl| *lvl > indent) {
            active_levels.pop();
        }

        if is_dash {
            if active_levels.last() != Some(&indent) {
                active_levels.push(indent);
            }
        } else if active_levels.last() == Some(&indent) {
            active_levels.pop();
        }

        let shift = delta * active_levels.len();
        out.push_str(&" ".repeat(shift));
        out.push_str(line);
        out.push('\n');
    }

    out
}
