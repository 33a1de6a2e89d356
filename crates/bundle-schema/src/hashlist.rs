//! The flat hash listing (`hashes.sha256`).
//!
//! One `<sha256>  <bundle path>` line per evidence file, the text-mode
//! format understood by `sha256sum -c` when run from the bundle root.
//! Paths containing line breaks or backslashes are escaped as GNU coreutils
//! does it: the line gets a leading `\` and the path uses `\\`, `\n`
//! and `\r`.

use crate::Manifest;
use evibundle_common::{Error, Result};

/// A single line of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashLine {
    pub sha256: String,
    pub path: String,
}

/// The parsed or generated hash listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashListing {
    pub lines: Vec<HashLine>,
}

impl HashListing {
    /// One line per manifest entry, in manifest order.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let lines = manifest
            .files
            .iter()
            .map(|f| HashLine {
                sha256: f.sha256.clone(),
                path: f.bundle_path(),
            })
            .collect();
        Self { lines }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if needs_escape(&line.path) {
                out.push_str(&format!("\\{}  {}\n", line.sha256, escape(&line.path)));
            } else {
                out.push_str(&format!("{}  {}\n", line.sha256, line.path));
            }
        }
        out
    }

    /// Parse a listing. Accepts the binary-mode `*` marker as well.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let (escaped, raw) = match raw.strip_prefix('\\') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let (sha256, rest) = raw.split_once(' ').ok_or_else(|| {
                Error::Input(format!("hash listing line {}: missing separator", idx + 1))
            })?;
            let path = rest
                .strip_prefix(' ')
                .or_else(|| rest.strip_prefix('*'))
                .ok_or_else(|| {
                    Error::Input(format!("hash listing line {}: bad mode marker", idx + 1))
                })?;
            if sha256.len() != 64 || !sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::Input(format!(
                    "hash listing line {}: invalid digest {:?}",
                    idx + 1,
                    sha256
                )));
            }
            let path = if escaped {
                unescape(path).ok_or_else(|| {
                    Error::Input(format!("hash listing line {}: bad escape sequence", idx + 1))
                })?
            } else {
                path.to_string()
            };
            lines.push(HashLine {
                sha256: sha256.to_ascii_lowercase(),
                path,
            });
        }
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn needs_escape(path: &str) -> bool {
    path.contains(|c| matches!(c, '\\' | '\n' | '\r'))
}

fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    for c in path.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(path: &str) -> Option<String> {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}
