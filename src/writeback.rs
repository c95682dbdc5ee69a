//! Record an assigned proposal identifier in the source document.
use crate::document::{FRONT_MATTER_DELIMITER, PROPOSAL_ID_KEY};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Return `content` with the identifier line set to `id`.
///
/// An existing identifier line inside the front matter is replaced in place;
/// otherwise a new line is inserted immediately after the first line. The
/// value is written double-quoted so YAML reads it back as the same string.
pub fn with_identifier(content: &str, id: &str) -> Result<String> {
    let quoted = serde_json::to_string(id).context("quote proposal identifier")?;
    let id_line = format!("{PROPOSAL_ID_KEY}: {quoted}");
    let prefix = format!("{PROPOSAL_ID_KEY}:");

    let mut delimiters = 0;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if bare.trim() == FRONT_MATTER_DELIMITER {
            delimiters += 1;
            if delimiters == 2 {
                break;
            }
        } else if delimiters == 1 && bare.starts_with(&prefix) {
            let rest = &content[offset + bare.len()..];
            return Ok(format!("{}{id_line}{rest}", &content[..offset]));
        }
        offset += line.len();
    }

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    Ok(match content.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{id_line}{newline}{rest}"),
        None => format!("{content}{newline}{id_line}"),
    })
}

/// Rewrite `path` with the identifier recorded. Returns whether the file changed.
pub fn write_identifier(path: &Path, id: &str) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let updated = with_identifier(&content, id)?;
    if updated == content {
        return Ok(false);
    }
    fs::write(path, updated.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}
