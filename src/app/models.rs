//! Data models for Media Archiver
//!
//! This module defines the unit of work handed to the archiver and the
//! loader that turns an item manifest (the upstream collector's output) into a
//! batch of items.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult, ManifestError, ManifestResult};

/// One remote resource to fetch and archive
///
/// The identifier must be unique within a batch: it becomes the archive entry
/// name (`<id>.<ext>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier, used as the archive entry stem
    pub id: String,
    /// Location of the resource
    #[serde(rename = "url", alias = "sourceUrl", alias = "videoUrl")]
    pub source_url: String,
}

impl Item {
    /// Create a new item
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
        }
    }

    /// Parse an `ID=URL` pair as given on the command line
    pub fn from_spec(spec: &str) -> ManifestResult<Self> {
        match spec.split_once('=') {
            Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                Ok(Self::new(id.trim(), url.trim()))
            }
            _ => Err(ManifestError::InvalidItemSpec {
                spec: spec.to_string(),
            }),
        }
    }

    /// Archive entry name for this item
    pub fn entry_name(&self, extension: &str) -> String {
        if extension.is_empty() {
            self.id.clone()
        } else {
            format!("{}.{}", self.id, extension)
        }
    }
}

/// Check that no two items share an identifier
///
/// # Errors
///
/// Returns `ConfigError::DuplicateItem` naming the first repeated id
pub fn ensure_unique_ids(items: &[Item]) -> ConfigResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(ConfigError::DuplicateItem {
                id: item.id.clone(),
            });
        }
    }
    Ok(())
}

/// Check that every identifier is a plain file name
///
/// Ids become entry names verbatim, so anything an extractor could resolve
/// outside its target directory is refused.
///
/// # Errors
///
/// Returns `ConfigError::InvalidItemId` for the first offending id
pub fn ensure_safe_ids(items: &[Item]) -> ConfigResult<()> {
    for item in items {
        let id = item.id.as_str();
        let reason = if id.trim().is_empty() {
            Some("id cannot be empty")
        } else if id.contains(['/', '\\']) {
            Some("id cannot contain path separators")
        } else if id == "." || id == ".." {
            Some("id must name a file")
        } else if id.chars().any(char::is_control) {
            Some("id cannot contain control characters")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ConfigError::InvalidItemId {
                id: id.to_string(),
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

/// Parse items from manifest text
///
/// Accepts either a JSON array of `{"id", "url"}` objects or one such object
/// per line (blank lines ignored).
pub fn parse_items(content: &str) -> ManifestResult<Vec<Item>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| ManifestError::InvalidFormat {
            line: e.line(),
            reason: e.to_string(),
        });
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| ManifestError::InvalidFormat {
                line: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Load items from a manifest file
///
/// # Errors
///
/// Returns `ManifestError::NotFound` if the file does not exist, or
/// `ManifestError::InvalidFormat` if it cannot be parsed
pub async fn load_items(path: &Path) -> ManifestResult<Vec<Item>> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = tokio::fs::read_to_string(path).await?;
    let items = parse_items(&content)?;
    tracing::debug!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}
