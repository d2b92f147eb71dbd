use serde::{Deserialize, Serialize};

use super::investment::Investment;

/// The persisted holdings payload: every investment plus the tag registry.
///
/// This is what lives under the holdings key of the durable store, and what
/// `export_snapshot` / `import_snapshot` exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    /// All holdings, in insertion order.
    pub investments: Vec<Investment>,

    /// Every tag ever created, in creation order. Investments may only carry
    /// tags listed here.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Holdings {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.investments.iter().position(|inv| inv.id == id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add `tag` to the registry if it is not there yet. Returns `true` if added.
    pub(crate) fn register_tag(&mut self, tag: &str) -> bool {
        if self.has_tag(tag) {
            false
        } else {
            self.tags.push(tag.to_string());
            true
        }
    }
}
