use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_STORAGE_KEY: &str = "schemastudio_designer_v1";

/// Tunables of a [`DesignerStore`](super::DesignerStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshots kept on each of the undo and redo stacks.
    pub history_capacity: usize,
    /// Name the designer state is saved under.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}
