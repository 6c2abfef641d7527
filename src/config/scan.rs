use serde::{Deserialize, Serialize};

use crate::retention::{EntryKind, ScanOptions};

/// Which children of the target directory are considered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Operate on directories instead of files.
    #[serde(default)]
    pub directories: bool,

    /// Consider names starting with `.`.
    #[serde(default)]
    pub include_dotfiles: bool,
}

impl ScanConfig {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            entry_kind: EntryKind::from_directories_flag(self.directories),
            include_dotfiles: self.include_dotfiles,
        }
    }
}
