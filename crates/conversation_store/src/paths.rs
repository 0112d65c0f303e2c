use std::path::{Path, PathBuf};

pub const CONVERSATIONS_FILE: &str = "conversations.json";
pub const CURRENT_POINTER_FILE: &str = "current_conversation";

/// Path of the serialized conversation collection under `root`.
#[must_use]
pub fn conversations_file(root: &Path) -> PathBuf {
    root.join(CONVERSATIONS_FILE)
}

/// Path of the persisted current-conversation pointer under `root`.
#[must_use]
pub fn current_pointer_file(root: &Path) -> PathBuf {
    root.join(CURRENT_POINTER_FILE)
}
