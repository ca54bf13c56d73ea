use std::path::Path;

use aw_session::{SessionConfig, SnapshotStore};

pub fn run(save_dir: &Path) -> Result<(), String> {
    let store = super::open_store(save_dir);
    let key = SessionConfig::default().save_key;
    store
        .delete(&key)
        .map_err(|e| format!("failed to delete saved session: {e}"))?;
    println!("  Cleared saved session in {}.", save_dir.display());
    Ok(())
}
