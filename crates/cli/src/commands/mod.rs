pub mod assemble;
pub mod blueprint;
pub mod config_cmd;
pub mod status;

use examforge_blueprint::{BlueprintStore, DirectoryBlueprintSource};
use examforge_config::AppConfig;
use std::sync::Arc;

/// A blueprint store over the configured blueprint directory.
pub fn blueprint_store(config: &AppConfig) -> BlueprintStore {
    let source = DirectoryBlueprintSource::new(&config.content.blueprint_dir);
    BlueprintStore::new(Arc::new(source))
}
