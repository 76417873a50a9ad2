//! `examforge blueprint` — Blueprint inspection commands.

use examforge_blueprint::DirectoryBlueprintSource;
use examforge_config::AppConfig;
use examforge_core::{BlueprintId, LocalePolicy};

pub async fn list(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = DirectoryBlueprintSource::new(&config.content.blueprint_dir);
    let ids = source.list_ids().await?;
    if ids.is_empty() {
        println!("No blueprints in {}", source.dir().display());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

pub async fn show(config: &AppConfig, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::blueprint_store(config);
    let blueprint = store.load(&BlueprintId::from(id)).await?;

    println!("📋 Blueprint {}", blueprint.id());
    println!("   Tasks:     {}", blueprint.task_count());
    println!("   Questions: {}", blueprint.total_need());
    println!();
    println!("   {:<10} {:<8} {:>5}  {:<9} dedupe", "task", "block", "need", "locale");
    for task in blueprint.tasks() {
        let policy = match task.locale_policy {
            LocalePolicy::Strict => "strict",
            LocalePolicy::FallbackToReference => "fallback",
        };
        println!(
            "   {:<10} {:<8} {:>5}  {:<9} {}",
            task.task_id,
            task.block_id.as_deref().unwrap_or("-"),
            task.need,
            policy,
            if task.dedupe_by_family { "yes" } else { "no" }
        );
    }
    Ok(())
}

pub async fn validate(config: &AppConfig, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating blueprint {id}...");
    let store = super::blueprint_store(config);
    match store.load(&BlueprintId::from(id)).await {
        Ok(blueprint) => {
            println!(
                "   ✅ {} task(s), {} question(s)",
                blueprint.task_count(),
                blueprint.total_need()
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(blueprint_id = id, kind = e.kind(), "Blueprint validation failed");
            println!("   ❌ {e}");
            Err(e.into())
        }
    }
}
