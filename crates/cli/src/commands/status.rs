//! `examforge status` — Show content and configuration status.

use examforge_blueprint::DirectoryBlueprintSource;
use examforge_config::AppConfig;
use examforge_pool::{InMemoryQuestionPool, InMemoryUserHistory};

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("📚 ExamForge Status");
    println!("===================");
    println!("  Config dir:        {}", AppConfig::config_dir().display());
    println!("  Reference locale:  {}", config.assembly.reference_locale);
    println!("  Default locale:    {}", config.assembly.default_locale);
    println!("  Concurrency:       {}", config.assembly.max_concurrent_tasks);

    let source = DirectoryBlueprintSource::new(&config.content.blueprint_dir);
    match source.list_ids().await {
        Ok(ids) => println!(
            "  Blueprints:        {} in {}",
            ids.len(),
            source.dir().display()
        ),
        Err(e) => println!("  Blueprints:        ⚠️  {e}"),
    }

    match InMemoryQuestionPool::load_jsonl(&config.content.question_bank).await {
        Ok(pool) => {
            println!("  Questions:         {}", pool.len().await);
            println!("  Locales:           {}", pool.locales().await.join(", "));
            println!("  Tasks covered:     {}", pool.task_ids().await.len());
        }
        Err(e) => println!("  Questions:         ⚠️  {e}"),
    }

    match InMemoryUserHistory::load_jsonl(&config.content.history_file).await {
        Ok(history) => println!("  Users with history: {}", history.user_count().await),
        Err(e) => println!("  History:           ⚠️  {e}"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — using defaults ({})", config_path.display());
    }

    Ok(())
}
