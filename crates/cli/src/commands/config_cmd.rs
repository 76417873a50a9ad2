//! `examforge config` — Configuration management commands.

use examforge_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.content.blueprint_dir.is_dir() {
                warnings.push(format!(
                    "Blueprint directory {} does not exist",
                    config.content.blueprint_dir.display()
                ));
            }
            if !config.content.question_bank.is_file() {
                warnings.push(format!(
                    "Question bank {} does not exist",
                    config.content.question_bank.display()
                ));
            }
            if config.assembly.default_locale.trim().is_empty() {
                warnings.push("assembly.default_locale is blank; requests without a locale use the reference locale".into());
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Reference locale: {}", config.assembly.reference_locale);
            println!("   Default locale:   {}", config.assembly.default_locale);
            println!("   Concurrency:      {}", config.assembly.max_concurrent_tasks);
            println!("   Log level:        {}", config.logging.level);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
