//! `examforge assemble` — Assemble an exam for one user.

use clap::Args;
use examforge_assembler::{ExamAssembler, practice_scope};
use examforge_config::AppConfig;
use examforge_core::{AssemblyError, BlueprintId, Exam, Locale, resolve_content_locale};
use examforge_pool::{InMemoryQuestionPool, InMemoryUserHistory};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Args)]
pub struct AssembleArgs {
    /// Blueprint id (`<blueprint_dir>/<id>.json`)
    #[arg(short, long)]
    blueprint: String,

    /// User whose history drives item selection
    #[arg(short, long)]
    user: String,

    /// Content locale (defaults to `assembly.default_locale`)
    #[arg(short, long)]
    locale: Option<String>,

    /// Switch to a locale that has content when the requested one has none
    #[arg(long)]
    auto_locale: bool,

    /// Restrict to these tasks (practice mode); repeatable
    #[arg(short, long = "task")]
    tasks: Vec<String>,

    /// Total item count for practice mode, spread across tasks by quota
    #[arg(long)]
    total: Option<usize>,

    /// Print the exam as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(config: &AppConfig, args: AssembleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::blueprint_store(config);
    let blueprint = store.load(&BlueprintId::new(args.blueprint)).await?;

    let reference = Locale::parse(&config.assembly.reference_locale);
    let pool = InMemoryQuestionPool::load_jsonl(&config.content.question_bank)
        .await?
        .with_reference_locale(reference.clone());
    let history = InMemoryUserHistory::load_jsonl(&config.content.history_file).await?;

    let mut locale = args
        .locale
        .unwrap_or_else(|| config.assembly.default_locale.clone());
    if args.auto_locale {
        let resolution = resolve_content_locale(&locale, &pool.locales().await, reference.as_str());
        if let Some(reason) = resolution.fallback_reason {
            eprintln!(
                "⚠️  No content for locale {} ({reason}), using {}",
                resolution.requested, resolution.resolved
            );
        }
        debug!(
            requested = %resolution.requested,
            resolved = %resolution.resolved,
            "Content locale resolved"
        );
        locale = resolution.resolved.to_string();
    }

    let blueprint = if args.tasks.is_empty() && args.total.is_none() {
        blueprint
    } else {
        let chosen: Vec<String> = if args.tasks.is_empty() {
            blueprint.tasks().iter().map(|t| t.task_id.clone()).collect()
        } else {
            args.tasks
        };
        let total = args.total.unwrap_or_else(|| {
            blueprint
                .tasks()
                .iter()
                .filter(|t| chosen.contains(&t.task_id))
                .map(|t| t.need)
                .sum()
        });
        info!(
            blueprint_id = %blueprint.id(),
            chosen = chosen.len(),
            total,
            "Practice mode requested"
        );
        Arc::new(practice_scope(&blueprint, &chosen, total)?)
    };

    info!(
        blueprint_id = %blueprint.id(),
        user = %args.user,
        locale = %locale,
        "Assembling from CLI"
    );

    let assembler = ExamAssembler::new(Arc::new(pool), Arc::new(history)).with_config(&config.assembly);
    match assembler.assemble(&blueprint, &args.user, &locale).await {
        Ok(exam) if args.json => {
            let out = serde_json::json!({
                "fingerprint": exam.fingerprint(),
                "exam": exam,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Ok(exam) => {
            print_exam(&exam);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", headline(&e));
            if let AssemblyError::Deficit { details } = &e {
                for detail in details {
                    eprintln!("   • {detail}");
                }
            }
            Err(e.into())
        }
    }
}

fn print_exam(exam: &Exam) {
    println!("📝 Exam {} ({})", exam.blueprint_id(), exam.locale());
    println!("   Questions:   {}", exam.len());
    println!("   Fingerprint: {}", exam.fingerprint());
    for section in exam.sections() {
        println!();
        println!(
            "   [{}] {} item(s), {} unseen{}",
            section.task_id,
            section.questions.len(),
            section.unseen,
            if section.used_fallback {
                ", includes reference-locale items"
            } else {
                ""
            }
        );
        for question in &section.questions {
            println!("     - {} ({})", question.id, question.locale);
        }
    }
}

fn headline(error: &AssemblyError) -> String {
    match error {
        AssemblyError::ContentNotFound { path } => format!("Content not found: {path}"),
        AssemblyError::SchemaViolation { path, reason } => {
            format!("Blueprint or content is malformed at {path}: {reason}")
        }
        AssemblyError::QuotaExceeded {
            task_id,
            required,
            have,
        } => format!("Task {task_id} needs {required} item(s) but only {have} are eligible"),
        AssemblyError::IoFailure { cause } => format!("Could not read content: {cause}"),
        AssemblyError::Deficit { details } => {
            format!("Not enough eligible items in {} task(s):", details.len())
        }
    }
}
