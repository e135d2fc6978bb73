use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use services::auth::EnvToken;
use services::{Clock, NextStep, TutorConfig, TutorServices};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tutor_core::model::{GenerationKind, SeriesId, Understanding};

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
    UnknownLesson { series: SeriesId, lesson: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnknownLesson { series, lesson } => {
                write!(f, "series {series} has no lesson {lesson}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

/// Lesson progression tutor: progress, curriculum and generated study aids.
#[derive(Parser)]
#[command(name = "tutor", version, about, long_about = None)]
struct Cli {
    /// SQLite database holding progress and the generation cache
    #[arg(long, env = "TUTOR_DB_URL", default_value = "sqlite://tutor.sqlite3")]
    db: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stored progress (repaired if it points at a locked series)
    Progress,

    /// Fetch a series and list its lessons with their status
    Series {
        /// Series id or alias: OT, U, L, C
        id: String,
    },

    /// Record the reading position
    Position { lesson: String, paragraph: usize },

    /// Mark a lesson completed and move on
    Complete {
        /// Series id or alias the lesson belongs to
        #[arg(long)]
        series: String,
        lesson: String,
    },

    /// Generate supplementary text for a paragraph
    Generate {
        /// explain, summary, understanding_question, homework, render_block
        kind: GenerationKind,
        #[arg(long)]
        series: SeriesId,
        #[arg(long)]
        lesson: String,
        #[arg(long, default_value_t = 0)]
        paragraph: usize,
        /// understood, partial, not_yet (required for homework)
        #[arg(long, required_if_eq("kind", "homework"))]
        understanding: Option<Understanding>,
        /// Learner question (explain only, never cached)
        #[arg(long)]
        question: Option<String>,
    },

    /// Show generation cache occupancy
    CacheStats,

    /// Drop all cached generations
    CacheClear,

    /// Wipe progress and the session pointer
    Reset,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;

    let config = TutorConfig::from_env();
    info!(api = %config.api_base_url, db = %db_url, "starting tutor");
    let services = TutorServices::new_sqlite(
        &db_url,
        Clock::system(),
        config,
        Arc::new(EnvToken::default()),
    )
    .await?;

    match cli.command {
        Commands::Progress => {
            let progress = services.progress().load_sanitized().await;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Commands::Series { id } => {
            let series = services.catalog().get_series(&id).await?;
            let progress = services.progress().load_sanitized().await;
            let statuses = services.lesson_statuses(&series, &progress);
            println!("{} ({})", series.title(), series.series_id());
            for (lesson, status) in series.lessons().iter().zip(statuses) {
                println!(
                    "  [{:>9}] {:<8} {} ({} paragraphs)",
                    status.as_str(),
                    lesson.lesson_id(),
                    lesson.title(),
                    lesson.paragraphs().len()
                );
            }
        }
        Commands::Position { lesson, paragraph } => {
            let progress = services.progress().update_position(&lesson, paragraph).await;
            println!(
                "now at {lesson} paragraph {paragraph} in series {}",
                progress.current_series_id
            );
        }
        Commands::Complete { series, lesson } => {
            let series = services.catalog().get_series(&series).await?;
            if series.find_lesson_by_id(&lesson).is_none() {
                return Err(ArgsError::UnknownLesson {
                    series: series.series_id(),
                    lesson,
                }
                .into());
            }
            match services.complete_lesson(&series, &lesson).await {
                NextStep::Lesson { lesson_id } => println!("next lesson: {lesson_id}"),
                NextStep::Series { series_id } => {
                    println!("series complete, next series: {}", series_id.info().title);
                }
                NextStep::CurriculumComplete => println!("curriculum complete"),
            }
        }
        Commands::Generate {
            kind,
            series,
            lesson,
            paragraph,
            understanding,
            question,
        } => {
            let text = services
                .generator()
                .generate(
                    kind,
                    series,
                    &lesson,
                    paragraph,
                    understanding,
                    question.as_deref(),
                )
                .await?;
            println!("{text}");
        }
        Commands::CacheStats => {
            let stats = services.generator().cache().stats().await;
            println!("entries: {}", stats.item_count);
            println!("oldest:  {}s", stats.oldest_age.num_seconds());
            println!("newest:  {}s", stats.newest_age.num_seconds());
        }
        Commands::CacheClear => services.generator().cache().clear().await,
        Commands::Reset => {
            services.reset().await;
            println!("progress reset");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "tutor",
            "generate",
            "homework",
            "--series",
            "U",
            "--lesson",
            "U-2",
            "--understanding",
            "not_yet",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                kind,
                series,
                understanding,
                paragraph,
                ..
            } => {
                assert_eq!(kind, GenerationKind::Homework);
                assert_eq!(series, SeriesId::U);
                assert_eq!(understanding, Some(Understanding::NotYet));
                assert_eq!(paragraph, 0);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn homework_requires_understanding() {
        let args = ["tutor", "generate", "homework", "--series", "OT", "--lesson", "OT-1"];
        assert!(Cli::try_parse_from(args).is_err());

        let cli = Cli::try_parse_from(["tutor", "generate", "summary", "--series", "OT", "--lesson", "OT-1"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/t.db"),
            "sqlite:///tmp/t.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/t.db"), "sqlite:///tmp/t.db");
        assert!(normalize_sqlite_url("t.db").ends_with("/t.db"));
    }

    #[test]
    fn prepare_rejects_non_file_urls() {
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
        assert!(prepare_sqlite_file("postgres://x").is_err());
        assert!(prepare_sqlite_file("sqlite://").is_err());
    }
}
