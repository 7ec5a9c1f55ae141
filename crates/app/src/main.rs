mod study_loop;

use std::fmt;

use services::{AppServices, Clock, GenerationCounts, UploadedDocument};
use storage::repository::{NewQuestionRecord, Storage};
use study_core::model::{QuestionDraft, QuestionKind};
use study_core::selector::{ReviewFilter, TopicFilter};

//
// ─── ARGUMENT PARSING ──────────────────────────────────────────────────────────
//

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidKind { raw: String },
    InvalidCount { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --type value (flashcard|quiz|essay): {raw}")
            }
            ArgsError::InvalidCount { flag, raw } => {
                write!(f, "invalid {flag} value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
struct CommonArgs {
    db_url: String,
    username: String,
}

impl CommonArgs {
    fn from_env() -> Self {
        let db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url);
        let username = std::env::var("STUDY_USER").unwrap_or_else(|_| "student".into());
        Self { db_url, username }
    }

    /// Consume a shared flag; returns false when the flag is not ours.
    fn accept(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match arg {
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                self.db_url = normalize_sqlite_url(value);
                Ok(true)
            }
            "--user" => {
                self.username = require_value(args, "--user")?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug)]
struct StudyArgs {
    common: CommonArgs,
    topic: Option<String>,
    kind: Option<QuestionKind>,
    only_failed: bool,
    resume: Option<String>,
}

#[derive(Debug)]
struct GenerateArgs {
    common: CommonArgs,
    topic: String,
    files: Vec<String>,
}

#[derive(Debug)]
struct MoreArgs {
    common: CommonArgs,
    topic: String,
    counts: GenerationCounts,
}

#[derive(Debug)]
struct TopicArgs {
    common: CommonArgs,
    topic: String,
}

#[derive(Debug)]
struct WipeArgs {
    common: CommonArgs,
    confirmed: bool,
}

#[derive(Debug)]
enum Command {
    Study(StudyArgs),
    Generate(GenerateArgs),
    More(MoreArgs),
    Stats(CommonArgs),
    Topics(CommonArgs),
    DeleteTopic(TopicArgs),
    ClearHistory(CommonArgs),
    Wipe(WipeArgs),
    Seed(TopicArgs),
}

fn parse_kind(raw: &str) -> Result<QuestionKind, ArgsError> {
    QuestionKind::parse(raw).map_err(|_| ArgsError::InvalidKind {
        raw: raw.to_string(),
    })
}

fn parse_count(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidCount { flag, raw })
}

fn parse_study(args: &mut impl Iterator<Item = String>) -> Result<StudyArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    let mut topic = None;
    let mut kind = None;
    let mut only_failed = false;
    let mut resume = None;

    while let Some(arg) = args.next() {
        if common.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--type" => kind = Some(parse_kind(&require_value(args, "--type")?)?),
            "--failed-only" => only_failed = true,
            "--resume" => resume = Some(require_value(args, "--resume")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(StudyArgs {
        common,
        topic,
        kind,
        only_failed,
        resume,
    })
}

fn parse_generate(args: &mut impl Iterator<Item = String>) -> Result<GenerateArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    let mut topic = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        if common.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--file" => files.push(require_value(args, "--file")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(GenerateArgs {
        common,
        topic: topic.ok_or(ArgsError::MissingFlag { flag: "--topic" })?,
        files,
    })
}

fn parse_more(args: &mut impl Iterator<Item = String>) -> Result<MoreArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    let mut topic = None;
    // Defaults mirror the generation dialog: a few flashcards, a couple of
    // quiz questions, no essays.
    let mut flashcards = 3;
    let mut quiz = 2;
    let mut essays = 0;

    while let Some(arg) = args.next() {
        if common.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--flashcards" => flashcards = parse_count(args, "--flashcards")?,
            "--quiz" => quiz = parse_count(args, "--quiz")?,
            "--essays" => essays = parse_count(args, "--essays")?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(MoreArgs {
        common,
        topic: topic.ok_or(ArgsError::MissingFlag { flag: "--topic" })?,
        counts: GenerationCounts::new(flashcards, quiz, essays),
    })
}

fn parse_common_only(args: &mut impl Iterator<Item = String>) -> Result<CommonArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    while let Some(arg) = args.next() {
        if !common.accept(&arg, args)? {
            return Err(ArgsError::UnknownArg(arg));
        }
    }
    Ok(common)
}

fn parse_topic_command(
    args: &mut impl Iterator<Item = String>,
    default_topic: Option<&str>,
) -> Result<TopicArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    let mut topic = None;

    while let Some(arg) = args.next() {
        if common.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    let topic = topic
        .or_else(|| default_topic.map(str::to_string))
        .ok_or(ArgsError::MissingFlag { flag: "--topic" })?;
    Ok(TopicArgs { common, topic })
}

fn parse_wipe(args: &mut impl Iterator<Item = String>) -> Result<WipeArgs, ArgsError> {
    let mut common = CommonArgs::from_env();
    let mut confirmed = false;

    while let Some(arg) = args.next() {
        if common.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--yes" => confirmed = true,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(WipeArgs { common, confirmed })
}

fn print_usage() {
    eprintln!("Usage: study <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  study          Interactive study session");
    eprintln!("                 [--topic <name>] [--type flashcard|quiz|essay]");
    eprintln!("                 [--failed-only] [--resume <pos>]");
    eprintln!("  generate       Create questions from documents");
    eprintln!("                 --topic <name> --file <path> [--file <path> ...]");
    eprintln!("  more           Generate extra questions for a topic");
    eprintln!("                 --topic <name> [--flashcards N] [--quiz N] [--essays N]");
    eprintln!("  stats          Show answer statistics and recent history");
    eprintln!("  topics         List topics with question counts");
    eprintln!("  delete-topic   Delete a topic and its progress  --topic <name>");
    eprintln!("  clear-history  Delete the current user's answer history");
    eprintln!("  wipe           Delete ALL questions and progress  --yes");
    eprintln!("  seed           Insert a small sample question set [--topic <name>]");
    eprintln!();
    eprintln!("Shared options: [--db <sqlite_url>] [--user <name>]");
    eprintln!();
    eprintln!("Environment: STUDY_DB_URL, STUDY_USER, STUDY_AI_API_KEY,");
    eprintln!("             STUDY_AI_BASE_URL, STUDY_AI_MODELS, STUDY_DOCS_DIR");
}

fn parse_command(mut argv: impl Iterator<Item = String>) -> Result<Option<Command>, ArgsError> {
    let Some(first) = argv.next() else {
        return Ok(None);
    };
    if first == "--help" || first == "-h" {
        return Ok(None);
    }

    let command = match first.as_str() {
        "study" => Command::Study(parse_study(&mut argv)?),
        "generate" => Command::Generate(parse_generate(&mut argv)?),
        "more" => Command::More(parse_more(&mut argv)?),
        "stats" => Command::Stats(parse_common_only(&mut argv)?),
        "topics" => Command::Topics(parse_common_only(&mut argv)?),
        "delete-topic" => Command::DeleteTopic(parse_topic_command(&mut argv, None)?),
        "clear-history" => Command::ClearHistory(parse_common_only(&mut argv)?),
        "wipe" => Command::Wipe(parse_wipe(&mut argv)?),
        "seed" => Command::Seed(parse_topic_command(&mut argv, Some("Sample"))?),
        other => return Err(ArgsError::UnknownArg(other.to_string())),
    };
    Ok(Some(command))
}

//
// ─── SQLITE BOOTSTRAP ──────────────────────────────────────────────────────────
//

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

    let path = std::path::Path::new(path);
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

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

type AppResult = Result<(), Box<dyn std::error::Error>>;

async fn open_services(db_url: &str) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(AppServices::new_sqlite(db_url, Clock::default_clock()).await?)
}

async fn cmd_study(args: StudyArgs) -> AppResult {
    let services = open_services(&args.common.db_url).await?;
    let topic = args.topic.map_or(TopicFilter::All, TopicFilter::named);
    let filter = ReviewFilter::new(topic, args.kind, args.only_failed);

    let session = services
        .study_loop()
        .start_session(&args.common.username, filter, args.resume.as_deref())
        .await?;

    if session.is_empty() {
        // Same signal, different message: an empty review set is good news.
        if args.only_failed {
            println!("Nothing left to review — every failed question is cleared.");
        } else {
            println!("No questions match these filters. Try `generate` first.");
        }
        return Ok(());
    }

    study_loop::run(services.study_loop(), session).await?;
    Ok(())
}

async fn cmd_generate(args: GenerateArgs) -> AppResult {
    let services = open_services(&args.common.db_url).await?;
    if !services.generation().enabled() {
        eprintln!("warning: STUDY_AI_API_KEY is not set; generation is disabled.");
        return Ok(());
    }

    let mut uploads = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let text = std::fs::read_to_string(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();
        uploads.push(UploadedDocument::new(name, text));
    }

    println!("Analyzing {} document(s)...", uploads.len());
    let created = services
        .generation()
        .generate_from_documents(&args.common.username, &args.topic, &uploads)
        .await?;

    if created == 0 {
        println!("The model produced no usable questions.");
    } else {
        println!("Created {created} questions under topic '{}'.", args.topic.trim());
    }
    Ok(())
}

async fn cmd_more(args: MoreArgs) -> AppResult {
    let services = open_services(&args.common.db_url).await?;
    if !services.generation().enabled() {
        eprintln!("warning: STUDY_AI_API_KEY is not set; generation is disabled.");
        return Ok(());
    }
    if args.counts.total() == 0 {
        println!("Nothing to generate: all counts are zero.");
        return Ok(());
    }

    println!(
        "Generating {} new question(s) for '{}'...",
        args.counts.total(),
        args.topic
    );
    let created = services
        .generation()
        .generate_more(&args.topic, args.counts)
        .await?;

    if created == 0 {
        println!("The model produced no usable questions.");
    } else {
        println!("Created {created} questions.");
    }
    Ok(())
}

async fn cmd_stats(common: CommonArgs) -> AppResult {
    let services = open_services(&common.db_url).await?;
    let review = services.review();

    let stats = review.stats(&common.username).await?;
    if stats.total == 0 {
        println!("No answers recorded yet for {}. Go study!", common.username);
        return Ok(());
    }

    println!("Statistics for {}:", common.username);
    println!("  answered:  {}", stats.total);
    println!("  correct:   {}", stats.correct);
    println!("  incorrect: {}", stats.incorrect());
    println!("  accuracy:  {:.1}%", stats.accuracy());

    let history = review.history(&common.username, 10).await?;
    println!("\nRecent answers (newest first):");
    for entry in history {
        let mark = if entry.is_correct { "+" } else { "-" };
        println!("  [{mark}] question {}", entry.question_id);
    }
    Ok(())
}

async fn cmd_topics(common: CommonArgs) -> AppResult {
    let services = open_services(&common.db_url).await?;
    let overview = services.content().topic_overview().await?;
    if overview.is_empty() {
        println!("No content yet. Use `generate` or `seed` to create questions.");
        return Ok(());
    }

    println!("Topics:");
    for item in overview {
        println!("  {:<30} {} questions", item.topic, item.questions);
    }
    Ok(())
}

async fn cmd_delete_topic(args: TopicArgs) -> AppResult {
    let services = open_services(&args.common.db_url).await?;
    let removed = services.content().delete_topic(&args.topic).await?;
    if removed == 0 {
        println!("No topic named '{}'.", args.topic);
    } else {
        println!(
            "Deleted topic '{}' ({removed} questions and their progress).",
            args.topic
        );
    }
    Ok(())
}

async fn cmd_clear_history(common: CommonArgs) -> AppResult {
    let services = open_services(&common.db_url).await?;
    let removed = services.review().clear_history(&common.username).await?;
    println!("Deleted {removed} history entries for {}.", common.username);
    Ok(())
}

async fn cmd_wipe(args: WipeArgs) -> AppResult {
    if !args.confirmed {
        eprintln!("wipe deletes every question and all progress; pass --yes to confirm.");
        return Ok(());
    }

    let services = open_services(&args.common.db_url).await?;
    services.content().wipe_all().await?;
    println!("All questions and progress deleted.");
    Ok(())
}

/// Built-in sample content so the study loop can be tried without AI access.
fn sample_drafts() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft {
            kind: QuestionKind::Flashcard,
            prompt: "What does CPU stand for?".into(),
            answer: "Central Processing Unit".into(),
            options: None,
        },
        QuestionDraft {
            kind: QuestionKind::Flashcard,
            prompt: "What is the time complexity of binary search?".into(),
            answer: "O(log n)".into(),
            options: None,
        },
        QuestionDraft {
            kind: QuestionKind::Quiz,
            prompt: "Which data structure is FIFO?".into(),
            answer: "Queue".into(),
            options: Some(vec![
                "Stack".into(),
                "Queue".into(),
                "Tree".into(),
                "Heap".into(),
            ]),
        },
        QuestionDraft {
            kind: QuestionKind::Quiz,
            prompt: "Which sort is stable?".into(),
            answer: "Merge sort".into(),
            options: Some(vec![
                "Quick sort".into(),
                "Heap sort".into(),
                "Merge sort".into(),
                "Selection sort".into(),
            ]),
        },
        QuestionDraft {
            kind: QuestionKind::Essay,
            prompt: "Explain the difference between a process and a thread.".into(),
            answer: "A process owns its address space; threads share one within a process."
                .into(),
            options: None,
        },
    ]
}

async fn cmd_seed(args: TopicArgs) -> AppResult {
    prepare_sqlite_file(&args.common.db_url)?;
    let storage = Storage::sqlite(&args.common.db_url).await?;

    let mut batch = Vec::new();
    for draft in sample_drafts() {
        batch.push(NewQuestionRecord::from_validated(
            &draft.validate(&args.topic)?,
        ));
    }
    let ids = storage.questions.insert_questions(&batch).await?;
    println!("Seeded {} questions under topic '{}'.", ids.len(), args.topic);
    Ok(())
}

//
// ─── ENTRY POINT ───────────────────────────────────────────────────────────────
//

async fn run() -> AppResult {
    let argv = std::env::args().skip(1);
    let command = match parse_command(argv) {
        Ok(Some(command)) => command,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    match command {
        Command::Study(args) => cmd_study(args).await,
        Command::Generate(args) => cmd_generate(args).await,
        Command::More(args) => cmd_more(args).await,
        Command::Stats(common) => cmd_stats(common).await,
        Command::Topics(common) => cmd_topics(common).await,
        Command::DeleteTopic(args) => cmd_delete_topic(args).await,
        Command::ClearHistory(common) => cmd_clear_history(common).await,
        Command::Wipe(args) => cmd_wipe(args).await,
        Command::Seed(args) => cmd_seed(args).await,
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
