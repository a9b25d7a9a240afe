//! ZABAL CLI: the main entry point.
//!
//! Commands:
//! - `init`            Create config, documents and prompt templates
//! - `newsletter`      Generate today's newsletter entry
//! - `social`          Turn a newsletter into social posts
//! - `full`            Newsletter, then social posts from it
//! - `interactive`     Prompt for inputs, then generate
//! - `lens`            Show which lens an input would select
//! - `check`           Run the editorial checks on a text file
//! - `memory`          Inspect or extend persona memory
//! - `update-context`  Learn voice updates from writing samples
//! - `serve`           Start the HTTP API

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::NewsletterArgs;

#[derive(Parser)]
#[command(
    name = "zabal",
    about = "ZABAL: persona-memory newsletter and social writing pipeline",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (default: ~/.zabal/config.toml)
    #[arg(long, global = true, env = "ZABAL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create config, persona documents and prompt templates
    Init,

    /// Generate today's newsletter entry
    Newsletter(NewsletterArgs),

    /// Generate social posts from a newsletter
    Social {
        /// File holding the newsletter text (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Link to the published newsletter
        #[arg(short, long)]
        link: Option<String>,

        /// Video content is available
        #[arg(long)]
        video: bool,
    },

    /// Generate the newsletter, then social posts from it
    Full {
        #[command(flatten)]
        newsletter: NewsletterArgs,

        /// Link to the published newsletter
        #[arg(short, long)]
        link: Option<String>,

        /// Video content is available
        #[arg(long)]
        video: bool,
    },

    /// Prompt for inputs, then generate newsletter and/or social posts
    Interactive,

    /// Show which mindful lens an input selects
    Lens {
        /// Daily input text
        input: String,

        /// Force a lens id
        #[arg(long)]
        lens: Option<String>,

        /// Calendar observance key
        #[arg(long)]
        calendar_key: Option<String>,
    },

    /// Run the editorial checks on a text file
    Check {
        /// File to check
        file: PathBuf,

        /// Content type: newsletter or social
        #[arg(short = 't', long = "type", default_value = "newsletter")]
        content_type: String,

        /// Apply safe fixes and print the result
        #[arg(long)]
        fix: bool,
    },

    /// Inspect or extend persona memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Learn voice updates from writing samples
    UpdateContext {
        /// Files holding writing samples
        files: Vec<PathBuf>,

        /// Inline writing sample (repeatable)
        #[arg(short, long)]
        text: Vec<String>,

        /// What felt off in recent output
        #[arg(long)]
        feedback: Option<String>,

        /// Show proposed changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Print the persona memory document
    Show,
    /// Append a voice example
    AddExample { title: String, content: String },
    /// Add a style note
    AddNote { note: String },
    /// Add a phrase to avoid
    AddDont { phrase: String },
    /// Add a context memory
    AddContext { text: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init => commands::init::run(config).await?,
        Commands::Newsletter(args) => commands::newsletter::run(config, args).await?,
        Commands::Social { file, link, video } => {
            commands::social::run(config, file, link, video).await?
        }
        Commands::Full {
            newsletter,
            link,
            video,
        } => commands::full::run(config, newsletter, link, video).await?,
        Commands::Interactive => commands::interactive::run(config).await?,
        Commands::Lens {
            input,
            lens,
            calendar_key,
        } => commands::lens::run(config, &input, lens.as_deref(), calendar_key.as_deref()).await?,
        Commands::Check {
            file,
            content_type,
            fix,
        } => commands::check::run(config, &file, &content_type, fix).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Show => commands::memory::show(config).await?,
            MemoryAction::AddExample { title, content } => {
                commands::memory::add_example(config, &title, &content).await?
            }
            MemoryAction::AddNote { note } => commands::memory::add_note(config, &note).await?,
            MemoryAction::AddDont { phrase } => commands::memory::add_dont(config, &phrase).await?,
            MemoryAction::AddContext { text } => {
                commands::memory::add_context(config, &text).await?
            }
        },
        Commands::UpdateContext {
            files,
            text,
            feedback,
            dry_run,
        } => commands::update::run(config, files, text, feedback, dry_run).await?,
        Commands::Serve { port } => commands::serve::run(config, port).await?,
    }

    Ok(())
}
