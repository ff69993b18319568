//! HireSense CLI
//!
//! Command line front end for the HireSense AI functions: an interactive
//! streaming chat, resume analysis and notification emails.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod chat;
mod config;
mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use hiresense::Client;
use hiresense::analysis::{AnalysisRequest, ResumeAnalysis};
use hiresense::notification::{
    EmailContent, NotificationData, NotificationKind, NotificationRequest, SENDER,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::chat::ChatSession;
use crate::config::{CliConfig, config_path as default_config_path, init_config, load_config_from};
use crate::error::{CliError, Result};

/// HireSense - AI recruiting assistant from the terminal
#[derive(Parser)]
#[command(name = "hiresense")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "HIRESENSE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Analyze a resume, optionally against a job description
    Analyze(AnalyzeArgs),

    /// Send a notification email
    Notify(NotifyArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Initial message to send
    #[arg(short, long)]
    message: Option<String>,

    /// Custom prompt prefix (overrides config)
    #[arg(short, long)]
    prompt: Option<String>,
}

/// Arguments for the analyze command
#[derive(Args)]
struct AnalyzeArgs {
    /// Plain-text resume file
    #[arg(short, long)]
    resume: PathBuf,

    /// Plain-text job description file
    #[arg(short, long)]
    job: Option<PathBuf>,

    /// Print the raw analysis as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the notify command
#[derive(Args)]
struct NotifyArgs {
    /// Notification kind (application_received, shortlisted,
    /// interview_scheduled, status_update)
    #[arg(short, long)]
    kind: NotificationKind,

    /// Recipient email address
    #[arg(short, long)]
    to: String,

    /// Recipient user id, for the delivery log
    #[arg(long)]
    user_id: Option<String>,

    /// Candidate name
    #[arg(long)]
    candidate: Option<String>,

    /// Job title
    #[arg(long)]
    job: Option<String>,

    /// Company name
    #[arg(long)]
    company: Option<String>,

    /// Interview date and time
    #[arg(long)]
    date: Option<String>,

    /// New application status
    #[arg(long)]
    status: Option<String>,

    /// Extra message for status updates
    #[arg(long)]
    message: Option<String>,

    /// Print the rendered email instead of sending it
    #[arg(long)]
    dry_run: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the configuration file and the resolved settings
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
///
/// Logs go to stderr so streamed replies on stdout stay clean.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hiresense={level},hiresense_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Commands::Chat(args) => cmd_chat(args, &config_file).await,
        Commands::Analyze(args) => cmd_analyze(args, &config_file).await,
        Commands::Notify(args) => cmd_notify(args, &config_file).await,
        Commands::Config(args) => cmd_config(args, &config_file).await,
    }
}

/// Build a client from the config file plus environment.
async fn load_client(config_file: &Path) -> Result<(CliConfig, Client)> {
    let config = load_config_from(config_file).await?;
    let client = Client::new(config.client_config()?)?;
    Ok((config, client))
}

/// Start interactive chat.
async fn cmd_chat(args: ChatArgs, config_file: &Path) -> Result<()> {
    let (config, client) = load_client(config_file).await?;
    let prompt = args.prompt.unwrap_or(config.chat.prompt);

    tracing::info!(endpoint = %client.endpoints().chat, "starting chat session");
    ChatSession::new(client, prompt).run(args.message).await
}

/// Analyze a resume.
async fn cmd_analyze(args: AnalyzeArgs, config_file: &Path) -> Result<()> {
    let resume = tokio::fs::read_to_string(&args.resume).await?;
    let mut request = AnalysisRequest::new(resume);
    if let Some(path) = &args.job {
        request = request.with_job_description(tokio::fs::read_to_string(path).await?);
    }

    let (_, client) = load_client(config_file).await?;
    let analysis = client.analyze_resume(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &ResumeAnalysis) {
    println!("Overall score:   {}/100", analysis.overall_score);
    if let Some(score) = analysis.job_match_score {
        println!("Job match score: {score}/100");
    }

    let sections = [
        ("Strengths", &analysis.strengths),
        ("Matched skills", &analysis.matched_skills),
        ("Missing skills", &analysis.missing_skills),
        ("Improvements", &analysis.improvements),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{title}:");
        for item in items {
            println!("  - {item}");
        }
    }

    if !analysis.summary.is_empty() {
        println!();
        println!("{}", analysis.summary);
    }
}

/// Send (or preview) a notification.
async fn cmd_notify(args: NotifyArgs, config_file: &Path) -> Result<()> {
    if !args.to.contains('@') {
        return Err(CliError::invalid(format!(
            "'{}' is not an email address",
            args.to
        )));
    }

    let data = NotificationData {
        candidate_name: args.candidate,
        job_title: args.job,
        company_name: args.company,
        interview_date: args.date,
        status: args.status,
        message: args.message,
    };
    let mut request = NotificationRequest::new(args.kind, args.to).with_data(data);
    if let Some(user_id) = args.user_id {
        request = request.with_user_id(user_id);
    }

    if args.dry_run {
        let EmailContent { subject, html } = request.render();
        println!("From:    {SENDER}");
        println!("To:      {}", request.recipient_email);
        println!("Subject: {subject}");
        println!();
        println!("{html}");
        return Ok(());
    }

    let (_, client) = load_client(config_file).await?;
    let receipt = client.send_notification(&request).await?;
    match receipt.id {
        Some(id) => println!("Notification sent ({id})"),
        None => println!("Notification sent"),
    }
    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_file: &Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            if config_file.exists() {
                let content = tokio::fs::read_to_string(config_file).await?;
                println!("{content}");
            } else {
                println!("Configuration file does not exist.");
                println!("Run 'hiresense config init' to create one.");
            }

            let config = load_config_from(config_file).await?;
            println!();
            println!("Resolved:");
            match config.client_config() {
                Ok(client_config) => {
                    println!("  URL:     {}", client_config.base_url);
                    println!("  API key: {}", mask(&client_config.api_key));
                    if let Some(chat) = &client_config.chat_endpoint {
                        println!("  Chat:    {chat}");
                    }
                    match client_config.timeout_secs {
                        Some(secs) => println!("  Timeout: {secs}s"),
                        None => println!("  Timeout: none"),
                    }
                }
                Err(e) => println!("  incomplete: {e}"),
            }
        }
        ConfigCommands::Init { force } => {
            if config_file.exists() && !force {
                println!("Configuration already exists at: {}", config_file.display());
                println!("Use --force to overwrite.");
                return Ok(());
            }

            init_config(config_file).await?;

            println!("Configuration created: {}", config_file.display());
            println!();
            println!("Next steps:");
            println!("  1. set service.url and service.api_key in the file");
            println!("     (or export HIRESENSE_URL and HIRESENSE_API_KEY)");
            println!("  2. hiresense chat");
        }
    }

    Ok(())
}

/// Show only the last four characters of a credential.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}
