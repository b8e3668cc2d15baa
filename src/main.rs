use std::io::{self, BufRead};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, Command, OutputFormat};
use vscribe::config::{Config, configured};
use vscribe::wordpress::WordPress;

const USER_AGENT: &str = concat!("vscribe/", env!("CARGO_PKG_VERSION"));

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("vscribe.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vscribe")
        .join("logs")
}

fn status_line(ok: bool, label: &str, detail: &str) -> String {
    if ok {
        format!("  \x1b[32m✅\x1b[0m {label:<16} {detail}")
    } else {
        format!("  \x1b[31m❌\x1b[0m {label:<16} {detail}")
    }
}

fn build_after_help() -> String {
    let config_path = vscribe::config::config_path();
    let config = Config::load(None).unwrap_or_default();

    let lines = [
        status_line(config_path.exists(), "config file", &config_path.display().to_string()),
        status_line(
            configured(&config.openai.api_key).is_some(),
            "OpenAI API key",
            "required for content generation",
        ),
        status_line(
            configured(&config.wordpress.url).is_some() && configured(&config.wordpress.app_password).is_some(),
            "WordPress",
            "required for creating drafts",
        ),
        status_line(
            configured(&config.youtube.api_key).is_some(),
            "YouTube API key",
            "optional (oEmbed is used without it)",
        ),
    ];

    format!(
        "\nCONFIGURATION:\n{}\n\nLogs are written to: {}",
        lines.join("\n"),
        log_dir().join("vscribe.log").display()
    )
}

fn read_urls(url: Option<String>) -> Result<Vec<String>> {
    let urls = match url {
        Some(url) => vec![url],
        None => io::stdin().lock().lines().collect::<Result<Vec<_>, _>>()?,
    };
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: vscribe process <URL>\n       echo <URL> | vscribe process");
    }
    Ok(urls)
}

async fn process(client: &reqwest::Client, config: &Config, cli: &Cli, url: Option<String>) -> Result<()> {
    let urls = read_urls(url)?;
    let mut failed = 0;

    for url in &urls {
        let verbose = cli.verbose;
        let outcome = vscribe::pipeline::process(client, config, url, |stage| {
            if verbose {
                eprintln!("[{url}] {stage}");
            }
        })
        .await;

        match outcome {
            Ok(outcome) => {
                if cli.verbose {
                    eprintln!("Transcript source: {}", outcome.transcript_source);
                }
                let rendered = match cli.format {
                    OutputFormat::Text => vscribe::output::render_outcome_text(&outcome),
                    OutputFormat::Json => vscribe::output::render_success_json(&outcome)?,
                };
                println!("{rendered}");
            }
            Err(e) => {
                failed += 1;
                match cli.format {
                    OutputFormat::Text => eprintln!("Error: {e}"),
                    OutputFormat::Json => println!("{}", vscribe::output::render_failure_json(&e)?),
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} video(s) failed", urls.len());
    }
    Ok(())
}

async fn recent(client: &reqwest::Client, config: &Config, cli: &Cli, limit: usize) -> Result<()> {
    let wordpress = WordPress::from_config(client, &config.wordpress)?;
    let posts = wordpress.recent_posts(limit).await?;
    debug!("Fetched {} recent posts", posts.len());

    let rendered = match cli.format {
        OutputFormat::Text => vscribe::output::render_recent_text(&posts),
        OutputFormat::Json => vscribe::output::render_success_json(&posts)?,
    };
    println!("{rendered}");
    Ok(())
}

async fn check(client: &reqwest::Client, config: &Config, cli: &Cli) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = vscribe::generate::check_provider(client, &config.openai).await {
        errors.push(format!("OpenAI API test failed: {}", e.detail()));
    }

    match WordPress::from_config(client, &config.wordpress) {
        Ok(wordpress) => match wordpress.check().await {
            Ok(user) => debug!("WordPress credentials valid for {user}"),
            Err(e) => errors.push(format!("WordPress API test failed: {e}")),
        },
        Err(e) => errors.push(format!("WordPress API test failed: {e}")),
    }

    if cli.format == OutputFormat::Json {
        let report = serde_json::json!({
            "success": errors.is_empty(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !errors.is_empty() {
        bail!("{}", errors.join("\n"));
    }
    if cli.format == OutputFormat::Text {
        println!("All API configurations are working correctly!");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        let config_path = cli.config.clone().unwrap_or_else(vscribe::config::config_path);
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        debug!("Transcript strategies: {:?}", config.transcript.strategies);
    }

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

    match cli.command {
        Command::Process { ref url } => process(&client, &config, &cli, url.clone()).await,
        Command::Recent { limit } => recent(&client, &config, &cli, limit).await,
        Command::Check => check(&client, &config, &cli).await,
    }
}
