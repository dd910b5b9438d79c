//! marketing-team: content creator + marketing reviewer from the terminal.
//!
//!   marketing-team run --instruction <text> --campaign-type <channel> \
//!       --brand <text> --audience <text> [--json] [--output file] [--analyze]
//!   marketing-team converse --task <text> [--max-rounds N] [--interactive]
//!
//! Requires ANTHROPIC_API_KEY environment variable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use marketing_team::config::{DEFAULT_CONFIG_PATH, TeamConfig};
use marketing_team::conversation::{ConversationMessage, HumanInput, Participant};
use marketing_team::llm::{LlmClient, ModelProvider};
use marketing_team::pipeline::KNOWN_CAMPAIGN_TYPES;
use marketing_team::{output, tools};

#[derive(Parser)]
#[command(name = "marketing-team", about = "AI content creator and marketing reviewer")]
struct Args {
    /// JSON config file (missing file = defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Claude model for both roles (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate content, then review and improve it
    Run {
        /// What to create
        #[arg(long)]
        instruction: String,

        /// Channel, e.g. "Instagram Post" or "Email Campaign"
        #[arg(long)]
        campaign_type: String,

        /// Brand name, mission, values, tone of voice
        #[arg(long)]
        brand: String,

        /// Who the content is for
        #[arg(long)]
        audience: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also write the result as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Run content analysis on the improved copy
        #[arg(long)]
        analyze: bool,
    },

    /// Let creator and reviewer iterate until done or out of rounds
    Converse {
        /// Opening task for the team
        #[arg(long)]
        task: String,

        /// Round cap (overrides config)
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Completion phrase (overrides config)
        #[arg(long)]
        sentinel: Option<String>,

        /// Ask for human input on stdin each round
        #[arg(long)]
        interactive: bool,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketing_team=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = TeamConfig::load(&args.config)?;
    if let Some(model) = &args.model {
        config.override_model(model);
    }

    let provider: Arc<dyn ModelProvider> =
        Arc::new(LlmClient::new(args.api_key.clone()).with_timeout(config.request_timeout())?);

    tokio::select! {
        res = execute(args.command, config, provider) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, discarding in-flight work");
            Err(interrupted())
        }
    }
}

fn interrupted() -> anyhow::Error {
    anyhow::anyhow!("interrupted")
}

async fn execute(command: Command, mut config: TeamConfig, provider: Arc<dyn ModelProvider>) -> Result<()> {
    match command {
        Command::Run {
            instruction,
            campaign_type,
            brand,
            audience,
            json,
            output: output_path,
            analyze,
        } => {
            if !KNOWN_CAMPAIGN_TYPES.contains(&campaign_type.as_str()) {
                tracing::info!(campaign_type = %campaign_type, "Custom campaign type");
            }

            let pipeline = config.pipeline(provider)?;
            let result = pipeline
                .run_with(&instruction, &campaign_type, &brand, &audience)
                .await?;

            if let Some(path) = output_path {
                let body = serde_json::to_string_pretty(&result)?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "Result written");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", output::pipeline_result(&result, output::WRAP_WIDTH));
            }

            if analyze {
                let text = if result.improved_content.is_empty() {
                    &result.original_content
                } else {
                    &result.improved_content
                };
                let report = output::analysis(
                    &tools::analyze_sentiment(text),
                    &tools::keyword_extraction(text, 10),
                    &tools::grammar_check(text),
                );
                println!("\n{report}");
            }
        }

        Command::Converse {
            task,
            max_rounds,
            sentinel,
            interactive,
            json,
        } => {
            if let Some(n) = max_rounds {
                config.conversation.max_rounds = n;
            }
            if let Some(s) = sentinel {
                config.conversation.sentinel = s;
            }
            let human = if interactive {
                Participant::Human(Arc::new(StdinHuman::new()))
            } else {
                Participant::unattended_human()
            };

            let conversation = config.conversation(provider, human)?;
            let state = conversation.run(&task).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", output::transcript(&state, output::WRAP_WIDTH));
            }
        }
    }
    Ok(())
}

/// Human turns read from stdin; an empty line passes.
struct StdinHuman {
    lines: Mutex<tokio::io::Lines<BufReader<tokio::io::Stdin>>>,
}

impl StdinHuman {
    fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl HumanInput for StdinHuman {
    async fn next_message(&self, log: &[ConversationMessage]) -> Option<String> {
        if let Some(last) = log.last() {
            println!("{}", output::wrap_lines(&format!("[{}] {}", last.speaker, last.content), output::WRAP_WIDTH).join("\n"));
        }
        write_prompt(&mut tokio::io::stdout()).await;

        match self.lines.lock().await.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => Some(line),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                None
            }
        }
    }
}

/// Write errors are logged and otherwise ignored.
async fn write_prompt<W: AsyncWrite + Unpin>(out: &mut W) {
    if let Err(e) = out.write_all(b"you> ").await {
        tracing::debug!(error = %e, "Failed to write prompt");
        return;
    }
    if let Err(e) = out.flush().await {
        tracing::debug!(error = %e, "Failed to flush prompt");
    }
}
