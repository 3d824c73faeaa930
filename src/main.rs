use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use docllm::prompts::{default_options, max_chars, truncate_for_prompt};
use docllm::request::Completion;
use docllm::{LlmConfig, LlmService, Operation, UsageLedger};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Command
{   Classify
  , Analyze
  , Enhance
}

impl From<Command> for Operation
{   fn from(command: Command) -> Self
    {   match command
        {   Command::Classify => Operation::Classify
          , Command::Analyze => Operation::Analyze
          , Command::Enhance => Operation::Enhance
        }
    }
}

/// Classify, analyze or enhance a text document with an LLM
#[derive(Debug, Parser)]
#[command(name = "docllm", version)]
struct Args
{   /// Operation to run
    #[arg(value_enum)]
    command: Command
  , /// Plain-text document to send
    file: PathBuf
  , /// JSON config file; environment variables are used otherwise
    #[arg(long)]
    config: Option<PathBuf>
  , /// Rewrite goal for enhance
    #[arg(long, default_value = "improve clarity and concision")]
    goal: String
  , #[arg(long)]
    temperature: Option<f32>
  , #[arg(long)]
    max_tokens: Option<u32>
  , /// Spend in USD before budget alerts stop
    #[arg(long, default_value_t = 50.0)]
    budget: f64
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::init();
    let args = Args::parse();

    match run(args).await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(e) => {
          error!("{}", e);
          eprintln!("docllm: {}", e);
          ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>>
{   let config = match &args.config
    {   Some(path) => LlmConfig::from_json_file(path)?
      , None => LlmConfig::from_env()?
    };
    let service = LlmService::from_config(&config)?;
    let ledger = UsageLedger::new(args.budget);

    let operation = Operation::from(args.command);
    let text = tokio::fs::read_to_string(&args.file).await?;
    let text = match max_chars(operation)
    {   Some(limit) => truncate_for_prompt(&text, limit)
      , None => &text
    };

    let mut options = default_options(operation, &args.goal);
    if let Some(temperature) = args.temperature
    {   options = options.with_temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens
    {   options = options.with_max_tokens(max_tokens);
    }

    let response = service.execute(operation, text, &options).await?;
    let standard = response.standard();
    if standard.used_fallback
    {   warn!("Served by fallback provider {}", standard.provider);
    }

    let cost = service.estimate_cost(standard).unwrap_or_default();
    ledger.record(standard, cost);
    info!("{} cost ${:.6}; {}", operation, cost, ledger.summary());

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
