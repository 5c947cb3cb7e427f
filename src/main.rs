use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vision_extract::app::{App, Task};
use vision_extract::models::{timeout_from_secs, Config};
use vision_extract::tasks::{TicketMode, DEFAULT_OBJECT};

#[derive(Debug, Parser)]
#[command(name = "vision-extract")]
#[command(about = "Ask a vision model about an image and get JSON back")]
struct CliArgs {
    /// Generate endpoint URL (overrides INFERENCE_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Model name (overrides INFERENCE_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true)]
    max_width: Option<u32>,

    #[arg(long, global = true)]
    max_height: Option<u32>,

    /// Request timeout in seconds; 0 disables it.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Send the `verbose` field with this value.
    #[arg(long, global = true)]
    verbose_field: Option<bool>,

    /// Extra or replacement HTTP header, e.g. 'Content-Type: application/json'.
    #[arg(long = "header", value_name = "NAME: VALUE", global = true, value_parser = parse_header_arg)]
    headers: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count objects in an image.
    Count {
        image: PathBuf,
        #[arg(long, default_value = DEFAULT_OBJECT)]
        object: String,
    },
    /// Extract line items from a photographed receipt.
    Ticket {
        image: PathBuf,
        /// Also ask the model for each line total.
        #[arg(long)]
        with_totals: bool,
    },
    /// Send an arbitrary prompt and print the normalized JSON.
    Raw {
        image: PathBuf,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        stream: bool,
    },
}

impl Command {
    fn into_task(self) -> Task {
        match self {
            Command::Count { image, object } => Task::Count { image, object },
            Command::Ticket { image, with_totals } => Task::Ticket {
                image,
                mode: if with_totals {
                    TicketMode::WithTotals
                } else {
                    TicketMode::ItemsOnly
                },
            },
            Command::Raw {
                image,
                prompt,
                stream,
            } => Task::Raw {
                image,
                prompt,
                stream,
            },
        }
    }
}

fn parse_header_arg(input: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = input
        .split_once(':')
        .ok_or_else(|| format!("Invalid header '{}'. Expected format: 'Name: value'", input))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid header '{}': empty name", input));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Flags that stand in for an environment variable.
fn cli_lookup(args: &CliArgs, key: &str) -> Option<String> {
    match key {
        "INFERENCE_API_URL" => args.api_url.clone(),
        _ => None,
    }
}

/// Command-line overrides on top of a config read from the environment.
fn apply_cli(mut config: Config, args: &CliArgs) -> vision_extract::Result<Config> {
    if let Some(model) = &args.model {
        config = config.with_model(model.as_str());
    }
    if let Some(width) = args.max_width {
        config.max_dimensions.max_width = width;
    }
    if let Some(height) = args.max_height {
        config.max_dimensions.max_height = height;
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(timeout_from_secs(secs));
    }
    if args.verbose_field.is_some() {
        config = config.with_verbose(args.verbose_field);
    }
    for (name, value) in &args.headers {
        config = config.with_header(name.as_str(), value.as_str());
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_extract=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env(|key| cli_lookup(&args, key))
        .and_then(|config| apply_cli(config, &args))
    {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run(args.command.into_task()).await {
        Ok(output) => {
            println!("{}", output);
            if let Some(elapsed) = output.elapsed() {
                println!("Elapsed: {:.2?}", elapsed);
            }
            if output.is_error() {
                std::process::exit(1);
            }
            info!("Task completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Task failed: {}", e);
            std::process::exit(1);
        }
    }
}
