//! Application orchestration: runs one task against the inference endpoint.

use crate::ai::{InferenceClient, InferenceReply, InferenceService};
use crate::models::Config;
use crate::tasks::{count_objects, extract_ticket, CountOutcome, TicketMode, TicketOutcome};
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// A single unit of work for the CLI.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Count { image: PathBuf, object: String },
    Ticket { image: PathBuf, mode: TicketMode },
    Raw { image: PathBuf, prompt: String, stream: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Count(CountOutcome),
    Ticket(TicketOutcome),
    Raw(InferenceReply),
}

impl TaskOutput {
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Count(outcome) => outcome.elapsed,
            Self::Ticket(outcome) => outcome.elapsed,
            Self::Raw(reply) => reply.elapsed,
        }
    }

    /// Only raw replies can carry an error record; the interpreted tasks
    /// turn records into `Err`.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Raw(reply) if reply.result.is_error())
    }
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(outcome) => write!(f, "{} {}", outcome.count, outcome.object),
            Self::Ticket(outcome) => write!(f, "{}", outcome.ticket),
            Self::Raw(reply) => {
                let value = reply.result.to_value();
                let text = serde_json::to_string_pretty(&value).map_err(|_| fmt::Error)?;
                write!(f, "{}", text)
            }
        }
    }
}

pub struct App {
    inference: Box<dyn InferenceService>,
}

impl App {
    /// Build an app around any inference service; tests pass a mock here.
    pub fn with_service(inference: Box<dyn InferenceService>) -> Self {
        Self { inference }
    }

    pub fn new(config: &Config) -> Result<Self> {
        let client = InferenceClient::new(config)?;
        info!(
            "Inference endpoint: {} (model: {}, max {}x{})",
            config.api_url,
            config.model,
            config.max_dimensions.max_width,
            config.max_dimensions.max_height
        );
        Ok(Self::with_service(Box::new(client)))
    }

    pub async fn run(&self, task: Task) -> Result<TaskOutput> {
        match task {
            Task::Count { image, object } => {
                info!("Counting {} in {}", object, image.display());
                let outcome = count_objects(self.inference.as_ref(), &image, &object).await?;
                Ok(TaskOutput::Count(outcome))
            }
            Task::Ticket { image, mode } => {
                info!("Extracting ticket lines ({:?}) from {}", mode, image.display());
                let outcome = extract_ticket(self.inference.as_ref(), &image, mode).await?;
                Ok(TaskOutput::Ticket(outcome))
            }
            Task::Raw {
                image,
                prompt,
                stream,
            } => {
                info!("Sending raw prompt for {}", image.display());
                let reply = self.inference.send_request(&prompt, &image, stream).await;
                Ok(TaskOutput::Raw(reply))
            }
        }
    }
}
