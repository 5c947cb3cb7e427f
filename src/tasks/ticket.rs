use crate::ai::InferenceService;
use crate::models::{LineItem, Ticket};
use crate::{prompts, Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Largest difference between a model-reported and a computed line total
/// that is not worth a warning.
const TOTAL_TOLERANCE: f64 = 0.01;

/// Which extraction prompt to send and how to read its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketMode {
    /// Whole-unit quantities and unit prices; totals computed locally.
    #[default]
    ItemsOnly,
    /// The model also reports each line total; the local total still wins.
    WithTotals,
}

impl TicketMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::ItemsOnly => prompts::TICKET_ITEMS,
            Self::WithTotals => prompts::TICKET_WITH_TOTALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketOutcome {
    pub ticket: Ticket,
    pub elapsed: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ReportedItem {
    name: String,
    quantity: f64,
    price_unit: f64,
    #[serde(default)]
    price_total: Option<f64>,
}

pub async fn extract_ticket(
    service: &dyn InferenceService,
    image_path: &Path,
    mode: TicketMode,
) -> Result<TicketOutcome> {
    let reply = service.send(mode.prompt(), image_path).await;
    let value = reply.result.into_result()?;

    let ticket = ticket_from_value(value, mode)?;
    tracing::info!(
        "Extracted {} lines totalling {:.2} from {}",
        ticket.items.len(),
        ticket.total,
        image_path.display()
    );

    Ok(TicketOutcome {
        ticket,
        elapsed: reply.elapsed,
    })
}

pub fn ticket_from_value(value: Value, mode: TicketMode) -> Result<Ticket> {
    let reported: Vec<ReportedItem> = serde_json::from_value(item_array(value)?)
        .map_err(|e| Error::Interpretation(format!("malformed ticket line: {}", e)))?;

    let items = reported
        .into_iter()
        .map(|reported| line_item(reported, mode))
        .collect();

    Ok(Ticket::from_items(items))
}

fn line_item(reported: ReportedItem, mode: TicketMode) -> LineItem {
    let item = LineItem::new(reported.name, reported.quantity, reported.price_unit);

    match mode {
        TicketMode::ItemsOnly => {
            if item.quantity.fract() != 0.0 {
                tracing::warn!(
                    "'{}' has fractional quantity {} in whole-unit mode",
                    item.name,
                    item.quantity
                );
            }
        }
        TicketMode::WithTotals => {
            if let Some(reported_total) = reported.price_total {
                if (reported_total - item.price_total).abs() > TOTAL_TOLERANCE {
                    tracing::warn!(
                        "'{}': model reported total {:.2}, computed {:.2}",
                        item.name,
                        reported_total,
                        item.price_total
                    );
                }
            }
        }
    }

    item
}

/// Finds the list of lines: a bare array, an object's `"items"` array, an
/// object's only array, or a single line object.
fn item_array(value: Value) -> Result<Value> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => {
            if let Some(items @ Value::Array(_)) = map.remove("items") {
                return Ok(items);
            }
            if map.contains_key("name") {
                return Ok(Value::Array(vec![Value::Object(map)]));
            }

            let mut arrays: Vec<Value> = map
                .into_iter()
                .map(|(_, value)| value)
                .filter(Value::is_array)
                .collect();
            match arrays.len() {
                1 => Ok(arrays.remove(0)),
                n => Err(Error::Interpretation(format!(
                    "expected one list of ticket lines, found {}",
                    n
                ))),
            }
        }
        other => Err(Error::Interpretation(format!(
            "expected a list of ticket lines, got {}",
            other
        ))),
    }
}
