//! Prompt and post-processing pairs layered over the inference client.

pub mod count;
pub mod ticket;

pub use count::{count_objects, extract_count, CountOutcome, DEFAULT_OBJECT};
pub use ticket::{extract_ticket, ticket_from_value, TicketMode, TicketOutcome};
