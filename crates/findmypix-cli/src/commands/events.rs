//! Event subcommands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;

use findmypix_core::models::{EventIn, EventOut};

use crate::commands::parse_date;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct EventsCommand {
    #[command(subcommand)]
    pub command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum EventsSubcommand {
    /// List events
    List {
        /// Only events you created
        #[arg(long)]
        mine: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a single event
    Get {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Create an event
    Create(EventFields),

    /// Replace an event's details
    Update {
        id: i64,

        #[command(flatten)]
        fields: EventFields,
    },

    /// Delete an event and its images
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct EventFields {
    #[arg(long)]
    pub title: String,

    /// Event date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_date)]
    pub date: DateTime<Utc>,

    #[arg(long)]
    pub description: Option<String>,
}

impl From<EventFields> for EventIn {
    fn from(fields: EventFields) -> Self {
        EventIn {
            title: fields.title,
            date: fields.date,
            description: fields.description,
        }
    }
}

pub async fn handle(cmd: EventsCommand) -> Result<()> {
    let client = session::connect()?;

    match cmd.command {
        EventsSubcommand::List { mine, json } => {
            let events = match mine {
                true => client.list_my_events().await,
                false => client.list_events().await,
            };
            let events = events.context("Failed to list events")?;

            if json {
                return output::json_pretty(&events);
            }
            if events.is_empty() {
                output::note("No events found.");
            }
            for event in &events {
                print_row(event);
            }
        }
        EventsSubcommand::Get { id, json } => {
            let event = client.get_event(id).await.context("Failed to fetch event")?;
            if json {
                return output::json_pretty(&event);
            }
            print_details(&event);
        }
        EventsSubcommand::Create(fields) => {
            let event = client
                .create_event(&fields.into())
                .await
                .context("Failed to create event")?;
            output::success(&format!("Created event {}", event.id));
            print_details(&event);
        }
        EventsSubcommand::Update { id, fields } => {
            let event = client
                .update_event(id, &fields.into())
                .await
                .context("Failed to update event")?;
            output::success(&format!("Updated event {}", event.id));
            print_details(&event);
        }
        EventsSubcommand::Delete { id } => {
            client.delete_event(id).await.context("Failed to delete event")?;
            output::success(&format!("Deleted event {}", id));
        }
    }

    Ok(())
}

fn print_row(event: &EventOut) {
    let owner = if event.is_owner { "*".green().to_string() } else { " ".to_string() };
    println!(
        "{} {:>5}  {}  {}",
        owner,
        event.id,
        event.date.format("%Y-%m-%d").to_string().dimmed(),
        event.title
    );
}

fn print_details(event: &EventOut) {
    output::field("ID", &event.id.to_string());
    output::field("Title", &event.title);
    output::field("Date", &event.date.to_rfc3339());
    if let Some(description) = &event.description {
        output::field("Description", description);
    }
    output::field("Owner", if event.is_owner { "you" } else { "someone else" });
}
