//! Face search subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use findmypix_core::models::MatchResult;
use findmypix_http::BackendClient;

use crate::commands::images::read_upload;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct MatchCommand {
    #[command(subcommand)]
    pub command: MatchSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum MatchSubcommand {
    /// Find an event's photos containing the face in a local photo
    Photo {
        event_id: i64,
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Find an event's photos containing an already detected face
    Face {
        event_id: i64,
        embedding_id: i64,

        #[arg(long)]
        json: bool,
    },
}

pub async fn handle(cmd: MatchCommand) -> Result<()> {
    let client = session::connect()?;

    let (matches, json) = match cmd.command {
        MatchSubcommand::Photo {
            event_id,
            file,
            json,
        } => {
            let photo = read_upload(&file).await?;
            let matches = client
                .match_photo(event_id, &photo)
                .await
                .context("Face search failed")?;
            (matches, json)
        }
        MatchSubcommand::Face {
            event_id,
            embedding_id,
            json,
        } => {
            let matches = client
                .match_face(event_id, embedding_id)
                .await
                .context("Face search failed")?;
            (matches, json)
        }
    };

    if json {
        return output::json_pretty(&matches);
    }
    if matches.is_empty() {
        output::note("No matching faces found.");
        return Ok(());
    }
    for result in &matches {
        print_match(&client, result);
    }
    Ok(())
}

fn print_match(client: &BackendClient, result: &MatchResult) {
    let distance = format!("{:.3}", result.distance);
    let distance = if result.is_within_threshold() {
        distance.green()
    } else {
        distance.yellow()
    };
    println!(
        "{}  face {} at {},{} {}x{}  {}",
        distance,
        result.embedding_id,
        result.bbox.x,
        result.bbox.y,
        result.bbox.w,
        result.bbox.h,
        client.file_url(&result.image_path)
    );
}
