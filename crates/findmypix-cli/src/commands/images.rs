//! Image subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use futures_util::future::join_all;
use tracing::debug;

use findmypix_core::models::{ImageOut, ImageUpload};

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct ImagesCommand {
    #[command(subcommand)]
    pub command: ImagesSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ImagesSubcommand {
    /// List an event's images and detected faces
    List {
        event_id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Upload images to an event (sent concurrently)
    Upload {
        event_id: i64,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete an image
    Delete { image_id: i64 },
}

pub async fn handle(cmd: ImagesCommand) -> Result<()> {
    let client = session::connect()?;

    match cmd.command {
        ImagesSubcommand::List { event_id, json } => {
            let images = client
                .list_images(event_id)
                .await
                .context("Failed to list images")?;

            if json {
                return output::json_pretty(&images);
            }
            if images.is_empty() {
                output::note("No images yet.");
            }
            for image in &images {
                println!(
                    "{:>6}  {} face(s)  {}",
                    image.id,
                    image.embeddings.len(),
                    client.file_url(&image.path)
                );
            }
        }
        ImagesSubcommand::Upload { event_id, files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for file in &files {
                uploads.push(read_upload(file).await?);
            }

            let results = join_all(
                uploads
                    .iter()
                    .map(|upload| client.upload_image(event_id, upload)),
            )
            .await;

            let mut failed = 0;
            for (upload, result) in uploads.iter().zip(results) {
                match result {
                    Ok(image) => report_upload(&upload.file_name, &image),
                    Err(e) => {
                        failed += 1;
                        output::error(&format!("{}: {}", upload.file_name, e));
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} uploads failed", failed, uploads.len());
            }
        }
        ImagesSubcommand::Delete { image_id } => {
            client
                .delete_image(image_id)
                .await
                .context("Failed to delete image")?;
            output::success(&format!("Deleted image {}", image_id));
        }
    }

    Ok(())
}

pub async fn read_upload(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;

    debug!(file = %file_name, size = bytes.len(), "Read upload");
    Ok(ImageUpload::new(file_name, bytes))
}

fn report_upload(file_name: &str, image: &ImageOut) {
    output::success(&format!(
        "{} -> image {} ({} face(s))",
        file_name,
        image.id,
        image.embeddings.len()
    ));
}
