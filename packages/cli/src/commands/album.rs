use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use clap::Subcommand;
use console::style;
use media::{PdfiumRasterizer, render_pages_to_png};
use reqwest::Method;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use super::{Context, confirm};

#[derive(Subcommand, Debug)]
pub enum AlbumCommand {
    /// List albums, oldest first.
    List,
    /// Render a PDF to page images and upload them as a new album.
    Upload {
        pdf: PathBuf,
        /// Folder name. Defaults to the PDF file name without extension.
        #[arg(long)]
        name: Option<String>,
        /// Human-readable label shown instead of the folder name.
        #[arg(long)]
        display_name: Option<String>,
        /// Directory containing the pdfium library. Defaults to the system
        /// library path.
        #[arg(long, env = "PDFIUM_DIR")]
        pdfium_dir: Option<PathBuf>,
    },
    /// Delete an album and every page in it.
    Delete {
        /// Folder name as shown by `album list`.
        folder: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumSummary {
    name: String,
    display_name: String,
    images: Vec<String>,
    time_created: String,
}

#[derive(Deserialize)]
struct AlbumList {
    blandare: Vec<AlbumSummary>,
}

#[derive(Deserialize)]
struct Uploaded {
    uploaded: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    message: String,
    deleted_files: usize,
}

pub fn run(ctx: &Context, command: AlbumCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        AlbumCommand::List => {
            let list: AlbumList = client.get("/albums")?;
            if list.blandare.is_empty() {
                println!("No albums");
            }
            for album in list.blandare {
                println!(
                    "{}  {}  {} pages  {}",
                    style(&album.name).bold(),
                    album.display_name,
                    album.images.len(),
                    style(&album.time_created).dim()
                );
            }
        }
        AlbumCommand::Upload {
            pdf,
            name,
            display_name,
            pdfium_dir,
        } => {
            let name = match name {
                Some(name) => name,
                None => pdf
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("{} has no usable file name", pdf.display()))?,
            };
            let document =
                fs::read(&pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;

            println!("Rendering {} ...", pdf.display());
            let rasterizer = PdfiumRasterizer::new(pdfium_dir);
            let pages = render_pages_to_png(&rasterizer, &document)
                .with_context(|| format!("Failed to render {}", pdf.display()))?;
            println!("Uploading {} pages ...", pages.len());

            let mut form = Form::new().text("pdfName", name);
            if let Some(display_name) = display_name {
                form = form.text("displayName", display_name);
            }
            for (file_name, bytes) in pages {
                let part = Part::bytes(bytes).file_name(file_name).mime_str("image/png")?;
                form = form.part("images[]", part);
            }

            let res: Uploaded = client.post_multipart("/albums", form)?;
            println!(
                "{} Uploaded {} pages",
                style("✓").green(),
                res.uploaded.len()
            );
        }
        AlbumCommand::Delete { folder, yes } => {
            if !confirm(&format!("Delete album {folder} and all its pages?"), yes)? {
                return Ok(());
            }
            let res: Deleted =
                client.send_json(Method::DELETE, "/albums", &json!({"folderName": folder}))?;
            println!(
                "{} {} ({} files)",
                style("✓").green(),
                res.message,
                res.deleted_files
            );
        }
    }
    Ok(())
}
