use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Subcommand;
use console::style;
use media::{WebImageOptions, transcode_to_web_format};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{Context, confirm};

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// List events, newest first.
    List,
    /// Create an event. The thumbnail is converted to WebP before upload.
    Create {
        #[arg(long)]
        name: String,
        /// Link to the photo folder.
        #[arg(long)]
        drive_url: String,
        /// Event date, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`.
        #[arg(long)]
        date: String,
        /// Thumbnail image (any format the image decoder understands).
        #[arg(long)]
        thumbnail: PathBuf,
    },
    /// Change fields of an event. Omitted fields are left unchanged.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        drive_url: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    /// Delete an event and its thumbnail.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    id: String,
    name: String,
    drive_url: String,
    event_date: String,
    uploaded_by: UploadedBy,
}

#[derive(Deserialize)]
struct UploadedBy {
    username: String,
}

#[derive(Deserialize)]
struct EventList {
    events: Vec<Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Mutation {
    message: String,
    event_id: String,
}

#[derive(Deserialize)]
struct Success {
    message: String,
}

pub fn run(ctx: &Context, command: EventCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        EventCommand::List => {
            let list: EventList = client.get("/events")?;
            if list.events.is_empty() {
                println!("No events");
            }
            for event in list.events {
                println!(
                    "{}  {}  {}",
                    style(&event.id).dim(),
                    style(&event.event_date[..event.event_date.len().min(10)]).cyan(),
                    style(&event.name).bold()
                );
                println!("    {} (by {})", event.drive_url, event.uploaded_by.username);
            }
        }
        EventCommand::Create {
            name,
            drive_url,
            date,
            thumbnail,
        } => {
            let (thumbnail_data, thumbnail_file_name) = thumbnail_payload(&thumbnail)?;
            let res: Mutation = client.send_json(
                Method::POST,
                "/events",
                &json!({
                    "name": name,
                    "driveUrl": drive_url,
                    "eventDate": date,
                    "thumbnailData": thumbnail_data,
                    "thumbnailFileName": thumbnail_file_name,
                }),
            )?;
            println!("{} {} ({})", style("✓").green(), res.message, res.event_id);
        }
        EventCommand::Update {
            id,
            name,
            drive_url,
            date,
            thumbnail,
        } => {
            let mut body = Map::new();
            if let Some(name) = name {
                body.insert("name".into(), Value::String(name));
            }
            if let Some(drive_url) = drive_url {
                body.insert("driveUrl".into(), Value::String(drive_url));
            }
            if let Some(date) = date {
                body.insert("eventDate".into(), Value::String(date));
            }
            if let Some(path) = thumbnail {
                let (data, file_name) = thumbnail_payload(&path)?;
                body.insert("thumbnailData".into(), Value::String(data));
                body.insert("thumbnailFileName".into(), Value::String(file_name));
            }
            if body.is_empty() {
                bail!("Nothing to update; pass at least one of --name, --drive-url, --date, --thumbnail");
            }
            let res: Mutation =
                client.send_json(Method::PUT, &format!("/events/{id}"), &Value::Object(body))?;
            println!("{} {}", style("✓").green(), res.message);
        }
        EventCommand::Delete { id, yes } => {
            if !confirm(&format!("Delete event {id}?"), yes)? {
                return Ok(());
            }
            let res: Success = client.delete(&format!("/events/{id}"))?;
            println!("{} {}", style("✓").green(), res.message);
        }
    }
    Ok(())
}

/// Transcode an image file to WebP and return `(data URL, original file name)`.
fn thumbnail_payload(path: &Path) -> Result<(String, String)> {
    let source = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let encoded = transcode_to_web_format(&source, WebImageOptions::default())
        .with_context(|| format!("Failed to convert {}", path.display()))?;
    tracing::debug!(
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.bytes.len(),
        "Thumbnail transcoded"
    );
    Ok((
        format!(
            "data:{};base64,{}",
            encoded.content_type,
            STANDARD.encode(&encoded.bytes)
        ),
        upload_file_name(path)?,
    ))
}

fn upload_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_name_is_the_last_path_segment() {
        assert_eq!(
            upload_file_name(Path::new("/tmp/bilder/Omslag bild.jpg")).unwrap(),
            "Omslag bild.jpg"
        );
        assert!(upload_file_name(Path::new("/")).is_err());
    }
}
