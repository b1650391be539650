use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use clap::{Args, Subcommand};
use console::style;
use media::crop::DEFAULT_MAX_OUTPUT_SIZE;
use media::{CropSelection, crop_to_square};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Context, confirm};

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Give a user the admin claim.
    Grant { uid: String },
    /// Take the admin claim away from a user.
    Revoke { uid: String },
    /// List users. Served from a 12-hour local cache unless --refresh is given.
    Users {
        #[arg(long)]
        refresh: bool,
        /// Print the raw JSON records.
        #[arg(long)]
        json: bool,
    },
    /// List users holding the admin claim.
    Admins,
    /// Create users from a JSON file: an array of entries, or `{"users": [...]}`.
    /// Every entry needs `identifier` and `password`; other fields go to the
    /// profile.
    BulkCreate { file: PathBuf },
    /// Delete every user whose uid is not kept.
    Purge {
        /// Uids to keep. May be repeated.
        #[arg(long = "keep")]
        keep: Vec<String>,
        /// File with one uid to keep per line.
        #[arg(long)]
        keep_file: Option<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Change a user's display name.
    DisplayName { uid: String, name: String },
    /// Crop an image to a square and set it as a user's profile picture.
    ProfilePicture {
        uid: String,
        image: PathBuf,
        #[command(flatten)]
        crop: CropArgs,
    },
}

/// Square selection in source pixels. Defaults to the largest centered square.
#[derive(Args, Debug)]
pub struct CropArgs {
    #[arg(long)]
    x: Option<u32>,
    #[arg(long)]
    y: Option<u32>,
    #[arg(long)]
    size: Option<u32>,
}

#[derive(Deserialize)]
struct Message {
    message: String,
}

#[derive(Deserialize)]
struct UserList {
    users: Vec<Value>,
}

#[derive(Deserialize)]
struct AdminList {
    admins: Vec<Value>,
}

#[derive(Deserialize)]
struct BulkResponse {
    message: String,
    results: Vec<BulkResult>,
}

#[derive(Deserialize)]
struct BulkResult {
    identifier: Option<String>,
    status: String,
    uid: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PurgeResponse {
    deleted_count: usize,
    kept_count: usize,
    deleted_uids: Vec<String>,
}

#[derive(Deserialize)]
struct ProfilePicture {
    message: String,
    key: String,
}

pub fn run(ctx: &Context, command: AdminCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        AdminCommand::Grant { uid } => set_claim(ctx, &uid, true)?,
        AdminCommand::Revoke { uid } => set_claim(ctx, &uid, false)?,
        AdminCommand::Users { refresh, json } => {
            let server = ctx.server()?;
            let cached = if refresh {
                None
            } else {
                ctx.users.load(&server, Utc::now())
            };
            let users = match cached {
                Some(users) => {
                    tracing::debug!("Serving user list from cache");
                    users
                }
                None => {
                    let list: UserList = client.get("/admin/users")?;
                    tracing::debug!(count = list.users.len(), "Fetched user list");
                    ctx.users.store(&server, &list.users, Utc::now())?;
                    list.users
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                print_users(&users);
            }
        }
        AdminCommand::Admins => {
            let list: AdminList = client.get("/admin/admins")?;
            print_users(&list.admins);
        }
        AdminCommand::BulkCreate { file } => {
            let raw =
                fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let users = bulk_entries(&raw)?;
            let res: BulkResponse = client.send_json(
                Method::POST,
                "/admin/bulkCreateUsers",
                &json!({"users": users}),
            )?;
            ctx.users.invalidate();

            let mut failed = 0;
            for result in &res.results {
                let identifier = result.identifier.as_deref().unwrap_or("<missing>");
                if result.status == "success" {
                    println!(
                        "{} {} {}",
                        style("✓").green(),
                        identifier,
                        style(result.uid.as_deref().unwrap_or_default()).dim()
                    );
                } else {
                    failed += 1;
                    println!(
                        "{} {} {}",
                        style("✗").red(),
                        identifier,
                        result.error.as_deref().unwrap_or_default()
                    );
                }
            }
            println!(
                "{} {} created, {} failed",
                res.message,
                res.results.len() - failed,
                failed
            );
        }
        AdminCommand::Purge {
            keep,
            keep_file,
            yes,
        } => {
            let whitelist = whitelist(keep, keep_file.as_deref())?;
            if whitelist.is_empty() {
                bail!("Refusing to purge with an empty whitelist; pass --keep or --keep-file");
            }
            let prompt = format!(
                "Delete every user except the {} whitelisted uid(s)?",
                whitelist.len()
            );
            if !confirm(&prompt, yes)? {
                return Ok(());
            }
            let res: PurgeResponse = client.send_json(
                Method::POST,
                "/admin/purge",
                &json!({"whitelist": whitelist}),
            )?;
            ctx.users.invalidate();
            for uid in &res.deleted_uids {
                println!("{} {}", style("deleted").red(), uid);
            }
            println!(
                "{} deleted, {} kept",
                res.deleted_count, res.kept_count
            );
        }
        AdminCommand::DisplayName { uid, name } => {
            let res: Message = client.send_json(
                Method::PUT,
                &format!("/admin/users/{uid}/displayName"),
                &json!({"displayName": name}),
            )?;
            ctx.users.invalidate();
            println!("{} {}", style("✓").green(), res.message);
        }
        AdminCommand::ProfilePicture { uid, image, crop } => {
            let source =
                fs::read(&image).with_context(|| format!("Failed to read {}", image.display()))?;
            let (width, height) = media::transcode::dimensions(&source)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let selection = crop.selection(width, height);
            let encoded = crop_to_square(&source, selection, DEFAULT_MAX_OUTPUT_SIZE)?;

            let res: ProfilePicture = client.put_bytes(
                &format!("/admin/users/{uid}/profilePicture"),
                encoded.bytes,
                encoded.content_type,
            )?;
            ctx.users.invalidate();
            println!("{} {} ({})", style("✓").green(), res.message, res.key);
        }
    }
    Ok(())
}

fn set_claim(ctx: &Context, uid: &str, is_admin: bool) -> Result<()> {
    let res: Message = ctx.client()?.send_json(
        Method::POST,
        "/admin/setClaim",
        &json!({"uid": uid, "isAdmin": is_admin}),
    )?;
    ctx.users.invalidate();
    println!("{} {}", style("✓").green(), res.message);
    Ok(())
}

impl CropArgs {
    fn selection(&self, width: u32, height: u32) -> CropSelection {
        let side = self.size.unwrap_or(width.min(height));
        let x = self.x.unwrap_or(width.saturating_sub(side) / 2);
        let y = self.y.unwrap_or(height.saturating_sub(side) / 2);
        CropSelection::natural(x, y, side, width, height)
    }
}

fn print_users(users: &[Value]) {
    if users.is_empty() {
        println!("No users");
    }
    for user in users {
        let field = |key: &str| user[key].as_str().unwrap_or("-").to_string();
        let admin = if user["isAdmin"].as_bool().unwrap_or(false) {
            style("admin").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{}  {}  {}  {}",
            style(field("uid")).dim(),
            field("email"),
            style(field("displayName")).bold(),
            admin
        );
    }
}

/// Entries of a bulk-create file: a bare array or an object with `users`.
fn bulk_entries(raw: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).context("Bulk file is not valid JSON")? {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("users") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => bail!("Bulk file object must have a `users` array"),
        },
        _ => bail!("Bulk file must be an array of users or an object with `users`"),
    }
}

fn whitelist(mut keep: Vec<String>, keep_file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = keep_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        keep.extend(raw.lines().map(str::to_string));
    }
    let mut uids: Vec<String> = keep
        .into_iter()
        .map(|uid| uid.trim().to_string())
        .filter(|uid| !uid.is_empty())
        .collect();
    uids.sort();
    uids.dedup();
    Ok(uids)
}
