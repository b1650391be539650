use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use dialoguer::{Input, Password};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::Context;
use crate::client::ApiClient;
use crate::session::Session;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    uid: String,
    is_admin: bool,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    uid: String,
    email: String,
    is_admin: bool,
}

pub fn login(ctx: &Context, email: Option<String>) -> Result<()> {
    let server = ctx.server()?;
    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("E-mail").interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    let client = ApiClient::new(&server, None)?;
    let res: LoginResponse = client.send_json(
        Method::POST,
        "/auth/login",
        &json!({"email": email, "password": password}),
    )?;

    ctx.sessions.save(&Session {
        server: server.clone(),
        token: res.token,
        uid: res.uid,
        is_admin: res.is_admin,
        expires_at: res.expires_at,
    })?;
    ctx.users.invalidate();

    println!("{} Logged in to {}", style("✓").green(), server);
    if !res.is_admin {
        println!(
            "{}",
            style("This account has no admin claim; only listing commands will work.").yellow()
        );
    }
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    if ctx.sessions.clear()? {
        ctx.users.invalidate();
        println!("{} Logged out", style("✓").green());
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let me: MeResponse = ctx.client()?.get("/auth/me")?;

    println!("{} {}", style("uid:").bold(), me.uid);
    println!("{} {}", style("email:").bold(), me.email);
    println!(
        "{} {}",
        style("admin:").bold(),
        if me.is_admin { "yes" } else { "no" }
    );
    println!(
        "{} {}",
        style("token expires:").bold(),
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}
