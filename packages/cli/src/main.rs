mod cache;
mod client;
mod commands;
mod session;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::commands::Context;
use crate::commands::admin::AdminCommand;
use crate::commands::album::AlbumCommand;
use crate::commands::event::EventCommand;
use crate::commands::post::PostCommand;

/// Manage events, Bländare albums, announcements and users of a Mottagning
/// server.
#[derive(Parser, Debug)]
#[command(name = "mottagning", author, version, about)]
struct Cli {
    /// Server origin, e.g. https://mottagning.example.org. Defaults to the
    /// server of the current session.
    #[arg(long, global = true, env = "MOTTAGNING_SERVER")]
    server: Option<String>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token.
    Login {
        /// Account e-mail. Prompted for when omitted.
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the identity of the stored session.
    Whoami,
    /// Events and their thumbnails.
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Bländare albums.
    Album {
        #[command(subcommand)]
        command: AlbumCommand,
    },
    /// Admin claims and user administration.
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Announcements.
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(cli.server)?;
    match cli.command {
        Command::Login { email } => commands::auth::login(&ctx, email),
        Command::Logout => commands::auth::logout(&ctx),
        Command::Whoami => commands::auth::whoami(&ctx),
        Command::Event { command } => commands::event::run(&ctx, command),
        Command::Album { command } => commands::album::run(&ctx, command),
        Command::Admin { command } => commands::admin::run(&ctx, command),
        Command::Post { command } => commands::post::run(&ctx, command),
    }
}
