use anyhow::Result;
use clap::Subcommand;
use console::style;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::Context;

#[derive(Subcommand, Debug)]
pub enum PostCommand {
    /// List announcements, newest first.
    List,
    /// Publish an announcement.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    title: String,
    description: String,
    author_uid: String,
    created_at: String,
}

#[derive(Deserialize)]
struct PostList {
    posts: Vec<Post>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Created {
    post_id: String,
}

pub fn run(ctx: &Context, command: PostCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        PostCommand::List => {
            let list: PostList = client.get("/posts")?;
            if list.posts.is_empty() {
                println!("No posts");
            }
            for post in list.posts {
                println!(
                    "{}  {}",
                    style(post.title).bold(),
                    style(format!("{} by {}", post.created_at, post.author_uid)).dim()
                );
                println!("    {}", post.description);
            }
        }
        PostCommand::Create { title, description } => {
            let res: Created = client.send_json(
                Method::POST,
                "/posts",
                &json!({"title": title, "description": description}),
            )?;
            println!("{} Post created ({})", style("✓").green(), res.post_id);
        }
    }
    Ok(())
}
