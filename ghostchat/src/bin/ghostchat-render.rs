//! Render chat text from stdin.
//!
//! ```bash
//! echo 'Voir [tool:show_image query="girafe"]' | cargo run --bin ghostchat-render -- --resolve
//! ```
//!
//! Logging is controlled by `RUST_LOG`.

use anyhow::Context;
use clap::Parser;
use ghostchat::images::{ImageBackfill, ImageResolver};
use ghostchat::{Renderer, Role};
use std::io::Read;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render chat text from stdin as safe HTML", long_about = None)]
struct Cli {
    /// Print the fragment list as JSON instead of HTML
    #[arg(long)]
    json: bool,

    /// Treat the input as a user message (always literal text)
    #[arg(long)]
    user: bool,

    /// Resolve pending images against Wikipedia before printing
    #[arg(long)]
    resolve: bool,
}

impl Cli {
    fn role(&self) -> Role {
        if self.user {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let renderer = Renderer::default();
    let mut doc = renderer.render_message(cli.role(), &input);

    if cli.resolve {
        let resolver = ImageResolver::default();
        let filled = ImageBackfill::new().fill(&mut doc, &resolver).await;
        info!(images = filled, "Resolved pending images");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{}", doc.to_html());
    }
    Ok(())
}
