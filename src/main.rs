mod cli;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{AdminArgs, AdminCommands, Cli, Commands, SaveArgs};
use gameshelf::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gameshelf=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ShelfConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.root { config.root_url = root; }
    let shelf = Gameshelf::new(config)?;

    match cli.command {
        Commands::Discover => {
            let outcome = shelf.discover().await?;
            if outcome.is_empty() {
                println!("No games found");
            } else {
                println!("{} game(s) via {} at {}", outcome.ids.len(), outcome.strategy.unwrap_or("-"), outcome.base.as_deref().unwrap_or("-"));
                for id in &outcome.ids { println!("{id}"); }
            }
        }
        Commands::List { json } => {
            let catalog = shelf.load_catalog().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else if catalog.is_empty() {
                println!("No games found");
            } else {
                for entry in &catalog.entries { print_card(entry); }
                println!("{} total, {} available, {} coming soon", catalog.stats.total, catalog.stats.available, catalog.stats.coming_soon);
            }
        }
        Commands::Admin(args) => run_admin(&shelf, args).await?,
    }
    Ok(())
}

fn print_card(e: &CatalogEntry) {
    let badge = if e.coming_soon { " [coming soon]" } else { "" };
    println!("{} v{} ({}){}", e.name, e.version, e.size, badge);
    println!("  {}", e.description);
    println!("  download: {}", e.download_url);
    if let Some(cover) = &e.cover { println!("  cover: {cover}"); }
}

async fn run_admin(shelf: &Gameshelf, args: AdminArgs) -> Result<()> {
    let bridge: Option<Arc<dyn HostBridge>> = match &args.data_file {
        Some(path) => Some(Arc::new(LocalBridge::new(path)?) as Arc<dyn HostBridge>),
        None => None,
    };
    let mut editor = shelf.open_editor(bridge).await?;
    if !editor.can_edit() && !matches!(args.command, AdminCommands::List) {
        eprintln!("read-only: pass --data-file to enable editing");
    }

    match args.command {
        AdminCommands::List => {
            for r in editor.records() {
                let badge = if r.coming_soon { " [coming soon]" } else { "" };
                println!("{}  {} v{}{}", r.id, r.name, r.version, badge);
            }
            let s = editor.stats();
            println!("{} total, {} available, {} coming soon", s.total, s.available, s.coming_soon);
        }
        AdminCommands::Save(save) => {
            fill_form(&mut editor, save);
            let outcome = editor.save().await?;
            println!("saved {}", outcome.id);
            if let Some(notice) = outcome.notice { eprintln!("{notice}"); }
        }
        AdminCommands::Delete { id, yes } => {
            match editor.delete(&id, |r| yes || confirm(&format!("Delete \"{}\"?", r.name))).await? {
                DeleteOutcome::Deleted(outcome) => {
                    println!("deleted {}", outcome.id);
                    if let Some(notice) = outcome.notice { eprintln!("{notice}"); }
                }
                DeleteOutcome::Cancelled => println!("cancelled"),
            }
        }
        AdminCommands::Publish(p) => {
            let target = PublishTarget { owner: p.owner, repo: p.repo, file_path: p.path };
            let outcome = editor.publish(target, &p.token, &p.message).await?;
            match outcome.error {
                None => println!("published"),
                Some(err) => eprintln!("{err}"),
            }
        }
    }
    Ok(())
}

/// Start from the selected record when the id exists, then overlay flags.
fn fill_form(editor: &mut MetadataEditor, save: SaveArgs) {
    let existing = save.id.as_deref().and_then(|id| editor.select(id)).is_some();
    let form = editor.form_mut();
    if !existing { form.id = save.id; }
    if let Some(v) = save.name { form.name = v; }
    if let Some(v) = save.description { form.description = v; }
    if let Some(v) = save.version { form.version = v; }
    if let Some(v) = save.download_url { form.download_url = v; }
    if let Some(v) = save.size { form.size = v; }
    if let Some(v) = save.coming_soon { form.coming_soon = v; }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() { return false; }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
