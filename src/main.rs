use anyhow::Context;
use clap::Parser;
use log::info;

use feature::confluence::{Confluence, Wiki};
use feature::github::GitHub;
use feature::jira::Jira;
use libs::config::{Args, Settings};

mod feature;
mod libs;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{
    // Environment variables win over the .env file.
    dotenvy::dotenv().ok();

    // Initialize the logger, while in debug mode, log everything; otherwise, log only errors, warnings and info.
    if cfg!(debug_assertions)
    {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::max())
            .parse_default_env()
            .init();
    }
    else
    {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .init();
    }

    // Parse the command line arguments
    let settings = Settings::from_args(Args::parse());
    info!(
        "Release notes for {}/{}: {} -> {} ({})",
        settings.github_org, settings.repo_name, settings.current_tag, settings.target_tag, settings.target_env
    );

    let github = GitHub::new(&settings.github_org, &settings.repo_name, settings.github_token.clone())
        .context("Failed to create GitHub client")?;
    let jira = Jira::new(&settings.jira_url, settings.jira_token.clone())
        .context("Failed to create Jira client")?;

    let output = feature::notes::build(&settings, &github, &jira)
        .await
        .with_context(|| format!("Failed to build release notes for {}...{}", settings.current_tag, settings.target_tag))?;
    println!("{}", output);

    let confluence = Confluence::new(&settings.confluence_url, settings.confluence_token.clone())
        .context("Failed to create Confluence client")?;
    confluence.update_page(&settings.page_id, &settings.page_title, &output)
        .await
        .with_context(|| format!("Failed to publish release notes to page {}", settings.page_id))?;

    Ok(())
}
