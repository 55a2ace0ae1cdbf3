use clap::Parser;

pub const DEFAULT_GITHUB_ORG: &str = "NHSDigital";
pub const DEFAULT_JIRA_URL: &str = "https://nhsd-jira.digital.nhs.uk/";
pub const DEFAULT_CONFLUENCE_URL: &str = "https://nhsd-confluence.digital.nhs.uk/";
pub const DEFAULT_TICKET_PREFIX: &str = "AEA";

#[derive(Parser, Debug, Default, Clone)]
#[command(version, about = "Identify release notes for commits between two tags", long_about = None)]
pub struct Args
{
    /// A specific tag to deploy
    #[arg(long)]
    pub target_tag: String,

    /// Current tag
    #[arg(long)]
    pub current_tag: String,

    /// Release notes page id
    #[arg(long)]
    pub release_notes_page_id: String,

    /// Release notes page title
    #[arg(long)]
    pub release_notes_page_title: String,

    /// Github repo name
    #[arg(long)]
    pub repo_name: String,

    /// Product name
    #[arg(long)]
    pub product_name: String,

    /// Target environment
    #[arg(long)]
    pub target_env: String,

    /// Github organisation owning the repository
    #[arg(long, env = "GITHUB_ORG", default_value = DEFAULT_GITHUB_ORG)]
    pub github_org: String,

    /// Base url of the Jira instance
    #[arg(long, env = "JIRA_URL", default_value = DEFAULT_JIRA_URL)]
    pub jira_url: String,

    /// Base url of the Confluence instance
    #[arg(long, env = "CONFLUENCE_URL", default_value = DEFAULT_CONFLUENCE_URL)]
    pub confluence_url: String,

    /// Jira project key that commit titles reference
    #[arg(long, env = "TICKET_PREFIX", default_value = DEFAULT_TICKET_PREFIX)]
    pub ticket_prefix: String,
}

/// Runtime settings for a single run, secrets included.
#[derive(Debug, Clone)]
pub struct Settings
{
    pub target_tag:     String,
    pub current_tag:    String,
    pub page_id:        String,
    pub page_title:     String,
    pub repo_name:      String,
    pub product_name:   String,
    pub target_env:     String,
    pub github_org:     String,
    pub jira_url:       String,
    pub confluence_url: String,
    pub ticket_prefix:  String,

    // Secrets
    pub jira_token:       Option<String>,
    pub confluence_token: Option<String>,
    pub github_token:     Option<String>,
}

impl Settings
{
    pub fn from_args(args: Args) -> Settings
    {
        Settings {
            target_tag: args.target_tag,
            current_tag: args.current_tag,
            page_id: args.release_notes_page_id,
            page_title: args.release_notes_page_title,
            repo_name: args.repo_name,
            product_name: args.product_name,
            target_env: args.target_env,
            github_org: args.github_org,
            jira_url: trim_base_url(&args.jira_url),
            confluence_url: trim_base_url(&args.confluence_url),
            ticket_prefix: args.ticket_prefix,
            jira_token: secret("JIRA_TOKEN"),
            confluence_token: secret("CONFLUENCE_TOKEN"),
            github_token: secret("GITHUB_TOKEN"),
        }
    }

    pub fn jira_browse_url(&self, ticket_key: &str) -> String
    {
        format!("{}/browse/{}", self.jira_url, ticket_key)
    }

    pub fn github_release_url(&self, release_tag: &str) -> String
    {
        format!("https://github.com/{}/{}/releases/tag/{}", self.github_org, self.repo_name, release_tag)
    }
}

fn trim_base_url(url: &str) -> String
{
    url.trim().trim_end_matches('/').to_string()
}

// Unset and empty variables are treated alike; the remote end rejects the request later.
fn secret(name: &str) -> Option<String>
{
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
pub fn test_settings() -> Settings
{
    Settings::from_args(Args {
        target_tag: "v1.1.0".to_string(),
        current_tag: "v1.0.0".to_string(),
        release_notes_page_id: "693750027".to_string(),
        release_notes_page_title: "Current release notes - INT".to_string(),
        repo_name: "prescriptionsforpatients".to_string(),
        product_name: "Prescriptions for Patients".to_string(),
        target_env: "INT".to_string(),
        github_org: DEFAULT_GITHUB_ORG.to_string(),
        jira_url: DEFAULT_JIRA_URL.to_string(),
        confluence_url: DEFAULT_CONFLUENCE_URL.to_string(),
        ticket_prefix: DEFAULT_TICKET_PREFIX.to_string(),
    })
}

#[test]
fn test_parse_args()
{
    let args = Args::try_parse_from([
        "release-notes",
        "--target-tag", "v1.1.0",
        "--current-tag", "v1.0.0",
        "--release-notes-page-id", "693750029",
        "--release-notes-page-title", "Release notes - PROD",
        "--repo-name", "prescriptionsforpatients",
        "--product-name", "Prescriptions for Patients",
        "--target-env", "PROD",
        "--jira-url", "https://jira.example.com/",
    ]).unwrap();

    assert_eq!(args.target_tag, "v1.1.0");
    assert_eq!(args.release_notes_page_id, "693750029");
    assert_eq!(args.jira_url, "https://jira.example.com/");

    let settings = Settings::from_args(args);
    assert_eq!(settings.page_title, "Release notes - PROD");
    assert_eq!(settings.jira_url, "https://jira.example.com");
}

#[test]
fn test_missing_required_arg()
{
    let result = Args::try_parse_from(["release-notes", "--target-tag", "v1.1.0"]);
    assert!(result.is_err());
}

#[test]
fn test_links()
{
    let settings = test_settings();

    assert_eq!(settings.jira_browse_url("AEA-100"), "https://nhsd-jira.digital.nhs.uk/browse/AEA-100");
    assert_eq!(
        settings.github_release_url("can not find release tag"),
        "https://github.com/NHSDigital/prescriptionsforpatients/releases/tag/can not find release tag"
    );
}
