use log::{debug, info};

use crate::feature::github::SourceControl;
use crate::feature::jira::{self, IssueTracker};
use crate::libs::config::Settings;
use crate::libs::error::Result;
use crate::libs::release::{self, ReleaseNoteEntry, TicketSummary, NOT_APPLICABLE, RELEASE_TAG_NOT_FOUND};
use crate::libs::ticket::{self, TicketMatcher};

const DISCLAIMER: &str = "This page is auto generated. Any manual modifications will be lost";

/// Append-only page body.
#[derive(Debug)]
pub struct ReleaseNotes
{
    output: String,
}

impl ReleaseNotes
{
    pub fn new() -> ReleaseNotes
    {
        ReleaseNotes { output: DISCLAIMER.to_string() }
    }

    pub fn append(&mut self, text: &str)
    {
        self.output.push('\n');
        self.output.push_str(text);
    }

    pub fn append_header(&mut self, product_name: &str, current_tag: &str, target_tag: &str, target_env: &str)
    {
        self.append(&format!(
            "<h1 id='Currentreleasenotes{target_tag}-plannedreleasetotag{target_tag}'>{product_name} planned release to {target_env} of tag {target_tag}</h1>"
        ));
        self.append(&format!(
            "<h2 id='Currentreleasenotes{target_tag}-Changessincecurrentlyreleasedtag{current_tag}'>Changes since currently released tag {current_tag}</h2>"
        ));
    }

    pub fn append_entry(&mut self, entry: &ReleaseNoteEntry)
    {
        let ticket = &entry.ticket;
        let user_story = ticket.user_story.replace('\n', "\n<br/>");

        self.append("<p>***");
        self.append(&format!("<br/>jira link               :  {}", external_link(&entry.jira_link)));
        self.append(&format!("<br/>jira title              : {}", ticket.title));
        self.append(&format!("<br/>user story              : {}", user_story));
        self.append(&format!("<br/>commit title            : {}", entry.commit_title));
        self.append(&format!("<br/>release tag             : {}", entry.release_tag));
        self.append(&format!("<br/>github release          : {}", external_link(&entry.github_link)));
        self.append(&format!("<br/>Area affected           : {}", ticket.components));
        self.append(&format!("<br/>Impact                  : {}", ticket.impact));
        self.append(&format!("<br/>Business/Service Impact : {}", ticket.business_service_impact));
        self.append("</p>");
    }

    pub fn into_string(self) -> String
    {
        self.output
    }
}

impl Default for ReleaseNotes
{
    fn default() -> Self
    {
        Self::new()
    }
}

fn external_link(url: &str) -> String
{
    format!("<a class='external-link' href='{url}' rel='nofollow'>{url}</a>")
}

/// Builds the release notes page for every commit between the current and the target tag.
pub async fn build(
    settings: &Settings,
    source: &impl SourceControl,
    tracker: &impl IssueTracker,
) -> Result<String>
{
    let matcher = TicketMatcher::new(&settings.ticket_prefix)?;

    let mut notes = ReleaseNotes::new();
    notes.append_header(&settings.product_name, &settings.current_tag, &settings.target_tag, &settings.target_env);

    let commits = source.compare(&settings.current_tag, &settings.target_tag).await?;
    let tags = source.tags().await?;

    for commit in commits.iter()
    {
        let release_tag = release::release_tag_for(commit, &tags)
            .unwrap_or(RELEASE_TAG_NOT_FOUND)
            .to_string();
        let commit_title = ticket::first_line(&commit.message).to_string();

        let (jira_link, ticket) = match matcher.ticket_key(&commit_title)
        {
            Some(key) =>
            {
                debug!("Commit: {} - {} [{}]", commit.sha, commit_title, key);
                (settings.jira_browse_url(&key), jira::enrich(tracker, &key).await)
            }
            None =>
            {
                debug!("Commit: {} - {} [no ticket]", commit.sha, commit_title);
                (NOT_APPLICABLE.to_string(), TicketSummary::not_applicable())
            }
        };

        let github_link = settings.github_release_url(&release_tag);
        notes.append_entry(&ReleaseNoteEntry { jira_link, ticket, commit_title, release_tag, github_link });
    }

    info!("Release notes built for {} commits", commits.len());
    Ok(notes.into_string())
}

#[cfg(test)]
use crate::libs::release::{CommitRecord, TagRecord};

#[cfg(test)]
struct FakeSource
{
    commits: Vec<CommitRecord>,
    tags: Vec<TagRecord>,
    tag_calls: std::cell::Cell<usize>,
}

#[cfg(test)]
fn fake_source(commits: Vec<CommitRecord>, tags: Vec<TagRecord>) -> FakeSource
{
    FakeSource { commits, tags, tag_calls: Default::default() }
}

#[cfg(test)]
impl SourceControl for FakeSource
{
    async fn compare(&self, base: &str, _head: &str) -> Result<Vec<CommitRecord>>
    {
        if base == "missing"
        {
            return Err(crate::libs::error::ReleaseNotesError::config("unknown ref"));
        }
        Ok(self.commits.clone())
    }

    async fn tags(&self) -> Result<Vec<TagRecord>>
    {
        self.tag_calls.set(self.tag_calls.get() + 1);
        Ok(self.tags.clone())
    }
}

#[cfg(test)]
fn commit(sha: &str, message: &str) -> CommitRecord
{
    CommitRecord { sha: sha.to_string(), message: message.to_string() }
}

#[tokio::test]
async fn test_build_single_commit()
{
    let settings = crate::libs::config::test_settings();
    let source = fake_source(
        vec![commit("aaa", "AEA-100: fix bug\n\nDetails")],
        vec![
            TagRecord { name: "v1.0.0".to_string(), commit_sha: "000".to_string() },
            TagRecord { name: "v1.1.0".to_string(), commit_sha: "aaa".to_string() },
        ],
    );
    let tracker = jira::fake_tracker(vec![("AEA-100", serde_json::json!({
        "fields": {
            "summary": "Fix the bug",
            "description": "User Story\nAs a patient\nI want it fixed\nBackground",
            "components": []
        }
    }))]);

    let output = build(&settings, &source, &tracker).await.unwrap();

    assert!(output.starts_with(DISCLAIMER));
    assert!(output.contains("<h1 id='Currentreleasenotesv1.1.0-plannedreleasetotagv1.1.0'>Prescriptions for Patients planned release to INT of tag v1.1.0</h1>"));
    assert!(output.contains("<h2 id='Currentreleasenotesv1.1.0-Changessincecurrentlyreleasedtagv1.0.0'>Changes since currently released tag v1.0.0</h2>"));
    assert!(output.contains("<a class='external-link' href='https://nhsd-jira.digital.nhs.uk/browse/AEA-100' rel='nofollow'>https://nhsd-jira.digital.nhs.uk/browse/AEA-100</a>"));
    assert!(output.contains("<br/>jira title              : Fix the bug\n"));
    assert!(output.contains("<br/>user story              : As a patient\n<br/>I want it fixed\n"));
    assert!(output.contains("<br/>commit title            : AEA-100: fix bug\n"));
    assert!(output.contains("<br/>release tag             : v1.1.0\n"));
    assert!(output.contains("https://github.com/NHSDigital/prescriptionsforpatients/releases/tag/v1.1.0"));
    assert!(output.contains("<br/>Area affected           : []\n"));
    assert!(output.contains("<br/>Business/Service Impact : \n</p>"));
    assert!(output.ends_with("</p>"));
}

#[tokio::test]
async fn test_build_without_ticket_or_tag()
{
    let settings = crate::libs::config::test_settings();
    let source = fake_source(vec![commit("bbb", "Upgrade: [dependabot] - bump regex")], vec![]);
    let tracker = jira::fake_tracker(vec![]);

    let output = build(&settings, &source, &tracker).await.unwrap();

    assert!(output.contains("href='n/a'"));
    assert!(output.contains("<br/>jira title              : n/a\n"));
    assert!(output.contains("<br/>user story              : n/a\n"));
    assert!(output.contains("<br/>Area affected           : n/a\n"));
    assert!(output.contains("<br/>Impact                  : n/a\n"));
    assert!(output.contains("<br/>Business/Service Impact : n/a\n"));
    assert!(output.contains("<br/>release tag             : can not find release tag\n"));
    assert!(output.contains("releases/tag/can not find release tag'"));
}

#[tokio::test]
async fn test_build_keeps_commit_order()
{
    let settings = crate::libs::config::test_settings();
    let source = fake_source(
        vec![
            commit("c1", "aea 7 first"),
            commit("c2", "AEA-7 second"),
            commit("c3", "third"),
        ],
        vec![],
    );
    let tracker = jira::fake_tracker(vec![]);

    let output = build(&settings, &source, &tracker).await.unwrap();

    assert_eq!(output.matches("<p>***").count(), 3);
    let first = output.find("commit title            : aea 7 first").unwrap();
    let second = output.find("commit title            : AEA-7 second").unwrap();
    let third = output.find("commit title            : third").unwrap();
    assert!(first < second && second < third);

    // Unknown tickets are reported per commit, not merged.
    assert_eq!(output.matches("can not find jira ticket for AEA-7").count(), 2);

    // One tag listing per run, one ticket lookup per referencing commit.
    assert_eq!(source.tag_calls.get(), 1);
    assert_eq!(*tracker.lookups.borrow(), vec!["AEA-7".to_string(), "AEA-7".to_string()]);
}

#[tokio::test]
async fn test_build_compare_failure()
{
    let mut settings = crate::libs::config::test_settings();
    settings.current_tag = "missing".to_string();
    let source = fake_source(vec![], vec![]);
    let tracker = jira::fake_tracker(vec![]);

    assert!(build(&settings, &source, &tracker).await.is_err());
}

#[test]
fn test_empty_range()
{
    let mut notes = ReleaseNotes::new();
    notes.append_header("Product", "v1", "v2", "PROD");

    let output = notes.into_string();
    assert_eq!(output.lines().count(), 3);
    assert!(!output.contains("<p>"));
}
