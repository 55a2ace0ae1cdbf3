pub const NOT_APPLICABLE: &str = "n/a";
pub const RELEASE_TAG_NOT_FOUND: &str = "can not find release tag";
pub const USER_STORY_NOT_FOUND: &str = "can not find user story";


/// A commit in the compared range, as returned by the source control API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord
{
    pub sha:     String,
    pub message: String,
}

/// A tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord
{
    pub name:       String,
    pub commit_sha: String,
}

/// Fields read from a Jira ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDetails
{
    pub title:                   String,
    pub user_story:              String,
    pub components:              Vec<String>,
    pub impact:                  String,
    pub business_service_impact: Option<String>,
}

/// Ticket fields ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSummary
{
    pub title:                   String,
    pub user_story:              String,
    pub components:              String,
    pub impact:                  String,
    pub business_service_impact: String,
}

impl TicketSummary
{
    pub fn not_found(ticket_key: &str) -> TicketSummary
    {
        TicketSummary {
            title: format!("can not find jira ticket for {}", ticket_key),
            user_story: String::new(),
            components: String::new(),
            impact: String::new(),
            business_service_impact: String::new(),
        }
    }

    pub fn not_applicable() -> TicketSummary
    {
        TicketSummary {
            title: NOT_APPLICABLE.to_string(),
            user_story: NOT_APPLICABLE.to_string(),
            components: NOT_APPLICABLE.to_string(),
            impact: NOT_APPLICABLE.to_string(),
            business_service_impact: NOT_APPLICABLE.to_string(),
        }
    }
}

impl From<TicketDetails> for TicketSummary
{
    fn from(details: TicketDetails) -> Self
    {
        TicketSummary {
            title: details.title,
            user_story: details.user_story,
            components: format!("{:?}", details.components),
            impact: details.impact,
            business_service_impact: details.business_service_impact.unwrap_or_default(),
        }
    }
}

/// One block of the release notes page, one per commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNoteEntry
{
    pub jira_link:    String,
    pub ticket:       TicketSummary,
    pub commit_title: String,
    pub release_tag:  String,
    pub github_link:  String,
}

/// Returns the first tag pointing at `commit`, in tag listing order.
pub fn release_tag_for<'a>(commit: &CommitRecord, tags: &'a [TagRecord]) -> Option<&'a str>
{
    tags.iter()
        .find(|tag| tag.commit_sha == commit.sha)
        .map(|tag| tag.name.as_str())
}

#[test]
fn test_release_tag_for()
{
    let commit = CommitRecord { sha: "abc".to_string(), message: "AEA-1 fix".to_string() };
    let tags = vec![
        TagRecord { name: "v1.0.0".to_string(), commit_sha: "def".to_string() },
        TagRecord { name: "v1.1.0".to_string(), commit_sha: "abc".to_string() },
        TagRecord { name: "v1.1.0-rc".to_string(), commit_sha: "abc".to_string() },
    ];

    assert_eq!(release_tag_for(&commit, &tags), Some("v1.1.0"));
    assert_eq!(release_tag_for(&commit, &tags[..1]), None);
    assert_eq!(release_tag_for(&commit, &[]), None);
}

#[test]
fn test_ticket_summary()
{
    let details = TicketDetails {
        title: "Fix the bug".to_string(),
        user_story: "As a user".to_string(),
        components: vec!["API".to_string(), "Lambda".to_string()],
        impact: "Low".to_string(),
        business_service_impact: None,
    };
    let summary = TicketSummary::from(details);
    assert_eq!(summary.components, r#"["API", "Lambda"]"#);
    assert_eq!(summary.business_service_impact, "");

    let summary = TicketSummary::not_found("AEA-9");
    assert_eq!(summary.title, "can not find jira ticket for AEA-9");
    assert_eq!(summary.components, "");

    assert_eq!(TicketSummary::not_applicable().impact, NOT_APPLICABLE);
}
