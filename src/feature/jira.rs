use std::io::Write;

use log::{debug, error};
use serde_json::Value;

use crate::libs::error::{ReleaseNotesError, Result};
use crate::libs::release::{TicketDetails, TicketSummary, USER_STORY_NOT_FOUND};
use crate::libs::ticket;

const IMPACT_FIELD: &str = "customfield_26905";
const BUSINESS_SERVICE_IMPACT_FIELD: &str = "customfield_13618";

/// Issue lookups by key.
pub trait IssueTracker
{
    async fn issue(&self, key: &str) -> Result<Value>;
}

pub struct Jira
{
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Jira
{
    pub fn new(base_url: &str, token: Option<String>) -> Result<Jira>
    {
        let client = reqwest::Client::builder().build()?;

        Ok(Jira { client, base_url: base_url.trim_end_matches('/').to_string(), token })
    }
}

impl IssueTracker for Jira
{
    async fn issue(&self, key: &str) -> Result<Value>
    {
        let url = format!("{}/rest/api/2/issue/{}", self.base_url, key);
        debug!("Fetching Jira ticket: {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token
        {
            request = request.bearer_auth(token);
        }

        let issue = request.send().await?
            .error_for_status()?
            .json::<Value>().await?;

        Ok(issue)
    }
}

/// Reads the release note fields of a ticket. Fails on any missing required field.
pub async fn fetch_details(tracker: &impl IssueTracker, key: &str) -> Result<TicketDetails>
{
    let issue = tracker.issue(key).await?;
    let fields = issue.get("fields")
        .ok_or_else(|| ReleaseNotesError::missing_field(key, "fields"))?;

    let title = string_field(fields, key, "summary")?;
    let description = string_field(fields, key, "description")?;
    let components = fields.get("components")
        .and_then(Value::as_array)
        .ok_or_else(|| ReleaseNotesError::missing_field(key, "components"))?
        .iter()
        .map(|component| component.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ReleaseNotesError::missing_field(key, "components[].name")))
        .collect::<Result<Vec<String>>>()?;

    let user_story = ticket::user_story(&description)
        .unwrap_or_else(|| USER_STORY_NOT_FOUND.to_string());

    let impact = fields.get(IMPACT_FIELD)
        .and_then(|impact| impact.get("value"))
        .map(display_value)
        .unwrap_or_default();

    let business_service_impact = fields.get(BUSINESS_SERVICE_IMPACT_FIELD)
        .filter(|value| !value.is_null())
        .map(|value| value.get("value").map(display_value).unwrap_or_else(|| display_value(value)));

    Ok(TicketDetails { title, user_story, components, impact, business_service_impact })
}

/// Ticket fields for the notes page. Lookup failures are logged and replaced by placeholders.
pub async fn enrich(tracker: &impl IssueTracker, key: &str) -> TicketSummary
{
    match fetch_details(tracker, key).await
    {
        Ok(details) => details.into(),
        Err(err) =>
        {
            error!("Failed to read Jira ticket {}: {:?}", key, err);
            report_failure(&mut std::io::stdout().lock(), key, &err);
            TicketSummary::not_found(key)
        }
    }
}

// The failure report shares stdout with the page body and precedes it.
fn report_failure(out: &mut impl Write, key: &str, err: &ReleaseNotesError)
{
    let _ = writeln!(out, "{}", key);
    let _ = writeln!(out, "{:?}", err);
}

fn string_field(fields: &Value, key: &str, name: &str) -> Result<String>
{
    fields.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ReleaseNotesError::missing_field(key, name))
}

fn display_value(value: &Value) -> String
{
    match value
    {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub struct FakeTracker
{
    pub issues: std::collections::HashMap<String, Value>,
    pub lookups: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl IssueTracker for FakeTracker
{
    async fn issue(&self, key: &str) -> Result<Value>
    {
        self.lookups.borrow_mut().push(key.to_string());
        self.issues.get(key)
            .cloned()
            .ok_or_else(|| ReleaseNotesError::missing_field(key, "issue"))
    }
}

#[cfg(test)]
pub fn fake_tracker(issues: Vec<(&str, Value)>) -> FakeTracker
{
    FakeTracker {
        issues: issues.into_iter().map(|(key, issue)| (key.to_string(), issue)).collect(),
        lookups: Default::default(),
    }
}

#[tokio::test]
async fn test_fetch_details()
{
    let tracker = fake_tracker(vec![("AEA-100", serde_json::json!({
        "fields": {
            "summary": "Fix the bug",
            "description": "h3. *User Story*\nAs a pharmacist\nh3. *Background*\nLegacy",
            "components": [{ "name": "API" }, { "name": "Lambda" }],
            "customfield_26905": { "value": "High" },
            "customfield_13618": "Prescriptions unavailable"
        }
    }))]);

    let details = fetch_details(&tracker, "AEA-100").await.unwrap();
    assert_eq!(details.title, "Fix the bug");
    assert_eq!(details.user_story, "As a pharmacist");
    assert_eq!(details.components, vec!["API".to_string(), "Lambda".to_string()]);
    assert_eq!(details.impact, "High");
    assert_eq!(details.business_service_impact, Some("Prescriptions unavailable".to_string()));
}

#[tokio::test]
async fn test_fetch_details_optional_fields()
{
    let tracker = fake_tracker(vec![("AEA-101", serde_json::json!({
        "fields": {
            "summary": "No story",
            "description": "Just some text",
            "components": [],
            "customfield_26905": null,
            "customfield_13618": { "value": "None expected" }
        }
    }))]);

    let details = fetch_details(&tracker, "AEA-101").await.unwrap();
    assert_eq!(details.user_story, USER_STORY_NOT_FOUND);
    assert!(details.components.is_empty());
    assert_eq!(details.impact, "");
    assert_eq!(details.business_service_impact, Some("None expected".to_string()));
}

#[tokio::test]
async fn test_fetch_details_missing_description()
{
    let tracker = fake_tracker(vec![("AEA-102", serde_json::json!({
        "fields": { "summary": "Fix", "description": null, "components": [] }
    }))]);

    let error = fetch_details(&tracker, "AEA-102").await.unwrap_err();
    assert!(error.to_string().contains("description"));
}

#[tokio::test]
async fn test_enrich_never_fails()
{
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();

    let tracker = fake_tracker(vec![("AEA-103", serde_json::json!({ "fields": { "summary": "Missing the rest" } }))]);

    let summary = enrich(&tracker, "AEA-404").await;
    assert!(summary.title.starts_with("can not find jira ticket for"));
    assert_eq!(summary, TicketSummary::not_found("AEA-404"));

    let summary = enrich(&tracker, "AEA-103").await;
    assert_eq!(summary.title, "can not find jira ticket for AEA-103");
    assert_eq!(summary.user_story, "");
}

#[test]
fn test_report_failure()
{
    let mut out = Vec::<u8>::new();
    report_failure(&mut out, "AEA-404", &ReleaseNotesError::missing_field("AEA-404", "issue"));

    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("AEA-404"));
    assert_eq!(lines.next(), Some(r#"MissingField { key: "AEA-404", field: "issue" }"#));
    assert_eq!(lines.next(), None);
}

#[cfg(test)]
use wiremock::{matchers::{header, method, path}, Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_jira_issue()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/AEA-100"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "key": "AEA-100",
            "fields": { "summary": "Fix the bug", "description": "", "components": [] }
        })))
        .mount(&server)
        .await;

    let jira = Jira::new(&format!("{}/", server.uri()), Some("secret".to_string())).unwrap();
    let details = fetch_details(&jira, "AEA-100").await.unwrap();

    assert_eq!(details.title, "Fix the bug");
    assert!(details.components.is_empty());
}

#[tokio::test]
async fn test_jira_issue_not_found()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/AEA-999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errorMessages": ["Issue Does Not Exist"]
        })))
        .mount(&server)
        .await;

    let jira = Jira::new(&server.uri(), None).unwrap();
    assert!(jira.issue("AEA-999").await.is_err());

    let summary = enrich(&jira, "AEA-999").await;
    assert_eq!(summary.title, "can not find jira ticket for AEA-999");
}
