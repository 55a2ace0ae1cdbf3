use thiserror::Error;

/// Errors raised while collecting, enriching or publishing release notes.
#[derive(Error, Debug)]
pub enum ReleaseNotesError
{
    #[error("GitHub request failed: {0}")]
    GitHub(#[from] octocrab::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Jira ticket {key} is missing field `{field}`")]
    MissingField { key: String, field: String },

    #[error("Confluence error: {0}")]
    Wiki(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReleaseNotesError>;

impl ReleaseNotesError
{
    pub fn missing_field(key: impl Into<String>, field: impl Into<String>) -> Self
    {
        ReleaseNotesError::MissingField { key: key.into(), field: field.into() }
    }

    pub fn wiki(msg: impl Into<String>) -> Self
    {
        ReleaseNotesError::Wiki(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self
    {
        ReleaseNotesError::Config(msg.into())
    }
}

#[test]
fn test_error_display()
{
    let error = ReleaseNotesError::missing_field("AEA-1", "fields.summary");
    assert_eq!(error.to_string(), "Jira ticket AEA-1 is missing field `fields.summary`");

    let error = ReleaseNotesError::wiki("page 12 has no version");
    assert_eq!(error.to_string(), "Confluence error: page 12 has no version");

    let error = ReleaseNotesError::config("invalid ticket prefix");
    assert!(error.to_string().starts_with("Configuration error"));
}

#[test]
fn test_error_from_json()
{
    let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let error: ReleaseNotesError = json_error.into();
    assert!(error.to_string().contains("Invalid JSON"));
}
