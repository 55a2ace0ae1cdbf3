use std::sync::OnceLock;

use regex::Regex;

use super::error::{ReleaseNotesError, Result};

/// Finds ticket keys such as `AEA-1234` in commit titles.
#[derive(Debug, Clone)]
pub struct TicketMatcher
{
    pattern: Regex,
}

impl TicketMatcher
{
    pub fn new(prefix: &str) -> Result<TicketMatcher>
    {
        let prefix = prefix.trim();
        if prefix.is_empty()
        {
            return Err(ReleaseNotesError::config("ticket prefix is empty"));
        }

        // The separator is required, the digits are not.
        let pattern = Regex::new(&format!(r"(?i){}[- ]\d*", regex::escape(prefix)))
            .map_err(|error| ReleaseNotesError::config(format!("invalid ticket prefix `{}`: {}", prefix, error)))?;

        Ok(TicketMatcher { pattern })
    }

    /// Normalized key of the first ticket reference in `line`.
    pub fn ticket_key(&self, line: &str) -> Option<String>
    {
        self.pattern
            .find(line)
            .map(|found| found.as_str().replace(' ', "-").to_uppercase())
    }
}

/// First line of a commit message.
pub fn first_line(message: &str) -> &str
{
    message.lines().next().unwrap_or("")
}

fn user_story_pattern() -> &'static Regex
{
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?ism)(user story)(.*?)background").expect("user story pattern is valid"))
}

/// Text between the first `user story` and the following `background`, without wiki markup.
pub fn user_story(description: &str) -> Option<String>
{
    let captures = user_story_pattern().captures(description)?;
    let story = captures.get(2)?.as_str();

    Some(story.replace('*', "").replace("h3.", "").trim().to_string())
}

#[test]
fn test_ticket_key()
{
    let matcher = TicketMatcher::new("AEA").unwrap();

    assert_eq!(matcher.ticket_key("aea 1234 fix things"), Some("AEA-1234".to_string()));
    assert_eq!(matcher.ticket_key("AEA-5678: upgrade"), Some("AEA-5678".to_string()));
    assert_eq!(matcher.ticket_key("Upgrade: [Aea-42] - bump"), Some("AEA-42".to_string()));
    assert_eq!(matcher.ticket_key("Upgrade: [dependabot] - bump"), None);
    assert_eq!(matcher.ticket_key("AEA1234 no separator"), None);
}

#[test]
fn test_ticket_key_custom_prefix()
{
    let matcher = TicketMatcher::new("EPS").unwrap();

    assert_eq!(matcher.ticket_key("eps-77 tidy"), Some("EPS-77".to_string()));
    assert_eq!(matcher.ticket_key("AEA-77 tidy"), None);
    assert!(TicketMatcher::new("  ").is_err());
}

#[test]
fn test_first_line()
{
    assert_eq!(first_line("AEA-100: fix bug\n\nlonger body"), "AEA-100: fix bug");
    assert_eq!(first_line("single"), "single");
    assert_eq!(first_line(""), "");
}

#[test]
fn test_user_story()
{
    assert_eq!(user_story("User Story\n* some text *\nBackground"), Some("some text".to_string()));
    assert_eq!(
        user_story("h3. *User story*\nAs a patient\nI want my prescriptions\nh3. *Background*\nstuff"),
        Some("As a patient\nI want my prescriptions".to_string())
    );
    assert_eq!(user_story("User Story\nno end marker"), None);
    assert_eq!(user_story(""), None);
}
