use log::{debug, info};
use serde_json::{json, Value};

use crate::libs::error::{ReleaseNotesError, Result};

/// Destination of the generated notes.
pub trait Wiki
{
    /// Replaces the title and body of an existing page.
    async fn update_page(&self, page_id: &str, title: &str, body: &str) -> Result<()>;
}

pub struct Confluence
{
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Confluence
{
    pub fn new(base_url: &str, token: Option<String>) -> Result<Confluence>
    {
        let client = reqwest::Client::builder().build()?;

        Ok(Confluence { client, base_url: base_url.trim_end_matches('/').to_string(), token })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder
    {
        let request = self.client.request(method, url);
        match &self.token
        {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn current_version(&self, page_id: &str) -> Result<u64>
    {
        let url = format!("{}/rest/api/content/{}?expand=version", self.base_url, page_id);
        let page = self.request(reqwest::Method::GET, url)
            .send().await?
            .error_for_status()?
            .json::<Value>().await?;

        page.pointer("/version/number")
            .and_then(Value::as_u64)
            .ok_or_else(|| ReleaseNotesError::wiki(format!("page {} has no version number", page_id)))
    }
}

impl Wiki for Confluence
{
    async fn update_page(&self, page_id: &str, title: &str, body: &str) -> Result<()>
    {
        let version = self.current_version(page_id).await?;
        debug!("Confluence page {} is at version {}", page_id, version);

        let payload = json!({
            "id": page_id,
            "type": "page",
            "title": title,
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            },
            "version": {
                "number": version + 1,
                "minorEdit": false
            }
        });

        let url = format!("{}/rest/api/content/{}", self.base_url, page_id);
        self.request(reqwest::Method::PUT, url)
            .json(&payload)
            .send().await?
            .error_for_status()?;

        info!("Updated Confluence page {} ({}) to version {}", page_id, title, version + 1);
        Ok(())
    }
}

#[cfg(test)]
use wiremock::{matchers::{body_partial_json, header, method, path}, Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_update_page()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/693750027"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "693750027",
            "title": "Old title",
            "version": { "number": 7 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/content/693750027"))
        .and(body_partial_json(json!({
            "title": "Current release notes - INT",
            "body": { "storage": { "value": "<p>notes</p>", "representation": "storage" } },
            "version": { "number": 8 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "693750027" })))
        .expect(1)
        .mount(&server)
        .await;

    let confluence = Confluence::new(&server.uri(), Some("secret".to_string())).unwrap();
    confluence.update_page("693750027", "Current release notes - INT", "<p>notes</p>").await.unwrap();
}

#[tokio::test]
async fn test_update_page_unauthorized()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let confluence = Confluence::new(&server.uri(), None).unwrap();
    let result = confluence.update_page("1", "title", "body").await;

    assert!(matches!(result, Err(ReleaseNotesError::Http(_))));
}

#[tokio::test]
async fn test_update_page_without_version()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "2" })))
        .mount(&server)
        .await;

    let confluence = Confluence::new(&server.uri(), None).unwrap();
    let result = confluence.update_page("2", "title", "body").await;

    assert!(matches!(result, Err(ReleaseNotesError::Wiki(_))));
}

#[tokio::test]
async fn test_update_page_conflict()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/content/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "3", "version": { "number": 4 } })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/content/3"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": 409,
            "message": "Version must be incremented on update. Current version is: 5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confluence = Confluence::new(&server.uri(), None).unwrap();
    let result = confluence.update_page("3", "title", "body").await;

    assert!(matches!(result, Err(ReleaseNotesError::Http(_))));
}
