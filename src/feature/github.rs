use log::{debug, info};

use crate::libs::error::Result;
use crate::libs::release::{CommitRecord, TagRecord};

const TAGS_PER_PAGE: u8 = 100;

/// Read access to the hosted repository the release is cut from.
pub trait SourceControl
{
    /// Commits reachable from `head` but not from `base`, in API order.
    async fn compare(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>>;

    /// Every tag of the repository.
    async fn tags(&self) -> Result<Vec<TagRecord>>;
}

pub struct GitHub
{
    octocrab: octocrab::Octocrab,
    owner: String,
    repo: String,
}

impl GitHub
{
    pub fn new(owner: &str, repo: &str, token: Option<String>) -> Result<GitHub>
    {
        let mut builder = octocrab::Octocrab::builder();
        if let Some(token) = token
        {
            builder = builder.personal_token(token);
        }

        Ok(GitHub { octocrab: builder.build()?, owner: owner.to_string(), repo: repo.to_string() })
    }

    #[cfg(test)]
    pub fn with_base_uri(owner: &str, repo: &str, base_uri: &str) -> Result<GitHub>
    {
        let octocrab = octocrab::Octocrab::builder()
            .base_uri(base_uri)?
            .build()?;

        Ok(GitHub { octocrab, owner: owner.to_string(), repo: repo.to_string() })
    }
}

impl SourceControl for GitHub
{
    async fn compare(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>>
    {
        debug!("Comparing: {}/{} {}...{}", self.owner, self.repo, base, head);

        let comparison = self.octocrab
            .commits(&self.owner, &self.repo)
            .compare(base, head)
            .send()
            .await?;
        info!("Commits between {} and {}: {}", base, head, comparison.commits.len());

        Ok(comparison.commits
            .into_iter()
            .map(|commit| CommitRecord { sha: commit.sha, message: commit.commit.message })
            .collect())
    }

    async fn tags(&self) -> Result<Vec<TagRecord>>
    {
        let first_page = self.octocrab
            .repos(&self.owner, &self.repo)
            .list_tags()
            .per_page(TAGS_PER_PAGE)
            .send()
            .await?;
        let tags = self.octocrab.all_pages(first_page).await?;

        info!("Tags: {}", tags.len());
        Ok(tags.into_iter()
            .map(|tag| TagRecord { name: tag.name, commit_sha: tag.commit.sha })
            .collect())
    }
}

#[cfg(test)]
use wiremock::{matchers::{method, path, query_param, query_param_is_missing}, Mock, MockServer, ResponseTemplate};

#[cfg(test)]
fn user_fixture() -> serde_json::Value
{
    serde_json::json!({
        "login": "octocat",
        "id": 1,
        "node_id": "MDQ6VXNlcjE=",
        "avatar_url": "https://github.com/images/error/octocat_happy.gif",
        "gravatar_id": "",
        "url": "https://api.github.com/users/octocat",
        "html_url": "https://github.com/octocat",
        "followers_url": "https://api.github.com/users/octocat/followers",
        "following_url": "https://api.github.com/users/octocat/following{/other_user}",
        "gists_url": "https://api.github.com/users/octocat/gists{/gist_id}",
        "starred_url": "https://api.github.com/users/octocat/starred{/owner}{/repo}",
        "subscriptions_url": "https://api.github.com/users/octocat/subscriptions",
        "organizations_url": "https://api.github.com/users/octocat/orgs",
        "repos_url": "https://api.github.com/users/octocat/repos",
        "events_url": "https://api.github.com/users/octocat/events{/privacy}",
        "received_events_url": "https://api.github.com/users/octocat/received_events",
        "type": "User",
        "site_admin": false
    })
}

#[cfg(test)]
fn commit_fixture(sha: &str, message: &str) -> serde_json::Value
{
    let url = format!("https://api.github.com/repos/NHSDigital/repo/commits/{}", sha);
    let git_user = serde_json::json!({ "name": "Octo Cat", "email": "octocat@github.com", "date": "2024-05-01T10:00:00Z" });

    serde_json::json!({
        "url": url,
        "sha": sha,
        "node_id": "MDY6Q29tbWl0NmRjYjA5YjViNTc4NzVmMzM0ZjYxYWViZWQ2OTVlMmU0MTkzZGI1ZQ==",
        "html_url": format!("https://github.com/NHSDigital/repo/commit/{}", sha),
        "comments_url": format!("{}/comments", url),
        "commit": {
            "url": format!("https://api.github.com/repos/NHSDigital/repo/git/commits/{}", sha),
            "author": git_user,
            "committer": git_user,
            "message": message,
            "tree": { "url": "https://api.github.com/repos/NHSDigital/repo/tree/6dcb09b", "sha": "6dcb09b" },
            "comment_count": 0,
            "verification": { "verified": false, "reason": "unsigned", "signature": null, "payload": null, "verified_at": null }
        },
        "author": user_fixture(),
        "committer": user_fixture(),
        "parents": [{ "url": "https://api.github.com/repos/NHSDigital/repo/commits/0000000", "sha": "0000000" }],
        "files": []
    })
}

#[cfg(test)]
fn tag_fixture(name: &str, sha: &str) -> serde_json::Value
{
    serde_json::json!({
        "name": name,
        "commit": { "sha": sha, "url": format!("https://api.github.com/repos/NHSDigital/repo/commits/{}", sha) },
        "zipball_url": format!("https://github.com/NHSDigital/repo/zipball/{}", name),
        "tarball_url": format!("https://github.com/NHSDigital/repo/tarball/{}", name),
        "node_id": "MDQ6VXNlcjE="
    })
}

#[tokio::test]
async fn test_compare()
{
    let server = MockServer::start().await;
    let base = commit_fixture("base", "previous release");
    let body = serde_json::json!({
        "url": "https://api.github.com/repos/NHSDigital/repo/compare/v1.0.0...v1.1.0",
        "html_url": "https://github.com/NHSDigital/repo/compare/v1.0.0...v1.1.0",
        "permalink_url": "https://github.com/NHSDigital/repo/compare/NHSDigital:base...NHSDigital:bbb",
        "diff_url": "https://github.com/NHSDigital/repo/compare/v1.0.0...v1.1.0.diff",
        "patch_url": "https://github.com/NHSDigital/repo/compare/v1.0.0...v1.1.0.patch",
        "base_commit": base,
        "merge_base_commit": base,
        "status": "ahead",
        "ahead_by": 2,
        "behind_by": 0,
        "total_commits": 2,
        "commits": [
            commit_fixture("aaa", "AEA-100: fix bug\n\nbody"),
            commit_fixture("bbb", "Upgrade: [dependabot] - bump")
        ],
        "files": []
    });

    Mock::given(method("GET"))
        .and(path("/repos/NHSDigital/repo/compare/v1.0.0...v1.1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let github = GitHub::with_base_uri("NHSDigital", "repo", &server.uri()).unwrap();
    let commits = github.compare("v1.0.0", "v1.1.0").await.unwrap();

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0], CommitRecord { sha: "aaa".to_string(), message: "AEA-100: fix bug\n\nbody".to_string() });
    assert_eq!(commits[1].sha, "bbb");
}

#[tokio::test]
async fn test_compare_unknown_tag()
{
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/NHSDigital/repo/compare/v0.0.0...v1.1.0"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/commits/commits#compare-two-commits"
        })))
        .mount(&server)
        .await;

    let github = GitHub::with_base_uri("NHSDigital", "repo", &server.uri()).unwrap();
    assert!(github.compare("v0.0.0", "v1.1.0").await.is_err());
}

#[tokio::test]
async fn test_tags_paged()
{
    let server = MockServer::start().await;
    let next = format!("<{}/repos/NHSDigital/repo/tags?per_page=100&page=2>; rel=\"next\"", server.uri());

    Mock::given(method("GET"))
        .and(path("/repos/NHSDigital/repo/tags"))
        .and(query_param("per_page", "100"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200)
            .insert_header("Link", next.as_str())
            .set_body_json(serde_json::json!([tag_fixture("v1.0.0", "000"), tag_fixture("v1.0.1", "111")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/NHSDigital/repo/tags"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([tag_fixture("v1.1.0", "aaa")])))
        .expect(1)
        .mount(&server)
        .await;

    let github = GitHub::with_base_uri("NHSDigital", "repo", &server.uri()).unwrap();
    let tags = github.tags().await.unwrap();

    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0], TagRecord { name: "v1.0.0".to_string(), commit_sha: "000".to_string() });
    assert_eq!(tags[2], TagRecord { name: "v1.1.0".to_string(), commit_sha: "aaa".to_string() });
}
