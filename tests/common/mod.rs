//! Common test utilities and helpers for gh-mirror tests
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use gh_mirror::{ToolStatus, Vcs};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "s3cr3t";

/// A version-control call observed by [`RecordingVcs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Clone { url: String, destination: PathBuf },
    Pull { working_dir: PathBuf },
}

/// In-memory `Vcs` that records calls and creates the clone destination
///
/// Clones share one call log, so a test can keep a handle after giving the
/// recorder to a `Syncer`.
#[derive(Default, Clone)]
pub struct RecordingVcs {
    calls: Arc<Mutex<Vec<VcsCall>>>,
}

impl RecordingVcs {
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Vcs for RecordingVcs {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<ToolStatus> {
        std::fs::create_dir_all(destination)?;
        self.calls.lock().unwrap().push(VcsCall::Clone {
            url: url.to_string(),
            destination: destination.to_path_buf(),
        });
        Ok(ToolStatus::from_code(Some(0)))
    }

    async fn pull(&self, working_dir: &Path) -> Result<ToolStatus> {
        self.calls.lock().unwrap().push(VcsCall::Pull {
            working_dir: working_dir.to_path_buf(),
        });
        Ok(ToolStatus::from_code(Some(0)))
    }
}

/// JSON body for one listing page, shaped like the GitHub API
pub fn repos_page(full_names: &[&str]) -> Value {
    Value::Array(
        full_names
            .iter()
            .map(|full_name| {
                json!({
                    "id": 1,
                    "name": full_name.rsplit('/').next(),
                    "full_name": full_name,
                    "private": false,
                    "clone_url": format!("https://github.com/{}.git", full_name),
                    "ssh_url": format!("git@github.com:{}.git", full_name),
                })
            })
            .collect(),
    )
}

/// Path of the n-th page (1-based) of a listing starting at `first_path`
pub fn page_path(first_path: &str, page: usize) -> String {
    if page == 1 {
        first_path.to_string()
    } else {
        format!("{}/page/{}", first_path, page)
    }
}

/// Serve `pages` in order, chained with `Link: rel="next"` headers
///
/// Each page must be requested exactly once with the test token.
pub async fn mount_pages(server: &MockServer, first_path: &str, pages: &[Vec<&str>]) {
    for (index, page) in pages.iter().enumerate() {
        let number = index + 1;
        let mut response = ResponseTemplate::new(200).set_body_json(repos_page(page));

        if number < pages.len() {
            let link = format!(
                "<{}{}>; rel=\"next\", <{}{}>; rel=\"last\"",
                server.uri(),
                page_path(first_path, number + 1),
                server.uri(),
                page_path(first_path, pages.len())
            );
            response = response.insert_header("Link", link.as_str());
        }

        Mock::given(method("GET"))
            .and(path(page_path(first_path, number)))
            .and(header("Authorization", format!("token {}", TOKEN).as_str()))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Serve a failing status for the given page path
pub async fn mount_failure(server: &MockServer, page_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string("{\"message\":\"Bad credentials\"}"))
        .mount(server)
        .await;
}

/// Write an executable stand-in for `git` that appends `<cwd>|<args>` to `log`
///
/// `clone` also creates its destination directory.
#[cfg(unix)]
pub fn fake_git(dir: &Path, log: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-git");
    let body = format!(
        "#!/bin/sh\n\
         echo \"$(pwd)|$*\" >> '{}'\n\
         if [ \"$1\" = \"clone\" ]; then mkdir -p \"$3\"; fi\n\
         exit 0\n",
        log.display()
    );
    std::fs::write(&script, body).expect("Failed to write fake git");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake git executable");
    script
}

/// Lines written by [`fake_git`], empty if it never ran
pub fn git_log_lines(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Assert that `text` contains every item
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
