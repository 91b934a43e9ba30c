//! Todoist adapter
//!
//! Projects come from the REST API, completed tasks from the sync API's
//! `completed/get_all` endpoint. Both authenticate with the personal API
//! token as a bearer token.

use daylog_core::{Config, DateRange, Project, SyncError, TaskRecord, TaskSource};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{self, bearer, map_error, parse_json, read_body};

pub const PROJECTS_URL: &str = "https://api.todoist.com/rest/v2/projects";
pub const COMPLETED_URL: &str = "https://api.todoist.com/sync/v9/completed/get_all";

/// Completed tasks returned per request. Only the first page is read.
pub const PAGE_LIMIT: usize = 100;

// ── Wire types ─────────────────────────────────────────────────

/// Todoist ids are strings in the REST API and were integers in older
/// sync responses
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectWire {
    id: WireId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CompletedWire {
    #[serde(default)]
    items: Vec<CompletedItemWire>,
}

#[derive(Debug, Deserialize)]
struct CompletedItemWire {
    #[serde(default)]
    content: String,
}

/// Parse the project list response
pub fn parse_projects(body: &str) -> Result<Vec<Project>, SyncError> {
    let projects: Vec<ProjectWire> = parse_json(body)?;
    Ok(projects
        .into_iter()
        .map(|p| Project::new(p.id.into_string(), p.name))
        .collect())
}

/// Parse a `completed/get_all` response; a missing `items` key means no tasks
pub fn parse_completed(body: &str) -> Result<Vec<TaskRecord>, SyncError> {
    let completed: CompletedWire = parse_json(body)?;
    Ok(completed
        .items
        .into_iter()
        .map(|item| TaskRecord::new(item.content))
        .collect())
}

/// Query parameters for one day's completed tasks
pub fn completed_query(range: &DateRange, project_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("since", range.since_param()),
        ("until", range.until_param()),
        ("limit", PAGE_LIMIT.to_string()),
        ("project_id", project_id.to_string()),
    ]
}

// ── Client ─────────────────────────────────────────────────────

/// Blocking Todoist client holding one agent for the whole run
pub struct TodoistClient {
    agent: ureq::Agent,
    token: String,
}

impl TodoistClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            agent: http::agent(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.todoist_api_token.clone())
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, SyncError> {
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", &bearer(&self.token));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(map_error)?;
        read_body(response)
    }
}

impl TaskSource for TodoistClient {
    fn list_projects(&self) -> Result<Vec<Project>, SyncError> {
        debug!(url = PROJECTS_URL, "listing projects");
        let body = self.get(PROJECTS_URL, &[])?;
        parse_projects(&body)
    }

    fn completed_tasks(
        &self,
        range: &DateRange,
        project_id: &str,
    ) -> Result<Vec<TaskRecord>, SyncError> {
        debug!(
            since = %range.since_param(),
            until = %range.until_param(),
            project_id,
            "fetching completed tasks"
        );
        let body = self.get(COMPLETED_URL, &completed_query(range, project_id))?;
        let tasks = parse_completed(&body)?;
        if tasks.len() >= PAGE_LIMIT {
            warn!(
                date = %range.date(),
                limit = PAGE_LIMIT,
                "page limit reached, later completions for this day are not included"
            );
        }
        Ok(tasks)
    }
}
