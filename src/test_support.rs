use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::git::{CommandResult, CommandRunner, GitError};
use crate::pr::{JsonFetcher, PrError};
use crate::repo::RepositoryRef;
use crate::workflow::NamePrompt;

pub fn repository() -> RepositoryRef {
    RepositoryRef {
        owner: "octo".to_string(),
        name: "widgets".to_string(),
    }
}

/// Single-PR API body with an intact source fork.
pub fn pull_json(number: u64, title: &str) -> Value {
    json!({
        "number": number,
        "title": title,
        "head": {
            "ref": "feature/login",
            "repo": {
                "full_name": "alice/widgets",
                "clone_url": "https://github.com/alice/widgets.git"
            }
        },
        "base": { "ref": "main" }
    })
}

/// Simulates the subset of git the tool uses: remotes, branches and pull.
#[derive(Debug, Default)]
pub struct FakeGit {
    state: Mutex<FakeGitState>,
}

#[derive(Debug, Default)]
struct FakeGitState {
    remotes: Vec<(String, String)>,
    branches: Vec<String>,
    current_branch: Option<String>,
    scripted: VecDeque<CommandResult>,
    commands: Vec<String>,
}

fn ok(lines: Vec<String>) -> CommandResult {
    CommandResult::new(Some(0), lines)
}

fn failed(code: i32, line: String) -> CommandResult {
    CommandResult::new(Some(code), vec![line])
}

impl FakeGit {
    pub fn with_remotes(remotes: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().remotes = remotes
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect();
        fake
    }

    pub fn with_branch(self, name: &str) -> Self {
        self.state.lock().unwrap().branches.push(name.to_string());
        self
    }

    /// Queue a canned result returned by the next command, whatever it is.
    pub fn script_next(&self, result: CommandResult) {
        self.state.lock().unwrap().scripted.push_back(result);
    }

    /// Every command run so far, without the program name.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn remote_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.remotes.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn remote_url(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .remotes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, url)| url.clone())
    }

    pub fn branches(&self) -> Vec<String> {
        self.state.lock().unwrap().branches.clone()
    }

    pub fn current_branch(&self) -> Option<String> {
        self.state.lock().unwrap().current_branch.clone()
    }
}

impl CommandRunner for FakeGit {
    fn describe(&self, args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    fn run(&self, args: &[&str]) -> Result<CommandResult, GitError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(args.join(" "));

        if let Some(result) = state.scripted.pop_front() {
            return Ok(result);
        }

        let result = match args {
            ["remote"] => ok(state.remotes.iter().map(|(n, _)| n.clone()).collect()),
            ["remote", "get-url", name] => match position(&state.remotes, name) {
                Some(i) => ok(vec![state.remotes[i].1.clone()]),
                None => failed(2, format!("error: No such remote '{name}'")),
            },
            ["remote", "add", name, url] => match position(&state.remotes, name) {
                Some(_) => failed(3, format!("error: remote {name} already exists.")),
                None => {
                    state.remotes.push((name.to_string(), url.to_string()));
                    ok(vec![])
                }
            },
            ["remote", "set-url", name, url] => match position(&state.remotes, name) {
                Some(i) => {
                    state.remotes[i].1 = url.to_string();
                    ok(vec![])
                }
                None => failed(2, format!("error: No such remote '{name}'")),
            },
            ["remote", "remove", name] => match position(&state.remotes, name) {
                Some(i) => {
                    state.remotes.remove(i);
                    ok(vec![])
                }
                None => failed(2, format!("error: No such remote: '{name}'")),
            },
            ["checkout", "-b", branch, _base] => {
                if state.branches.iter().any(|b| b == branch) {
                    failed(128, format!("fatal: a branch named '{branch}' already exists"))
                } else {
                    state.branches.push(branch.to_string());
                    state.current_branch = Some(branch.to_string());
                    ok(vec![format!("Switched to a new branch '{branch}'")])
                }
            }
            ["pull", ..] => ok(vec![
                "Updating 1a2b3c4..5d6e7f8".to_string(),
                "Fast-forward".to_string(),
            ]),
            _ => failed(1, format!("git: '{}' is not a git command", args.join(" "))),
        };

        Ok(result)
    }
}

fn position(remotes: &[(String, String)], name: &str) -> Option<usize> {
    remotes.iter().position(|(n, _)| n == name)
}

/// Canned response for one URL.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Json(Value),
    NotFound,
    Status(u16),
}

/// Serves canned JSON by exact URL and records every request.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    responses: HashMap<String, FakeResponse>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, response: FakeResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JsonFetcher for FakeFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, PrError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(FakeResponse::Json(value)) => Ok(value.clone()),
            Some(FakeResponse::Status(status)) => Err(PrError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(FakeResponse::NotFound) | None => Err(PrError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

/// Answers every name prompt with the same canned line.
#[derive(Debug, Default)]
pub struct CannedPrompt {
    answer: String,
    pub asked: Vec<String>,
}

impl CannedPrompt {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            asked: Vec::new(),
        }
    }
}

impl NamePrompt for CannedPrompt {
    fn ask(&mut self, suggestion: &str) -> std::io::Result<String> {
        self.asked.push(suggestion.to_string());
        Ok(self.answer.clone())
    }
}
