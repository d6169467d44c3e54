//! Test doubles for the wizard: scripted answers, a fake command runner
//! that simulates `crontab`/`systemctl`/`launchctl`, and a mock Telegram API.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use axum::{Router, http::StatusCode, routing::get};
use inquire::InquireError;
use inquire::error::InquireResult;

use super::command::{CommandOutput, CommandRunner, display_command};
use super::prompt::Prompter;

#[derive(Debug, Clone)]
pub enum Answer {
    Yes,
    No,
    Text(String),
    Choice(usize),
}

impl Answer {
    pub fn text(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

/// Replays answers in order and records every question it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.answers.is_empty()
    }

    fn next(&mut self, message: &str) -> InquireResult<Answer> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .ok_or(InquireError::OperationCanceled)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, _help: Option<&str>) -> InquireResult<bool> {
        match self.next(message)? {
            Answer::Yes => Ok(true),
            Answer::No => Ok(false),
            other => panic!("expected yes/no for {message:?}, scripted {other:?}"),
        }
    }

    fn text(&mut self, message: &str, _help: Option<&str>) -> InquireResult<String> {
        match self.next(message)? {
            Answer::Text(value) => Ok(value),
            other => panic!("expected text for {message:?}, scripted {other:?}"),
        }
    }

    fn secret(&mut self, message: &str) -> InquireResult<String> {
        self.text(message, None)
    }

    fn select(&mut self, message: &str, options: &[&str]) -> InquireResult<usize> {
        match self.next(message)? {
            Answer::Choice(index) => Ok(index),
            other => panic!("expected a choice among {options:?} for {message:?}, scripted {other:?}"),
        }
    }
}

/// In-memory stand-in for the OS tools.
///
/// `crontab -l` / `crontab -` operate on `crontab`; every other invocation
/// succeeds unless a canned response was registered for its command line.
/// A canned response for `crontab -` leaves the stored crontab untouched.
#[derive(Debug, Default)]
pub struct FakeCommands {
    pub crontab: RefCell<Option<String>>,
    pub calls: RefCell<Vec<String>>,
    responses: HashMap<String, CommandOutput>,
}

impl FakeCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crontab(self, contents: &str) -> Self {
        self.crontab.replace(Some(contents.to_string()));
        self
    }

    pub fn respond(mut self, command_line: &str, success: bool, output: &str) -> Self {
        self.responses.insert(
            command_line.to_string(),
            CommandOutput {
                success,
                stdout: String::new(),
                stderr: output.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn crontab_contents(&self) -> String {
        self.crontab.borrow().clone().unwrap_or_default()
    }
}

impl CommandRunner for FakeCommands {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls.borrow_mut().push(line.clone());

        if program == "crontab" && args == ["-l"] {
            return Ok(match self.crontab.borrow().as_ref() {
                Some(contents) => CommandOutput {
                    success: true,
                    stdout: contents.clone(),
                    stderr: String::new(),
                },
                None => CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "crontab: no crontab for tester".to_string(),
                },
            });
        }

        Ok(self.responses.get(&line).cloned().unwrap_or(CommandOutput {
            success: true,
            ..CommandOutput::default()
        }))
    }

    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> std::io::Result<CommandOutput> {
        let line = display_command(program, args);
        self.calls.borrow_mut().push(line.clone());
        if let Some(canned) = self.responses.get(&line) {
            return Ok(canned.clone());
        }
        if program == "crontab" && args == ["-"] {
            self.crontab.replace(Some(input.to_string()));
        }
        Ok(CommandOutput {
            success: true,
            ..CommandOutput::default()
        })
    }
}

/// Serve `GET /bot<token>/getUpdates` with a fixed status and body and
/// return the base URL.
pub async fn spawn_updates_server(status: u16, body: &'static str) -> String {
    let status = StatusCode::from_u16(status).unwrap();
    let app = Router::new().route(
        "/{bot}/getUpdates",
        get(move || async move {
            (
                status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body,
            )
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
