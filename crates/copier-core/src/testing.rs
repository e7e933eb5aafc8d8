//! Scripted command runner for unit tests

use crate::error::{Error, Result};
use crate::runtime::command::{CancelToken, CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&CommandSpec) -> Option<Result<CommandOutput>> + Send + Sync>;

/// Records every invocation and answers from a list of responders
///
/// Responders are tried in registration order; the first one returning
/// `Some` wins. Unmatched commands succeed with empty output.
#[derive(Clone, Default)]
pub(crate) struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    responders: Arc<Mutex<Vec<Responder>>>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose arguments contain all of `needles`
    pub(crate) fn respond(&self, needles: &[&str], output: CommandOutput) -> &Self {
        let needles: Vec<String> = needles.iter().map(|s| s.to_string()).collect();
        self.respond_with(move |spec| {
            needles
                .iter()
                .all(|n| spec.args.contains(n))
                .then(|| Ok(output.clone()))
        })
    }

    /// Fail commands whose arguments contain all of `needles` with a timeout
    pub(crate) fn time_out(&self, needles: &[&str]) -> &Self {
        let needles: Vec<String> = needles.iter().map(|s| s.to_string()).collect();
        self.respond_with(move |spec| {
            needles.iter().all(|n| spec.args.contains(n)).then(|| {
                Err(Error::Timeout {
                    command: spec.display(),
                    secs: spec.timeout.as_secs(),
                })
            })
        })
    }

    pub(crate) fn respond_with<F>(&self, f: F) -> &Self
    where
        F: Fn(&CommandSpec) -> Option<Result<CommandOutput>> + Send + Sync + 'static,
    {
        self.responders.lock().unwrap().push(Box::new(f));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_with(&self, arg: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.args.iter().any(|a| a == arg))
            .count()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.calls.lock().unwrap().push(spec.clone());
        let responders = self.responders.lock().unwrap();
        for responder in responders.iter() {
            if let Some(result) = responder(spec) {
                return result;
            }
        }
        Ok(CommandOutput {
            code: Some(0),
            ..Default::default()
        })
    }
}

pub(crate) fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub(crate) fn failed(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
