//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::alerts::{Alert, AlertChannel};
use crate::command::{CommandOutput, CommandRunner};
use crate::error::MonitorError;

/// Records every alert it is asked to deliver.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<Alert>>>,
    fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that records and then reports a delivery failure.
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.title).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        self.sent.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(MonitorError::AlertDelivery("recording channel down".to_string()));
        }
        Ok(())
    }
}

type Reply = Result<CommandOutput, MonitorError>;

/// Replays canned command results keyed by the full command line.
///
/// Each key holds a queue; the last reply for a key is repeated once the
/// queue would otherwise run dry.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(program: &str, args: &[String]) -> String {
        std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Queue a reply for the command line `line` (program and args joined by spaces).
    pub fn push(&self, line: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(line.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn push_output(&self, line: &str, output: CommandOutput) {
        self.push(line, Ok(output));
    }

    /// Queue a reply for any command starting with `prefix`.
    pub fn push_prefix(&self, prefix: &str, reply: Reply) {
        self.push(&format!("{prefix}*"), reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn clone_reply(reply: &Reply) -> Reply {
    match reply {
        Ok(output) => Ok(output.clone()),
        Err(MonitorError::Command { program, source }) => Err(MonitorError::Command {
            program: program.clone(),
            source: std::io::Error::new(source.kind(), source.to_string()),
        }),
        Err(e) => Err(MonitorError::probe("scripted", e.to_string())),
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, MonitorError> {
        let line = Self::key(program, args);
        self.calls.lock().unwrap().push(line.clone());

        let mut replies = self.replies.lock().unwrap();
        let key = if replies.contains_key(&line) {
            line.clone()
        } else {
            replies
                .keys()
                .find(|k| k.ends_with('*') && line.starts_with(k.trim_end_matches('*')))
                .cloned()
                .ok_or_else(|| MonitorError::Command {
                    program: program.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("no scripted reply for `{line}`"),
                    ),
                })?
        };

        let queue = replies.get_mut(&key).expect("key present");
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            clone_reply(queue.front().expect("non-empty queue"))
        }
    }
}
