//! Scripted `ChatModel` for exercising the interview flow without a network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm_client::{ChatError, ChatModel, ChatSession};

enum Step {
    Reply(String),
    Transient,
    Api,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    /// "start" and "send:<text>" in call order.
    events: Vec<String>,
    unavailable: bool,
}

/// Replies from a queue; falls back to a generic question when the queue is empty.
#[derive(Clone, Default)]
pub(crate) struct ScriptedModel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(self, step: Step) -> Self {
        self.script.lock().unwrap().steps.push_back(step);
        self
    }

    pub(crate) fn reply(self, text: &str) -> Self {
        self.push(Step::Reply(text.to_string()))
    }

    pub(crate) fn fail_transient(self) -> Self {
        self.push(Step::Transient)
    }

    pub(crate) fn fail_api(self) -> Self {
        self.push(Step::Api)
    }

    pub(crate) fn unavailable(self) -> Self {
        self.script.lock().unwrap().unavailable = true;
        self
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.script.lock().unwrap().events.clone()
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("send:").map(String::from))
            .collect()
    }

    pub(crate) fn starts(&self) -> usize {
        self.events().iter().filter(|e| *e == "start").count()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn start(&self) -> Result<Box<dyn ChatSession>, ChatError> {
        let mut script = self.script.lock().unwrap();
        if script.unavailable {
            return Err(ChatError::ModelUnavailable("no credential".to_string()));
        }
        script.events.push("start".to_string());
        Ok(Box::new(ScriptedChat {
            script: self.script.clone(),
            turns: 0,
        }))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedChat {
    script: Arc<Mutex<Script>>,
    turns: usize,
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let step = {
            let mut script = self.script.lock().unwrap();
            script.events.push(format!("send:{text}"));
            script.steps.pop_front()
        };

        match step {
            Some(Step::Reply(reply)) => {
                self.turns += 1;
                Ok(reply)
            }
            None => {
                self.turns += 1;
                Ok("Can you tell me more?".to_string())
            }
            Some(Step::Transient) => Err(ChatError::Transient {
                status: Some(429),
                message: "rate limited".to_string(),
            }),
            Some(Step::Api) => Err(ChatError::Api {
                status: Some(400),
                message: "invalid request".to_string(),
            }),
        }
    }

    fn turn_count(&self) -> usize {
        self.turns
    }
}
