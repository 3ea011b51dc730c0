#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flow_engine::{Engine, EngineConfig};
use flowsmith_core_types::{
    Action, ActionRef, Block, Flow, FlowId, Inputs, NewAction, NewBlock, TaskStatus,
};
use flowsmith_doc_store::MemoryDocumentStore;
use parking_lot::Mutex;
use reasoning_oracle::{OracleError, ReasoningOracle};
use serde_json::{json, Value};
use task_runner::{PollPolicy, TaskHandle, TaskRequest, TaskRunner, TaskRunnerError, TaskSnapshot};

/// One poll answer: status, extracted information, failure reason.
pub type Tick = (TaskStatus, Option<Value>, Option<String>);

pub fn completes_with(extracted: Value) -> Vec<Tick> {
    vec![
        (TaskStatus::Queued, None, None),
        (TaskStatus::Running, None, None),
        (TaskStatus::Completed, Some(extracted), None),
    ]
}

pub fn fails_with(reason: &str) -> Vec<Tick> {
    vec![
        (TaskStatus::Running, None, None),
        (TaskStatus::Failed, None, Some(reason.to_string())),
    ]
}

pub fn never_finishes() -> Vec<Tick> {
    vec![(TaskStatus::Running, None, None)]
}

/// Task runner answering each dispatch with the next queued script.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<VecDeque<Vec<Tick>>>,
    tasks: Mutex<HashMap<String, VecDeque<Tick>>>,
    dispatched: Mutex<Vec<TaskRequest>>,
    counter: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(scripts: Vec<Vec<Tick>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        })
    }

    pub fn push(&self, script: Vec<Tick>) {
        self.scripts.lock().push_back(script);
    }

    pub fn dispatched(&self) -> Vec<TaskRequest> {
        self.dispatched.lock().clone()
    }
}

#[async_trait]
impl TaskRunner for ScriptedRunner {
    async fn dispatch(&self, request: &TaskRequest) -> Result<TaskHandle, TaskRunnerError> {
        let script = self
            .scripts
            .lock()
            .pop_front()
            .ok_or_else(|| TaskRunnerError::Backend {
                status: 500,
                body: "no script left".to_string(),
            })?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let task_id = format!("tsk_{n}");
        self.tasks.lock().insert(task_id.clone(), script.into());
        self.dispatched.lock().push(request.clone());
        Ok(TaskHandle::new(task_id))
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, TaskRunnerError> {
        let mut tasks = self.tasks.lock();
        let ticks = tasks
            .get_mut(handle.task_id.as_str())
            .ok_or_else(|| TaskRunnerError::invalid_response("unknown task"))?;
        let tick = if ticks.len() > 1 {
            ticks.pop_front()
        } else {
            ticks.front().cloned()
        };
        let (status, extracted, reason) =
            tick.ok_or_else(|| TaskRunnerError::invalid_response("empty script"))?;
        let mut snapshot = TaskSnapshot::new(handle.task_id.clone(), status).with_extracted(extracted);
        if let Some(reason) = reason {
            snapshot = snapshot.with_failure_reason(reason);
        }
        Ok(snapshot)
    }
}

pub type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Oracle whose replies may depend on the prompt they answer.
#[derive(Default)]
pub struct PromptOracle {
    steps: Mutex<VecDeque<Responder>>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl PromptOracle {
    pub fn new(steps: Vec<Responder>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl ReasoningOracle for PromptOracle {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError> {
        let index = {
            let mut prompts = self.prompts.lock();
            prompts.push((prompt.to_string(), max_tokens));
            prompts.len()
        };
        let step = self
            .steps
            .lock()
            .pop_front()
            .ok_or(OracleError::Exhausted(index))?;
        Ok(step(prompt))
    }
}

pub fn reply(value: Value) -> Responder {
    let text = value.to_string();
    Box::new(move |_| text.clone())
}

pub fn raw_reply(text: &str) -> Responder {
    let text = text.to_string();
    Box::new(move |_| text.clone())
}

/// Replies with every action id listed in the prompt, in listed order.
pub fn echo_ids() -> Responder {
    Box::new(|prompt| json!(ids_in(prompt)).to_string())
}

pub fn responder(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Responder {
    Box::new(f)
}

pub fn ids_in(prompt: &str) -> Vec<String> {
    const MARKER: &str = "\"id\": \"";
    let mut ids = Vec::new();
    let mut rest = prompt;
    while let Some(start) = rest.find(MARKER) {
        let tail = &rest[start + MARKER.len()..];
        let end = tail.find('"').unwrap_or(tail.len());
        ids.push(tail[..end].to_string());
        rest = &tail[end..];
    }
    ids
}

pub fn fast_poll() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(5), Duration::from_secs(60))
}

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<MemoryDocumentStore>,
    pub runner: Arc<ScriptedRunner>,
    pub oracle: Arc<PromptOracle>,
}

pub async fn harness(runner: Arc<ScriptedRunner>, oracle: Arc<PromptOracle>) -> Harness {
    harness_with(runner, oracle, EngineConfig {
        poll: fast_poll(),
        ..EngineConfig::default()
    })
    .await
}

pub async fn harness_with(
    runner: Arc<ScriptedRunner>,
    oracle: Arc<PromptOracle>,
    config: EngineConfig,
) -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    let engine = Engine::bootstrap(store.clone(), runner.clone(), oracle.clone(), config)
        .await
        .unwrap();
    Harness {
        engine,
        store,
        runner,
        oracle,
    }
}

impl Harness {
    pub async fn block(&self, name: &str, url: &str) -> Block {
        self.engine
            .blocks
            .store(NewBlock::website(name, url))
            .await
            .unwrap()
    }

    pub async fn action(
        &self,
        block: &Block,
        name: &str,
        required: &[&str],
        produces: &[&str],
    ) -> Action {
        self.engine
            .actions
            .store(NewAction {
                block_id: block.id.clone(),
                name: name.to_string(),
                navigation_goal: format!("{name} navigation"),
                data_extraction_goal: format!("{name} extraction"),
                required_inputs: required.iter().map(|s| s.to_string()).collect(),
                output_schema: produces
                    .iter()
                    .map(|s| (s.to_string(), format!("{s} value")))
                    .collect(),
                url: block.url.clone(),
            })
            .await
            .unwrap()
    }

    pub async fn flow(&self, actions: &[&Action]) -> Flow {
        self.engine
            .flows
            .create_flow(
                "test flow",
                "flow under test",
                actions.iter().map(|a| ActionRef::from(a.id.clone())).collect(),
            )
            .await
            .unwrap()
    }

    /// Flow of `n` input-free actions on one block.
    pub async fn simple_flow(&self, n: usize) -> (Flow, Vec<Action>) {
        let block = self.block("shop", "example.com").await;
        let mut actions = Vec::new();
        for i in 0..n {
            actions.push(self.action(&block, &format!("step{i}"), &[], &[]).await);
        }
        let refs: Vec<&Action> = actions.iter().collect();
        (self.flow(&refs).await, actions)
    }

    pub async fn latest(&self, flow_id: &FlowId) -> flowsmith_core_types::FlowExecution {
        self.engine
            .flows
            .latest_execution(flow_id)
            .await
            .unwrap()
            .expect("an execution was stored")
    }
}

pub fn inputs(value: Value) -> Inputs {
    match value {
        Value::Object(map) => map,
        other => panic!("inputs must be an object, got {other}"),
    }
}
