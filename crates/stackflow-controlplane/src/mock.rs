//! Recording executor for tests
//!
//! Enabled with the `test-utils` feature. Every call is recorded; apply
//! outputs, the plan and failures are scripted up front.

use async_trait::async_trait;
use serde_json::Value;
use stackflow_core::{
    Executor, ExecutorRequest, ExecutorSession, Plan, Result, StackError, State,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Executor operation, for scripting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Connect,
    Apply,
    Plan,
    Destroy,
}

/// A recorded executor call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Connect(String),
    Apply(ExecutorRequest),
    Plan(ExecutorRequest),
    Destroy(ExecutorRequest),
}

impl MockCall {
    pub fn op(&self) -> MockOp {
        match self {
            MockCall::Connect(_) => MockOp::Connect,
            MockCall::Apply(_) => MockOp::Apply,
            MockCall::Plan(_) => MockOp::Plan,
            MockCall::Destroy(_) => MockOp::Destroy,
        }
    }

    pub fn request(&self) -> Option<&ExecutorRequest> {
        match self {
            MockCall::Connect(_) => None,
            MockCall::Apply(req) | MockCall::Plan(req) | MockCall::Destroy(req) => Some(req),
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<MockCall>,
    outputs: BTreeMap<String, Value>,
    plan: Plan,
    failures: BTreeMap<String, (MockOp, String)>,
    releases: usize,
}

/// In-process [`Executor`] that records what the lifecycle asks of it
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    recorder: Arc<Mutex<Recorder>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root outputs returned by every Apply.
    pub fn with_outputs<K, V>(self, outputs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.lock().outputs = outputs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Plan returned by every Plan call.
    pub fn with_plan(self, plan: Plan) -> Self {
        self.lock().plan = plan;
        self
    }

    /// Fail `op` with an execution error carrying `message`.
    pub fn fail_on(self, op: MockOp, message: impl Into<String>) -> Self {
        self.fail_for(op, "", message)
    }

    /// Fail `op` only for requests whose content id is `content_id`.
    pub fn fail_for(self, op: MockOp, content_id: &str, message: impl Into<String>) -> Self {
        self.lock()
            .failures
            .insert(format!("{:?}:{}", op, content_id), (op, message.into()));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Calls made against an open session, connects excluded.
    pub fn remote_calls(&self) -> Vec<MockCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op() != MockOp::Connect)
            .cloned()
            .collect()
    }

    pub fn count(&self, op: MockOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Number of sessions that were closed.
    pub fn releases(&self) -> usize {
        self.lock().releases
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall) -> Result<()> {
        let mut recorder = self.lock();
        let op = call.op();
        let content_id = call.request().map(|r| r.content_id.clone()).unwrap_or_default();
        recorder.calls.push(call);

        let failure = recorder
            .failures
            .get(&format!("{:?}:{}", op, content_id))
            .or_else(|| recorder.failures.get(&format!("{:?}:", op)));

        match failure {
            Some((MockOp::Connect, message)) => Err(StackError::Connection(message.clone())),
            Some((_, message)) => Err(StackError::Execution(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn ExecutorSession>> {
        self.record(MockCall::Connect(endpoint.to_string()))?;
        Ok(Box::new(MockSession {
            executor: self.clone(),
            closed: false,
        }))
    }
}

struct MockSession {
    executor: MockExecutor,
    closed: bool,
}

#[async_trait]
impl ExecutorSession for MockSession {
    async fn apply(&mut self, req: &ExecutorRequest) -> Result<State> {
        self.executor.record(MockCall::Apply(req.clone()))?;
        Ok(State::with_outputs(self.executor.lock().outputs.clone()))
    }

    async fn plan(&mut self, req: &ExecutorRequest) -> Result<Plan> {
        self.executor.record(MockCall::Plan(req.clone()))?;
        Ok(self.executor.lock().plan.clone())
    }

    async fn destroy(&mut self, req: &ExecutorRequest) -> Result<()> {
        self.executor.record(MockCall::Destroy(req.clone()))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.executor.lock().releases += 1;
        }
    }
}
