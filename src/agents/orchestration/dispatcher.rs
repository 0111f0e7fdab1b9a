//! Supervisor/worker state machine

use std::collections::HashMap;
use std::sync::Arc;

use crate::agents::config::{DispatchConfig, DispatchMode};
use crate::agents::core::Worker;
use crate::agents::domain::{ConversationState, Message, Route, WorkerKind};
use crate::agents::error::{AgentError, DispatchError};

use super::Supervisor;

/// Position of the dispatcher in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Supervisor,
    Worker(WorkerKind),
    Terminal,
}

/// Edge taken out of the supervisor node
pub fn after_supervisor(route: Route) -> Node {
    match route {
        Route::Worker(kind) => Node::Worker(kind),
        Route::Finish => Node::Terminal,
    }
}

/// Edge taken out of a worker node, given how many workers have run so far
pub fn after_worker(config: &DispatchConfig, steps: u32) -> Node {
    match config.mode {
        DispatchMode::OneShot => Node::Terminal,
        DispatchMode::Bounded if steps < config.max_steps => Node::Supervisor,
        DispatchMode::Bounded => Node::Terminal,
    }
}

/// Result of one dispatch run
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub state: ConversationState,
    /// Every label the supervisor produced, in order
    pub trace: Vec<Route>,
    /// Last worker reply, `None` when the supervisor finished immediately
    pub reply: Option<Message>,
}

/// Runs one conversation through the supervisor and the workers
pub struct Dispatcher {
    supervisor: Supervisor,
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(supervisor: Supervisor, config: DispatchConfig) -> Self {
        Self {
            supervisor,
            workers: HashMap::new(),
            config,
        }
    }

    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        self.workers.insert(worker.kind(), worker);
    }

    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.register(worker);
        self
    }

    pub fn workers(&self) -> impl Iterator<Item = WorkerKind> + '_ {
        self.workers.keys().copied()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Drive `state` from the supervisor to a terminal node.
    ///
    /// The supervisor writes `state.next` once per turn. A worker reply is
    /// appended to the messages and its auxiliary fields merged; in one-shot
    /// mode the run ends after the first worker.
    pub async fn run(&self, mut state: ConversationState) -> Result<DispatchOutcome, DispatchError> {
        if state.messages.is_empty() {
            return Err(DispatchError::EmptyConversation);
        }

        let mut trace = Vec::new();
        let mut reply = None;
        let mut steps = 0u32;
        let mut node = Node::Supervisor;

        loop {
            node = match node {
                Node::Supervisor => {
                    let decision = self.supervisor.decide(&state.messages).await?;
                    tracing::info!(
                        request_id = %state.request_id,
                        next = %decision.next,
                        "routing decision"
                    );
                    state.next = Some(decision.next);
                    trace.push(decision.next);
                    after_supervisor(decision.next)
                }
                Node::Worker(kind) => {
                    let worker = self
                        .workers
                        .get(&kind)
                        .ok_or_else(|| AgentError::NotFound(kind.as_str().to_string()))?;

                    let output = match tokio::time::timeout(worker.timeout(), worker.run(&state)).await {
                        Ok(result) => result,
                        Err(_) => Err(AgentError::Timeout(worker.timeout().as_secs())),
                    }
                    .map_err(|e| {
                        tracing::warn!(request_id = %state.request_id, worker = %kind, "worker failed: {}", e);
                        DispatchError::from(e)
                    })?;

                    steps += 1;
                    state.messages.push(output.message.clone());
                    state.apply(output.update);
                    reply = Some(output.message);
                    after_worker(&self.config, steps)
                }
                Node::Terminal => break,
            };
        }

        tracing::info!(
            request_id = %state.request_id,
            steps,
            route = ?trace.last().map(Route::as_str),
            "dispatch finished"
        );

        Ok(DispatchOutcome { state, trace, reply })
    }
}
