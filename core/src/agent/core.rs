//! Agent implementation: the planning/executing loop

use super::config::{AgentBuilder, AgentConfig};
use super::execution::{AbortReason, AgentRun, RunOutcome};
use super::prompt::{build_system_prompt, incomplete_answer};
use super::session::{AgentSession, LoopState};
use crate::error::{AgentError, Error, LlmError};
use crate::llm::{ChatOptions, ConversationTurn, LlmClient, LlmResponse, PlanningOutcome};
use crate::output::{AgentEvent, AgentOutput};
use crate::tools::{ToolCall, ToolInvoker, ToolRegistry, ToolResult};
use crate::trajectory::{TrajectoryEntry, TrajectoryRecorder};
use futures::future::join_all;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an await inside the loop did not complete
enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

/// Result of one planning step
enum PlanStep {
    Outcome(LlmResponse, PlanningOutcome),
    Malformed,
    DeadlineExceeded,
}

/// Tool-calling agent.
///
/// Holds only shared, immutable pieces; every call to [`Agent::run`] owns its
/// own [`AgentSession`], so one agent can serve concurrent runs.
pub struct Agent {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    invoker: ToolInvoker,
    chat_options: ChatOptions,
    output: Arc<dyn AgentOutput>,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl Agent {
    pub(crate) fn new(
        llm_client: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
        chat_options: ChatOptions,
        output: Arc<dyn AgentOutput>,
        trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
    ) -> Self {
        let invoker = ToolInvoker::new(registry.clone(), config.tool_timeout());
        Self {
            config,
            llm_client,
            registry,
            invoker,
            chat_options,
            output,
            trajectory_recorder,
        }
    }

    /// Start building an agent around a client and a tool registry
    pub fn builder(llm_client: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> AgentBuilder {
        AgentBuilder::new(llm_client, registry)
    }

    /// Get agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }


    /// Answer one user message.
    ///
    /// `prior_history` is the conversation so far (as returned by
    /// [`AgentRun::history`]); system turns in it are replaced by the current
    /// system prompt. Running out of iterations, a run deadline or repeated
    /// malformed model output still produce an answer; only an unavailable
    /// model, a rejected model request or cancellation are errors.
    pub async fn run(
        &self,
        user_message: &str,
        prior_history: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<AgentRun, AgentError> {
        let result = self.run_loop(user_message, prior_history, cancel).await;

        if let Err(e) = &result {
            tracing::error!("Agent run failed: {}", e);
            self.record(TrajectoryEntry::error(
                e.to_string(),
                Some("agent run".to_string()),
                0,
            ))
            .await;
        }

        result
    }

    async fn run_loop(
        &self,
        user_message: &str,
        prior_history: &[ConversationTurn],
        cancel: &CancellationToken,
    ) -> Result<AgentRun, AgentError> {
        let start_time = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.request_timeout();

        let system_prompt =
            build_system_prompt(self.config.system_prompt.as_deref(), &self.registry.names());
        let mut session = AgentSession::new(
            system_prompt,
            prior_history,
            user_message,
            self.config.max_iterations,
        );

        self.emit(AgentEvent::ExecutionStarted {
            user_message: user_message.to_string(),
            max_iterations: self.config.max_iterations,
        })
        .await;
        self.record(TrajectoryEntry::task_start(
            user_message.to_string(),
            serde_json::to_value(&self.config).unwrap_or_default(),
        ))
        .await;

        let (answer, outcome) = loop {
            match session.state().clone() {
                LoopState::Planning => {
                    let iteration = session.iterations() + 1;
                    tracing::debug!(iteration, "planning step");
                    self.emit(AgentEvent::PlanningStarted { iteration }).await;

                    match self.plan(&session, cancel, deadline).await? {
                        PlanStep::Outcome(response, outcome) => {
                            session.apply_planning(&response, outcome);
                            self.output
                                .emit_token_update(session.token_usage().clone())
                                .await
                                .unwrap_or_else(|e| {
                                    tracing::debug!("Failed to emit token update event: {}", e)
                                });
                        }
                        PlanStep::Malformed => session.abort(AbortReason::MalformedResponse),
                        PlanStep::DeadlineExceeded => session.abort(AbortReason::RequestTimeout),
                    }
                }
                LoopState::Executing(calls) => {
                    let iteration = session.iterations() + 1;
                    tracing::debug!(iteration, calls = calls.len(), "executing tool calls");

                    let slots = Mutex::new(vec![None; calls.len()]);
                    let batch = guarded(cancel, deadline, self.execute_calls(&calls, iteration, &slots)).await;
                    let finished = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());

                    match batch {
                        Ok(()) => {
                            let results = fill_unfinished(finished, &calls, self.config.request_timeout_ms);
                            session.complete_cycle(&results);
                            self.record(TrajectoryEntry::step_complete(
                                format!("Iteration {} ran {} tool call(s)", iteration, calls.len()),
                                iteration,
                            ))
                            .await;
                        }
                        Err(Interrupt::Cancelled) => return Err(AgentError::Cancelled),
                        Err(Interrupt::DeadlineExceeded) => {
                            tracing::warn!(iteration, "run deadline passed while tools were running");
                            let results = fill_unfinished(finished, &calls, self.config.request_timeout_ms);
                            session.interrupt_cycle(&results, AbortReason::RequestTimeout);
                        }
                    }
                }
                LoopState::Done(answer) => break (answer, RunOutcome::Done),
                LoopState::Aborted(reason) => {
                    tracing::warn!("Run aborted: {}", reason.describe());
                    let answer = incomplete_answer(&reason.describe(), session.last_assistant_text());
                    session.push_incomplete_answer(&answer);
                    break (answer, RunOutcome::Aborted(reason));
                }
            }
        };

        let iterations = session.iterations();
        let duration_ms = start_time.elapsed().as_millis() as u64;

        self.record(TrajectoryEntry::task_complete(
            outcome == RunOutcome::Done,
            answer.clone(),
            iterations,
            duration_ms,
        ))
        .await;
        self.emit(AgentEvent::ExecutionCompleted {
            outcome: outcome.clone(),
            iterations,
        })
        .await;

        Ok(AgentRun {
            answer,
            iterations,
            outcome,
            duration_ms,
            token_usage: session.token_usage().clone(),
            transcript: session.into_transcript(),
        })
    }

    /// One planning step: ask the model, retrying once if the answer is unusable
    async fn plan(
        &self,
        session: &AgentSession,
        cancel: &CancellationToken,
        deadline: tokio::time::Instant,
    ) -> Result<PlanStep, AgentError> {
        let iteration = session.iterations() + 1;
        let mut malformed = 0;

        loop {
            let response = match self
                .request_with_retry(session.conversation(), iteration, cancel, deadline)
                .await?
            {
                Some(response) => response,
                None => return Ok(PlanStep::DeadlineExceeded),
            };

            match response.planning_outcome() {
                Some(outcome) => return Ok(PlanStep::Outcome(response, outcome)),
                None => {
                    malformed += 1;
                    tracing::warn!(iteration, malformed, "model returned an empty or malformed response");
                    if malformed > 1 {
                        return Ok(PlanStep::Malformed);
                    }
                }
            }
        }
    }

    /// Call the model, retrying transient failures with exponential backoff.
    ///
    /// Returns `None` when the run deadline passes first.
    async fn request_with_retry(
        &self,
        conversation: &[ConversationTurn],
        iteration: u32,
        cancel: &CancellationToken,
        deadline: tokio::time::Instant,
    ) -> Result<Option<LlmResponse>, AgentError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.record(TrajectoryEntry::llm_request(
                conversation.to_vec(),
                self.llm_client.model_name().to_string(),
                self.llm_client.provider_name().to_string(),
                iteration,
            ))
            .await;

            let request = self.llm_client.chat_completion(
                conversation,
                self.registry.list(),
                Some(self.chat_options.clone()),
            );
            let result = match guarded(cancel, deadline, request).await {
                Ok(result) => result,
                Err(Interrupt::Cancelled) => return Err(AgentError::Cancelled),
                Err(Interrupt::DeadlineExceeded) => return Ok(None),
            };

            let error = match result {
                Ok(response) => {
                    self.record(TrajectoryEntry::llm_response(&response, iteration))
                        .await;
                    return Ok(Some(response));
                }
                Err(Error::Llm(e)) => e,
                Err(other) => LlmError::InvalidRequest {
                    message: other.to_string(),
                },
            };

            if !error.is_transient() {
                return Err(AgentError::Llm(error));
            }
            if attempt > self.config.model_retry_count {
                return Err(AgentError::ModelUnavailable {
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            let delay = self.config.retry_delay(attempt);
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "transient model failure, retrying: {}",
                error
            );
            self.emit(AgentEvent::ModelRetry {
                attempt,
                error: error.to_string(),
            })
            .await;

            match guarded(cancel, deadline, tokio::time::sleep(delay)).await {
                Ok(()) => {}
                Err(Interrupt::Cancelled) => return Err(AgentError::Cancelled),
                Err(Interrupt::DeadlineExceeded) => return Ok(None),
            }
        }
    }

    /// Run every requested call, storing each result in its request-order slot
    /// as soon as it finishes
    async fn execute_calls(
        &self,
        calls: &[ToolCall],
        iteration: u32,
        slots: &Mutex<Vec<Option<ToolResult>>>,
    ) {
        if self.config.parallel_tool_calls {
            join_all(
                calls
                    .iter()
                    .enumerate()
                    .map(|(index, call)| self.execute_into_slot(index, call, iteration, slots)),
            )
            .await;
        } else {
            for (index, call) in calls.iter().enumerate() {
                self.execute_into_slot(index, call, iteration, slots).await;
            }
        }
    }

    async fn execute_into_slot(
        &self,
        index: usize,
        call: &ToolCall,
        iteration: u32,
        slots: &Mutex<Vec<Option<ToolResult>>>,
    ) {
        let result = self.execute_call(call, iteration).await;
        if let Ok(mut slots) = slots.lock() {
            slots[index] = Some(result);
        }
    }

    async fn execute_call(&self, call: &ToolCall, iteration: u32) -> ToolResult {
        self.emit(AgentEvent::ToolExecutionStarted { call: call.clone() })
            .await;
        self.record(TrajectoryEntry::tool_call(call.clone(), iteration))
            .await;

        let result = self.invoker.invoke(call).await;
        match result.error() {
            Some(e) => tracing::warn!(tool = %call.name, call_id = %call.id, "tool call failed: {}", e),
            None => tracing::debug!(tool = %call.name, call_id = %call.id, duration_ms = ?result.duration_ms, "tool call succeeded"),
        }

        self.record(TrajectoryEntry::tool_result(result.clone(), iteration))
            .await;
        self.emit(AgentEvent::ToolExecutionCompleted {
            result: result.clone(),
        })
        .await;

        result
    }

    async fn emit(&self, event: AgentEvent) {
        self.output
            .emit_event(event)
            .await
            .unwrap_or_else(|e| tracing::debug!("Failed to emit agent event: {}", e));
    }

    async fn record(&self, entry: TrajectoryEntry) {
        if let Some(recorder) = &self.trajectory_recorder {
            recorder.record_quietly(entry).await;
        }
    }
}

/// Await `fut` unless the run is cancelled or its deadline passes first
async fn guarded<F: Future>(
    cancel: &CancellationToken,
    deadline: tokio::time::Instant,
    fut: F,
) -> Result<F::Output, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        result = tokio::time::timeout_at(deadline, fut) => {
            result.map_err(|_| Interrupt::DeadlineExceeded)
        }
    }
}

/// Results in request order; calls cut off by the run deadline get a timeout
/// failure, so every call keeps exactly one reply
fn fill_unfinished(
    finished: Vec<Option<ToolResult>>,
    calls: &[ToolCall],
    request_timeout_ms: u64,
) -> Vec<ToolResult> {
    finished
        .into_iter()
        .zip(calls)
        .map(|(result, call)| {
            result.unwrap_or_else(|| {
                ToolResult::failure(
                    call,
                    crate::error::ToolError::Timeout {
                        name: call.name.clone(),
                        timeout_ms: request_timeout_ms,
                    },
                )
            })
        })
        .collect()
}

/// Run one message through a freshly built agent with no output handler
pub async fn run_agent(
    llm_client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    user_message: &str,
    prior_history: &[ConversationTurn],
    config: AgentConfig,
) -> crate::error::Result<AgentRun> {
    let agent = AgentBuilder::new(llm_client, registry)
        .with_agent_config(config)
        .build()?;
    Ok(agent
        .run(user_message, prior_history, &CancellationToken::new())
        .await?)
}
