//! End-to-end runs of the agent loop against a scripted model

use adpilot_core::error::{AgentError, LlmError};
use adpilot_core::tools::{ParamKind, ParameterSpec, ToolArgs};
use adpilot_core::{
    advertising_registry, AbortReason, Agent, AgentConfig, ConversationTurn, LlmResponse,
    RunOutcome, ScriptedClient, Tool, ToolCall, ToolRegistry,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

fn registry() -> Arc<ToolRegistry> {
    Arc::new(advertising_registry().unwrap())
}

fn config() -> AgentConfig {
    AgentConfig {
        retry_backoff_ms: 1,
        ..Default::default()
    }
}

fn tool_results(transcript: &[ConversationTurn]) -> Vec<(String, String, bool)> {
    transcript
        .iter()
        .filter_map(|turn| match turn {
            ConversationTurn::ToolResult {
                tool_call_id,
                content,
                is_error,
                ..
            } => Some((tool_call_id.clone(), content.clone(), *is_error)),
            _ => None,
        })
        .collect()
}

/// Sleeps far longer than any timeout used in these tests
struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow_report"
    }

    fn description(&self) -> &str {
        "Takes forever."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn execute(&self, _args: ToolArgs) -> adpilot_core::Result<Value> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(json!("too late"))
    }
}

/// Waits until every sibling reaches the barrier
struct RendezvousTool {
    name: &'static str,
    barrier: Arc<Barrier>,
}

#[async_trait]
impl Tool for RendezvousTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Completes only when its siblings run at the same time."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn execute(&self, _args: ToolArgs) -> adpilot_core::Result<Value> {
        self.barrier.wait().await;
        Ok(json!({"tool": self.name}))
    }
}

/// Counts executions
struct CountingTool {
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        "count_clicks"
    }

    fn description(&self) -> &str {
        "Counts clicks for a campaign."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "campaign_id",
            ParamKind::String,
            "Campaign identifier",
        )]
    }

    async fn execute(&self, _args: ToolArgs) -> adpilot_core::Result<Value> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(json!(42))
    }
}

#[tokio::test]
async fn cpa_question_is_answered_from_campaign_metrics() {
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::with_id(
            "call_metrics",
            "get_campaign_metrics",
            json!({"date_range": "2024-05-01 to 2024-05-31"}),
        )]),
        LlmResponse::text(
            "Summer Sale 2024 (123) spent 850.0 for 120 conversions, a CPA of about 7.08.",
        ),
    ]));
    let agent = Agent::builder(client.clone(), registry())
        .with_agent_config(config())
        .build()
        .unwrap();

    let run = agent
        .run(
            "What happened to CPA last month?",
            &[],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.outcome, RunOutcome::Done);
    assert_eq!(run.iterations, 1);
    assert!(run.answer.contains("850.0"));
    assert!(run.answer.contains("120"));

    let results = tool_results(&run.transcript);
    assert_eq!(results.len(), 1);
    let (call_id, content, is_error) = &results[0];
    assert_eq!(call_id, "call_metrics");
    assert!(!is_error);
    assert!(content.contains("\"id\":\"123\""));
    assert!(content.contains("850.0"));

    // The second planning step saw the metrics
    let second_request = &client.requests()[1];
    assert!(matches!(
        second_request.last(),
        Some(ConversationTurn::ToolResult { tool_call_id, .. }) if tool_call_id == "call_metrics"
    ));
}

#[tokio::test]
async fn unknown_tool_is_reported_back_and_the_loop_continues() {
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::with_id(
            "call_unicorn",
            "get_unicorn_stats",
            json!({}),
        )]),
        LlmResponse::text("I don't have a tool for unicorn stats."),
    ]));
    let agent = Agent::builder(client.clone(), registry()).build().unwrap();

    let run = agent
        .run("Show unicorn stats", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(run.is_complete());
    assert_eq!(client.call_count(), 2);
    let results = tool_results(&run.transcript);
    assert_eq!(results[0].0, "call_unicorn");
    assert!(results[0].2);
    assert!(results[0].1.contains("unknown_tool"));
    assert!(results[0].1.contains("get_unicorn_stats"));
}

#[tokio::test]
async fn repeated_or_empty_call_ids_still_pair_one_to_one() {
    let args = json!({"ad_group_id": "9", "date_range": "2024-05-01 to 2024-05-31"});
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![
            ToolCall::with_id("dup", "get_keywords", args.clone()),
            ToolCall::with_id("dup", "get_ads", args.clone()),
            ToolCall::with_id("", "get_ads", args),
        ]),
        LlmResponse::text("done"),
    ]));
    let agent = Agent::builder(client, registry()).build().unwrap();

    let run = agent
        .run("Compare keywords and ads", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(run.is_complete());
    let requested: Vec<String> = run
        .transcript
        .iter()
        .flat_map(|turn| turn.tool_calls().iter().map(|c| c.id.clone()))
        .collect();
    let answered: Vec<String> = tool_results(&run.transcript)
        .into_iter()
        .map(|(id, _, _)| id)
        .collect();

    assert_eq!(requested.len(), 3);
    assert_eq!(requested, answered);
    assert_eq!(requested[0], "dup");
    assert!(requested.iter().all(|id| !id.is_empty()));
    let mut unique = requested.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn slow_tool_times_out_and_the_loop_moves_on() {
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(SlowTool))
            .unwrap()
            .build(),
    );
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::with_id("call_slow", "slow_report", json!({}))]),
        LlmResponse::text("The report service is not responding."),
    ]));
    let agent = Agent::builder(client, registry)
        .with_tool_timeout_ms(100)
        .build()
        .unwrap();

    let started = Instant::now();
    let run = agent
        .run("Build the slow report", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(run.is_complete());
    let results = tool_results(&run.transcript);
    assert!(results[0].2);
    assert!(results[0].1.contains("timeout"));
}

#[tokio::test]
async fn endless_tool_requests_stop_after_five_cycles() {
    let client = Arc::new(ScriptedClient::new(vec![]).repeating(LlmResponse::tool_calls(vec![
        ToolCall::with_id(
            "call_overview",
            "get_account_overview",
            json!({"date_range": "2024-05-01 to 2024-05-31"}),
        ),
    ])));
    let agent = Agent::builder(client.clone(), registry()).build().unwrap();

    let run = agent
        .run("Keep digging", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(client.call_count(), 5);
    assert_eq!(run.iterations, 5);
    assert_eq!(
        run.outcome,
        RunOutcome::Aborted(AbortReason::IterationLimitExceeded { max_iterations: 5 })
    );
    assert!(run.answer.contains("step limit of 5"));
    assert_eq!(tool_results(&run.transcript).len(), 5);
}

#[tokio::test]
async fn sibling_calls_run_together_and_join_before_planning() {
    let barrier = Arc::new(Barrier::new(2));
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(RendezvousTool {
                name: "left",
                barrier: barrier.clone(),
            }))
            .unwrap()
            .register(Arc::new(RendezvousTool {
                name: "right",
                barrier,
            }))
            .unwrap()
            .build(),
    );
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![
            ToolCall::with_id("call_left", "left", json!({})),
            ToolCall::with_id("call_right", "right", json!({})),
        ]),
        LlmResponse::text("Both done."),
    ]));
    let agent = Agent::builder(client.clone(), registry)
        .with_tool_timeout_ms(2_000)
        .build()
        .unwrap();

    let run = agent
        .run("Run both", &[], &CancellationToken::new())
        .await
        .unwrap();

    let results = tool_results(&run.transcript);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "call_left");
    assert_eq!(results[1].0, "call_right");
    assert!(results.iter().all(|(_, _, is_error)| !is_error));

    // Both results were in place before the next model call
    let second_request = &client.requests()[1];
    assert_eq!(tool_results(second_request).len(), 2);
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_tool() {
    let executions = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(CountingTool {
                executions: executions.clone(),
            }))
            .unwrap()
            .build(),
    );
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::tool_calls(vec![ToolCall::with_id(
            "call_count",
            "count_clicks",
            json!({"campaign_id": 123}),
        )]),
        LlmResponse::text("The campaign id was wrong."),
    ]));
    let agent = Agent::builder(client, registry).build().unwrap();

    let run = agent
        .run("Count clicks", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(executions.load(Ordering::SeqCst), 0);
    let results = tool_results(&run.transcript);
    assert!(results[0].2);
    assert!(results[0].1.contains("campaign_id"));
}

#[tokio::test]
async fn identical_inputs_give_identical_transcripts() {
    let script = || {
        Arc::new(ScriptedClient::new(vec![
            LlmResponse::tool_calls(vec![
                ToolCall::with_id("k", "get_keywords", json!({"ad_group_id": "9", "date_range": "2024-05-01 to 2024-05-31"})),
                ToolCall::with_id("a", "get_ads", json!({"ad_group_id": "9", "date_range": "2024-05-01 to 2024-05-31"})),
            ]),
            LlmResponse::text("Ad group 9 relies on broad match."),
        ]))
    };

    let first = Agent::builder(script(), registry())
        .build()
        .unwrap()
        .run("Audit ad group 9", &[], &CancellationToken::new())
        .await
        .unwrap();
    let second = Agent::builder(script(), registry())
        .build()
        .unwrap()
        .run("Audit ad group 9", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.transcript, second.transcript);
    assert_eq!(first.answer, second.answer);
}

#[tokio::test]
async fn one_malformed_response_is_retried() {
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::default(),
        LlmResponse::text("Recovered."),
    ]));
    let agent = Agent::builder(client.clone(), registry()).build().unwrap();

    let run = agent
        .run("hi", &[], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(run.answer, "Recovered.");
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn two_malformed_responses_abort_the_run() {
    let client = Arc::new(ScriptedClient::new(vec![]).repeating(LlmResponse::default()));
    let agent = Agent::builder(client.clone(), registry()).build().unwrap();

    let run = agent
        .run("hi", &[], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(run.outcome, RunOutcome::Aborted(AbortReason::MalformedResponse));
    assert_eq!(client.call_count(), 2);
    assert!(!run.answer.is_empty());
}

#[tokio::test]
async fn transient_model_failures_are_retried() {
    let client = Arc::new(ScriptedClient::with_results(vec![
        Err(LlmError::RateLimit),
        Err(LlmError::Network {
            message: "connection reset".to_string(),
        }),
        Ok(LlmResponse::text("Third time lucky.")),
    ]));
    let agent = Agent::builder(client.clone(), registry())
        .with_agent_config(config())
        .build()
        .unwrap();

    let run = agent
        .run("hi", &[], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(run.answer, "Third time lucky.");
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_model_unavailable() {
    let client = Arc::new(
        ScriptedClient::with_results(vec![]).repeating_error(LlmError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        }),
    );
    let agent = Agent::builder(client.clone(), registry())
        .with_agent_config(config())
        .build()
        .unwrap();

    let err = agent
        .run("hi", &[], &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        AgentError::ModelUnavailable { attempts, message } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected ModelUnavailable, got {:?}", other),
    }
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn cancellation_stops_a_pending_model_call() {
    let client = Arc::new(
        ScriptedClient::new(vec![LlmResponse::text("never seen")])
            .with_delay(Duration::from_secs(30)),
    );
    let agent = Agent::builder(client, registry()).build().unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = agent.run("hi", &[], &cancel).await.unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn run_deadline_produces_an_explanatory_answer() {
    let client = Arc::new(
        ScriptedClient::new(vec![LlmResponse::text("never seen")])
            .with_delay(Duration::from_secs(30)),
    );
    let agent = Agent::builder(client, registry())
        .with_agent_config(AgentConfig {
            request_timeout_ms: 100,
            ..Default::default()
        })
        .build()
        .unwrap();

    let run = agent
        .run("hi", &[], &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(run.outcome, RunOutcome::Aborted(AbortReason::RequestTimeout));
    assert!(run.answer.contains("took too long"));
}

#[tokio::test]
async fn run_deadline_keeps_results_of_calls_that_already_finished() {
    let executions = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(SlowTool))
            .unwrap()
            .register(Arc::new(CountingTool {
                executions: executions.clone(),
            }))
            .unwrap()
            .build(),
    );
    let client = Arc::new(ScriptedClient::new(vec![LlmResponse::tool_calls(vec![
        ToolCall::with_id("fast", "count_clicks", json!({"campaign_id": "123"})),
        ToolCall::with_id("slow", "slow_report", json!({})),
    ])]));
    let agent = Agent::builder(client, registry)
        .with_agent_config(AgentConfig {
            request_timeout_ms: 200,
            tool_timeout_ms: 10_000,
            ..config()
        })
        .build()
        .unwrap();

    let run = agent
        .run("Clicks and the slow report, please", &[], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.outcome, RunOutcome::Aborted(AbortReason::RequestTimeout));
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    let results = tool_results(&run.transcript);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "fast");
    assert!(!results[0].2);
    assert_eq!(results[0].1, "42");
    assert_eq!(results[1].0, "slow");
    assert!(results[1].2);
    assert!(results[1].1.contains("timeout"));
}

#[tokio::test]
async fn prior_history_is_carried_into_the_next_run() {
    let client = Arc::new(ScriptedClient::new(vec![
        LlmResponse::text("Campaign 123 had a CPA of 7.08."),
        LlmResponse::text("Campaign 456 did better at 3.76."),
    ]));
    let agent = Agent::builder(client.clone(), registry()).build().unwrap();
    let cancel = CancellationToken::new();

    let first = agent.run("CPA of 123?", &[], &cancel).await.unwrap();
    let second = agent
        .run("And 456?", &first.history(), &cancel)
        .await
        .unwrap();

    let request = &client.requests()[1];
    assert!(matches!(&request[0], ConversationTurn::System { .. }));
    assert_eq!(request[1], ConversationTurn::user("CPA of 123?"));
    assert_eq!(
        request.last(),
        Some(&ConversationTurn::user("And 456?"))
    );
    assert_eq!(
        request
            .iter()
            .filter(|t| matches!(t, ConversationTurn::System { .. }))
            .count(),
        1
    );
    assert_eq!(second.answer, "Campaign 456 did better at 3.76.");
}
