//! Bounded tool-use loop

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::conversation::Conversation;
use super::error::{AgentError, AgentResult};
use crate::config::DEFAULT_MAX_TURNS;
use crate::logging::Logger;
use crate::providers::{ChatOptions, Provider, ProviderModelConfig};
use crate::tools::ToolHandler;
use crate::types::{ToolCall, ToolResult};

/// Phase of an agent run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Waiting on the model
    Thinking,
    /// Executing the tool calls of the last turn, one at a time
    Dispatching,
    /// Final answer produced
    Done,
    /// Turn limit hit
    Aborted,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Thinking => write!(f, "thinking"),
            AgentState::Dispatching => write!(f, "dispatching"),
            AgentState::Done => write!(f, "done"),
            AgentState::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Maximum model calls per run
    pub max_turns: usize,
    pub temperature: f32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            temperature: 0.0,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    /// Every state entered, starting with `Thinking`
    pub transitions: Vec<AgentState>,
    /// Model calls made
    pub turns: usize,
    pub conversation: Conversation,
}

/// Drives one query to a final answer with a fixed tool set
pub struct Agent {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    instruction: String,
    tools: Vec<Arc<dyn ToolHandler>>,
    options: AgentOptions,
    logger: Arc<dyn Logger>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        instruction: impl Into<String>,
        tools: Vec<Arc<dyn ToolHandler>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            instruction: instruction.into(),
            tools,
            options: AgentOptions::default(),
            logger,
        }
    }

    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    fn chat_options(&self) -> ChatOptions {
        ChatOptions::new()
            .with_temperature(self.options.temperature)
            .with_tools(self.tools.iter().map(|t| t.metadata().to_tool()).collect())
            .with_parallel_tool_calls(false)
    }

    /// Run `query` until the model answers without requesting tools
    pub async fn run(&self, query: &str) -> AgentResult<AgentOutcome> {
        let handlers: HashMap<&str, &Arc<dyn ToolHandler>> =
            self.tools.iter().map(|t| (t.name(), t)).collect();
        let options = self.chat_options();
        let mut conversation = Conversation::new(self.instruction.clone(), query);
        let mut transitions = vec![AgentState::Thinking];

        for turn_number in 1..=self.options.max_turns {
            self.logger.debug(&format!(
                "[Agent] turn {}/{}",
                turn_number, self.options.max_turns
            ));
            let turn = self
                .provider
                .chat(
                    conversation.request_messages()?,
                    self.model.clone(),
                    options.clone(),
                )
                .await?;

            if !turn.has_tool_calls() {
                if turn.content.trim().is_empty() {
                    return Err(AgentError::EmptyResponse);
                }
                let answer = turn.content.clone();
                conversation.push_turn(turn)?;
                transitions.push(AgentState::Done);
                self.logger
                    .info(&format!("[Agent] answered after {} turn(s)", turn_number));
                return Ok(AgentOutcome {
                    answer,
                    transitions,
                    turns: turn_number,
                    conversation,
                });
            }

            let calls = turn.tool_calls.clone();
            conversation.push_turn(turn)?;
            transitions.push(AgentState::Dispatching);

            // Strictly sequential, even when one turn requests several calls
            for call in &calls {
                let result = self.dispatch(&handlers, call).await;
                conversation.push_tool_result(result)?;
            }
            transitions.push(AgentState::Thinking);
        }

        transitions.push(AgentState::Aborted);
        self.logger.warn(&format!(
            "[Agent] {} after {} turns without a final answer",
            AgentState::Aborted,
            self.options.max_turns
        ));
        Err(AgentError::TurnLimitExceeded {
            max_turns: self.options.max_turns,
        })
    }

    /// Execute one call; every failure becomes an error result for the model
    async fn dispatch(
        &self,
        handlers: &HashMap<&str, &Arc<dyn ToolHandler>>,
        call: &ToolCall,
    ) -> ToolResult {
        let Some(handler) = handlers.get(call.name.as_str()) else {
            self.logger
                .warn(&format!("[Agent] model requested unknown tool '{}'", call.name));
            return call.respond(Err(format!("unknown tool '{}'", call.name)));
        };

        self.logger.info(&format!(
            "[Agent] calling {} with {}",
            call.name, call.input
        ));
        let outcome = handler.call(&call.input).await;
        if let Err(e) = &outcome {
            self.logger
                .warn(&format!("[Agent] tool '{}' failed: {}", call.name, e));
        }
        call.respond(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockConnector, MockEndpoint, Session};
    use crate::providers::{MockProvider, ModelTurn};
    use crate::tools::{LocalTool, ToolAction};
    use crate::types::ChatMessage;
    use serde_json::json;
    use std::time::Duration;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn agent(provider: Arc<MockProvider>, tools: Vec<Arc<dyn ToolHandler>>) -> Agent {
        Agent::new(
            provider,
            ProviderModelConfig::new("mock/agent"),
            "Use the tools.",
            tools,
            logger(),
        )
    }

    fn call(id: &str, name: &str, input: serde_json::Value) -> ToolCall {
        ToolCall::new(id, name, input)
    }

    #[tokio::test]
    async fn test_scripted_run_walks_the_state_machine() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::calls(vec![call("c1", "multiply", json!({"a": 6, "b": 7}))]),
                ModelTurn::text("The answer is 42."),
            ],
            logger(),
        ));
        let outcome = agent(Arc::clone(&provider), LocalTool::all())
            .run("What is 6 times 7?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "The answer is 42.");
        assert_eq!(outcome.turns, 2);
        assert_eq!(
            outcome.transitions,
            vec![
                AgentState::Thinking,
                AgentState::Dispatching,
                AgentState::Thinking,
                AgentState::Done
            ]
        );

        let second = &provider.requests()[1];
        assert!(matches!(
            second.messages.last(),
            Some(ChatMessage::Tool(result)) if result.call_id == "c1" && result.content == "42.0"
        ));
        assert_eq!(second.options.tools.len(), 4);
        assert!(!second.options.parallel_tool_calls);
        assert_eq!(second.options.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_direct_answer_skips_dispatch() {
        let provider = Arc::new(MockProvider::fixed("Hello!", logger()));
        let outcome = agent(provider, Vec::new()).run("hi").await.unwrap();

        assert_eq!(outcome.transitions, vec![AgentState::Thinking, AgentState::Done]);
        assert_eq!(outcome.conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_tool_errors_are_reported_to_the_model() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::calls(vec![
                    call("c1", "divide", json!({"a": 1, "b": 0})),
                    call("c2", "sqrt", json!({"x": 4})),
                    call("c3", "add", json!({"a": "one"})),
                ]),
                ModelTurn::text("I could not compute that."),
            ],
            logger(),
        ));
        let outcome = agent(Arc::clone(&provider), LocalTool::all())
            .run("1/0, sqrt 4, one + ?")
            .await
            .unwrap();

        let results: Vec<ToolResult> = outcome
            .conversation
            .messages()
            .iter()
            .filter_map(|m| match m {
                ChatMessage::Tool(result) => Some(result.clone()),
                _ => None,
            })
            .collect();
        let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert!(results.iter().all(|r| r.is_error && r.content.starts_with("Error: ")));
        assert!(results[0].content.contains("Cannot divide by zero"));
        assert!(results[1].content.contains("unknown tool 'sqrt'"));
        assert!(results[2].content.contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_turn_limit_aborts() {
        let looping: Vec<ModelTurn> = (0..5)
            .map(|i| {
                ModelTurn::calls(vec![call(&format!("c{i}"), "add", json!({"a": 1, "b": 1}))])
            })
            .collect();
        let provider = Arc::new(MockProvider::scripted(looping, logger()));
        let result = agent(Arc::clone(&provider), LocalTool::all())
            .with_options(AgentOptions {
                max_turns: 3,
                temperature: 0.0,
            })
            .run("loop forever")
            .await;

        assert!(matches!(
            result,
            Err(AgentError::TurnLimitExceeded { max_turns: 3 })
        ));
        assert_eq!(provider.request_count(), 3);
        assert_eq!(provider.remaining_turns(), 2);
    }

    #[tokio::test]
    async fn test_empty_turn_is_an_error() {
        let provider = Arc::new(MockProvider::scripted(vec![ModelTurn::text("  ")], logger()));
        let result = agent(provider, Vec::new()).run("anything").await;
        assert!(matches!(result, Err(AgentError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(MockProvider::error("quota exceeded", logger()));
        let result = agent(provider, Vec::new()).run("anything").await;
        assert!(matches!(result, Err(AgentError::Provider(_))));
    }

    #[tokio::test]
    async fn test_multi_call_turn_dispatches_sequentially() {
        let connector = MockConnector::new(
            MockEndpoint::math().with_call_delay(Duration::from_millis(20)),
        );
        let session = Arc::new(
            Session::open(&connector, "mock://math", logger())
                .await
                .unwrap(),
        );
        let catalog = session.fetch_catalog("instructions").await.unwrap();
        let tools = ToolAction::adapt_all(catalog.tools, &session);

        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::calls(vec![
                    call("c1", "add", json!({"a": 1, "b": 2})),
                    call("c2", "multiply", json!({"a": 3, "b": 4})),
                    call("c3", "subtract", json!({"a": 9, "b": 5})),
                ]),
                ModelTurn::text("done"),
            ],
            logger(),
        ));
        agent(provider, tools).run("three things").await.unwrap();
        session.close().await.unwrap();

        let names: Vec<String> = connector.stats().calls().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["add", "multiply", "subtract"]);
        assert_eq!(connector.stats().max_in_flight(), 1);
    }
}
