//! Query pipeline

use std::future::{self, Future};
use std::sync::Arc;

use thiserror::Error;

use crate::agent::{Agent, AgentError, AgentOptions, AgentOutcome};
use crate::config::{AppConfig, DEFAULT_INSTRUCTION_PROMPT};
use crate::logging::Logger;
use crate::{log_error, log_warn};
use crate::mcp::{Connector, Session, SessionError};
use crate::providers::{Provider, ProviderModelConfig};
use crate::registry::{Registry, ServerRecord};
use crate::router::Router;
use crate::tools::ToolAction;

/// Errors raised after a session is open
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// How a single query ended
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Answered {
        server: String,
        answer: String,
        turns: usize,
    },
    /// The router matched no registered server
    NoRoute,
    /// The selected server could not be connected to or initialized
    Unreachable { server: String, reason: String },
    /// Anything else: model failure, catalog failure, turn limit...
    Failed {
        server: Option<String>,
        reason: String,
    },
    /// The caller cancelled; any session opened for the query was closed
    Interrupted { server: Option<String> },
}

impl QueryOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, QueryOutcome::Answered { .. })
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            QueryOutcome::Answered { answer, .. } => Some(answer),
            _ => None,
        }
    }
}

/// Progress notifications emitted while a query runs
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Routing,
    Routed { server: String, url: String },
    Ready {
        server: String,
        tools: Vec<String>,
        used_fallback: bool,
    },
}

type Observer = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Runs queries end to end against a loaded registry
pub struct QueryPipeline {
    registry: Registry,
    router: Router,
    connector: Arc<dyn Connector>,
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    agent_options: AgentOptions,
    instruction_prompt: String,
    observer: Option<Observer>,
    logger: Arc<dyn Logger>,
}

impl QueryPipeline {
    pub fn new(
        registry: Registry,
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        connector: Arc<dyn Connector>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let router = Router::new(Arc::clone(&provider), model.clone(), Arc::clone(&logger));
        Self {
            registry,
            router,
            connector,
            provider,
            model,
            agent_options: AgentOptions::default(),
            instruction_prompt: DEFAULT_INSTRUCTION_PROMPT.to_string(),
            observer: None,
            logger,
        }
    }

    /// Pipeline with temperature, turn limit and prompt name taken from `config`
    pub fn from_config(
        config: &AppConfig,
        registry: Registry,
        provider: Arc<dyn Provider>,
        connector: Arc<dyn Connector>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let mut model = ProviderModelConfig::new(config.model.clone());
        if let Some(base) = &config.api_base {
            model = model.with_api_base(base.clone());
        }

        let mut pipeline = Self::new(registry, provider, model, connector, logger)
            .with_agent_options(AgentOptions {
                max_turns: config.max_turns,
                temperature: config.temperature,
            })
            .with_instruction_prompt(config.instruction_prompt.clone());
        pipeline.router = Router::new(
            Arc::clone(&pipeline.provider),
            pipeline.model.clone(),
            Arc::clone(&pipeline.logger),
        )
        .with_temperature(config.temperature);
        pipeline
    }

    pub fn with_agent_options(mut self, options: AgentOptions) -> Self {
        self.agent_options = options;
        self
    }

    pub fn with_instruction_prompt(mut self, name: impl Into<String>) -> Self {
        self.instruction_prompt = name.into();
        self
    }

    /// Receive a `PipelineEvent` at each step
    pub fn with_observer(mut self, observer: impl Fn(&PipelineEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }

    /// Answer one query; never fails, every error becomes an outcome
    pub async fn run(&self, query: &str) -> QueryOutcome {
        self.run_until(query, future::pending::<()>()).await
    }

    /// `run`, stopping with `Interrupted` once `cancel` resolves
    ///
    /// A session already open is closed before this returns.
    pub async fn run_until<C>(&self, query: &str, cancel: C) -> QueryOutcome
    where
        C: Future<Output = ()>,
    {
        let mut cancel = std::pin::pin!(cancel);
        self.emit(PipelineEvent::Routing);
        let routed = tokio::select! {
            biased;
            _ = &mut cancel => return QueryOutcome::Interrupted { server: None },
            routed = self.router.route(&self.registry, query) => routed,
        };
        let server = match routed {
            Ok(Some(server)) => server,
            Ok(None) => return QueryOutcome::NoRoute,
            Err(e) => {
                log_error!(self.logger, "[Pipeline] routing via {} failed: {}", e.provider(), e);
                return QueryOutcome::Failed {
                    server: None,
                    reason: e.to_string(),
                };
            }
        };
        self.emit(PipelineEvent::Routed {
            server: server.name.clone(),
            url: server.url.clone(),
        });

        let result = Session::scoped_until(
            self.connector.as_ref(),
            &server.url,
            Arc::clone(&self.logger),
            cancel,
            |session| self.serve(session, &server, query),
        )
        .await;

        match result {
            Ok(Ok(outcome)) => QueryOutcome::Answered {
                server: server.name,
                answer: outcome.answer,
                turns: outcome.turns,
            },
            Ok(Err(e)) => {
                log_error!(self.logger, "[Pipeline] query on '{}' failed: {}", server.name, e);
                QueryOutcome::Failed {
                    server: Some(server.name),
                    reason: e.to_string(),
                }
            }
            Err(SessionError::Interrupted { .. }) => {
                log_warn!(self.logger, "[Pipeline] query on '{}' interrupted", server.name);
                QueryOutcome::Interrupted {
                    server: Some(server.name),
                }
            }
            Err(e) if e.is_unreachable() => {
                log_warn!(self.logger, "[Pipeline] '{}' is unreachable: {}", server.name, e);
                QueryOutcome::Unreachable {
                    server: server.name,
                    reason: e.to_string(),
                }
            }
            Err(e) => QueryOutcome::Failed {
                server: Some(server.name),
                reason: e.to_string(),
            },
        }
    }

    async fn serve(
        &self,
        session: Arc<Session>,
        server: &ServerRecord,
        query: &str,
    ) -> Result<AgentOutcome, QueryError> {
        let catalog = session.fetch_catalog(&self.instruction_prompt).await?;
        self.emit(PipelineEvent::Ready {
            server: server.name.clone(),
            tools: catalog.tool_names().into_iter().map(String::from).collect(),
            used_fallback: catalog.used_fallback,
        });

        let tools = ToolAction::adapt_all(catalog.tools, &session);
        let agent = Agent::new(
            Arc::clone(&self.provider),
            self.model.clone(),
            catalog.instruction,
            tools,
            Arc::clone(&self.logger),
        )
        .with_options(self.agent_options.clone());

        Ok(agent.run(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockConnector, MockEndpoint, FALLBACK_INSTRUCTION};
    use crate::providers::{MockProvider, ModelTurn};
    use crate::types::{ChatMessage, ToolCall};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> Registry {
        Registry::from_records(vec![
            ServerRecord::new("Math", "mock://math", "Arithmetic: add, subtract, multiply, divide"),
            ServerRecord::new("Weather", "mock://weather", "Forecasts"),
        ])
    }

    fn pipeline(provider: Arc<MockProvider>, connector: Arc<MockConnector>) -> QueryPipeline {
        QueryPipeline::new(
            registry(),
            provider,
            ProviderModelConfig::new("mock/test"),
            connector,
            Arc::new(NoOpLogger),
        )
    }

    fn add_then_answer() -> Vec<ModelTurn> {
        vec![
            ModelTurn::text("Math"),
            ModelTurn::calls(vec![ToolCall::new("c1", "add", json!({"a": 2, "b": 3}))]),
            ModelTurn::text("2 + 3 = 5"),
        ]
    }

    #[tokio::test]
    async fn test_answered_query_closes_session() {
        let provider = Arc::new(MockProvider::scripted(add_then_answer(), Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let outcome = pipeline(Arc::clone(&provider), Arc::clone(&connector))
            .with_observer(move |event| sink.lock().push(event.clone()))
            .run("What is 2 + 3?")
            .await;

        assert_eq!(
            outcome,
            QueryOutcome::Answered {
                server: "Math".to_string(),
                answer: "2 + 3 = 5".to_string(),
                turns: 2,
            }
        );
        assert_eq!(connector.stats().connects(), 1);
        assert_eq!(connector.stats().releases(), 1);
        assert_eq!(provider.request_count(), 3);

        let events = events.lock();
        assert_eq!(events[0], PipelineEvent::Routing);
        assert!(matches!(&events[1], PipelineEvent::Routed { server, .. } if server == "Math"));
        assert!(matches!(
            &events[2],
            PipelineEvent::Ready { tools, used_fallback: false, .. } if tools.len() == 4
        ));
    }

    #[tokio::test]
    async fn test_no_route_never_connects() {
        let provider = Arc::new(MockProvider::fixed("None", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));

        let outcome = pipeline(provider, Arc::clone(&connector)).run("Translate hello").await;

        assert_eq!(outcome, QueryOutcome::NoRoute);
        assert_eq!(connector.stats().connects(), 0);
    }

    #[tokio::test]
    async fn test_router_failure_is_reported() {
        let provider = Arc::new(MockProvider::error("bad key", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));

        let outcome = pipeline(provider, connector).run("2 + 2").await;
        assert!(matches!(outcome, QueryOutcome::Failed { server: None, .. }));
    }

    #[tokio::test]
    async fn test_connection_failure_is_unreachable() {
        let provider = Arc::new(MockProvider::fixed("Math", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math().fail_connect()));

        let outcome = pipeline(provider, Arc::clone(&connector)).run("2 + 2").await;
        assert!(matches!(outcome, QueryOutcome::Unreachable { ref server, .. } if server == "Math"));
        assert_eq!(connector.stats().releases(), 0);
    }

    #[tokio::test]
    async fn test_handshake_failure_is_unreachable_and_released() {
        let provider = Arc::new(MockProvider::fixed("Math", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math().fail_handshake()));

        let outcome = pipeline(provider, Arc::clone(&connector)).run("2 + 2").await;
        assert!(matches!(outcome, QueryOutcome::Unreachable { .. }));
        assert_eq!(connector.stats().releases(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_failed_and_released() {
        let provider = Arc::new(MockProvider::fixed("Math", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math().fail_list_tools()));

        let outcome = pipeline(provider, Arc::clone(&connector)).run("2 + 2").await;
        assert!(matches!(outcome, QueryOutcome::Failed { server: Some(_), .. }));
        assert_eq!(connector.stats().releases(), 1);
    }

    #[tokio::test]
    async fn test_turn_limit_is_failed_and_released() {
        let mut turns = vec![ModelTurn::text("Math")];
        turns.extend((0..3).map(|i| {
            ModelTurn::calls(vec![ToolCall::new(format!("c{i}"), "add", json!({"a": 1, "b": 1}))])
        }));
        let provider = Arc::new(MockProvider::scripted(turns, Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));

        let outcome = pipeline(provider, Arc::clone(&connector))
            .with_agent_options(AgentOptions {
                max_turns: 2,
                temperature: 0.0,
            })
            .run("keep adding")
            .await;

        match outcome {
            QueryOutcome::Failed { reason, .. } => assert!(reason.contains("Turn limit of 2")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(connector.stats().releases(), 1);
    }

    #[tokio::test]
    async fn test_missing_instruction_uses_fallback() {
        let provider = Arc::new(MockProvider::scripted(
            vec![ModelTurn::text("Math"), ModelTurn::text("4")],
            Arc::new(NoOpLogger),
        ));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math().without_instruction()));

        let outcome = pipeline(Arc::clone(&provider), connector).run("2 + 2").await;
        assert_eq!(outcome.answer(), Some("4"));

        let agent_request = &provider.requests()[1];
        assert_eq!(
            agent_request.messages[0],
            ChatMessage::system(FALLBACK_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn test_each_query_gets_its_own_session() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::text("Math"),
                ModelTurn::text("first"),
                ModelTurn::text("Math"),
                ModelTurn::text("second"),
            ],
            Arc::new(NoOpLogger),
        ));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));
        let pipeline = pipeline(provider, Arc::clone(&connector));

        assert_eq!(pipeline.run("one").await.answer(), Some("first"));
        assert_eq!(pipeline.run("two").await.answer(), Some("second"));
        assert_eq!(connector.stats().connects(), 2);
        assert_eq!(connector.stats().releases(), 2);
    }

    #[tokio::test]
    async fn test_from_config_applies_limits() {
        let config = AppConfig {
            max_turns: 1,
            temperature: 0.3,
            instruction_prompt: "custom_prompt".to_string(),
            ..AppConfig::default()
        };
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::text("Math"),
                ModelTurn::calls(vec![ToolCall::new("c1", "add", json!({"a": 1, "b": 1}))]),
            ],
            Arc::new(NoOpLogger),
        ));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));

        let pipeline = QueryPipeline::from_config(
            &config,
            registry(),
            Arc::clone(&provider) as Arc<dyn Provider>,
            Arc::clone(&connector) as Arc<dyn Connector>,
            Arc::new(NoOpLogger),
        );
        let outcome = pipeline.run("1 + 1").await;

        match outcome {
            QueryOutcome::Failed { reason, .. } => assert!(reason.contains("Turn limit of 1")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(connector.stats().prompts(), vec!["custom_prompt"]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|request| request.options.temperature == Some(0.3)));
    }

    #[tokio::test]
    async fn test_interrupt_mid_query_closes_session() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ModelTurn::text("Math"),
                ModelTurn::calls(vec![ToolCall::new("c1", "add", json!({"a": 1, "b": 1}))]),
                ModelTurn::text("never reached"),
            ],
            Arc::new(NoOpLogger),
        ));
        let connector = Arc::new(MockConnector::new(
            MockEndpoint::math().with_call_delay(Duration::from_secs(5)),
        ));

        let outcome = pipeline(Arc::clone(&provider), Arc::clone(&connector))
            .run_until("1 + 1", tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(
            outcome,
            QueryOutcome::Interrupted {
                server: Some("Math".to_string())
            }
        );
        assert_eq!(connector.stats().calls().len(), 1);
        assert_eq!(connector.stats().releases(), 1);
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_interrupt_while_routing_never_connects() {
        let provider = Arc::new(MockProvider::fixed("Math", Arc::new(NoOpLogger)));
        let connector = Arc::new(MockConnector::new(MockEndpoint::math()));

        let outcome = pipeline(provider, Arc::clone(&connector))
            .run_until("1 + 1", future::ready(()))
            .await;

        assert_eq!(outcome, QueryOutcome::Interrupted { server: None });
        assert_eq!(connector.stats().connects(), 0);
    }
}
