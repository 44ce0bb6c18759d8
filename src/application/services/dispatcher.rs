use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::RunEventSink;
use crate::application::services::{SimilaritySearchService, SqlTranslationService};
use crate::domain::entities::{RetrievalRequest, RetrievalRoute, RouteState};

pub const SQL_SEARCH_TOOL: &str = "sql_search";
pub const VECTOR_SEARCH_TOOL: &str = "vector_search";

#[derive(Debug)]
pub enum ToolError {
    Execution(String),
    UnsupportedRequest(&'static str),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Execution(msg) => write!(f, "Tool execution error: {}", msg),
            ToolError::UnsupportedRequest(tool) => {
                write!(f, "Request variant not supported by tool '{}'", tool)
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// A retrieval strategy the dispatcher can hand a routed question to. The
/// description is the natural-language contract an agent layer would expose
/// to the model; the return value is always a UTF-8 JSON string.
#[async_trait]
pub trait RetrievalTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn invoke(&self, request: &RetrievalRequest) -> Result<String, ToolError>;
}

pub struct SqlSearchTool {
    service: Arc<SqlTranslationService>,
}

impl SqlSearchTool {
    pub fn new(service: Arc<SqlTranslationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RetrievalTool for SqlSearchTool {
    fn name(&self) -> &'static str {
        SQL_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Converts the user's question into a SQL query over the invoices table, executes it \
         and returns the matching rows as JSON. Use for keyword, categorical, date-range and \
         aggregate questions."
    }

    async fn invoke(&self, request: &RetrievalRequest) -> Result<String, ToolError> {
        match request {
            RetrievalRequest::SqlQuery { question } => self
                .service
                .answer(question)
                .await
                .map_err(|e| ToolError::Execution(e.to_string())),
            RetrievalRequest::VectorQuery { .. } => {
                Err(ToolError::UnsupportedRequest(SQL_SEARCH_TOOL))
            }
        }
    }
}

pub struct VectorSearchTool {
    service: Arc<SimilaritySearchService>,
}

impl VectorSearchTool {
    pub fn new(service: Arc<SimilaritySearchService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RetrievalTool for VectorSearchTool {
    fn name(&self) -> &'static str {
        VECTOR_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Finds invoices semantically similar to the question via embedding distance and \
         reports how many invoices fall under the distance threshold. Use for \
         similar-to-an-example, conceptual project-type and abstract business questions."
    }

    async fn invoke(&self, request: &RetrievalRequest) -> Result<String, ToolError> {
        match request {
            RetrievalRequest::VectorQuery {
                question,
                max_distance,
                limit,
            } => Ok(self.service.search(question, *max_distance, *limit).await),
            RetrievalRequest::SqlQuery { .. } => {
                Err(ToolError::UnsupportedRequest(VECTOR_SEARCH_TOOL))
            }
        }
    }
}

/// Per-question strategy selection. Pluggable so a model-backed classifier
/// can replace the rule set without touching the dispatcher.
pub trait QueryRouter: Send + Sync {
    fn route(&self, question: &str) -> RetrievalRoute;
}

/// Deterministic routing rubric. SQL is the default for keyword, categorical,
/// date-range and aggregate questions; the vector path is taken only on
/// explicit similarity phrasing or conceptual/abstract framing that no
/// discrete column captures. Ambiguity is resolved silently in favor of SQL.
pub struct RuleBasedRouter;

const SIMILARITY_CUES: &[&str] = &[
    "similar to",
    "similar invoices",
    "like invoice",
    "like this one",
    "look like",
    "looks like",
    "looking like",
    "resemble",
    "comparable to",
    "along the lines of",
    "reminiscent of",
    "related to",
];

const CONCEPT_CUES: &[&str] = &[
    "project",
    "initiative",
    "strategy",
    "strategic",
    "concept",
    "theme",
];

impl QueryRouter for RuleBasedRouter {
    fn route(&self, question: &str) -> RetrievalRoute {
        let normalized = question.to_lowercase();

        let has_cue = |cues: &[&str]| cues.iter().any(|cue| normalized.contains(cue));

        if has_cue(SIMILARITY_CUES) || has_cue(CONCEPT_CUES) {
            RetrievalRoute::Vector
        } else {
            RetrievalRoute::Sql
        }
    }
}

/// Static name-to-implementation table, built once at container construction.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn RetrievalTool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn RetrievalTool>>) -> Self {
        let tools = tools.into_iter().map(|tool| (tool.name(), tool)).collect();
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RetrievalTool>> {
        self.tools.get(name).cloned()
    }

    pub fn descriptions(&self) -> Vec<(&'static str, &'static str)> {
        let mut listing: Vec<_> = self
            .tools
            .values()
            .map(|tool| (tool.name(), tool.description()))
            .collect();
        listing.sort_by_key(|(name, _)| *name);
        listing
    }
}

pub fn tool_name_for(route: RetrievalRoute) -> &'static str {
    match route {
        RetrievalRoute::Sql => SQL_SEARCH_TOOL,
        RetrievalRoute::Vector => VECTOR_SEARCH_TOOL,
    }
}

/// Terminal result of one dispatched question.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub request_id: Uuid,
    pub route: RetrievalRoute,
    pub state: RouteState,
    pub payload: Option<String>,
    pub error: Option<String>,
}

/// One-shot dispatch: Unrouted -> RoutedSql|RoutedVector -> Answered|Failed.
/// Exactly one tool runs per question; a tool's own `{"error": ...}` payload
/// still answers the question, a hard tool error fails it. No re-routing.
pub struct AgentDispatcher {
    router: Arc<dyn QueryRouter>,
    registry: ToolRegistry,
    event_sink: Arc<dyn RunEventSink>,
}

impl AgentDispatcher {
    pub fn new(
        router: Arc<dyn QueryRouter>,
        registry: ToolRegistry,
        event_sink: Arc<dyn RunEventSink>,
    ) -> Self {
        Self {
            router,
            registry,
            event_sink,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, question: &str) -> DispatchOutcome {
        let request_id = Uuid::new_v4();

        let route = self.router.route(question);
        debug!(%request_id, state = ?RouteState::routed(route), user_query = question, "question routed");

        let tool_name = tool_name_for(route);
        let Some(tool) = self.registry.get(tool_name) else {
            let message = format!("tool '{}' is not registered", tool_name);
            self.event_sink.on_error(request_id, tool_name, &message);
            return DispatchOutcome {
                request_id,
                route,
                state: RouteState::Failed,
                payload: None,
                error: Some(message),
            };
        };

        let request = RetrievalRequest::for_route(route, question.to_string(), None, None);

        match tool.invoke(&request).await {
            Ok(payload) => {
                self.event_sink.on_result(request_id, tool_name, &payload);
                DispatchOutcome {
                    request_id,
                    route,
                    state: RouteState::Answered,
                    payload: Some(payload),
                    error: None,
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.event_sink.on_error(request_id, tool_name, &message);
                DispatchOutcome {
                    request_id,
                    route,
                    state: RouteState::Failed,
                    payload: None,
                    error: Some(message),
                }
            }
        }
    }
}
