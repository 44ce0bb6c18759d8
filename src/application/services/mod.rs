pub mod dispatcher;
pub mod similarity_search;
pub mod sql_translator;

pub use dispatcher::{
    AgentDispatcher, DispatchOutcome, QueryRouter, RetrievalTool, RuleBasedRouter,
    SqlSearchTool, ToolRegistry, VectorSearchTool,
};
pub use similarity_search::SimilaritySearchService;
pub use sql_translator::SqlTranslationService;
