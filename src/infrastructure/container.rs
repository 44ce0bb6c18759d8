use std::sync::Arc;

use crate::{
    application::{
        ports::{CompletionProvider, EmbeddingProvider, TracingEventSink},
        services::{
            AgentDispatcher, RetrievalTool, RuleBasedRouter, SimilaritySearchService,
            SqlSearchTool, SqlTranslationService, ToolRegistry, VectorSearchTool,
        },
    },
    domain::repositories::InvoiceRepository,
    infrastructure::{
        database::{
            DbPool, PostgresInvoiceRepository, create_connection_pool,
            get_connection_from_pool, run_migrations,
        },
        external_services::AzureOpenAiClient,
    },
};

/// All long-lived state, constructed once at startup and passed down
/// explicitly. The pool and the HTTP client are the only shared resources;
/// everything else is stateless per request.
pub struct AppContainer {
    pub db_pool: DbPool,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub dispatcher: Arc<AgentDispatcher>,
}

impl AppContainer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let db_pool = create_connection_pool()?;
        let mut conn = get_connection_from_pool(&db_pool)?;
        run_migrations(&mut conn)?;
        drop(conn);

        let openai_client = Arc::new(AzureOpenAiClient::from_env()?);
        let completion_provider: Arc<dyn CompletionProvider> = openai_client.clone();
        let embedding_provider: Arc<dyn EmbeddingProvider> = openai_client;

        let invoice_repository: Arc<dyn InvoiceRepository> =
            Arc::new(PostgresInvoiceRepository::new(db_pool.clone()));

        let sql_translation = Arc::new(SqlTranslationService::new(
            completion_provider,
            invoice_repository.clone(),
        ));
        let similarity_search = Arc::new(SimilaritySearchService::new(
            embedding_provider.clone(),
            invoice_repository,
        ));

        let registry = ToolRegistry::new(vec![
            Arc::new(SqlSearchTool::new(sql_translation)) as Arc<dyn RetrievalTool>,
            Arc::new(VectorSearchTool::new(similarity_search)),
        ]);

        let dispatcher = Arc::new(AgentDispatcher::new(
            Arc::new(RuleBasedRouter),
            registry,
            Arc::new(TracingEventSink),
        ));

        Ok(Self {
            db_pool,
            embedding_provider,
            dispatcher,
        })
    }
}
