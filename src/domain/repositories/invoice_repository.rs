use async_trait::async_trait;
use pgvector::Vector;
use serde::Serialize;

use crate::domain::entities::InvoiceProjection;

#[derive(Debug)]
pub enum InvoiceRepositoryError {
    PoolError(String),
    QueryError(String),
}

impl std::fmt::Display for InvoiceRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceRepositoryError::PoolError(msg) => write!(f, "Pool error: {}", msg),
            InvoiceRepositoryError::QueryError(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for InvoiceRepositoryError {}

/// An invoice row paired with its cosine distance to the query embedding.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredInvoice {
    #[serde(flatten)]
    pub invoice: InvoiceProjection,
    pub distance: f64,
}

/// One page of similarity results plus the count of every row under the
/// threshold. Both come out of a single statement, so the count can exceed
/// the page length but never contradict it.
#[derive(Debug, Serialize)]
pub struct SimilarityPage {
    pub results: Vec<ScoredInvoice>,
    pub total_relevant_count: i64,
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Runs a generated SELECT in a read-only transaction and returns the
    /// rows as a JSON array, whatever columns the statement projects.
    async fn execute_readonly(
        &self,
        statement: &str,
    ) -> Result<serde_json::Value, InvoiceRepositoryError>;

    /// Distance-ranked page of invoices under `max_distance`, with the total
    /// relevant count taken from the same statement execution.
    async fn similarity_page(
        &self,
        query_embedding: Vector,
        max_distance: f32,
        limit: i64,
    ) -> Result<SimilarityPage, InvoiceRepositoryError>;
}
