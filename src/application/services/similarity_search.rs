use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use crate::application::ports::EmbeddingProvider;
use crate::domain::repositories::InvoiceRepository;

/// Similarity Retriever: the question is embedded exactly once, then a single
/// statement ranks, filters, counts and pages the invoice table. Embedding or
/// query failures degrade to an `{"error": ...}` payload; there is no hard
/// failure path and no retry.
pub struct SimilaritySearchService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    invoice_repository: Arc<dyn InvoiceRepository>,
}

impl SimilaritySearchService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        invoice_repository: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self {
            embedding_provider,
            invoice_repository,
        }
    }

    pub async fn search(&self, question: &str, max_distance: f32, limit: i64) -> String {
        let query_embedding = match self.embedding_provider.generate_embedding(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                error!(user_query = question, error = %e, "embedding computation failed");
                return error_payload(&e.to_string());
            }
        };

        match self
            .invoice_repository
            .similarity_page(query_embedding, max_distance, limit)
            .await
        {
            Ok(page) => {
                debug!(
                    user_query = question,
                    max_distance,
                    limit,
                    returned = page.results.len(),
                    total_relevant_count = page.total_relevant_count,
                    "similarity search executed"
                );
                serde_json::to_string(&page).unwrap_or_else(|e| error_payload(&e.to_string()))
            }
            Err(e) => {
                error!(user_query = question, error = %e, "similarity query failed");
                error_payload(&e.to_string())
            }
        }
    }
}

fn error_payload(message: &str) -> String {
    json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::sync::Mutex;

    use crate::application::ports::embedding_provider::EmbeddingProviderError;
    use crate::domain::entities::InvoiceProjection;
    use crate::domain::repositories::{
        InvoiceRepositoryError, ScoredInvoice, SimilarityPage,
    };

    struct CountingEmbedder {
        calls: Mutex<u32>,
        fail: bool,
    }

    impl CountingEmbedder {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn generate_embedding(&self, _text: &str) -> Result<Vector, EmbeddingProviderError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                Err(EmbeddingProviderError::NetworkError(
                    "embedding service down".to_string(),
                ))
            } else {
                Ok(Vector::from(vec![0.1, 0.2, 0.3]))
            }
        }

        async fn generate_embeddings(
            &self,
            _texts: &[String],
        ) -> Result<Vec<Vector>, EmbeddingProviderError> {
            unreachable!("search never batches")
        }

        fn embedding_dimension(&self) -> usize {
            3
        }
    }

    struct PageRepository {
        page: Option<SimilarityPage>,
    }

    #[async_trait]
    impl InvoiceRepository for PageRepository {
        async fn execute_readonly(
            &self,
            _statement: &str,
        ) -> Result<serde_json::Value, InvoiceRepositoryError> {
            unreachable!("retriever never runs generated SQL")
        }

        async fn similarity_page(
            &self,
            _query_embedding: Vector,
            _max_distance: f32,
            _limit: i64,
        ) -> Result<SimilarityPage, InvoiceRepositoryError> {
            match &self.page {
                Some(page) => Ok(SimilarityPage {
                    results: page.results.clone(),
                    total_relevant_count: page.total_relevant_count,
                }),
                None => Err(InvoiceRepositoryError::QueryError(
                    "relation \"invoices\" does not exist".to_string(),
                )),
            }
        }
    }

    fn scored(invoice_id: i32, distance: f64) -> ScoredInvoice {
        ScoredInvoice {
            invoice: InvoiceProjection {
                invoice_id,
                fiscal_week_begin_date: String::new(),
                invoice_date: String::new(),
                region: "Central".to_string(),
                facility_name: String::new(),
                branch_id: String::new(),
                channel: String::new(),
                soldto_name: "ACME Corp".to_string(),
                shipto_name: String::new(),
                product_type: String::new(),
                major_code: String::new(),
                major_desc: String::new(),
                mid_code: String::new(),
                mid_desc: String::new(),
                minor_code: String::new(),
                minor_desc: String::new(),
                item: String::new(),
                item_desc: String::new(),
                sales: 0.0,
                gross_profit: 0.0,
                gm_percent: 0.0,
                tle: 0.0,
            },
            distance,
        }
    }

    #[tokio::test]
    async fn shapes_results_and_count_and_embeds_once() {
        let embedder = Arc::new(CountingEmbedder::new(false));
        let service = SimilaritySearchService::new(
            embedder.clone(),
            Arc::new(PageRepository {
                page: Some(SimilarityPage {
                    results: vec![scored(1, 0.12), scored(2, 0.34)],
                    total_relevant_count: 7,
                }),
            }),
        );

        let payload = service.search("roofing projects", 0.6, 10).await;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["total_relevant_count"], 7);
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(value["total_relevant_count"].as_i64().unwrap() >= results.len() as i64);
        // Ascending distance ordering is preserved through serialization.
        assert!(results[0]["distance"].as_f64().unwrap() < results[1]["distance"].as_f64().unwrap());
        // Projection fields flatten next to the distance annotation.
        assert_eq!(results[0]["soldto_name"], "ACME Corp");
        assert_eq!(results[0]["ID"], 1);

        assert_eq!(*embedder.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_page_keeps_zero_count() {
        let service = SimilaritySearchService::new(
            Arc::new(CountingEmbedder::new(false)),
            Arc::new(PageRepository {
                page: Some(SimilarityPage {
                    results: Vec::new(),
                    total_relevant_count: 0,
                }),
            }),
        );

        let payload = service.search("anything", 0.0, 10).await;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["total_relevant_count"], 0);
        assert!(value["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_error_payload() {
        let service = SimilaritySearchService::new(
            Arc::new(CountingEmbedder::new(true)),
            Arc::new(PageRepository { page: None }),
        );

        let payload = service.search("anything", 0.6, 10).await;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("embedding service down")
        );
    }

    #[tokio::test]
    async fn query_failure_degrades_to_error_payload() {
        let service = SimilaritySearchService::new(
            Arc::new(CountingEmbedder::new(false)),
            Arc::new(PageRepository { page: None }),
        );

        let payload = service.search("anything", 0.6, 10).await;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("does not exist")
        );
    }
}
