use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::json;
use tracing::{debug, error};

use crate::application::ports::CompletionProvider;
use crate::domain::repositories::InvoiceRepository;

/// Output-token cap for the completion call. A query against one table does
/// not need more.
const SQL_OUTPUT_TOKEN_BUDGET: u32 = 256;

/// Fixed instruction set for the NL-to-SQL translation. Column names are
/// case- and quoting-sensitive; the free-text rule routes every text search
/// through the precomputed tsvector column.
pub const SQL_SYSTEM_PROMPT: &str = "You are an assistant that converts natural language \
questions into SQL queries for a PostgreSQL database. The table is named 'invoices' and has \
the following columns: \"ID\", \"FiscalWeekBeginDate\", \"Invoice Date\", \"Region\", \
\"Facility Name\", \"Branch Id\", \"Channel\", \"soldto_name\", \"shipto_name\", \
\"Product Type\", \"Major Code\", \"Major Desc\", \"Mid Code\", \"Mid Desc\", \"Minor Code\", \
\"Minor Desc\", \"Item\", \"Item Desc\", \"Sales\", \"Gross Profit\", \"GM Percent\", \"TLE\". \
\"Region\", \"Facility Name\", \"Branch Id\", \"Channel\", \"Product Type\", \"Major Code\", \
\"Mid Code\" and \"Minor Code\" are categorical TEXT columns: compare them with quoted string \
literals even when the value looks numeric, and never with numeric ranges. \"Sales\", \
\"Gross Profit\", \"GM Percent\" and \"TLE\" are numeric. Any search over the free-text \
columns (\"soldto_name\", \"shipto_name\", \"Major Desc\", \"Mid Desc\", \"Minor Desc\", \
\"Item Desc\") MUST match the precomputed tsv column using \
tsv @@ plainto_tsquery('english', '<search words>'); never use =, LIKE or ILIKE on the raw \
text columns. ALWAYS use double quotes around all column names in your SQL. Do not use \
SELECT *, always specify columns. Only generate SQL, no explanations.";

#[derive(Debug)]
pub enum SqlTranslationError {
    CompletionError(String),
}

impl std::fmt::Display for SqlTranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlTranslationError::CompletionError(msg) => write!(f, "Completion error: {}", msg),
        }
    }
}

impl std::error::Error for SqlTranslationError {}

/// Query Translator: one completion call turns the question into a SQL
/// statement, which runs read-only against the invoice store. A bad generated
/// statement degrades into an `{"error": ...}` payload instead of failing the
/// turn; only a completion-service failure is a hard error.
pub struct SqlTranslationService {
    completion_provider: Arc<dyn CompletionProvider>,
    invoice_repository: Arc<dyn InvoiceRepository>,
}

impl SqlTranslationService {
    pub fn new(
        completion_provider: Arc<dyn CompletionProvider>,
        invoice_repository: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self {
            completion_provider,
            invoice_repository,
        }
    }

    pub async fn answer(&self, question: &str) -> Result<String, SqlTranslationError> {
        let completion = self
            .completion_provider
            .complete(SQL_SYSTEM_PROMPT, question, SQL_OUTPUT_TOKEN_BUDGET)
            .await
            .map_err(|e| SqlTranslationError::CompletionError(e.to_string()))?;

        let statement = isolate_statement(&completion);
        debug!(user_query = question, sql_query = %statement, "generated SQL");

        match self.invoice_repository.execute_readonly(&statement).await {
            Ok(rows) => {
                let payload = rows.to_string();
                debug!(results_json = %payload, "SQL query executed");
                Ok(payload)
            }
            Err(e) => {
                error!(sql_query = %statement, error = %e, "SQL execution failed");
                Ok(json!({ "error": e.to_string() }).to_string())
            }
        }
    }
}

/// Reduces a model completion to the bare statement: unwraps a ```sql or
/// plain code fence and trims the trailing semicolon so the statement can be
/// embedded as a subquery.
pub fn isolate_statement(completion: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("fence regex"));

    let trimmed = completion.trim();
    let captures = fence.captures(trimmed);
    let body = match &captures {
        Some(captures) => captures[1].trim(),
        None => trimmed,
    };

    body.trim_end_matches(';').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::sync::Mutex;

    use crate::application::ports::completion_provider::CompletionProviderError;
    use crate::domain::repositories::{InvoiceRepositoryError, SimilarityPage};

    struct FixedCompletion(String);

    #[async_trait]
    impl CompletionProvider for FixedCompletion {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_text: &str,
            _max_tokens: u32,
        ) -> Result<String, CompletionProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionProvider for FailingCompletion {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_text: &str,
            _max_tokens: u32,
        ) -> Result<String, CompletionProviderError> {
            Err(CompletionProviderError::NetworkError(
                "connection refused".to_string(),
            ))
        }
    }

    struct RecordingRepository {
        statements: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingRepository {
        fn new(fail: bool) -> Self {
            Self {
                statements: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl InvoiceRepository for RecordingRepository {
        async fn execute_readonly(
            &self,
            statement: &str,
        ) -> Result<serde_json::Value, InvoiceRepositoryError> {
            self.statements
                .lock()
                .unwrap()
                .push(statement.to_string());
            if self.fail {
                Err(InvoiceRepositoryError::QueryError(
                    "column \"Nope\" does not exist".to_string(),
                ))
            } else {
                Ok(serde_json::json!([{ "Region": "Central", "Sales": 100.0 }]))
            }
        }

        async fn similarity_page(
            &self,
            _query_embedding: Vector,
            _max_distance: f32,
            _limit: i64,
        ) -> Result<SimilarityPage, InvoiceRepositoryError> {
            unreachable!("translator never runs similarity queries")
        }
    }

    #[test]
    fn prompt_states_the_query_rules() {
        for column in [
            "\"ID\"",
            "\"FiscalWeekBeginDate\"",
            "\"Invoice Date\"",
            "\"Region\"",
            "\"Facility Name\"",
            "\"Branch Id\"",
            "\"Channel\"",
            "\"soldto_name\"",
            "\"shipto_name\"",
            "\"Product Type\"",
            "\"Major Code\"",
            "\"Major Desc\"",
            "\"Mid Code\"",
            "\"Mid Desc\"",
            "\"Minor Code\"",
            "\"Minor Desc\"",
            "\"Item\"",
            "\"Item Desc\"",
            "\"Sales\"",
            "\"Gross Profit\"",
            "\"GM Percent\"",
            "\"TLE\"",
        ] {
            assert!(SQL_SYSTEM_PROMPT.contains(column), "missing {}", column);
        }

        assert!(SQL_SYSTEM_PROMPT.contains("plainto_tsquery"));
        assert!(SQL_SYSTEM_PROMPT.contains("never use =, LIKE or ILIKE"));
        assert!(SQL_SYSTEM_PROMPT.contains("quoted string literals"));
        assert!(SQL_SYSTEM_PROMPT.contains("Do not use SELECT *"));
    }

    #[test]
    fn isolates_fenced_statements() {
        let fenced = "```sql\nSELECT \"Region\" FROM invoices;\n```";
        assert_eq!(isolate_statement(fenced), "SELECT \"Region\" FROM invoices");

        let bare_fence = "```\nSELECT \"Region\" FROM invoices\n```";
        assert_eq!(
            isolate_statement(bare_fence),
            "SELECT \"Region\" FROM invoices"
        );

        let unfenced = "  SELECT \"Region\" FROM invoices;  ";
        assert_eq!(isolate_statement(unfenced), "SELECT \"Region\" FROM invoices");
    }

    #[test]
    fn isolates_multiline_statements() {
        let fenced = "```sql\nSELECT \"Region\", SUM(\"Sales\")\nFROM invoices\nGROUP BY \"Region\";\n```";
        assert_eq!(
            isolate_statement(fenced),
            "SELECT \"Region\", SUM(\"Sales\")\nFROM invoices\nGROUP BY \"Region\""
        );
    }

    #[tokio::test]
    async fn returns_rows_and_passes_the_stripped_statement() {
        let repository = Arc::new(RecordingRepository::new(false));
        let service = SqlTranslationService::new(
            Arc::new(FixedCompletion(
                "```sql\nSELECT \"Region\", \"Sales\" FROM invoices;\n```".to_string(),
            )),
            repository.clone(),
        );

        let payload = service.answer("sales by region").await.unwrap();
        let rows: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(rows[0]["Region"], "Central");

        let statements = repository.statements.lock().unwrap();
        assert_eq!(
            statements.as_slice(),
            ["SELECT \"Region\", \"Sales\" FROM invoices"]
        );
    }

    #[tokio::test]
    async fn execution_failure_degrades_to_error_payload() {
        let service = SqlTranslationService::new(
            Arc::new(FixedCompletion("SELECT \"Nope\" FROM invoices".to_string())),
            Arc::new(RecordingRepository::new(true)),
        );

        let payload = service.answer("bad question").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("does not exist")
        );
    }

    #[tokio::test]
    async fn completion_failure_is_a_hard_error() {
        let service = SqlTranslationService::new(
            Arc::new(FailingCompletion),
            Arc::new(RecordingRepository::new(false)),
        );

        let result = service.answer("any question").await;
        assert!(matches!(
            result,
            Err(SqlTranslationError::CompletionError(_))
        ));
    }
}
