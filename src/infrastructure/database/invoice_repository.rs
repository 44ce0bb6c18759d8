use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Json, Text};
use pgvector::Vector;

use crate::domain::entities::InvoiceProjection;
use crate::domain::repositories::{
    InvoiceRepository, InvoiceRepositoryError, ScoredInvoice, SimilarityPage,
};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

/// Distance-ranked page plus the under-threshold total, from one statement.
/// The window count sees every row passing the WHERE filter, so the count and
/// the page cannot drift apart under concurrent writes. The comparison is
/// strict, which keeps a zero threshold an exact empty result.
const SIMILARITY_PAGE_SQL: &str = r#"
SELECT
    "ID" AS invoice_id,
    "FiscalWeekBeginDate" AS fiscal_week_begin_date,
    "Invoice Date" AS invoice_date,
    "Region" AS region,
    "Facility Name" AS facility_name,
    "Branch Id" AS branch_id,
    "Channel" AS channel,
    "soldto_name" AS soldto_name,
    "shipto_name" AS shipto_name,
    "Product Type" AS product_type,
    "Major Code" AS major_code,
    "Major Desc" AS major_desc,
    "Mid Code" AS mid_code,
    "Mid Desc" AS mid_desc,
    "Minor Code" AS minor_code,
    "Minor Desc" AS minor_desc,
    "Item" AS item,
    "Item Desc" AS item_desc,
    "Sales" AS sales,
    "Gross Profit" AS gross_profit,
    "GM Percent" AS gm_percent,
    "TLE" AS tle,
    (embedding <=> $1) AS distance,
    COUNT(*) OVER () AS total_relevant_count
FROM invoices
WHERE embedding IS NOT NULL
  AND (embedding <=> $1) < $2
ORDER BY distance ASC
LIMIT $3
"#;

#[derive(QueryableByName)]
struct JsonRows {
    #[diesel(sql_type = Json)]
    rows: serde_json::Value,
}

#[derive(QueryableByName)]
struct InvoiceDistanceRow {
    #[diesel(sql_type = Integer)]
    invoice_id: i32,
    #[diesel(sql_type = Text)]
    fiscal_week_begin_date: String,
    #[diesel(sql_type = Text)]
    invoice_date: String,
    #[diesel(sql_type = Text)]
    region: String,
    #[diesel(sql_type = Text)]
    facility_name: String,
    #[diesel(sql_type = Text)]
    branch_id: String,
    #[diesel(sql_type = Text)]
    channel: String,
    #[diesel(sql_type = Text)]
    soldto_name: String,
    #[diesel(sql_type = Text)]
    shipto_name: String,
    #[diesel(sql_type = Text)]
    product_type: String,
    #[diesel(sql_type = Text)]
    major_code: String,
    #[diesel(sql_type = Text)]
    major_desc: String,
    #[diesel(sql_type = Text)]
    mid_code: String,
    #[diesel(sql_type = Text)]
    mid_desc: String,
    #[diesel(sql_type = Text)]
    minor_code: String,
    #[diesel(sql_type = Text)]
    minor_desc: String,
    #[diesel(sql_type = Text)]
    item: String,
    #[diesel(sql_type = Text)]
    item_desc: String,
    #[diesel(sql_type = Double)]
    sales: f64,
    #[diesel(sql_type = Double)]
    gross_profit: f64,
    #[diesel(sql_type = Double)]
    gm_percent: f64,
    #[diesel(sql_type = Double)]
    tle: f64,
    #[diesel(sql_type = Double)]
    distance: f64,
    #[diesel(sql_type = BigInt)]
    total_relevant_count: i64,
}

impl From<InvoiceDistanceRow> for ScoredInvoice {
    fn from(row: InvoiceDistanceRow) -> Self {
        ScoredInvoice {
            invoice: InvoiceProjection {
                invoice_id: row.invoice_id,
                fiscal_week_begin_date: row.fiscal_week_begin_date,
                invoice_date: row.invoice_date,
                region: row.region,
                facility_name: row.facility_name,
                branch_id: row.branch_id,
                channel: row.channel,
                soldto_name: row.soldto_name,
                shipto_name: row.shipto_name,
                product_type: row.product_type,
                major_code: row.major_code,
                major_desc: row.major_desc,
                mid_code: row.mid_code,
                mid_desc: row.mid_desc,
                minor_code: row.minor_code,
                minor_desc: row.minor_desc,
                item: row.item,
                item_desc: row.item_desc,
                sales: row.sales,
                gross_profit: row.gross_profit,
                gm_percent: row.gm_percent,
                tle: row.tle,
            },
            distance: row.distance,
        }
    }
}

/// Wraps a generated statement so arbitrary projections and aggregates come
/// back as one JSON array, shaped by the database rather than the client.
fn wrap_as_json_rows(statement: &str) -> String {
    format!(
        "SELECT coalesce(json_agg(row_to_json(sub)), '[]'::json) AS rows FROM ({}) AS sub",
        statement
    )
}

pub struct PostgresInvoiceRepository {
    pool: DbPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn execute_readonly(
        &self,
        statement: &str,
    ) -> Result<serde_json::Value, InvoiceRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| InvoiceRepositoryError::PoolError(e.to_string()))?;

        let wrapped = wrap_as_json_rows(statement);

        let result = conn
            .transaction::<JsonRows, diesel::result::Error, _>(|conn| {
                diesel::sql_query("SET TRANSACTION READ ONLY").execute(conn)?;
                diesel::sql_query(&wrapped).get_result(conn)
            })
            .map_err(|e| InvoiceRepositoryError::QueryError(e.to_string()))?;

        Ok(result.rows)
    }

    async fn similarity_page(
        &self,
        query_embedding: Vector,
        max_distance: f32,
        limit: i64,
    ) -> Result<SimilarityPage, InvoiceRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| InvoiceRepositoryError::PoolError(e.to_string()))?;

        let rows = diesel::sql_query(SIMILARITY_PAGE_SQL)
            .bind::<pgvector::sql_types::Vector, _>(query_embedding)
            .bind::<Double, _>(f64::from(max_distance))
            .bind::<BigInt, _>(limit)
            .load::<InvoiceDistanceRow>(&mut conn)
            .map_err(|e| InvoiceRepositoryError::QueryError(e.to_string()))?;

        let total_relevant_count = rows
            .first()
            .map(|row| row.total_relevant_count)
            .unwrap_or(0);

        Ok(SimilarityPage {
            results: rows.into_iter().map(ScoredInvoice::from).collect(),
            total_relevant_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_generated_statements_as_json() {
        let wrapped = wrap_as_json_rows("SELECT \"Region\" FROM invoices");
        assert_eq!(
            wrapped,
            "SELECT coalesce(json_agg(row_to_json(sub)), '[]'::json) AS rows \
             FROM (SELECT \"Region\" FROM invoices) AS sub"
        );
    }

    #[test]
    fn similarity_statement_counts_and_pages_together() {
        // Count and page must come from one execution, with a strict
        // threshold comparison and ascending distance order.
        assert!(SIMILARITY_PAGE_SQL.contains("COUNT(*) OVER () AS total_relevant_count"));
        assert!(SIMILARITY_PAGE_SQL.contains("(embedding <=> $1) < $2"));
        assert!(SIMILARITY_PAGE_SQL.contains("ORDER BY distance ASC"));
        assert!(SIMILARITY_PAGE_SQL.contains("LIMIT $3"));
        // The raw embedding never joins a projection.
        assert!(!SIMILARITY_PAGE_SQL.contains("embedding AS"));
    }
}
