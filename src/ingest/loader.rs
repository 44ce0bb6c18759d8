use std::path::Path;
use std::sync::Arc;

use diesel::prelude::*;
use pgvector::Vector;
use serde::Deserialize;
use tracing::info;

use crate::application::ports::EmbeddingProvider;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};
use crate::infrastructure::database::models::NewInvoiceModel;
use crate::infrastructure::database::schema::invoices;

/// One embeddings round trip covers this many rows.
const EMBEDDING_BATCH_SIZE: usize = 16;

#[derive(Debug)]
pub enum IngestError {
    CsvError(String),
    EmbeddingError(String),
    DatabaseError(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            IngestError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            IngestError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {}

/// Raw CSV row. Everything arrives as text; numeric measures are coerced on
/// the way into the model so a junk value in the export never aborts a load.
#[derive(Debug, Deserialize)]
pub struct InvoiceCsvRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "FiscalWeekBeginDate")]
    pub fiscal_week_begin_date: String,
    #[serde(rename = "Invoice Date")]
    pub invoice_date: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Facility Name")]
    pub facility_name: String,
    #[serde(rename = "Branch Id")]
    pub branch_id: String,
    #[serde(rename = "Channel")]
    pub channel: String,
    pub soldto_name: String,
    pub shipto_name: String,
    #[serde(rename = "Product Type")]
    pub product_type: String,
    #[serde(rename = "Major Code")]
    pub major_code: String,
    #[serde(rename = "Major Desc")]
    pub major_desc: String,
    #[serde(rename = "Mid Code")]
    pub mid_code: String,
    #[serde(rename = "Mid Desc")]
    pub mid_desc: String,
    #[serde(rename = "Minor Code")]
    pub minor_code: String,
    #[serde(rename = "Minor Desc")]
    pub minor_desc: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Item Desc")]
    pub item_desc: String,
    #[serde(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: String,
    #[serde(rename = "GM Percent")]
    pub gm_percent: String,
    #[serde(rename = "TLE")]
    pub tle: String,
}

/// Absent or non-numeric source values become a neutral zero, never NULL and
/// never NaN.
pub fn safe_float(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn safe_int(raw: &str) -> i32 {
    raw.trim().parse().unwrap_or(0)
}

/// Embedding input for one row: every source field joined in column order,
/// the same text the similarity search compares against.
pub fn embedding_input(record: &InvoiceCsvRecord) -> String {
    [
        record.id.as_str(),
        record.fiscal_week_begin_date.as_str(),
        record.invoice_date.as_str(),
        record.region.as_str(),
        record.facility_name.as_str(),
        record.branch_id.as_str(),
        record.channel.as_str(),
        record.soldto_name.as_str(),
        record.shipto_name.as_str(),
        record.product_type.as_str(),
        record.major_code.as_str(),
        record.major_desc.as_str(),
        record.mid_code.as_str(),
        record.mid_desc.as_str(),
        record.minor_code.as_str(),
        record.minor_desc.as_str(),
        record.item.as_str(),
        record.item_desc.as_str(),
        record.sales.as_str(),
        record.gross_profit.as_str(),
        record.gm_percent.as_str(),
        record.tle.as_str(),
    ]
    .join(" | ")
}

fn to_new_model(record: InvoiceCsvRecord, embedding: Vector) -> NewInvoiceModel {
    NewInvoiceModel {
        invoice_id: safe_int(&record.id),
        fiscal_week_begin_date: record.fiscal_week_begin_date,
        invoice_date: record.invoice_date,
        region: record.region,
        facility_name: record.facility_name,
        branch_id: record.branch_id,
        channel: record.channel,
        soldto_name: record.soldto_name,
        shipto_name: record.shipto_name,
        product_type: record.product_type,
        major_code: record.major_code,
        major_desc: record.major_desc,
        mid_code: record.mid_code,
        mid_desc: record.mid_desc,
        minor_code: record.minor_code,
        minor_desc: record.minor_desc,
        item: record.item,
        item_desc: record.item_desc,
        sales: safe_float(&record.sales),
        gross_profit: safe_float(&record.gross_profit),
        gm_percent: safe_float(&record.gm_percent),
        tle: safe_float(&record.tle),
        embedding: Some(embedding),
    }
}

/// Loads an invoice CSV export: batches of rows are embedded through the
/// provider and inserted together. The tsvector column is generated by the
/// database, so inserting the text fields is enough to keep it in sync.
pub async fn load_csv(
    path: &Path,
    pool: &DbPool,
    embedding_provider: Arc<dyn EmbeddingProvider>,
) -> Result<usize, IngestError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| IngestError::CsvError(e.to_string()))?;

    let records: Vec<InvoiceCsvRecord> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|e| IngestError::CsvError(e.to_string()))?;

    info!(rows = records.len(), "generating embeddings and inserting invoice rows");

    let mut inserted = 0;
    let mut batch = Vec::with_capacity(EMBEDDING_BATCH_SIZE);

    for record in records {
        batch.push(record);
        if batch.len() == EMBEDDING_BATCH_SIZE {
            inserted += insert_batch(&mut batch, pool, &embedding_provider).await?;
        }
    }
    if !batch.is_empty() {
        inserted += insert_batch(&mut batch, pool, &embedding_provider).await?;
    }

    let mut conn = get_connection_from_pool(pool)
        .map_err(|e| IngestError::DatabaseError(e.to_string()))?;
    let total: i64 = invoices::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| IngestError::DatabaseError(e.to_string()))?;

    info!(rows = inserted, total, "invoice load complete");
    Ok(inserted)
}

async fn insert_batch(
    batch: &mut Vec<InvoiceCsvRecord>,
    pool: &DbPool,
    embedding_provider: &Arc<dyn EmbeddingProvider>,
) -> Result<usize, IngestError> {
    let texts: Vec<String> = batch.iter().map(embedding_input).collect();

    let embeddings = embedding_provider
        .generate_embeddings(&texts)
        .await
        .map_err(|e| IngestError::EmbeddingError(e.to_string()))?;

    let rows: Vec<NewInvoiceModel> = batch
        .drain(..)
        .zip(embeddings)
        .map(|(record, embedding)| to_new_model(record, embedding))
        .collect();

    let mut conn = get_connection_from_pool(pool)
        .map_err(|e| IngestError::DatabaseError(e.to_string()))?;

    diesel::insert_into(invoices::table)
        .values(&rows)
        .execute(&mut conn)
        .map_err(|e| IngestError::DatabaseError(e.to_string()))
}
