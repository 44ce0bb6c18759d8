use diesel::prelude::*;
use pgvector::Vector;

use super::schema::invoices;

/// Insert shape for one invoice row. The surrogate id, the loaded_at stamp
/// and the tsvector column are all filled by the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = invoices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewInvoiceModel {
    pub invoice_id: i32,
    pub fiscal_week_begin_date: String,
    pub invoice_date: String,
    pub region: String,
    pub facility_name: String,
    pub branch_id: String,
    pub channel: String,
    pub soldto_name: String,
    pub shipto_name: String,
    pub product_type: String,
    pub major_code: String,
    pub major_desc: String,
    pub mid_code: String,
    pub mid_desc: String,
    pub minor_code: String,
    pub minor_desc: String,
    pub item: String,
    pub item_desc: String,
    pub sales: f64,
    pub gross_profit: f64,
    pub gm_percent: f64,
    pub tle: f64,
    pub embedding: Option<Vector>,
}
