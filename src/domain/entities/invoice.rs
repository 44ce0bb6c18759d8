use serde::{Deserialize, Serialize};

/// One row of the `invoices` table as it is returned to callers. The
/// embedding and tsvector columns never leave the database; they are derived
/// caches of the text fields below.
///
/// Serialized field names match the quoted SQL column names so tool output
/// lines up with the schema the translator prompt describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceProjection {
    #[serde(rename = "ID")]
    pub invoice_id: i32,
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
    pub sales: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "GM Percent")]
    pub gm_percent: f64,
    #[serde(rename = "TLE")]
    pub tle: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvoiceProjection {
        InvoiceProjection {
            invoice_id: 42,
            fiscal_week_begin_date: "2024-01-01".to_string(),
            invoice_date: "2024-01-03".to_string(),
            region: "Central".to_string(),
            facility_name: "Tulsa DC".to_string(),
            branch_id: "0211".to_string(),
            channel: "Warehouse".to_string(),
            soldto_name: "ACME Corp".to_string(),
            shipto_name: "ACME Corp".to_string(),
            product_type: "Lumber".to_string(),
            major_code: "100".to_string(),
            major_desc: "Structural".to_string(),
            mid_code: "110".to_string(),
            mid_desc: "Studs".to_string(),
            minor_code: "111".to_string(),
            minor_desc: "2x4".to_string(),
            item: "LBR-2X4-8".to_string(),
            item_desc: "2x4x8 stud".to_string(),
            sales: 1250.0,
            gross_profit: 310.0,
            gm_percent: 24.8,
            tle: 1.02,
        }
    }

    #[test]
    fn serializes_with_sql_column_names() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["ID"], 42);
        assert_eq!(value["Invoice Date"], "2024-01-03");
        assert_eq!(value["Facility Name"], "Tulsa DC");
        assert_eq!(value["soldto_name"], "ACME Corp");
        assert_eq!(value["Gross Profit"], 310.0);
        // Derived columns never appear in projections.
        assert!(value.get("embedding").is_none());
        assert!(value.get("tsv").is_none());
    }
}
