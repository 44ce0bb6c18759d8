// The generated tsv column is maintained by the database and only ever
// referenced from raw SQL, so it is left out of the table definition.

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    invoices (id) {
        id -> Int4,
        #[sql_name = "ID"]
        invoice_id -> Int4,
        #[sql_name = "FiscalWeekBeginDate"]
        fiscal_week_begin_date -> Text,
        #[sql_name = "Invoice Date"]
        invoice_date -> Text,
        #[sql_name = "Region"]
        region -> Text,
        #[sql_name = "Facility Name"]
        facility_name -> Text,
        #[sql_name = "Branch Id"]
        branch_id -> Text,
        #[sql_name = "Channel"]
        channel -> Text,
        soldto_name -> Text,
        shipto_name -> Text,
        #[sql_name = "Product Type"]
        product_type -> Text,
        #[sql_name = "Major Code"]
        major_code -> Text,
        #[sql_name = "Major Desc"]
        major_desc -> Text,
        #[sql_name = "Mid Code"]
        mid_code -> Text,
        #[sql_name = "Mid Desc"]
        mid_desc -> Text,
        #[sql_name = "Minor Code"]
        minor_code -> Text,
        #[sql_name = "Minor Desc"]
        minor_desc -> Text,
        #[sql_name = "Item"]
        item -> Text,
        #[sql_name = "Item Desc"]
        item_desc -> Text,
        #[sql_name = "Sales"]
        sales -> Float8,
        #[sql_name = "Gross Profit"]
        gross_profit -> Float8,
        #[sql_name = "GM Percent"]
        gm_percent -> Float8,
        #[sql_name = "TLE"]
        tle -> Float8,
        embedding -> Nullable<Vector>,
        loaded_at -> Timestamptz,
    }
}
