//! Sales tables: loading, cleaning and aggregation.

pub mod aggregate;
pub mod cleaning;
pub mod frame;
pub mod loader;

pub use aggregate::{
    aggregate, correlation_matrix, describe, describe_frame, monthly_totals, CorrelationMatrix,
    GroupKey, GroupLabel, GroupSummary, Statistic, Summary,
};
pub use cleaning::{
    add_calendar_fields, add_share_columns, add_total_sales, clean, flag_outliers,
    impute_missing, mode, CleanedSales, ImputationReport, OutlierSplit,
};
pub use frame::{SalesFrame, DATE_COLUMN, DRUG_COLUMNS, TOTAL_SALES, Z_SCORE};
pub use loader::{load_all, load_sales, load_sales_with_format, read_sales, write_sales, SalesData};
