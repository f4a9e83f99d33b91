use serde::{Deserialize, Serialize};

/// One row of the `customer_data` fact table: a customer's order totals for a quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_name: String,
    pub year: i32,
    pub quarter: String,
    pub total_order_amount: f64,
    pub average_order_amount: f64,
    pub order_frequency: i32,
    /// Cluster label assigned by the offline segmentation.
    pub categorized: i32,
}
