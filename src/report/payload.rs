//! Type-specific report payloads.
//!
//! Field names follow the backend's JSON: summary blocks are camelCase,
//! row records are snake_case.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::ReportType;

/// A monetary amount as sent by the backend: a number or a numeric string.
/// `null`, booleans and nested values are read as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => Amount::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => Amount::Text(s),
            _ => Amount::Number(0.0),
        })
    }
}

impl Amount {
    /// Numeric value; anything unparsable counts as zero
    pub fn value(&self) -> f64 {
        match self {
            Amount::Number(n) if n.is_finite() => *n,
            Amount::Number(_) => 0.0,
            Amount::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(0.0)
    }
}

/// Numeric field that may arrive as a number, a numeric string, or null
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Amount::deserialize(deserializer).map(|amount| amount.value())
}

/// Whole count; strings and null are accepted like `lenient_f64`
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    lenient_f64(deserializer).map(|n| if n > 0.0 { n.round() as u64 } else { 0 })
}

/// Text field where null reads as empty
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Like `lenient_f64`, but null and unparsable values stay absent
fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

/// A free-form backend record (used by the generic table fallback)
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_expenses: f64,
    #[serde(default, alias = "netProfit", deserialize_with = "lenient_f64")]
    pub net_income: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit_margin: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_revenue: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub growth_rate: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub overdue_payments_count: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overdue_payments_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExpenseLine {
    #[serde(default, deserialize_with = "lenient_string")]
    pub expense_type: String,
    #[serde(default)]
    pub total_amount: Amount,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FinancialPayload {
    #[serde(default)]
    pub summary: FinancialSummary,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
}

/// One property's occupancy, accepting both the flat and the camelCase shapes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PropertyOccupancy {
    #[serde(default, alias = "propertyName", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, alias = "totalUnits", deserialize_with = "lenient_f64")]
    pub total_units: f64,
    #[serde(default, alias = "occupiedUnits", deserialize_with = "lenient_f64")]
    pub occupied_units: f64,
    #[serde(default, alias = "availableUnits", deserialize_with = "lenient_f64")]
    pub vacant_units: f64,
    #[serde(default, alias = "occupancyRate", deserialize_with = "lenient_f64")]
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyOverview {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub occupied_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub available_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub vacancy_rate: f64,
    #[serde(default)]
    pub by_property: Vec<PropertyOccupancy>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OccupancyTrend {
    #[serde(default, deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OccupancyPayload {
    #[serde(default)]
    pub occupancy: Option<OccupancyOverview>,
    #[serde(default)]
    pub properties: Vec<PropertyOccupancy>,
    #[serde(default)]
    pub trends: Vec<OccupancyTrend>,
}

impl OccupancyPayload {
    /// Per-property rows: the flat list when present, else the overview breakdown
    pub fn property_rows(&self) -> &[PropertyOccupancy] {
        if !self.properties.is_empty() {
            return &self.properties;
        }
        self.occupancy
            .as_ref()
            .map(|o| o.by_property.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PaymentPayload {
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRevenue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub property_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueOverview {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_monthly: f64,
    /// Passed through as sent; the backend computes it
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub growth_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub projected_revenue: f64,
    #[serde(default)]
    pub by_property: Vec<PropertyRevenue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdown {
    #[serde(default, deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rent_revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub other_revenue: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_revenue: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RevenuePayload {
    #[serde(default)]
    pub revenue: Option<RevenueOverview>,
    #[serde(default)]
    pub breakdown: Vec<RevenueBreakdown>,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Record>,
}

/// User-authored report: arbitrary records plus an optional summary
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CustomPayload {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Record>,
}

/// Report body; the variant is the report type, so shapes never mix
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ReportPayload {
    Financial(FinancialPayload),
    Occupancy(OccupancyPayload),
    Payment(PaymentPayload),
    Revenue(RevenuePayload),
    Custom(CustomPayload),
}

impl ReportPayload {
    /// Decode a backend `data` value as the payload of `report_type`
    pub fn from_value(report_type: ReportType, value: Value) -> serde_json::Result<Self> {
        Ok(match report_type {
            ReportType::Financial => ReportPayload::Financial(serde_json::from_value(value)?),
            ReportType::Occupancy => ReportPayload::Occupancy(serde_json::from_value(value)?),
            ReportType::Payment => ReportPayload::Payment(serde_json::from_value(value)?),
            ReportType::Revenue => ReportPayload::Revenue(serde_json::from_value(value)?),
            ReportType::Custom => ReportPayload::Custom(serde_json::from_value(value)?),
        })
    }

    pub fn report_type(&self) -> ReportType {
        match self {
            ReportPayload::Financial(_) => ReportType::Financial,
            ReportPayload::Occupancy(_) => ReportType::Occupancy,
            ReportPayload::Payment(_) => ReportType::Payment,
            ReportPayload::Revenue(_) => ReportType::Revenue,
            ReportPayload::Custom(_) => ReportType::Custom,
        }
    }

    /// Summary block as a flat JSON object, if the payload carries one
    pub fn summary(&self) -> Option<Record> {
        match self {
            ReportPayload::Financial(p) => match serde_json::to_value(&p.summary) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            ReportPayload::Payment(p) => p.summary.clone(),
            ReportPayload::Revenue(p) => p.summary.clone(),
            ReportPayload::Custom(p) => p.summary.clone(),
            ReportPayload::Occupancy(_) => None,
        }
    }

    /// Generic records for the table fallback
    pub fn records(&self) -> &[Record] {
        match self {
            ReportPayload::Revenue(p) => &p.data,
            ReportPayload::Custom(p) => &p.data,
            _ => &[],
        }
    }
}
