use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One sensor observation pushed by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    pub device_id: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub value: i64,
    pub created_at: i64,
}

/// Write request body. `created_at` falls back to the server clock.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub value: i64,
    pub created_at: Option<i64>,
}

/// Conjunctive constraints for a readings scan. All fields optional;
/// present fields are ANDed together, time bounds inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub device_id: Option<String>,
    pub sensor_type: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Statistic selectable on the aggregate endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Min,
    Max,
    Mean,
    Median,
    Mode,
    Quartiles,
}

impl FromStr for AggregateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "quartiles" => Ok(Self::Quartiles),
            other => Err(Error::Validation(format!("unknown aggregate: {other}"))),
        }
    }
}

/// Aggregate outcome. `None` means the filtered set was empty, which is
/// distinct from a zero value and serializes as JSON null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateResponse {
    Scalar {
        value: Option<f64>,
    },
    Quartiles {
        quartile_1: Option<f64>,
        quartile_3: Option<f64>,
    },
}

/// Per-(device, sensor type) rollup row for the fleet summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub device_id: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub count: u64,
    pub max: i64,
    pub mean: f64,
    pub quartile_1: f64,
    pub quartile_3: f64,
    pub median: f64,
}
