use crate::model::Filter;

/// A value destined for a `?` placeholder in a readings scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    Text(String),
    Int(i64),
}

/// Builds the WHERE clause and ordered bind list for a filter.
///
/// Conditions are appended in a fixed order (device, type, start, end) so
/// the generated SQL is stable across calls with the same filter. Values
/// always travel as bound parameters, never interpolated into the clause.
pub fn build_where(filter: &Filter) -> (String, Vec<Bind>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut binds: Vec<Bind> = Vec::new();

    if let Some(device_id) = &filter.device_id {
        conditions.push("device_id = ?");
        binds.push(Bind::Text(device_id.clone()));
    }

    if let Some(sensor_type) = &filter.sensor_type {
        conditions.push("sensor_type = ?");
        binds.push(Bind::Text(sensor_type.clone()));
    }

    if let Some(start) = filter.start {
        conditions.push("created_at >= ?");
        binds.push(Bind::Int(start));
    }

    if let Some(end) = filter.end {
        conditions.push("created_at <= ?");
        binds.push(Bind::Int(end));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (clause, binds)
}
