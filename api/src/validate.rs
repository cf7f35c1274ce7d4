use crate::errors::{Error, Result};
use crate::model::NewReading;

const VALUE_MIN: i64 = 0;
const VALUE_MAX: i64 = 100;

/// One declarative write-schema rule: field name, predicate, expectation.
struct Rule {
    field: &'static str,
    ok: fn(&str, &NewReading) -> bool,
    expect: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        field: "device_id",
        ok: |device_id, _| !device_id.is_empty(),
        expect: "must be a non-empty string",
    },
    Rule {
        field: "type",
        ok: |_, reading| !reading.sensor_type.is_empty(),
        expect: "must be a non-empty string",
    },
    Rule {
        field: "value",
        ok: |_, reading| (VALUE_MIN..=VALUE_MAX).contains(&reading.value),
        expect: "must be an integer between 0 and 100",
    },
];

/// Checks an incoming write against the schema rules, first failure wins.
pub fn validate(device_id: &str, reading: &NewReading) -> Result<()> {
    for rule in RULES {
        if !(rule.ok)(device_id, reading) {
            return Err(Error::Validation(format!("{} {}", rule.field, rule.expect)));
        }
    }

    Ok(())
}
