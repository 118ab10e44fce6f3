// src/report/mod.rs

pub mod channels;
pub mod sink;

use crate::error::ReportError;
use crate::extract::RowRecord;
use crate::parse::{parse_measurement, FieldKind, Measurement, Number};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub use sink::Sink;

/// Label of the identity cell every row must carry.
pub const INDEX_LABEL: &str = "Index";
/// Field the identity is reported under.
pub const CHANNEL_FIELD: &str = "channel";

/// The three tables read from the status page, in reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Downstream,
    Upstream,
    Codewords,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [
        TableKind::Downstream,
        TableKind::Upstream,
        TableKind::Codewords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Downstream => "downstream",
            TableKind::Upstream => "upstream",
            TableKind::Codewords => "codewords",
        }
    }

    pub fn event_name(&self) -> &'static str {
        self.spec().event_name
    }

    pub fn spec(&self) -> &'static ReportSpec {
        match self {
            TableKind::Downstream => &channels::DOWNSTREAM,
            TableKind::Upstream => &channels::UPSTREAM,
            TableKind::Codewords => &channels::CODEWORDS,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported attribute value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<Number> for FieldValue {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(v) => FieldValue::Int(v),
            Number::Float(v) => FieldValue::Float(v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// One observation handed to a sink.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricEvent {
    pub name: &'static str,
    pub observed_at: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

/// How a raw cell becomes a field value.
#[derive(Clone, Copy, Debug)]
pub enum Conversion {
    /// Reported verbatim.
    Text,
    Measure(FieldKind),
}

/// Reads the cell under `label` and reports it as `field`.
#[derive(Debug)]
pub struct FieldSpec {
    pub label: &'static str,
    pub field: &'static str,
    pub conversion: Conversion,
}

#[derive(Debug)]
pub struct ReportSpec {
    pub event_name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Build one event per record, in record order.
///
/// Labels missing from a record are skipped, unavailable readings are left
/// out, and anything else that fails to parse aborts the whole table.
pub fn report_entries(
    table: TableKind,
    records: &[RowRecord],
    observed_at: DateTime<Utc>,
) -> Result<Vec<MetricEvent>, ReportError> {
    let spec = table.spec();
    let mut events = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let channel = record
            .get(INDEX_LABEL)
            .ok_or(ReportError::MissingIndex { table, row })?;

        let mut fields = BTreeMap::new();
        fields.insert(CHANNEL_FIELD.to_string(), FieldValue::from(channel.as_str()));

        for fs in spec.fields {
            let Some(raw) = record.get(fs.label) else {
                continue;
            };
            let value = match fs.conversion {
                Conversion::Text => FieldValue::from(raw.as_str()),
                Conversion::Measure(kind) => match parse_measurement(raw, kind) {
                    Ok(Measurement::Value(n)) => n.into(),
                    Ok(Measurement::Unavailable) => {
                        debug!(%table, %channel, field = fs.field, "reading unavailable");
                        continue;
                    }
                    Err(source) => {
                        return Err(ReportError::Field {
                            table,
                            channel: channel.clone(),
                            label: fs.label,
                            raw: raw.clone(),
                            source,
                        })
                    }
                },
            };
            fields.insert(fs.field.to_string(), value);
        }

        debug!(event = spec.event_name, %channel, ?fields, "built event");
        events.push(MetricEvent {
            name: spec.event_name,
            observed_at,
            fields,
        });
    }

    Ok(events)
}
