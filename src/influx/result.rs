//! Annotated CSV query results.
//!
//! InfluxDB answers Flux queries with CSV whose tables are described by
//! `#datatype`, `#group` and `#default` annotation rows, followed by a header
//! row and data rows. The first column of every row is reserved for annotations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::influx::error::{InfluxError, InfluxResult};

/// A single typed cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FluxValue {
    Null,
    String(String),
    Long(i64),
    UnsignedLong(u64),
    Double(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl FluxValue {
    /// Numeric view of the value, used when plotting.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Self::Long(v) => Some(*v as f64),
            #[allow(clippy::cast_precision_loss)]
            Self::UnsignedLong(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FluxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("<nil>"),
            Self::String(v) => f.write_str(v),
            Self::Long(v) => write!(f, "{v}"),
            Self::UnsignedLong(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FluxColumn {
    pub index: usize,
    pub name: String,
    pub data_type: String,
    pub group: bool,
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FluxTableMetadata {
    pub position: usize,
    pub columns: Vec<FluxColumn>,
}

impl FluxTableMetadata {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&FluxColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for FluxTableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{position: {}, columns: [", self.position)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{{index: {}, name: {}, dataType: {}, group: {}, defaultValue: {}}}",
                column.index, column.name, column.data_type, column.group, column.default_value
            )?;
        }
        f.write_str("]}")
    }
}

/// One row of a result table, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxRecord {
    pub table: usize,
    pub values: BTreeMap<String, FluxValue>,
}

impl FluxRecord {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FluxValue> {
        self.values.get(column)
    }

    #[must_use]
    pub fn value(&self) -> Option<&FluxValue> {
        self.get("_value")
    }

    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.get("_field").and_then(FluxValue::as_str)
    }

    #[must_use]
    pub fn measurement(&self) -> Option<&str> {
        self.get("_measurement").and_then(FluxValue::as_str)
    }

    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self.get("_time") {
            Some(FluxValue::Time(t)) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for FluxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}:{value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxTable {
    pub metadata: FluxTableMetadata,
    pub records: Vec<FluxRecord>,
}

/// Annotations collected for the table that is about to start.
#[derive(Debug, Default)]
struct PendingAnnotations {
    data_types: Vec<String>,
    groups: Vec<String>,
    defaults: Vec<String>,
}

impl PendingAnnotations {
    fn is_empty(&self) -> bool {
        self.data_types.is_empty() && self.groups.is_empty() && self.defaults.is_empty()
    }
}

enum Section {
    /// Columns are known, rows are data.
    Data(Vec<FluxColumn>),
    /// The header announced an error table.
    Error,
}

/// Parse an annotated CSV response body into tables.
///
/// # Errors
///
/// Returns `InfluxError::Query` when the response contains an error table and
/// `InfluxError::Decode` when the CSV is malformed.
pub fn parse_annotated_csv(body: &[u8]) -> InfluxResult<Vec<FluxTable>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let mut tables: Vec<FluxTable> = Vec::new();
    let mut pending = PendingAnnotations::default();
    let mut section: Option<Section> = None;
    let mut current_table_id: Option<String> = None;

    for row in reader.records() {
        let row = row.map_err(|e| InfluxError::Decode(format!("Invalid CSV: {e}")))?;
        let first = row.get(0).unwrap_or_default();

        if let Some(annotation) = first.strip_prefix('#') {
            // An annotation always opens a new table block.
            section = None;
            current_table_id = None;
            let cells: Vec<String> = row.iter().skip(1).map(str::to_string).collect();
            match annotation {
                "datatype" => pending.data_types = cells,
                "group" => pending.groups = cells,
                "default" => pending.defaults = cells,
                other => tracing::debug!(annotation = other, "Ignoring unknown annotation"),
            }
            continue;
        }

        if row.iter().all(str::is_empty) {
            continue;
        }

        let Some(current) = &section else {
            section = Some(header_section(&row, &std::mem::take(&mut pending)));
            continue;
        };

        let columns = match current {
            Section::Error => return Err(error_from_row(&row)),
            Section::Data(columns) => columns,
        };

        let table_id = columns
            .iter()
            .find(|c| c.name == "table")
            .and_then(|c| row.get(c.index + 1))
            .unwrap_or_default()
            .to_string();

        if tables.is_empty() || current_table_id.as_deref() != Some(table_id.as_str()) {
            tables.push(FluxTable {
                metadata: FluxTableMetadata {
                    position: tables.len(),
                    columns: columns.clone(),
                },
                records: Vec::new(),
            });
            current_table_id = Some(table_id);
        }

        let position = tables.len() - 1;
        let mut values = BTreeMap::new();
        for column in columns {
            let raw = row.get(column.index + 1).unwrap_or_default();
            let raw = if raw.is_empty() {
                column.default_value.as_str()
            } else {
                raw
            };
            values.insert(column.name.clone(), parse_value(raw, &column.data_type)?);
        }

        tables[position].records.push(FluxRecord {
            table: position,
            values,
        });
    }

    Ok(tables)
}

fn header_section(row: &csv::StringRecord, annotations: &PendingAnnotations) -> Section {
    let names: Vec<&str> = row.iter().skip(1).collect();
    if names.first() == Some(&"error") {
        return Section::Error;
    }

    if annotations.is_empty() {
        tracing::debug!("Query response has no annotations, treating all columns as strings");
    }

    let columns = names
        .iter()
        .enumerate()
        .map(|(index, name)| FluxColumn {
            index,
            name: (*name).to_string(),
            data_type: annotations
                .data_types
                .get(index)
                .cloned()
                .unwrap_or_else(|| "string".to_string()),
            group: annotations.groups.get(index).is_some_and(|g| g == "true"),
            default_value: annotations.defaults.get(index).cloned().unwrap_or_default(),
        })
        .collect();

    Section::Data(columns)
}

fn error_from_row(row: &csv::StringRecord) -> InfluxError {
    let message = row.get(1).unwrap_or_default().to_string();
    let reference = row
        .get(2)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    InfluxError::Query { message, reference }
}

fn parse_value(raw: &str, data_type: &str) -> InfluxResult<FluxValue> {
    if raw.is_empty() {
        return Ok(FluxValue::Null);
    }

    let invalid = |e: &dyn fmt::Display| {
        InfluxError::Decode(format!("Invalid {data_type} value '{raw}': {e}"))
    };

    let value = match data_type {
        "long" => FluxValue::Long(raw.parse().map_err(|e| invalid(&e))?),
        "unsignedLong" => FluxValue::UnsignedLong(raw.parse().map_err(|e| invalid(&e))?),
        "double" => FluxValue::Double(match raw {
            "+Inf" => f64::INFINITY,
            "-Inf" => f64::NEG_INFINITY,
            _ => raw.parse().map_err(|e| invalid(&e))?,
        }),
        "boolean" => FluxValue::Bool(raw.eq_ignore_ascii_case("true")),
        t if t.starts_with("dateTime") => FluxValue::Time(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| invalid(&e))?
                .with_timezone(&Utc),
        ),
        // string, duration, base64Binary and anything newer stay textual.
        _ => FluxValue::String(raw.to_string()),
    };

    Ok(value)
}
