pub mod client;
pub mod error;
pub mod models;
pub mod point;
pub mod result;

pub use client::InfluxClient;
pub use error::{InfluxError, InfluxResult};
pub use point::{FieldValue, Point};
pub use result::{FluxRecord, FluxTable, FluxValue};
