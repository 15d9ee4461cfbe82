//! influx-starter - getting-started sample applications for InfluxDB v2
//!
//! Each binary under `src/bin` is an independent program; this library holds
//! the pieces they share.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod influx;
pub mod logins;
pub mod queries;
pub mod routes;
pub mod server;
pub mod snippets;
