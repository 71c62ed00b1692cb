//! Concrete adapter implementations for ports.

pub mod caching_adapter;
pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
pub mod svg_report;
