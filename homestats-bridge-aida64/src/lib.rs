//! Zenoh bridge for AIDA64 hardware sensors.
//!
//! AIDA64 keeps a text dump of its sensor readings up to date. This bridge
//! reads that dump on a fixed interval, maps the vendor identifiers onto
//! canonical sensor ids, folds per-core and per-thread readings into max/min
//! pairs, and publishes one timestamped payload per cycle.
//!
//! # Key Expressions
//!
//! ```text
//! homestats/aida64/<hostname>/sensors
//! homestats/aida64/@/status
//! ```
//!
//! # Payload
//!
//! ```text
//! {"sent": "2026-10-16 08:15:02.125",
//!  "payload": [{"id": "[temp][cpu]_measure", "label": "", "value": 48.0}, ...]}
//! ```

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod parser;
pub mod scheduler;
pub mod sink;
pub mod snapshot;
