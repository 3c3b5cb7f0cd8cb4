//! Mapping of raw AIDA64 identifiers onto canonical sensor ids.
//!
//! Each numeric record is checked against three independent classifications:
//! the identifier table (one record, one sensor), the pattern groups
//! (many records folded into max/min), and the indexed disk-temperature
//! pattern (one sensor per matching record, numbered in encounter order).

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use homestats_common::Sensor;

use crate::parser::RawRecord;

/// Sensor table errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Pattern '{0}' has an empty canonical prefix")]
    EmptyPrefix(String),

    #[error("Identifier '{0}' maps to an empty canonical id")]
    EmptyId(String),

    #[error("Canonical id '{0}' would be produced more than once per cycle")]
    DuplicateId(String),

    #[error("Pattern groups matched no sensors in the startup snapshot: {}", .0.join(", "))]
    UnmatchedGroups(Vec<String>),
}

/// A pattern folded into `{prefix}max` / `{prefix}min`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternGroupConfig {
    pub pattern: String,
    pub prefix: String,
}

/// A pattern whose matches are published as `{prefix}1`, `{prefix}2`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedGroupConfig {
    pub pattern: String,
    pub prefix: String,
}

/// The identifier and pattern tables handed to the classifier.
///
/// Missing sections fall back to the reference tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorTableConfig {
    /// Raw identifier to canonical id.
    pub identifiers: HashMap<String, String>,

    /// Max/min groups, in publication order.
    pub groups: Vec<PatternGroupConfig>,

    /// Per-disk temperatures.
    pub disk_temperature: IndexedGroupConfig,
}

const REFERENCE_IDENTIFIERS: &[(&str, &str)] = &[
    ("SCPUCK", "[sys][cpu]_clock"),
    ("SCPUUTI", "[sys][cpu]_utilization"),
    ("SUSEDMEM", "[sys][mem]_usage"),
    ("SMEMCLK", "[sys][mem]_clock"),
    ("SUSEDVMEM", "[sys][gpu]_mem_usage"),
    ("SGPU1MEMCLK", "[sys][gpu]_mem_clock"),
    ("SGPU1UTI", "[sys][gpu]_utilization"),
    ("TMOBO", "[temp][mobo]_measure"),
    ("TCHIP", "[temp][chipset]_measure"),
    ("TCPUDIO", "[temp][cpu]_measure"),
    ("TGPU1DIO", "[temp][gpu]_measure"),
    ("TGPU1HOT", "[temp][gpu]_hotspot"),
    ("FCPU", "[fan][cpu]_measure"),
    ("FGPU1", "[fan][gpu]_fan1"),
    ("FGPU1GPU2", "[fan][gpu]_fan2"),
    ("FGPU1GPU3", "[fan][gpu]_fan3"),
    ("VCPUVDD", "[voltage][cpu]_measure"),
    ("VGPU1", "[voltage][gpu]_measure"),
    ("PCPUVDD", "[wattage][cpu]_measure"),
    ("PGPU1", "[wattage][gpu]_measure"),
];

impl SensorTableConfig {
    /// Built-in tables for a single-GPU desktop.
    pub fn reference() -> Self {
        Self {
            identifiers: REFERENCE_IDENTIFIERS
                .iter()
                .map(|(raw, id)| (raw.to_string(), id.to_string()))
                .collect(),
            groups: vec![
                PatternGroupConfig {
                    pattern: "SCC-1-[0-9]+".to_string(),
                    prefix: "[sys][cpu]_clock_core_".to_string(),
                },
                PatternGroupConfig {
                    pattern: "SCPU[0-9]+UTI".to_string(),
                    prefix: "[sys][cpu]_utilization_thread_".to_string(),
                },
            ],
            disk_temperature: IndexedGroupConfig {
                pattern: "THDD[1-9][0-9]*".to_string(),
                prefix: "[temp][hdd]_hdd".to_string(),
            },
        }
    }

    /// Check the tables without building a classifier.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        SensorClassifier::new(self).map(|_| ())
    }
}

impl Default for SensorTableConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Compile a pattern so that it must match the whole identifier.
fn full_match(pattern: &str) -> Result<Regex, ClassifierError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| ClassifierError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn is_disk_id(id: &str, disk_prefix: &str) -> bool {
    id.strip_prefix(disk_prefix)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a raw value. Non-numeric and non-finite values are rejected.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A compiled max/min group and the readings collected this cycle.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    pattern: Regex,
    source: String,
    prefix: String,
    collected: Vec<f64>,
}

impl PatternGroup {
    fn new(config: &PatternGroupConfig) -> Result<Self, ClassifierError> {
        if config.prefix.is_empty() {
            return Err(ClassifierError::EmptyPrefix(config.pattern.clone()));
        }

        Ok(Self {
            pattern: full_match(&config.pattern)?,
            source: config.pattern.clone(),
            prefix: config.prefix.clone(),
            collected: Vec::new(),
        })
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Readings collected in the current cycle.
    pub fn collected(&self) -> &[f64] {
        &self.collected
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.pattern.is_match(identifier)
    }

    pub fn max_id(&self) -> String {
        format!("{}max", self.prefix)
    }

    pub fn min_id(&self) -> String {
        format!("{}min", self.prefix)
    }
}

/// Output of one classification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Sensors from the identifier table, in record order.
    pub sensors: Vec<Sensor>,
    /// Disk temperatures, in record order.
    pub disk_temps: Vec<f64>,
}

/// Classifies the records of one snapshot.
///
/// Owns the per-cycle group buffers; every call to [`classify`](Self::classify)
/// starts them from empty.
#[derive(Debug, Clone)]
pub struct SensorClassifier {
    identifiers: HashMap<String, String>,
    groups: Vec<PatternGroup>,
    disk_pattern: Regex,
    disk_prefix: String,
}

impl SensorClassifier {
    /// Compile the tables.
    pub fn new(config: &SensorTableConfig) -> Result<Self, ClassifierError> {
        let mut produced = HashSet::new();
        let mut claim = |id: String| {
            if produced.insert(id.clone()) {
                Ok(())
            } else {
                Err(ClassifierError::DuplicateId(id))
            }
        };

        for (raw, id) in &config.identifiers {
            if id.is_empty() {
                return Err(ClassifierError::EmptyId(raw.clone()));
            }
            claim(id.clone())?;
        }

        let groups = config
            .groups
            .iter()
            .map(PatternGroup::new)
            .collect::<Result<Vec<_>, _>>()?;

        for group in &groups {
            claim(group.max_id())?;
            claim(group.min_id())?;
        }

        let disk = &config.disk_temperature;
        if disk.prefix.is_empty() {
            return Err(ClassifierError::EmptyPrefix(disk.pattern.clone()));
        }

        // Disk ids are `{prefix}{n}`, n >= 1, so any such identifier id may collide
        if let Some(id) = config.identifiers.values().find(|id| is_disk_id(id, &disk.prefix)) {
            return Err(ClassifierError::DuplicateId(id.clone()));
        }

        Ok(Self {
            identifiers: config.identifiers.clone(),
            groups,
            disk_pattern: full_match(&disk.pattern)?,
            disk_prefix: disk.prefix.clone(),
        })
    }

    /// Groups with the readings of the last classification.
    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn disk_prefix(&self) -> &str {
        &self.disk_prefix
    }

    /// Number of entries in the identifier table.
    pub fn identifier_count(&self) -> usize {
        self.identifiers.len()
    }

    /// Clear every group buffer.
    pub fn reset(&mut self) {
        for group in &mut self.groups {
            group.collected.clear();
        }
    }

    /// Classify one snapshot's records.
    pub fn classify(&mut self, records: &[RawRecord]) -> Classification {
        self.reset();

        let mut out = Classification::default();

        for record in records {
            let Some(value) = parse_value(&record.raw_value) else {
                tracing::trace!(id = %record.identifier, raw = %record.raw_value, "Skipping non-numeric value");
                continue;
            };

            for group in &mut self.groups {
                if group.matches(&record.identifier) {
                    group.collected.push(value);
                }
            }

            if let Some(id) = self.identifiers.get(&record.identifier) {
                out.sensors.push(Sensor::new(id.clone(), value));
            }

            if self.disk_pattern.is_match(&record.identifier) {
                out.disk_temps.push(value);
            }
        }

        out
    }

    /// Check that every group collects at least one reading from `records`.
    pub fn validate(&mut self, records: &[RawRecord]) -> Result<(), ClassifierError> {
        self.classify(records);

        let unmatched: Vec<String> = self
            .groups
            .iter()
            .filter(|g| g.collected.is_empty())
            .map(|g| g.source.clone())
            .collect();

        self.reset();

        if unmatched.is_empty() {
            Ok(())
        } else {
            Err(ClassifierError::UnmatchedGroups(unmatched))
        }
    }
}
