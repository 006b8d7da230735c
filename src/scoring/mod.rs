pub mod config;
pub mod table;
pub mod triage;

pub use config::{ConfigError, ScoringConfig, ThresholdSpec, Weight};
pub use table::{composite, ScoringTable, Verdict, MISSING_VERDICT_POINTS};
pub use triage::{LongTaskSeverity, TriageConfig};
