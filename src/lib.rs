//! Static analysis for dynamic-form configurations.
//!
//! A configuration describes a multi-step form: fields, conditional
//! visibility (`showIf`), parent/child dependencies, option data sources and
//! a submit mapping. This crate simulates the form against example states
//! and reports the defects it finds as [`Finding`]s:
//!
//! ```text
//! parse_*(text) → AnalysisInput → Engine::run → RunReport { findings }
//!                                               → serialize_findings → JSON artifact
//! ```
//!
//! Built-in rules (in reporting order): required-hidden, mutually-exclusive,
//! impossible-combo, schema-drift, version-break. Duplicate names, dangling
//! references and dependency cycles are checked once per run.
//!
//! # Quick Start
//!
//! ```rust
//! let config = r#"{
//!   "steps": [{"fields": [
//!     {"name": "plan", "type": "select", "defaultValue": "free"},
//!     {"name": "card", "type": "text", "validation": {"required": true},
//!      "showIf": {"field": "plan", "operator": "equals", "value": "pro"}}
//!   ]}]
//! }"#;
//!
//! let report = formdebug::analyze(config, None, None).expect("readable documents");
//! assert!(report.summary().has_errors());
//! assert!(report.findings[0].title.contains("hidden"));
//! ```
//!
//! # Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cel-eval` | yes     | CEL evaluation of `expression` cross-field rules via the [`cel`] crate. |
//! | `cli`      | no      | The `formdebug` binary (`clap`, `tracing-subscriber`). |

pub mod condition;
pub mod engine;
pub mod enums;
pub mod error;
pub mod finding;
pub mod format;
pub mod graph;
pub mod parse;
pub mod payload;
pub mod primitives;
pub mod rules;
pub mod serialize;
pub mod simulate;
pub mod structure;
pub mod types;

pub use engine::{AnalysisInput, Engine, EngineOptions, RunReport, RuleTiming, write_artifact};
pub use enums::Severity;
pub use error::*;
pub use finding::{Finding, Summary};
pub use format::{format_finding, format_summary};
pub use graph::detect_cycles;
pub use parse::{parse_configuration, parse_example_states, parse_invariants};
pub use rules::{DetectionRule, RuleContext};
pub use serialize::{parse_findings, serialize_findings};
pub use types::*;

/// Convenience entry point: parse the documents and run the default engine.
///
/// `invariants` and `states` may be omitted; an omitted states document
/// probes the configuration's defaults.
///
/// # Errors
///
/// Returns the [`ParseError`] of the first document that cannot be read.
pub fn analyze(
    configuration: &str,
    invariants: Option<&str>,
    states: Option<&str>,
) -> Result<RunReport, ParseError> {
    let input = AnalysisInput::from_text(configuration, invariants, states)?;
    Ok(Engine::default().run(&input))
}
