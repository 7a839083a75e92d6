//! Detection rules run against every simulated example state.
//!
//! Each rule is a stateless value implementing [`DetectionRule`]. Rules never
//! see each other's findings, so the registry order only fixes the order in
//! which findings are reported.

use crate::error::RuleError;
use crate::finding::Finding;
use crate::simulate::SimulatedState;
use crate::types::{Configuration, ExampleState, Invariants};

pub mod impossible_combo;
pub mod mutually_exclusive;
pub mod required_hidden;
pub mod schema_drift;
pub mod version_break;

pub use impossible_combo::ImpossibleCombo;
pub use mutually_exclusive::MutuallyExclusive;
pub use required_hidden::RequiredHidden;
pub use schema_drift::SchemaDrift;
pub use version_break::VersionBreak;

/// Everything a rule may look at for one example state.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    pub configuration: &'a Configuration,
    pub invariants: &'a Invariants,
    pub state: &'a SimulatedState,
    /// The probe that produced `state`; its values are the reproducer.
    pub example: &'a ExampleState,
}

/// A check over one simulated state.
///
/// Missing optional structure yields no findings, never an error. An `Err`
/// is reserved for a rule that cannot complete; the engine reports it as a
/// single error finding and carries on.
pub trait DetectionRule: Send + Sync {
    /// Stable kebab-case identifier, e.g. `required-hidden`.
    fn id(&self) -> &'static str;

    /// Short human-readable name.
    fn title(&self) -> &'static str;

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError>;
}

/// The five built-in rules in their fixed reporting order.
pub fn default_rules() -> Vec<Box<dyn DetectionRule>> {
    vec![
        Box::new(RequiredHidden),
        Box::new(MutuallyExclusive),
        Box::new(ImpossibleCombo),
        Box::new(SchemaDrift),
        Box::new(VersionBreak),
    ]
}
