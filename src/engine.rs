//! Analysis orchestration: structure checks, per-state rules, reference checks.

use crate::error::{DocumentKind, LoadError, ParseError};
use crate::finding::{Finding, Summary};
use crate::graph::reference_findings;
use crate::parse::{Parsed, parse_configuration, parse_example_states, parse_invariants};
use crate::rules::{DetectionRule, RuleContext, default_rules};
use crate::serialize::serialize_findings;
use crate::simulate::simulate;
use crate::structure::structure_findings;
use crate::types::{Configuration, ExampleState, ExampleStates, Invariants, ValueMap};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Description of the state probed when no example states are supplied.
pub const DEFAULT_PROBE: &str = "defaults";

/// Run-time switches for an [`Engine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Probe one empty "defaults" state when the example states are empty.
    pub probe_defaults_when_no_states: bool,
    /// Rule ids to skip, e.g. `version-break`.
    pub disabled_rules: Vec<String>,
    /// Where [`Engine::run_files`] writes the findings artifact, if anywhere.
    pub artifact_path: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            probe_defaults_when_no_states: true,
            disabled_rules: Vec::new(),
            artifact_path: None,
        }
    }
}

/// The three input documents plus the findings produced while loading them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisInput {
    pub configuration: Configuration,
    pub invariants: Invariants,
    pub states: ExampleStates,
    pub load_findings: Vec<Finding>,
}

impl AnalysisInput {
    pub fn new(configuration: Configuration, invariants: Invariants, states: ExampleStates) -> Self {
        Self {
            configuration,
            invariants,
            states,
            load_findings: Vec::new(),
        }
    }

    /// Combines leniently parsed documents, keeping their skip findings.
    pub fn from_parsed(
        configuration: Parsed<Configuration>,
        invariants: Parsed<Invariants>,
        states: Parsed<ExampleStates>,
    ) -> Self {
        let mut load_findings = configuration.findings;
        load_findings.extend(invariants.findings);
        load_findings.extend(states.findings);
        Self {
            configuration: configuration.document,
            invariants: invariants.document,
            states: states.document,
            load_findings,
        }
    }

    /// Parses all three documents from text.
    pub fn from_text(
        configuration: &str,
        invariants: Option<&str>,
        states: Option<&str>,
    ) -> Result<Self, ParseError> {
        let configuration = parse_configuration(configuration)?;
        let invariants = match invariants {
            Some(text) => parse_invariants(text)?,
            None => Parsed::default(),
        };
        let states = match states {
            Some(text) => parse_example_states(text)?,
            None => Parsed::default(),
        };
        Ok(Self::from_parsed(configuration, invariants, states))
    }
}

/// Time spent by one rule on one example state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTiming {
    pub rule: &'static str,
    pub state: String,
    pub elapsed: Duration,
}

/// Outcome of [`Engine::run`].
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub findings: Vec<Finding>,
    pub timings: Vec<RuleTiming>,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        Summary::of(&self.findings)
    }
}

/// Runs the registered detection rules over every example state.
pub struct Engine {
    rules: Vec<Box<dyn DetectionRule>>,
    options: EngineOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    /// An engine with the five built-in rules.
    pub fn new(options: EngineOptions) -> Self {
        Self::with_rules(default_rules(), options)
    }

    pub fn with_rules(rules: Vec<Box<dyn DetectionRule>>, options: EngineOptions) -> Self {
        Self { rules, options }
    }

    pub fn run(&self, input: &AnalysisInput) -> RunReport {
        let mut report = RunReport::default();
        report.findings.extend(input.load_findings.iter().cloned());
        report
            .findings
            .extend(structure_findings(&input.configuration));

        let implicit;
        let states: &[ExampleState] = if input.states.states.is_empty()
            && self.options.probe_defaults_when_no_states
        {
            implicit = [ExampleState::new(DEFAULT_PROBE, ValueMap::new())];
            &implicit
        } else {
            &input.states.states
        };

        for example in states {
            let state = simulate(&input.configuration, &example.values);
            tracing::debug!(state = %example.description, "simulated example state");

            let ctx = RuleContext {
                configuration: &input.configuration,
                invariants: &input.invariants,
                state: &state,
                example,
            };

            for rule in &self.rules {
                if self.options.disabled_rules.iter().any(|id| id == rule.id()) {
                    continue;
                }
                let started = Instant::now();
                let findings = run_isolated(rule.as_ref(), &ctx);
                let elapsed = started.elapsed();
                tracing::debug!(
                    rule = rule.id(),
                    state = %example.description,
                    findings = findings.len(),
                    ?elapsed,
                    "rule finished"
                );
                report.timings.push(RuleTiming {
                    rule: rule.id(),
                    state: example.description.clone(),
                    elapsed,
                });
                report.findings.extend(findings);
            }
        }

        report
            .findings
            .extend(reference_findings(&input.configuration));

        let summary = report.summary();
        tracing::info!(
            states = states.len(),
            errors = summary.errors,
            warnings = summary.warnings,
            infos = summary.infos,
            "analysis complete"
        );
        report
    }

    /// Loads the documents from disk, runs the analysis and writes the
    /// artifact when [`EngineOptions::artifact_path`] is set.
    ///
    /// Read and syntax failures are returned before any rule runs.
    pub fn run_files(
        &self,
        configuration: &Path,
        invariants: Option<&Path>,
        states: Option<&Path>,
    ) -> Result<RunReport, LoadError> {
        let configuration = load(configuration, DocumentKind::Configuration, parse_configuration)?;
        let invariants = match invariants {
            Some(path) => load(path, DocumentKind::Invariants, parse_invariants)?,
            None => Parsed::default(),
        };
        let states = match states {
            Some(path) => load(path, DocumentKind::ExampleStates, parse_example_states)?,
            None => Parsed::default(),
        };

        let report = self.run(&AnalysisInput::from_parsed(configuration, invariants, states));
        if let Some(path) = &self.options.artifact_path {
            write_artifact(path, &report.findings)?;
        }
        Ok(report)
    }
}

fn load<T>(
    path: &Path,
    document: DocumentKind,
    parse: fn(&str) -> Result<Parsed<T>, ParseError>,
) -> Result<Parsed<T>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        document,
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persists findings as the JSON artifact.
pub fn write_artifact(path: &Path, findings: &[Finding]) -> Result<(), LoadError> {
    let json = serialize_findings(findings)?;
    std::fs::write(path, json).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs one rule, turning an `Err` or a panic into a single error finding.
fn run_isolated(rule: &dyn DetectionRule, ctx: &RuleContext<'_>) -> Vec<Finding> {
    let reason = match catch_unwind(AssertUnwindSafe(|| rule.detect(ctx))) {
        Ok(Ok(findings)) => return findings,
        Ok(Err(e)) => e.message,
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    tracing::warn!(rule = rule.id(), state = %ctx.example.description, %reason, "rule failed");

    vec![
        Finding::error(format!("Rule '{}' failed", rule.id()))
            .explain(format!(
                "{} could not finish on state '{}': {}. Other rules were not affected.",
                rule.title(),
                ctx.example.description,
                reason
            ))
            .reproducer(&ctx.example.values)
            .fix(format!(
                "Inspect the inputs this state feeds to '{}' and correct the value named in \
                 the message above.",
                rule.id()
            ))
            .fix(format!(
                "Rerun with --disable-rule {} to analyze the remaining rules meanwhile.",
                rule.id()
            )),
    ]
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
