//! Configuration version behind the contract's current version.

use super::{DetectionRule, RuleContext};
use crate::error::RuleError;
use crate::finding::Finding;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-+][0-9A-Za-z.+-]*)?$").unwrap()
});

const VERSION_PATH: &str = "metadata.version";

pub struct VersionBreak;

/// `major.minor.patch`; missing components are zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn parse(input: &str) -> Option<Version> {
        let caps = VERSION_RE.captures(input.trim())?;
        let part = |i: usize| -> Option<u64> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(Version {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

impl DetectionRule for VersionBreak {
    fn id(&self) -> &'static str {
        "version-break"
    }

    fn title(&self) -> &'static str {
        "Version break"
    }

    fn detect(&self, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Some(versioning) = &ctx.invariants.versioning else {
            return Ok(Vec::new());
        };
        let Some(current) = versioning.current_version.as_deref() else {
            return Ok(Vec::new());
        };
        let guide = versioning
            .migration_guide
            .clone()
            .unwrap_or_else(|| format!("the migration notes for {}", current));

        let Some(declared) = ctx.configuration.version() else {
            return Ok(vec![
                Finding::info("Configuration declares no version")
                    .explain(format!(
                        "The contract's current version is {}, but the configuration has no \
                         metadata.version, so version compatibility cannot be checked.",
                        current
                    ))
                    .at(VERSION_PATH)
                    .reproducer(&ctx.example.values)
                    .fix(format!(
                        "Add \"metadata\": {{\"version\": \"{}\"}} once the configuration has \
                         been reviewed against {}.",
                        current, guide
                    ))
                    .fix("Bump metadata.version on every schema change so consumers can detect breaks."),
            ]);
        };

        let (Some(before), Some(after)) = (Version::parse(declared), Version::parse(current)) else {
            return Ok(vec![
                Finding::info("Unparseable version string")
                    .explain(format!(
                        "Cannot compare configuration version '{}' with current version '{}'; \
                         both must look like MAJOR.MINOR.PATCH.",
                        declared, current
                    ))
                    .at(VERSION_PATH)
                    .reproducer(&ctx.example.values)
                    .fix(format!(
                        "Rewrite metadata.version as a semantic version, e.g. \"{}\".",
                        Version::parse(current)
                            .map(|v| format!("{}.{}.{}", v.major, v.minor, v.patch))
                            .unwrap_or_else(|| "1.0.0".to_string())
                    ))
                    .fix("Rewrite invariants.versioning.currentVersion the same way, e.g. \"2.0.0\"."),
            ]);
        };

        if before == after {
            return Ok(Vec::new());
        }

        let finding = if after.major > before.major {
            Finding::warning(format!("Breaking version change {} -> {}", declared, current))
                .explain(format!(
                    "The configuration declares version {} but the contract is at {}: a major \
                     bump. Payload shape or field semantics may have changed incompatibly. \
                     Migration guidance: {}.",
                    declared, current, guide
                ))
                .fix(format!(
                    "Review the configuration against {} and then set metadata.version to \"{}\".",
                    guide, current
                ))
                .fix(format!(
                    "Until migrated, pin invariants.versioning.currentVersion to \"{}.x\" for \
                     this configuration so the old contract is checked.",
                    before.major
                ))
        } else {
            let direction = match before.cmp(&after) {
                Ordering::Less => "behind",
                _ => "ahead of",
            };
            Finding::info(format!("Version differs: {} vs {}", declared, current))
                .explain(format!(
                    "The configuration declares version {}, {} the contract's {} without a \
                     major change. See {}.",
                    declared, direction, current, guide
                ))
                .fix(format!(
                    "Set metadata.version to \"{}\" after checking the changes listed in {}.",
                    current, guide
                ))
                .fix(format!(
                    "If the configuration is intentionally {} the contract, document it in \
                     metadata.description (e.g. \"targets contract {}\").",
                    direction, declared
                ))
        };

        Ok(vec![
            finding.at(VERSION_PATH).reproducer(&ctx.example.values),
        ])
    }
}
