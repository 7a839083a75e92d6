//! Configuration-wide reference checks: duplicate field names, dangling
//! references and dependency cycles.
//!
//! An edge `A -> B` means A's visibility or enabled state depends on B,
//! either through `A.dependency.parent == B` or through a `showIf` (including
//! nested `and` / `or` rules) that reads B. These checks run once per
//! analysis, not per example state.

use crate::finding::Finding;
use crate::types::{Configuration, FieldRef};
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// Directed field dependency graph in declaration order.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph; references to unknown fields are left out.
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let mut graph = DependencyGraph::default();
        for field_ref in configuration.fields() {
            if !graph.edges.contains_key(field_ref.name()) {
                graph.nodes.push(field_ref.name().to_string());
                graph.edges.insert(field_ref.name().to_string(), Vec::new());
            }
        }

        for field_ref in configuration.fields() {
            let field = field_ref.field;
            let parent = field.dependency.as_ref().map(|d| d.parent.as_str());
            let from_show_if = field
                .show_if
                .as_ref()
                .map(|rule| rule.referenced_fields())
                .unwrap_or_default();

            for target in parent.into_iter().chain(from_show_if) {
                if !graph.edges.contains_key(target) {
                    continue;
                }
                if let Some(out) = graph.edges.get_mut(&field.name)
                    && !out.iter().any(|t| t == target)
                {
                    out.push(target.to_string());
                }
            }
        }
        graph
    }

    pub fn dependencies_of(&self, node: &str) -> &[String] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every cycle reachable by depth-first search from each unvisited node,
    /// as the path slice from the revisited node to the current one.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut visited = HashSet::new();
        let mut cycles = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node.as_str()) {
                self.dfs_detect_cycle(node, &mut visited, &mut cycles);
            }
        }
        cycles
    }

    /// Depth-first search from `start` with an explicit stack, so chain
    /// length never bounds the call depth. Each frame is a node on the
    /// current path plus the index of its next unexplored edge.
    fn dfs_detect_cycle<'a>(
        &'a self,
        start: &'a str,
        visited: &mut HashSet<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        let mut recursion_stack: HashSet<&'a str> = HashSet::new();
        let mut current_path: Vec<&'a str> = Vec::new();
        let mut frames: Vec<(&'a str, usize)> = Vec::new();

        visited.insert(start);
        recursion_stack.insert(start);
        current_path.push(start);
        frames.push((start, 0));

        while let Some(&(node, next_edge)) = frames.last() {
            let edges = self.dependencies_of(node);
            let Some(next) = edges.get(next_edge).map(String::as_str) else {
                frames.pop();
                recursion_stack.remove(node);
                current_path.pop();
                continue;
            };
            if let Some(frame) = frames.last_mut() {
                frame.1 += 1;
            }

            if !visited.contains(next) {
                visited.insert(next);
                recursion_stack.insert(next);
                current_path.push(next);
                frames.push((next, 0));
            } else if recursion_stack.contains(next)
                && let Some(from) = current_path.iter().position(|n| *n == next)
            {
                cycles.push(current_path[from..].iter().map(|s| s.to_string()).collect());
            }
        }
    }
}

/// Dependency cycles of the configuration, each an ordered list of field names.
pub fn detect_cycles(configuration: &Configuration) -> Vec<Vec<String>> {
    DependencyGraph::from_configuration(configuration).detect_cycles()
}

/// All configuration-wide reference findings: duplicates, dangling
/// references, then cycles.
pub fn reference_findings(configuration: &Configuration) -> Vec<Finding> {
    let mut findings = duplicate_findings(configuration);
    findings.extend(dangling_findings(configuration));
    findings.extend(cycle_findings(configuration));
    findings
}

// ─── Duplicates ─────────────────────────────────────────────────────────────

fn duplicate_findings(configuration: &Configuration) -> Vec<Finding> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<FieldRef<'_>>)> = Vec::new();
    for field_ref in configuration.fields() {
        match index.get(field_ref.name()) {
            Some(&i) => groups[i].1.push(field_ref),
            None => {
                index.insert(field_ref.name(), groups.len());
                groups.push((field_ref.name(), vec![field_ref]));
            }
        }
    }

    groups
        .into_iter()
        .filter(|(_, refs)| refs.len() > 1)
        .map(|(name, refs)| {
            let mut finding = Finding::error(format!("Duplicate field name '{}'", name)).explain(
                format!(
                    "'{}' is declared {} times. Field names must be unique across all steps: \
                     values, visibility and payload entries of the copies overwrite each other.",
                    name,
                    refs.len()
                ),
            );
            for r in &refs {
                finding = finding.at(r.property_path("name"));
            }
            let second = &refs[1];
            finding
                .fix(format!(
                    "Rename the second declaration: set {}.name to \"{}_{}\" and update any \
                     showIf / dependency.parent that should point at it.",
                    second.path(),
                    name,
                    refs.len()
                ))
                .fix(format!(
                    "If the copies are variants of one question, keep a single '{}' and switch \
                     its label or options with showIf on the fields that differ.",
                    name
                ))
        })
        .collect()
}

// ─── Dangling references ────────────────────────────────────────────────────

fn dangling_findings(configuration: &Configuration) -> Vec<Finding> {
    let known: Vec<&str> = configuration.fields().map(|f| f.name()).collect();
    let declared: HashSet<&str> = known.iter().copied().collect();
    let mut findings = Vec::new();

    for field_ref in configuration.fields() {
        let field = field_ref.field;

        if let Some(dep) = &field.dependency
            && !declared.contains(dep.parent.as_str())
        {
            findings.push(dangling(
                &field_ref,
                &dep.parent,
                field_ref.property_path("dependency.parent"),
                &known,
            ));
        }

        if let Some(rule) = &field.show_if {
            let mut reported: Vec<&str> = Vec::new();
            for target in rule.referenced_fields() {
                if declared.contains(target) || reported.contains(&target) {
                    continue;
                }
                reported.push(target);
                findings.push(dangling(
                    &field_ref,
                    target,
                    field_ref.property_path("showIf"),
                    &known,
                ));
            }
        }
    }
    findings
}

fn dangling(field_ref: &FieldRef<'_>, target: &str, at: String, known: &[&str]) -> Finding {
    let suggestion = closest_name(target, known)
        .map(|n| format!("\"{}\"", n))
        .unwrap_or_else(|| "an existing field name".to_string());
    Finding::error(format!(
        "Field '{}' references unknown field '{}'",
        field_ref.name(),
        target
    ))
    .explain(format!(
        "{} points at '{}', which is not declared anywhere in the configuration. The \
         condition always sees an absent value, so the field's visibility never reacts to input.",
        at, target
    ))
    .at(field_ref.path())
    .at(at.clone())
    .fix(format!("Correct the reference at {}: replace '{}' with {}.", at, target, suggestion))
    .fix(format!(
        "Or declare the missing field, e.g. add {} to the step that precedes '{}'.",
        json!({"name": target, "type": "text"}),
        field_ref.name()
    ))
}

/// Case-insensitive match first, then the longest shared prefix.
fn closest_name<'a>(target: &str, known: &[&'a str]) -> Option<&'a str> {
    let lower = target.to_lowercase();
    if let Some(exact) = known.iter().find(|n| n.to_lowercase() == lower) {
        return Some(exact);
    }
    known
        .iter()
        .map(|n| {
            let shared = n
                .to_lowercase()
                .chars()
                .zip(lower.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (shared, *n)
        })
        .filter(|(shared, _)| *shared >= 3)
        .max_by_key(|(shared, _)| *shared)
        .map(|(_, n)| n)
}

// ─── Cycles ─────────────────────────────────────────────────────────────────

fn cycle_findings(configuration: &Configuration) -> Vec<Finding> {
    detect_cycles(configuration)
        .into_iter()
        .map(|cycle| {
            let mut chain = cycle.clone();
            if let Some(first) = cycle.first() {
                chain.push(first.clone());
            }
            let mut finding = Finding::error(format!("Dependency cycle: {}", chain.join(" -> ")))
                .explain(format!(
                    "Each field's visibility or enabled state depends on the next: {}. No \
                     evaluation order can settle these fields, so they may flicker, stay \
                     hidden or reset each other forever.",
                    chain.join(" -> ")
                ));
            for name in &cycle {
                if let Some(f) = configuration.field(name) {
                    finding = finding.at(f.path());
                }
            }

            // The closing edge: last field in the cycle back to the first.
            let (Some(last), Some(first)) = (cycle.last(), cycle.first()) else {
                return finding;
            };
            let closing = configuration
                .field(last)
                .map(|f| relation_path(&f, first))
                .unwrap_or_else(|| last.clone());
            finding
                .fix(format!(
                    "Break the closing edge: remove or rewrite {} so '{}' no longer depends on '{}'.",
                    closing, last, first
                ))
                .fix(format!(
                    "Or gate '{}' on a field outside the cycle, e.g. set its showIf to {}.",
                    first,
                    json!({"field": "<field outside the cycle>", "operator": "isNotEmpty"})
                ))
        })
        .collect()
}

/// JSON path of the property that makes `field` depend on `target`.
fn relation_path(field: &FieldRef<'_>, target: &str) -> String {
    match &field.field.dependency {
        Some(dep) if dep.parent == target => field.property_path("dependency.parent"),
        _ => field.property_path("showIf"),
    }
}
