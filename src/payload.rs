//! Submission payload construction from a simulated state.
//!
//! Visible fields with a resolved value are written at their `submitField`
//! dot path (or their name), creating nested objects on the way. The
//! configuration's `submit.transforms` then run in order.

use crate::primitives::{PathConflict, cast_value, insert_path, remove_path, resolve_simple_path};
use crate::simulate::SimulatedState;
use crate::types::{Configuration, ValueMap};
use serde_json::Value;

/// A payload path written twice or blocked by a scalar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadCollision {
    pub path: String,
    /// Field names involved, in declaration order.
    pub fields: Vec<String>,
    /// JSON paths of the field definitions involved.
    pub locations: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub body: ValueMap,
    pub collisions: Vec<PayloadCollision>,
}

impl Payload {
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = self.body.get(path.split('.').next()?)?;
        if let Some((_, rest)) = path.split_once('.') {
            current = resolve_simple_path(rest, current)?;
        }
        Some(current)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

pub fn build_payload(configuration: &Configuration, state: &SimulatedState) -> Payload {
    let mut payload = Payload::default();
    // (path, field name, field location) of every write so far.
    let mut writers: Vec<(String, String, String)> = Vec::new();

    for field_ref in configuration.fields() {
        let field = field_ref.field;
        if !state.is_visible(&field.name) {
            continue;
        }
        let Some(value) = state.values.get(&field.name) else {
            continue;
        };
        let path = field.payload_path().to_string();

        if let Some((_, first, first_at)) = writers.iter().find(|(p, _, _)| *p == path) {
            record_collision(
                &mut payload.collisions,
                &path,
                [first.clone(), field.name.clone()],
                [first_at.clone(), field_ref.path()],
            );
        }

        let nested_prefix = format!("{}.", path);
        if let Some((_, nested, nested_at)) =
            writers.iter().find(|(p, _, _)| p.starts_with(&nested_prefix))
        {
            record_collision(
                &mut payload.collisions,
                &path,
                [nested.clone(), field.name.clone()],
                [nested_at.clone(), field_ref.path()],
            );
        }

        match insert_path(&mut payload.body, &path, value.clone()) {
            Ok(()) => {}
            Err(PathConflict { at }) => {
                let blocker = writers
                    .iter()
                    .find(|(p, _, _)| *p == at)
                    .map(|(_, name, loc)| (name.clone(), loc.clone()))
                    .unwrap_or_default();
                record_collision(
                    &mut payload.collisions,
                    &at,
                    [blocker.0, field.name.clone()],
                    [blocker.1, field_ref.path()],
                );
            }
        }
        writers.push((path, field.name.clone(), field_ref.path()));
    }

    if let Some(submit) = &configuration.submit {
        for transform in &submit.transforms {
            if let Some(target) = &transform.rename_to
                && let Some(moved) = remove_path(&mut payload.body, &transform.path)
            {
                // A conflicting rename leaves the value where it was.
                if insert_path(&mut payload.body, target, moved.clone()).is_err() {
                    let _ = insert_path(&mut payload.body, &transform.path, moved);
                }
            }
            if let Some(cast) = transform.cast {
                let path = transform.rename_to.as_deref().unwrap_or(&transform.path);
                let casted = payload.get(path).and_then(|v| cast_value(v, cast));
                if let Some(casted) = casted {
                    let _ = insert_path(&mut payload.body, path, casted);
                }
            }
        }
    }

    payload
}

fn record_collision(
    collisions: &mut Vec<PayloadCollision>,
    path: &str,
    fields: [String; 2],
    locations: [String; 2],
) {
    if let Some(existing) = collisions.iter_mut().find(|c| c.path == path) {
        for (name, loc) in fields.into_iter().zip(locations) {
            if !name.is_empty() && !existing.fields.contains(&name) {
                existing.fields.push(name);
                existing.locations.push(loc);
            }
        }
        return;
    }
    let (fields, locations): (Vec<String>, Vec<String>) = fields
        .into_iter()
        .zip(locations)
        .filter(|(name, _)| !name.is_empty())
        .unzip();
    collisions.push(PayloadCollision {
        path: path.to_string(),
        fields,
        locations,
    });
}
