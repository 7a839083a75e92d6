//! Findings ⇄ JSON artifact.

use crate::error::{DocumentKind, ParseError, ParseErrorKind, SerializeError};
use crate::finding::Finding;

/// Serialize findings to a pretty-printed JSON array.
///
/// Each finding's keys are emitted as `severity, title, explanation,
/// jsonPaths, reproducerState, fixGuidance`; reproducer maps keep the
/// insertion order of the example state.
pub fn serialize_findings(findings: &[Finding]) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(findings).map_err(|e| SerializeError {
        message: format!("failed to serialize findings: {}", e),
    })
}

/// Read an artifact written by [`serialize_findings`].
pub fn parse_findings(input: &str) -> Result<Vec<Finding>, ParseError> {
    serde_json::from_str(input).map_err(|e| ParseError {
        kind: if e.is_syntax() || e.is_eof() {
            ParseErrorKind::Syntax
        } else {
            ParseErrorKind::TypeMismatch
        },
        document: DocumentKind::Findings,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueMap;
    use serde_json::json;

    #[test]
    fn key_order_is_stable() {
        let mut state = ValueMap::new();
        state.insert("zeta".into(), json!(1));
        state.insert("alpha".into(), json!(2));
        let finding = Finding::warning("t")
            .explain("e")
            .at("steps[0].fields[0]")
            .reproducer(&state)
            .fix("f");
        let out = serialize_findings(&[finding]).unwrap();
        let order = ["\"severity\"", "\"title\"", "\"explanation\"", "\"jsonPaths\"", "\"reproducerState\"", "\"fixGuidance\""];
        let positions: Vec<usize> = order.iter().map(|k| out.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.find("zeta").unwrap() < out.find("alpha").unwrap());
    }

    #[test]
    fn wrong_shape_is_type_mismatch() {
        let err = parse_findings(r#"[{"severity": "fatal"}]"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
        assert_eq!(err.document, DocumentKind::Findings);
    }
}
