use serde_json::Value as JsonValue;

use crate::data::model::Feature;

// ---------------------------------------------------------------------------
// Filter expressions, MapLibre syntax subset
// ---------------------------------------------------------------------------

/// Evaluate a filter expression against a feature.
///
/// Supported forms: boolean literals, `["==", a, b]`, `["!=", a, b]`,
/// `["!", e]`, `["all", ...]`, `["any", ...]`, `["has", prop]`, with operands
/// being literals or `["get", prop]`. Anything else rejects the feature.
pub fn evaluate(expr: &JsonValue, feature: &Feature) -> bool {
    match expr {
        JsonValue::Bool(b) => *b,
        JsonValue::Array(items) => {
            let Some(op) = items.first().and_then(JsonValue::as_str) else {
                return false;
            };
            let args = &items[1..];
            match (op, args) {
                ("==", [a, b]) => operand(a, feature) == operand(b, feature),
                ("!=", [a, b]) => operand(a, feature) != operand(b, feature),
                ("!", [e]) => !evaluate(e, feature),
                ("all", _) => args.iter().all(|e| evaluate(e, feature)),
                ("any", _) => args.iter().any(|e| evaluate(e, feature)),
                ("has", [JsonValue::String(prop)]) => feature.property(prop).is_some(),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Resolve an operand to a JSON value; `["get", p]` reads a property.
fn operand(expr: &JsonValue, feature: &Feature) -> JsonValue {
    if let JsonValue::Array(items) = expr {
        if let [JsonValue::String(op), JsonValue::String(prop)] = items.as_slice() {
            if op == "get" {
                return feature
                    .property(prop)
                    .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string()));
            }
        }
    }
    expr.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{predicate, CategoryFilter};
    use crate::data::model::Geometry;
    use serde_json::json;

    fn feature(pairs: &[(&str, &str)]) -> Feature {
        Feature {
            properties: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            geometry: Geometry::Absent,
        }
    }

    #[test]
    fn equality_on_properties() {
        let f = feature(&[("mango", "TRUE"), ("language", "en")]);
        assert!(evaluate(&json!(["==", ["get", "mango"], "TRUE"]), &f));
        assert!(!evaluate(&json!(["==", ["get", "maplibre"], "TRUE"]), &f));
        assert!(evaluate(&json!(["!=", ["get", "language"], "fr"]), &f));
        assert!(evaluate(&json!(["has", "language"]), &f));
        assert!(!evaluate(&json!(["!", ["has", "language"]]), &f));
    }

    #[test]
    fn combinators() {
        let f = feature(&[("mango", "TRUE"), ("maptiler", "FALSE")]);
        let both = json!([
            "all",
            ["==", ["get", "mango"], "TRUE"],
            ["==", ["get", "maptiler"], "TRUE"]
        ]);
        let either = json!([
            "any",
            ["==", ["get", "mango"], "TRUE"],
            ["==", ["get", "maptiler"], "TRUE"]
        ]);
        assert!(!evaluate(&both, &f));
        assert!(evaluate(&either, &f));
        assert!(!evaluate(&json!(["bogus"]), &f));
        assert!(evaluate(&json!(true), &f));
    }

    #[test]
    fn agrees_with_category_predicate() {
        let features = [
            feature(&[("mango", "TRUE")]),
            feature(&[("mango", "true")]),
            feature(&[("maplibre", "TRUE")]),
            feature(&[]),
        ];
        for category in CategoryFilter::ALL {
            let accepts = predicate(category);
            for f in &features {
                let by_expr = category.expression().map_or(true, |e| evaluate(&e, f));
                assert_eq!(by_expr, accepts(f), "{category} on {:?}", f.properties);
            }
        }
    }
}
