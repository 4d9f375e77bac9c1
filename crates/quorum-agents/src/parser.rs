use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

/// Closing marker of a reasoning segment emitted by "thinking" models.
pub const REASONING_DELIMITER: &str = "</think>";

const WRAPPER_MARKERS: [&str; 3] = ["```json", "```JSON", "```"];

/// Explicit failure marker: no JSON object could be recovered. Callers
/// supply their own default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no JSON object found in response (length={length})")]
pub struct ParseFailed {
    pub length: usize,
}

/// Remove code-fence markers and any reasoning segment preceding the answer.
pub fn clean_response(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in WRAPPER_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    if let Some(pos) = cleaned.rfind(REASONING_DELIMITER) {
        cleaned = cleaned[pos + REASONING_DELIMITER.len()..].to_string();
    }
    cleaned.trim().to_string()
}

/// Extract the single JSON object a provider was asked to return.
///
/// Handles:
/// - Clean JSON: `{"key": "value"}`
/// - Fenced: ```json\n{"key": "value"}\n```
/// - Reasoning first: `<think>...</think>{"key": "value"}`
/// - Prose around the object: `Here is my answer: {"key": "value"} Hope it helps.`
///
/// Never panics; every failure path ends in [`ParseFailed`].
pub fn parse_object(text: &str) -> Result<Map<String, Value>, ParseFailed> {
    let cleaned = clean_response(text);

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(map);
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                return Ok(map);
            }
        }
    }

    Err(ParseFailed { length: text.len() })
}

/// Trimmed, non-empty string field.
pub fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Decimal from a JSON number or numeric string ("0.8", "80%"). Not clamped.
pub fn decimal_field(map: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match map.get(key)? {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => parse_decimal(pct.trim()).map(|v| v / Decimal::ONE_HUNDRED),
                None => parse_decimal(s),
            }
        }
        _ => None,
    }
}

/// Positive integer from a number or the first digit run of a string ("50", "50x").
pub fn integer_field(map: &Map<String, Value>, key: &str) -> Option<u32> {
    match map.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
            .map(|v| v.min(u32::MAX as u64) as u32),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CLEAN: &str = r#"{"signal": "BUY", "confidence": 0.8, "reasoning": "RSI divergence"}"#;

    #[test]
    fn clean_json_is_idempotent() {
        let first = parse_object(CLEAN).unwrap();
        let again = parse_object(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(first, again);
        assert_eq!(first["signal"], "BUY");
    }

    #[test]
    fn fenced_and_reasoning_wrapped_recover_same_object() {
        let expected = parse_object(CLEAN).unwrap();
        let fenced = format!("```json\n{CLEAN}\n```");
        let bare_fence = format!("```\n{CLEAN}\n```");
        let thinking = format!("<think>RSI is 28, so {{maybe}} a bounce</think>\n{CLEAN}");
        let both = format!("<think>hmm</think>```json\n{CLEAN}\n```");

        for input in [fenced, bare_fence, thinking, both] {
            assert_eq!(parse_object(&input).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn prose_around_object_uses_outer_braces() {
        let input = format!("Here is my analysis:\n{CLEAN}\nLet me know if you need more.");
        assert_eq!(parse_object(&input).unwrap()["confidence"], 0.8);
    }

    #[test]
    fn nested_objects_survive_brace_extraction() {
        let input = r#"Decision: {"action": "SELL", "risk_parameters": {"leverage": 5, "stop_loss": "Tight"}} done"#;
        let map = parse_object(input).unwrap();
        assert_eq!(map["risk_parameters"]["leverage"], 5);
    }

    #[test]
    fn failures_are_explicit() {
        assert_eq!(
            parse_object("no json here"),
            Err(ParseFailed { length: 12 })
        );
        assert!(parse_object("").is_err());
        assert!(parse_object("} backwards {").is_err());
        assert!(parse_object("[1, 2, 3]").is_err());
        assert!(parse_object("{\"unterminated\": ").is_err());
    }

    #[test]
    fn decimal_field_accepts_numbers_and_strings() {
        let map = parse_object(
            r#"{"a": 0.75, "b": "0.6", "c": "85%", "d": 1e-2, "e": "high", "f": null}"#,
        )
        .unwrap();
        assert_eq!(decimal_field(&map, "a"), Some(dec!(0.75)));
        assert_eq!(decimal_field(&map, "b"), Some(dec!(0.6)));
        assert_eq!(decimal_field(&map, "c"), Some(dec!(0.85)));
        assert_eq!(decimal_field(&map, "d"), Some(dec!(0.01)));
        assert_eq!(decimal_field(&map, "e"), None);
        assert_eq!(decimal_field(&map, "f"), None);
        assert_eq!(decimal_field(&map, "missing"), None);
    }

    #[test]
    fn integer_field_accepts_loose_forms() {
        let map = parse_object(r#"{"a": 50, "b": "20x", "c": "Integer (e.g., 10)", "d": 7.6, "e": "none"}"#)
            .unwrap();
        assert_eq!(integer_field(&map, "a"), Some(50));
        assert_eq!(integer_field(&map, "b"), Some(20));
        assert_eq!(integer_field(&map, "c"), Some(10));
        assert_eq!(integer_field(&map, "d"), Some(8));
        assert_eq!(integer_field(&map, "e"), None);
    }

    #[test]
    fn text_field_trims_and_skips_empty() {
        let map = parse_object(r#"{"a": "  Tight ", "b": "   ", "c": 3}"#).unwrap();
        assert_eq!(text_field(&map, "a"), Some("Tight"));
        assert_eq!(text_field(&map, "b"), None);
        assert_eq!(text_field(&map, "c"), None);
    }
}
