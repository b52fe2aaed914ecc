use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::{CfgTreeError, Result};
use crate::model::Value;

/// Column at which per-node base64 text is wrapped
pub const BASE64_LINE_WIDTH: usize = 80;

/// Encode a value as wrapped base64 of its YAML form
///
/// # Errors
///
/// `Serialization` if the value cannot be rendered as YAML.
pub fn encode_value(value: &Value) -> Result<String> {
    let yaml = serde_yaml::to_string(value)?;
    Ok(wrap(&STANDARD.encode(yaml.as_bytes()), BASE64_LINE_WIDTH))
}

/// Decode text produced by [`encode_value`]; whitespace is ignored
///
/// # Errors
///
/// * `Base64Decode` - the text is not valid base64 of UTF-8
/// * `MalformedDocument` - the decoded text is not valid YAML
pub fn decode_value(text: &str, path: &str) -> Result<Value> {
    let yaml = decode_text(text).map_err(|reason| CfgTreeError::Base64Decode {
        path: path.to_string(),
        reason,
    })?;
    serde_yaml::from_str(&yaml).map_err(|e| CfgTreeError::MalformedDocument {
        path: path.to_string(),
        reason: format!("decoded value is not valid YAML: {}", e),
    })
}

/// Encode a whole document text as one base64 blob
pub fn encode_document(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a whole-document blob; whitespace is ignored
///
/// # Errors
///
/// `Base64Decode` if the blob is not valid base64 of UTF-8.
pub fn decode_document(blob: &str) -> Result<String> {
    decode_text(blob).map_err(|reason| CfgTreeError::Base64Decode {
        path: String::new(),
        reason,
    })
}

fn decode_text(text: &str) -> std::result::Result<String, String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn wrap(text: &str, width: usize) -> String {
    text.as_bytes()
        .chunks(width)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_encoded_text_is_wrapped_base64() {
        let value = json!({"names": ["a".repeat(100), "b".repeat(100)], "n": 3});
        let text = encode_value(&value).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= BASE64_LINE_WIDTH));
        assert!(lines[..lines.len() - 1]
            .iter()
            .all(|l| l.len() == BASE64_LINE_WIDTH));
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+/=\n".contains(c)));
        assert_eq!(decode_value(&text, "p").unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_value("not base64 at all!", "ss/blob").unwrap_err();
        assert!(matches!(err, CfgTreeError::Base64Decode { ref path, .. } if path == "ss/blob"));
    }

    #[test]
    fn test_document_blob() {
        let text = "ss1:\n  Name1: 17\n";
        let blob = encode_document(text);
        assert!(!blob.contains('\n'));
        assert_eq!(decode_document(&format!("{}\n", blob)).unwrap(), text);
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 :#-]{0,40}".prop_map(Value::from),
        ]
    }

    fn nested() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_value_codec_round_trip(value in nested()) {
            let text = encode_value(&value).unwrap();
            prop_assert!(text.lines().all(|l| l.len() <= BASE64_LINE_WIDTH));
            prop_assert_eq!(decode_value(&text, "p").unwrap(), value);
        }
    }
}
