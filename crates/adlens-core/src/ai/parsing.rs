//! JSON parsing helpers for text-generation responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the
//! payload is taken from the first `{` to the last `}`.

use crate::error::{Error, Result};

use super::types::NarrativeResponse;

/// Truncate long responses for error messages
fn truncate(s: &str) -> String {
    if s.len() > 200 {
        let mut end = 200;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

/// Parse an executive narrative from a model response
///
/// Fails with [`Error::MalformedResponse`] when there is no JSON object, the
/// JSON does not match, the summary is blank, or no recommendation is left
/// after dropping blank entries.
pub fn parse_narrative(response: &str) -> Result<NarrativeResponse> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::MalformedResponse(format!(
                "No JSON found in response | Raw: {}",
                truncate(response)
            )))
        }
    };

    let parsed: NarrativeResponse = serde_json::from_str(json_str).map_err(|e| {
        Error::MalformedResponse(format!(
            "Invalid narrative JSON: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let executive_summary = parsed.executive_summary.trim().to_string();
    if executive_summary.is_empty() {
        return Err(Error::MalformedResponse("Empty executive summary".into()));
    }

    let recommendations: Vec<String> = parsed
        .recommendations
        .iter()
        .map(|r| r.trim().trim_start_matches(['-', '*']).trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    if recommendations.is_empty() {
        return Err(Error::MalformedResponse("No recommendations in response".into()));
    }

    Ok(NarrativeResponse {
        executive_summary,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_narrative() {
        let response = r#"{"executive_summary": "Channel A leads.", "recommendations": ["Shift budget to A"]}"#;
        let result = parse_narrative(response).unwrap();
        assert_eq!(result.executive_summary, "Channel A leads.");
        assert_eq!(result.recommendations, vec!["Shift budget to A"]);
    }

    #[test]
    fn test_parse_narrative_with_text() {
        let response = r#"Here is the report:
```json
{"executive_summary": " Strong quarter. ", "recommendations": ["- Grow A", "", "  "]}
```
Done!"#;
        let result = parse_narrative(response).unwrap();
        assert_eq!(result.executive_summary, "Strong quarter.");
        assert_eq!(result.recommendations, vec!["Grow A"]);
    }

    #[test]
    fn test_parse_narrative_no_json() {
        let result = parse_narrative("I cannot help with that.");
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_narrative_invalid_json() {
        let result = parse_narrative(r#"{"executive_summary": 42}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_narrative_empty_fields() {
        let result = parse_narrative(r#"{"executive_summary": "  ", "recommendations": ["x"]}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));

        let result = parse_narrative(r#"{"executive_summary": "ok", "recommendations": []}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));

        let result = parse_narrative(r#"{"executive_summary": "ok"}"#);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_truncate_multibyte() {
        let long = "é".repeat(300);
        let result = parse_narrative(&long);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }
}
