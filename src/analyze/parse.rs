// src/analyze/parse.rs
//! Parsing of the semi-structured analysis payload returned by the model.
//! Every field is optional on the wire and mapped to a documented default;
//! only the outer JSON shape itself can fail.

use serde::{Deserialize, Serialize};

use crate::error::LensError;

/// How to treat prose around the model's JSON object.
///
/// `Strict` demands the whole completion be one JSON object. `Tolerant`
/// additionally scans for the first balanced object when the strict parse
/// fails, recovering replies like "Sure! Here is the JSON: {…}".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Strict,
    Tolerant,
}

/// Wire shape of the model's reply. Field names are part of the prompt
/// contract; everything defaults so a sparse reply still parses.
#[derive(Debug, Default, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub summary_points: Vec<String>,
    #[serde(default)]
    pub overall_sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_explainer: Option<String>,
    #[serde(default)]
    pub counts: RawCounts,
}

/// Three-bucket tally as the model sends it; missing keys become 0 later.
#[derive(Debug, Default, Deserialize)]
pub struct RawCounts {
    #[serde(default)]
    pub positive: Option<u32>,
    #[serde(default)]
    pub neutral: Option<u32>,
    #[serde(default)]
    pub negative: Option<u32>,
}

/// Parse the completion text into the raw payload, honoring the mode.
pub fn parse_analysis(raw: &str, mode: ParseMode) -> Result<RawAnalysis, LensError> {
    match serde_json::from_str::<RawAnalysis>(raw) {
        Ok(v) => Ok(v),
        Err(e) => match mode {
            ParseMode::Strict => Err(LensError::MalformedResponse(e.to_string())),
            ParseMode::Tolerant => {
                let candidate = extract_first_object(raw)
                    .ok_or_else(|| LensError::MalformedResponse(e.to_string()))?;
                serde_json::from_str::<RawAnalysis>(candidate)
                    .map_err(|e2| LensError::MalformedResponse(e2.to_string()))
            }
        },
    }
}

/// First balanced `{…}` span in `s`, respecting string literals and escapes.
fn extract_first_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;

    for (i, &b) in s.as_bytes().iter().enumerate().skip(start) {
        if in_str {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_str = false;
            }
            continue;
        }
        match b {
            b'"' => in_str = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    // '{' and '}' are ASCII, so these are char boundaries
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
