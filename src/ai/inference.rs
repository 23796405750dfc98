use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{BatchItem, ClassifyError};
use crate::domain::ClassificationResult;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const INSTRUCTIONS: &str = r#"You are a disinformation expert. Analyze these social media comments.
1. Score: 1-10 (10 = propaganda or bot-like).
2. Note: if a comment makes a factual claim, verify it and explain briefly; otherwise leave it empty.
Return ONLY a JSON array with one object per comment, in the same order: [{"score": 8, "note": "Claim is false: ..."}, ...]"#;

// `[` opening something that can be a verdict array: an object, a null or nothing
static ARRAY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*(?:\{|null|\])").expect("valid array regex"));

#[derive(Serialize)]
struct PromptEntry<'a> {
    u: &'a str,
    t: &'a str,
}

pub fn build_prompt(items: &[BatchItem<'_>]) -> Result<String, ClassifyError> {
    let entries: Vec<PromptEntry<'_>> = items
        .iter()
        .map(|item| PromptEntry {
            u: item.identity,
            t: item.content,
        })
        .collect();
    let data = serde_json::to_string(&entries)?;
    Ok(format!("{INSTRUCTIONS}\nData: {data}"))
}

pub fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }],
    }
}

/// Maps a raw HTTP status and body to verdicts.
pub fn interpret_response(status: u16, body: &str) -> Result<Vec<ClassificationResult>, ClassifyError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|err| err.error)
            .and_then(|err| err.message)
            .unwrap_or_else(|| "no error message".to_string());
        return Err(ClassifyError::Status { status, message });
    }

    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| ClassifyError::Malformed(format!("response body is not JSON: {err}")))?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| ClassifyError::Malformed("missing candidate text".to_string()))?;

    parse_verdicts(&text)
}

/// Decodes the first well-formed verdict array in free-form model output.
///
/// Text after the array is ignored. Elements that are null or carry no score
/// become the fallback verdict instead of failing the batch.
pub fn parse_verdicts(text: &str) -> Result<Vec<ClassificationResult>, ClassifyError> {
    let mut last_error = None;
    for start in ARRAY_START.find_iter(text) {
        let mut stream = serde_json::Deserializer::from_str(&text[start.start()..])
            .into_iter::<Vec<Option<RawVerdict>>>();
        match stream.next() {
            Some(Ok(raw)) => return Ok(raw.into_iter().map(RawVerdict::resolve).collect()),
            Some(Err(err)) => last_error = Some(err),
            None => {}
        }
    }
    match last_error {
        Some(err) => Err(ClassifyError::Decode(err)),
        None => Err(ClassifyError::MissingArray),
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(alias = "rating", default)]
    score: Option<f64>,
    #[serde(alias = "fact", default)]
    note: Option<String>,
}

impl RawVerdict {
    fn resolve(verdict: Option<Self>) -> ClassificationResult {
        match verdict {
            Some(RawVerdict { score: Some(score), note }) => {
                ClassificationResult::new(score.round() as i64, note.unwrap_or_default().trim())
            }
            _ => ClassificationResult::fallback(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCandidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wrap(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    #[test]
    fn prompt_embeds_compact_batch() {
        let items = [
            BatchItem { identity: "ana", content: "say \"hi\"" },
            BatchItem { identity: "bo", content: "ok" },
        ];
        let prompt = build_prompt(&items).unwrap();
        assert!(prompt.ends_with(r#"Data: [{"u":"ana","t":"say \"hi\""},{"u":"bo","t":"ok"}]"#));
    }

    #[test]
    fn request_serializes_to_generate_content_shape() {
        let value = serde_json::to_value(build_request("hello")).unwrap();
        assert_eq!(value, json!({ "contents": [{ "parts": [{ "text": "hello" }] }] }));
    }

    #[test]
    fn finds_array_inside_prose() {
        let text = "Sure! Here you go:\n```json\n[{\"score\": 9, \"note\": \"Claim is false\"}, {\"score\": 2}]\n```";
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(
            verdicts,
            vec![
                ClassificationResult::new(9, "Claim is false"),
                ClassificationResult::new(2, ""),
            ]
        );
    }

    #[test]
    fn accepts_rating_and_fact_fields() {
        let verdicts = parse_verdicts(r#"[{"rating": 7, "fact": "unverified"}]"#).unwrap();
        assert_eq!(verdicts, vec![ClassificationResult::new(7, "unverified")]);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let verdicts = parse_verdicts(r#"[{"score": 14}, {"score": 0}, {"score": 6.6}]"#).unwrap();
        let scores: Vec<u8> = verdicts.iter().map(|v| v.score).collect();
        assert_eq!(scores, vec![10, 1, 7]);
    }

    #[test]
    fn bracketed_prose_after_the_array_is_ignored() {
        let text = "[{\"score\": 9, \"note\": \"bot\"}, {\"score\": 2}]\nNote: comment [2] looks sarcastic.";
        let verdicts = parse_verdicts(text).unwrap();
        assert_eq!(
            verdicts,
            vec![ClassificationResult::new(9, "bot"), ClassificationResult::new(2, "")]
        );
    }

    #[test]
    fn skips_bracketed_prose_before_the_array() {
        let text = "Comments [1] and [2] below:\n[{\"score\": 4}, {\"score\": 8}]";
        let scores: Vec<u8> = parse_verdicts(text).unwrap().iter().map(|v| v.score).collect();
        assert_eq!(scores, vec![4, 8]);
    }

    #[test]
    fn null_or_scoreless_elements_fall_back_individually() {
        let verdicts = parse_verdicts(r#"[null, {"note": "x"}, {"score": 8}]"#).unwrap();
        assert_eq!(
            verdicts,
            vec![
                ClassificationResult::fallback(),
                ClassificationResult::fallback(),
                ClassificationResult::new(8, ""),
            ]
        );
    }

    #[test]
    fn text_without_array_is_rejected() {
        assert!(matches!(
            parse_verdicts("I cannot help with that."),
            Err(ClassifyError::MissingArray)
        ));
    }

    #[test]
    fn broken_array_is_a_decode_error() {
        assert!(matches!(
            parse_verdicts("[{\"score\": }]"),
            Err(ClassifyError::Decode(_))
        ));
    }

    #[test]
    fn non_success_status_carries_service_message() {
        let body = json!({ "error": { "message": "API key not valid" } }).to_string();
        match interpret_response(400, &body) {
            Err(ClassifyError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_candidate_text_is_malformed() {
        let body = json!({ "candidates": [] }).to_string();
        assert!(matches!(
            interpret_response(200, &body),
            Err(ClassifyError::Malformed(_))
        ));
        assert!(matches!(
            interpret_response(200, "<html>busy</html>"),
            Err(ClassifyError::Malformed(_))
        ));
    }

    #[test]
    fn successful_body_yields_verdicts() {
        let body = wrap("[{\"score\": 8, \"note\": \"bot pattern\"}]");
        let verdicts = interpret_response(200, &body).unwrap();
        assert_eq!(verdicts, vec![ClassificationResult::new(8, "bot pattern")]);
    }
}
