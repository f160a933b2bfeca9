// 🤖 Parsing Collaborator - free text / audio → EntryCandidate
// Remote extraction through the Gemini generateContent API, plus the intake
// checks that run before and after the remote call

use crate::config::AiConfig;
use crate::data_quality::validate_candidate;
use crate::entry::{format_ledger_date, EntryCandidate, EntryKind};
use crate::error::{LedgerError, LedgerResult};
use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, warn};

const SYSTEM_INSTRUCTION: &str = "\
You are a utilitarian finance parser.
Extract the following fields from the user's input (text or audio transcript):
1. amount (number, positive value)
2. currency (string, default to 'CNY' if inferred as Chinese context, 'USD' otherwise, or symbol provided)
3. category (string, keep it short, 1-2 words. Examples: 'Food', 'Transport', 'Salary', 'Freelance')
4. description (string, concise summary of the note/item)
5. date (string, ISO 8601 format YYYY-MM-DD. If \"today\", use current date. If \"yesterday\", use yesterday.)
6. type (string, strictly \"INCOME\" or \"EXPENSE\". Infer from context: e.g., \"salary\", \"sold\", \"received\" -> INCOME; \"bought\", \"paid\", \"spent\" -> EXPENSE)

If information is missing, infer reasonable defaults based on context.";

/// JSON schema the model must answer with
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "amount": { "type": "NUMBER" },
            "currency": { "type": "STRING" },
            "category": { "type": "STRING" },
            "description": { "type": "STRING" },
            "date": { "type": "STRING" },
            "type": { "type": "STRING", "enum": ["INCOME", "EXPENSE"] }
        },
        "required": ["amount", "category", "date", "type"]
    })
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// Turns raw user input into a structured candidate.
#[allow(async_fn_in_trait)]
pub trait EntryParser {
    async fn parse_text(&self, raw_text: &str, today: NaiveDate) -> LedgerResult<EntryCandidate>;

    async fn parse_audio(
        &self,
        base64_audio: &str,
        mime_type: &str,
        today: NaiveDate,
    ) -> LedgerResult<EntryCandidate>;
}

// ============================================================================
// GEMINI CLIENT
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiParser {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiParser {
    pub fn new(config: &AiConfig) -> LedgerResult<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| LedgerError::ParseFailure("API key is missing".to_string()))?;

        Ok(GeminiParser {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint,
            urlencoding::encode(&self.model),
            urlencoding::encode(&self.api_key)
        )
    }

    async fn generate(&self, parts: Vec<Part>) -> LedgerResult<EntryCandidate> {
        let request = build_request(parts);
        let resp = self.http.post(self.url()).json(&request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "parsing service returned an error");
            return Err(LedgerError::ParseFailure(format!("API error ({}): {}", status, body)));
        }

        let body: GenerateResponse = resp.json().await?;
        let text = response_text(&body)?;
        debug!(%text, "parsing service answered");
        candidate_from_json(&text)
    }
}

impl EntryParser for GeminiParser {
    async fn parse_text(&self, raw_text: &str, today: NaiveDate) -> LedgerResult<EntryCandidate> {
        let prompt = format!(
            "Parse this transaction: \"{}\". Today is {}",
            raw_text,
            format_ledger_date(today)
        );
        self.generate(vec![Part {
            text: Some(prompt),
            inline_data: None,
        }])
        .await
    }

    async fn parse_audio(
        &self,
        base64_audio: &str,
        mime_type: &str,
        today: NaiveDate,
    ) -> LedgerResult<EntryCandidate> {
        let prompt = format!(
            "Listen to this audio and extract transaction details. Today is {}",
            format_ledger_date(today)
        );
        self.generate(vec![
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime_type.to_string(),
                    data: base64_audio.to_string(),
                }),
            },
            Part {
                text: Some(prompt),
                inline_data: None,
            },
        ])
        .await
    }
}

fn build_request(parts: Vec<Part>) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: Some(SYSTEM_INSTRUCTION.to_string()),
                inline_data: None,
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    }
}

/// First text part of the first candidate
fn response_text(body: &GenerateResponse) -> LedgerResult<String> {
    body.candidates
        .first()
        .and_then(|c| c.content.parts.iter().find_map(|p| p.text.clone()))
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| LedgerError::ParseFailure("No response from AI".to_string()))
}

/// Decode the model's JSON answer, tolerating a ```json fence around it
pub fn candidate_from_json(text: &str) -> LedgerResult<EntryCandidate> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(body.trim())?)
}

// ============================================================================
// INTAKE
// ============================================================================

/// Fixed candidate returned for any input mentioning "demo"
pub fn demo_candidate(today: NaiveDate) -> EntryCandidate {
    EntryCandidate::new(100.0, "Demo", &format_ledger_date(today), EntryKind::Expense)
        .with_currency("USD")
        .with_description("Testing input")
}

/// Runs the checks around a parser call: empty input is rejected up front,
/// "demo" short-circuits, and the result must pass the critical quality
/// rules before anyone may commit it.
pub struct Intake<P: EntryParser> {
    parser: P,
}

impl<P: EntryParser> Intake<P> {
    pub fn new(parser: P) -> Self {
        Intake { parser }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub async fn from_text(&self, raw_text: &str, today: NaiveDate) -> LedgerResult<EntryCandidate> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(LedgerError::Input("text is empty".to_string()));
        }

        let candidate = if text.to_lowercase().contains("demo") {
            demo_candidate(today)
        } else {
            self.parser.parse_text(text, today).await?
        };

        checked(candidate)
    }

    pub async fn from_audio(
        &self,
        base64_audio: &str,
        mime_type: &str,
        today: NaiveDate,
    ) -> LedgerResult<EntryCandidate> {
        if base64_audio.trim().is_empty() {
            return Err(LedgerError::Input("recording is empty".to_string()));
        }

        let candidate = self.parser.parse_audio(base64_audio, mime_type, today).await?;
        checked(candidate)
    }

    /// Read a recording from disk and run it through the parser
    pub async fn from_audio_file(&self, path: &Path, today: NaiveDate) -> LedgerResult<EntryCandidate> {
        let (data, mime_type) = read_recording(path)?;
        self.from_audio(&data, mime_type, today).await
    }
}

fn checked(candidate: EntryCandidate) -> LedgerResult<EntryCandidate> {
    let report = validate_candidate(&candidate);
    if report.has_critical_issues() {
        return Err(LedgerError::ParseFailure(report.critical_summary()));
    }
    for warning in report.warnings() {
        warn!(field = %warning.field, "{}", warning.message);
    }
    Ok(candidate)
}

// ============================================================================
// RECORDINGS
// ============================================================================

/// MIME type from a recording's file extension
pub fn audio_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "webm" => Some("audio/webm"),
        "ogg" | "oga" | "opus" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mp3"),
        "m4a" | "mp4" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}

/// Base64 payload and MIME type of a recording
pub fn read_recording(path: &Path) -> LedgerResult<(String, &'static str)> {
    let mime_type = audio_mime_type(path).ok_or_else(|| {
        LedgerError::Input(format!("unsupported recording format: {}", path.display()))
    })?;

    let bytes = std::fs::read(path)
        .map_err(|e| LedgerError::DeviceAccess(format!("{}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(LedgerError::Input("recording is empty".to_string()));
    }

    Ok((base64::engine::general_purpose::STANDARD.encode(bytes), mime_type))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Parser returning a canned answer and counting calls
    struct StubParser {
        answer: Option<EntryCandidate>,
        calls: Cell<usize>,
    }

    impl StubParser {
        fn answering(answer: Option<EntryCandidate>) -> Self {
            StubParser {
                answer,
                calls: Cell::new(0),
            }
        }

        fn reply(&self) -> LedgerResult<EntryCandidate> {
            self.calls.set(self.calls.get() + 1);
            self.answer
                .clone()
                .ok_or_else(|| LedgerError::ParseFailure("No response from AI".to_string()))
        }
    }

    impl EntryParser for StubParser {
        async fn parse_text(&self, _raw: &str, _today: NaiveDate) -> LedgerResult<EntryCandidate> {
            self.reply()
        }

        async fn parse_audio(&self, _b64: &str, _mime: &str, _today: NaiveDate) -> LedgerResult<EntryCandidate> {
            self.reply()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_parser() {
        let intake = Intake::new(StubParser::answering(None));

        let err = intake.from_text("   ", today()).await.unwrap_err();

        assert!(matches!(err, LedgerError::Input(_)));
        assert_eq!(intake.parser().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_demo_shortcut() {
        let intake = Intake::new(StubParser::answering(None));

        let candidate = intake.from_text("Run the DEMO please", today()).await.unwrap();

        assert_eq!(candidate, demo_candidate(today()));
        assert_eq!(candidate.date, "2024-06-01");
        assert_eq!(intake.parser().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_parser_failure_propagates() {
        let intake = Intake::new(StubParser::answering(None));
        let err = intake.from_text("spent 50 on coffee", today()).await.unwrap_err();
        assert!(matches!(err, LedgerError::ParseFailure(_)));
    }

    #[tokio::test]
    async fn test_invalid_candidate_rejected() {
        let bad = EntryCandidate::new(50.0, "Coffee", "yesterday", EntryKind::Expense);
        let intake = Intake::new(StubParser::answering(Some(bad)));

        let err = intake.from_text("spent 50 on coffee", today()).await.unwrap_err();
        assert!(err.to_string().contains("date"));
    }

    #[tokio::test]
    async fn test_audio_file_goes_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.webm");
        std::fs::write(&path, b"fake-audio").unwrap();

        let good = EntryCandidate::new(5000.0, "Salary", "2024-06-01", EntryKind::Income);
        let intake = Intake::new(StubParser::answering(Some(good.clone())));

        assert_eq!(intake.from_audio_file(&path, today()).await.unwrap(), good);
    }

    #[tokio::test]
    async fn test_missing_recording_is_device_error() {
        let intake = Intake::new(StubParser::answering(None));
        let err = intake
            .from_audio_file(Path::new("/definitely/not/here.wav"), today())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DeviceAccess(_)));
    }

    #[test]
    fn test_audio_mime_type() {
        assert_eq!(audio_mime_type(Path::new("a.WEBM")), Some("audio/webm"));
        assert_eq!(audio_mime_type(Path::new("a.m4a")), Some("audio/mp4"));
        assert_eq!(audio_mime_type(Path::new("a.txt")), None);
        assert_eq!(audio_mime_type(Path::new("noext")), None);
    }

    #[test]
    fn test_candidate_from_json() {
        let fenced = "```json\n{\"amount\": 50, \"currency\": \"CNY\", \"category\": \"Coffee\", \"description\": \"latte\", \"date\": \"2024-06-01\", \"type\": \"EXPENSE\"}\n```";
        let candidate = candidate_from_json(fenced).unwrap();
        assert_eq!(candidate.currency, "CNY");
        assert_eq!(candidate.amount, 50.0);

        let missing = candidate_from_json(r#"{"amount": 50, "type": "EXPENSE"}"#);
        assert!(matches!(missing, Err(LedgerError::ParseFailure(_))));
    }

    #[test]
    fn test_response_text_extraction() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(&body).unwrap(), "{\"a\":1}");

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response_text(&empty).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = build_request(vec![Part {
            text: Some("hi".to_string()),
            inline_data: None,
        }]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            json["generationConfig"]["responseSchema"]["required"],
            json!(["amount", "category", "date", "type"])
        );
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("You are a utilitarian finance parser."));
    }
}
