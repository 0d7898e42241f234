use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{ExtractedTask, SummarizationEngine, SummarizationError};
use crate::domain::Language;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_SUMMARY_TOKENS: u32 = 800;
const SUMMARY_TEMPERATURE: f32 = 0.1;

/// Meeting summarization and task extraction over the OpenAI chat
/// completions API, with language-parameterized prompt construction.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ExtractedTaskPayload {
    title: String,
    #[serde(default)]
    due_at: Option<DateTime<Utc>>,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, SummarizationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizationError::ApiRequestFailed(format!("request: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizationError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SummarizationError::ApiRequestFailed(format!(
                "status {}: {}",
                status, text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::InvalidResponse(format!("json: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| SummarizationError::InvalidResponse("no choices".to_string()))
    }
}

#[async_trait]
impl SummarizationEngine for OpenAiSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        language: Language,
    ) -> Result<String, SummarizationError> {
        let prompt = format!(
            "You are a professional meeting summarizer. Create comprehensive meeting minutes.\n\n\
             Language Instructions: {}\n\n\
             Meeting Content:\n{}\n\n\
             Provide a well-structured summary with:\n\
             - Key discussion points\n\
             - Important decisions made\n\
             - Action items with owners (if mentioned)\n\
             - Next steps\n\n\
             Format as clear, readable text (not JSON).\n",
            summary_instructions(language),
            transcript
        );

        let summary = self
            .chat(
                "You are an expert meeting summarizer who creates clear, actionable meeting minutes.",
                &prompt,
                MAX_SUMMARY_TOKENS,
                SUMMARY_TEMPERATURE,
            )
            .await?;

        tracing::info!(chars = summary.len(), language = %language, "Summary generated");
        Ok(summary)
    }

    async fn extract_tasks(
        &self,
        transcript: &str,
    ) -> Result<Vec<ExtractedTask>, SummarizationError> {
        let prompt = format!(
            "Extract action items from this transcript. Return a JSON array where each \
             element has:\n\
             - \"title\": short imperative task description\n\
             - \"due_at\": RFC 3339 timestamp if a specific time is mentioned, else null\n\n\
             Return only the JSON array, no other text.\n\n\
             Transcript:\n{}",
            transcript
        );

        let raw = self
            .chat(
                "You extract actionable tasks from meeting transcripts.",
                &prompt,
                500,
                0.0,
            )
            .await?;

        // Models occasionally wrap the array in prose or code fences; parse
        // the outermost bracketed slice.
        let start = raw.find('[');
        let end = raw.rfind(']');
        let json_slice = match (start, end) {
            (Some(s), Some(e)) if e > s => &raw[s..=e],
            _ => {
                return Err(SummarizationError::InvalidResponse(
                    "no JSON array in task extraction output".to_string(),
                ))
            }
        };

        let payload: Vec<ExtractedTaskPayload> = serde_json::from_str(json_slice)
            .map_err(|e| SummarizationError::InvalidResponse(format!("task json: {}", e)))?;

        Ok(payload
            .into_iter()
            .filter(|task| !task.title.trim().is_empty())
            .map(|task| ExtractedTask {
                title: task.title.trim().to_string(),
                due_at: task.due_at,
            })
            .collect())
    }
}

/// Per-language directive keeping the model from drifting back to English.
fn summary_instructions(language: Language) -> &'static str {
    match language {
        Language::Hindi => {
            "कृपया केवल हिंदी भाषा में मीटिंग का सारांश प्रदान करें। अन्य किसी भाषा का उपयोग न करें।"
        }
        Language::English => {
            "Please provide the meeting summary ONLY in English language. Do not use any other language."
        }
        Language::Marathi => {
            "कृपया फक्त मराठी भाषेत मीटिंगचा सारांश द्या. इतर कोणत्याही भाषेचा वापर करू नका."
        }
        Language::Tamil => {
            "தயவுசெய்து தமிழ் மொழியில் மட்டுமே கூட்டத்தின் சுருக்கத்தை வழங்கவும். வேறு எந்த மொழியையும் பயன்படுத்த வேண்டாம்."
        }
        Language::Telugu => {
            "దయచేసి తెలుగు భాషలో మాత్రమే సమావేశ సారాంశం అందించండి. ఇతర భాషలను ఉపయోగించవద్దు."
        }
        Language::Bengali => {
            "অনুগ্রহ করে শুধুমাত্র বাংলা ভাষায় মিটিং এর সারসংক্ষেপ প্রদান করুন। অন্য কোনো ভাষা ব্যবহার করবেন না।"
        }
        Language::Gujarati => {
            "કૃપા કરીને ફક્ત ગુજરાતી ભાષામાં જ મીટિંગનો સારાંશ આપો. અન્ય કોઈ ભાષાનો ઉપયોગ કરશો નહીં."
        }
        Language::Kannada => {
            "ದಯವಿಟ್ಟು ಕನ್ನಡ ಭಾಷೆಯಲ್ಲಿ ಮಾತ್ರ ಸಭೆಯ ಸಾರಾಂಶವನ್ನು ಒದಗಿಸಿ. ಬೇರೆ ಯಾವುದೇ ಭಾಷೆಯನ್ನು ಬಳಸಬೇಡಿ."
        }
        Language::Punjabi => {
            "ਕਿਰਪਾ ਕਰਕੇ ਸਿਰਫ਼ ਪੰਜਾਬੀ ਭਾਸ਼ਾ ਵਿੱਚ ਹੀ ਮੀਟਿੰਗ ਦਾ ਸਾਰ ਪ੍ਰਦਾਨ ਕਰੋ। ਕੋਈ ਹੋਰ ਭਾਸ਼ਾ ਦੀ ਵਰਤੋਂ ਨਾ ਕਰੋ।"
        }
    }
}
