use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::services::{delivery, PipelineJob};
use crate::domain::{Language, PhoneNumber, VoiceNote};
use crate::presentation::state::AppState;

/// Empty TwiML body acknowledging receipt; actual replies go out through the
/// messenger asynchronously.
const TWIML_EMPTY: &str = "<Response></Response>";

/// Twilio webhook form fields. Media messages carry `NumMedia > 0` plus the
/// first media URL/content type; free-text replies carry `Body`.
#[derive(Debug, Deserialize)]
pub struct TwilioWebhook {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "NumMedia", default)]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
    #[serde(rename = "MediaContentType0", default)]
    pub media_content_type: Option<String>,
}

/// Echo endpoint so the transport's console can verify the URL is live.
pub async fn webhook_verify_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[tracing::instrument(skip(state, payload), fields(from = %payload.from))]
pub async fn webhook_handler(
    State(state): State<AppState>,
    Form(payload): Form<TwilioWebhook>,
) -> impl IntoResponse {
    let phone = PhoneNumber::normalize(&payload.from);

    // Lazy account creation on first contact.
    if let Err(e) = state.accounts.get_or_create(&phone).await {
        tracing::error!(error = %e, "Account lookup failed");
        return twiml(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let num_media: usize = payload
        .num_media
        .as_deref()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    if num_media > 0 {
        handle_media(&state, &phone, &payload).await
    } else {
        handle_text(&state, &phone, payload.body.as_deref().unwrap_or("")).await
    }
}

async fn handle_media(
    state: &AppState,
    phone: &PhoneNumber,
    payload: &TwilioWebhook,
) -> axum::response::Response {
    let media_url = match payload.media_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => {
            tracing::warn!("Media message without a media URL");
            return twiml(StatusCode::OK);
        }
    };

    let content_type = payload.media_content_type.as_deref().unwrap_or("");
    if !content_type.starts_with("audio") && !content_type.starts_with("video") {
        tracing::debug!(content_type, "Ignoring non-audio media");
        send_async(state, phone, "🎙️ Please send a voice note and I'll transcribe and summarize it for you!");
        return twiml(StatusCode::OK);
    }

    let note = VoiceNote::new(
        phone.clone(),
        media_url.to_string(),
        payload.message_sid.clone(),
    );
    let note_id = note.id;

    match state.notes.create_if_new(&note).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(
                dedupe_key = ?payload.message_sid,
                "Duplicate webhook delivery, skipping"
            );
            return twiml(StatusCode::OK);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create voice note row");
            return twiml(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    if let Err(e) = state
        .job_sender
        .send(PipelineJob::ProcessAudio { note_id })
        .await
    {
        tracing::error!(error = %e, "Failed to enqueue audio job");
        return twiml(StatusCode::SERVICE_UNAVAILABLE);
    }

    tracing::info!(note_id = %note_id, "Voice note enqueued");
    send_async(state, phone, "🎙️ Voice note received! Transcribing...");
    twiml(StatusCode::OK)
}

async fn handle_text(state: &AppState, phone: &PhoneNumber, body: &str) -> axum::response::Response {
    let awaiting = match state.notes.latest_awaiting_for(phone).await {
        Ok(note) => note,
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up awaiting note");
            return twiml(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let note = match awaiting {
        Some(note) => note,
        None => {
            send_async(
                state,
                phone,
                "🎙️ Send me a voice note and I'll transcribe and summarize it for you!",
            );
            return twiml(StatusCode::OK);
        }
    };

    let language = match Language::from_menu_choice(body) {
        Some(language) => language,
        None => {
            // Invalid selection: re-prompt, no state change.
            send_async(state, phone, &delivery::invalid_choice_message());
            return twiml(StatusCode::OK);
        }
    };

    match state.notes.set_chosen_language(note.id, language).await {
        Ok(true) => {
            if let Err(e) = state
                .job_sender
                .send(PipelineJob::CompleteSummary {
                    note_id: note.id,
                    language,
                })
                .await
            {
                tracing::error!(error = %e, "Failed to enqueue summary job");
                return twiml(StatusCode::SERVICE_UNAVAILABLE);
            }
            tracing::info!(note_id = %note.id, language = %language, "Language selected");
        }
        Ok(false) => {
            // A concurrent writer (timeout default or another reply) already
            // advanced the row; the idempotent completing write makes the
            // race harmless.
            tracing::info!(note_id = %note.id, "Selection raced another writer, ignoring");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record language choice");
            return twiml(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    twiml(StatusCode::OK)
}

/// Replies to webhook senders go out on a detached task; the webhook
/// response itself must return quickly.
fn send_async(state: &AppState, phone: &PhoneNumber, body: &str) {
    let messenger = state.messenger.clone();
    let phone = phone.clone();
    let body = body.to_string();
    tokio::spawn(async move {
        if let Err(e) = messenger.send_message(&phone, &body).await {
            tracing::error!(error = %e, to = %phone, "Webhook reply delivery failed");
        }
    });
}

fn twiml(status: StatusCode) -> axum::response::Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/xml")],
        TWIML_EMPTY,
    )
        .into_response()
}
