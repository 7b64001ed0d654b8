use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use log::{debug, info};
use serde::Serialize;
use std::future::Future;

use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::{AudioArtifact, AudioInput, OutputTarget};
use crate::server::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TranslateAudioResponse {
    pub original_text: String,
    pub translated_text: String,
    pub target_language: String,
    pub message: String,
}

/// A validated multipart upload
#[derive(Debug)]
struct AudioUpload {
    file_name: String,
    bytes: Bytes,
    target_language: String,
}

impl AudioUpload {
    fn into_input(self) -> (AudioInput, String) {
        (
            AudioInput::Upload {
                file_name: self.file_name,
                bytes: self.bytes,
            },
            self.target_language,
        )
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "LinguaWave API is running",
    })
}

pub async fn translate_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranslateAudioResponse>, ApiError> {
    let upload = read_upload(multipart, &state.default_language).await?;
    info!("Translating upload {} into {}", upload.file_name, upload.target_language);

    let pipeline = state.pipeline.clone();
    let (input, target_language) = upload.into_input();
    let translation = run_in_pool(&state, async move {
        pipeline.transcribe_and_translate(input, &target_language).await
    })
    .await?;

    Ok(Json(TranslateAudioResponse {
        translated_text: translation.translated_text(),
        original_text: translation.original_text,
        target_language: translation.target_language,
        message: "Translation completed successfully".to_string(),
    }))
}

pub async fn translate_and_synthesize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart, &state.default_language).await?;
    info!("Translating and synthesizing upload {} into {}", upload.file_name, upload.target_language);

    let attachment_name = FileManager::translated_audio_file_name(&upload.file_name);
    let pipeline = state.pipeline.clone();
    let (input, target_language) = upload.into_input();
    let result = run_in_pool(&state, async move {
        pipeline.run(input, &target_language, OutputTarget::InMemory).await
    })
    .await?;

    let audio = match result.audio {
        AudioArtifact::Bytes(bytes) => bytes,
        AudioArtifact::File(path) => {
            return Err(ApiError::Internal(format!("Unexpected file output at {}", path.display())));
        }
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", attachment_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"translated_audio.mp3\""));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        audio,
    )
        .into_response())
}

/// Run a pipeline future on its own task once a run permit is available
async fn run_in_pool<T, F>(state: &AppState, run: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    let permit = state
        .runs
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Internal("Server is shutting down".to_string()))?;

    let handle = tokio::spawn(async move {
        let _permit = permit;
        run.await
    });

    match handle.await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError::Internal(format!("Pipeline task failed: {}", e))),
    }
}

/// Read the `file` and `target_language` fields and validate them
async fn read_upload(mut multipart: Multipart, default_language: &str) -> Result<AudioUpload, ApiError> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut target_language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("audio").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;
                file = Some((file_name, content_type, bytes));
            }
            "target_language" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid target_language field: {}", e)))?;
                if !value.trim().is_empty() {
                    target_language = Some(value.trim().to_string());
                }
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    if !FileManager::is_allowed_audio(content_type.as_deref(), &file_name) {
        return Err(ApiError::BadRequest("File must be an audio file".to_string()));
    }
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let target_language = target_language.unwrap_or_else(|| default_language.to_string());
    language_utils::normalize_target_language(&target_language)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(AudioUpload {
        file_name,
        bytes,
        target_language,
    })
}
