/*!
 * HTTP API tests, driving the router in-process
 */

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use linguawave::app_config::ServerConfig;
use linguawave::pipeline::Pipeline;
use linguawave::server::{AppState, router};

use crate::common::mock_providers::{FakeSynthesizer, MockTranscriber, RecordingConcatenator, UppercaseTranslator};
use crate::common::{self, MockSet};

const BOUNDARY: &str = "linguawave-test-boundary";

struct Upload<'a> {
    file_name: &'a str,
    content_type: &'a str,
    bytes: &'a [u8],
}

fn multipart_request(uri: &str, file: Option<Upload<'_>>, target_language: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    if let Some(language) = target_language {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"target_language\"\r\n\r\n{}\r\n",
                BOUNDARY, language
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn wav_upload() -> Upload<'static> {
    Upload {
        file_name: "clip.wav",
        content_type: "audio/x-wav",
        bytes: b"RIFF0000WAVEfmt ",
    }
}

fn app(mocks: &MockSet, work_dir: &std::path::Path) -> Router {
    let pipeline = Pipeline::new(mocks.collaborators(), &common::test_pipeline_config(work_dir, 5000));
    router(AppState::new(Arc::new(pipeline), &ServerConfig::default(), "es"))
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_shouldReportHealthy() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("unused");

    let response = app(&mocks, work.path())
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "LinguaWave API is running");
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withWavUpload_shouldReturnBothTexts() -> Result<()> {
    common::init_test_logger();
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("Hello world. This is a test.");

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", Some(wav_upload()), Some("fr")))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["original_text"], "Hello world. This is a test.");
    assert_eq!(body["translated_text"], "HELLO WORLD. THIS IS A TEST.");
    assert_eq!(body["target_language"], "fr");
    assert_eq!(body["message"], "Translation completed successfully");
    assert!(mocks.synthesizer.received().is_empty());
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withoutLanguage_shouldDefaultToSpanish() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("Hi");

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", Some(wav_upload()), None))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["target_language"], "es");
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withGoogleCodes_shouldReachTranslator() -> Result<()> {
    let work = common::create_temp_dir()?;

    for (requested, expected) in [("iw", "iw"), ("zh-hant", "zh-Hant"), ("mni-Mtei", "mni-Mtei")] {
        let mocks = MockSet::with_transcript("Hi");
        let response = app(&mocks, work.path())
            .oneshot(multipart_request("/translate-audio", Some(wav_upload()), Some(requested)))
            .await?;

        assert_eq!(response.status(), StatusCode::OK, "language {}", requested);
        assert_eq!(json_body(response).await?["target_language"], expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_translate_and_synthesize_withWavUpload_shouldReturnMp3Attachment() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("Hello world. This is a test.");

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-and-synthesize", Some(wav_upload()), Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"translated_clip.wav.mp3\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(bytes.to_vec(), FakeSynthesizer::audio_for("HELLO WORLD. THIS IS A TEST.", "es"));
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_translate_and_synthesize_withAllowedExtension_shouldIgnoreContentType() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("Hello");

    let upload = Upload {
        file_name: "memo.m4a",
        content_type: "application/octet-stream",
        bytes: b"ftypM4A ",
    };
    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-and-synthesize", Some(upload), Some("de")))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withTextFile_shouldReturnBadRequest() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("unused");

    let upload = Upload {
        file_name: "notes.txt",
        content_type: "text/plain",
        bytes: b"not audio",
    };
    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", Some(upload), Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["detail"], "File must be an audio file");
    assert_eq!(mocks.transcriber.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withoutFile_shouldReturnBadRequest() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("unused");

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", None, Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await?["detail"], "No file uploaded");
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withEmptyFile_shouldReturnBadRequest() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("unused");

    let upload = Upload {
        file_name: "clip.wav",
        content_type: "audio/wav",
        bytes: b"",
    };
    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", Some(upload), Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_translate_audio_withUnknownLanguage_shouldReturnBadRequest() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::with_transcript("unused");

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-audio", Some(wav_upload()), Some("zz")))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await?["detail"].as_str().unwrap_or_default().contains("zz"));
    assert_eq!(mocks.transcriber.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translate_and_synthesize_withFailingTranscriber_shouldReturnServerError() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::new(
        MockTranscriber::failing(),
        UppercaseTranslator::new(),
        FakeSynthesizer::new(),
        RecordingConcatenator::new(),
    );

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-and-synthesize", Some(wav_upload()), Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await?["detail"].as_str().unwrap_or_default().to_string();
    assert!(detail.contains("Transcription failed"), "unexpected detail: {}", detail);
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_translate_and_synthesize_withFailingSynthesizer_shouldReturnServerError() -> Result<()> {
    let work = common::create_temp_dir()?;
    let mocks = MockSet::new(
        MockTranscriber::returning("Hello"),
        UppercaseTranslator::new(),
        FakeSynthesizer::failing_at(0),
        RecordingConcatenator::new(),
    );

    let response = app(&mocks, work.path())
        .oneshot(multipart_request("/translate-and-synthesize", Some(wav_upload()), Some("es")))
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}
