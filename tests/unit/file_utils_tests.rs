/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

use linguawave::file_utils::FileManager;

use crate::common;

#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "clip.wav", b"RIFF")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_resolve_against_cwd_withRelativePath_shouldJoinCurrentDir() -> Result<()> {
    let resolved = FileManager::resolve_against_cwd("audio/clip.wav")?;
    assert_eq!(resolved, std::env::current_dir()?.join("audio/clip.wav"));

    let absolute = FileManager::resolve_against_cwd("/tmp/clip.wav")?;
    assert_eq!(absolute, Path::new("/tmp/clip.wav"));
    Ok(())
}

#[test]
fn test_run_scoped_path_withDifferentRuns_shouldNotCollide() {
    let dir = Path::new("/tmp/work");
    let a = FileManager::run_scoped_path(dir, Uuid::new_v4(), "chunk_0000.mp3");
    let b = FileManager::run_scoped_path(dir, Uuid::new_v4(), "chunk_0000.mp3");

    assert_ne!(a, b);
    assert_eq!(a.parent(), Some(dir));
    assert!(a.file_name().unwrap().to_string_lossy().starts_with("linguawave_"));
}

#[tokio::test]
async fn test_move_file_shouldMoveBytesUnchanged() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "source.mp3", &[0xFF, 0xFB, 0x90, 0x00])?;
    let target = temp_dir.path().join("nested").join("target.mp3");

    FileManager::move_file(&source, &target).await?;

    assert!(!source.exists());
    assert_eq!(std::fs::read(&target)?, vec![0xFF, 0xFB, 0x90, 0x00]);
    Ok(())
}

#[tokio::test]
async fn test_remove_if_exists_withMissingFile_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let present = common::create_test_file(temp_dir.path(), "partial.mp3", b"trunc")?;

    FileManager::remove_if_exists(&present).await?;
    FileManager::remove_if_exists(&present).await?;

    assert!(!present.exists());
    Ok(())
}

#[test]
fn test_is_allowed_audio_withAudioContentType_shouldAccept() {
    assert!(FileManager::is_allowed_audio(Some("audio/x-wav"), "clip.bin"));
    assert!(FileManager::is_allowed_audio(Some("Audio/MPEG"), "noext"));
}

#[test]
fn test_is_allowed_audio_withAllowedExtension_shouldAcceptAnyContentType() {
    assert!(FileManager::is_allowed_audio(Some("application/octet-stream"), "talk.M4A"));
    assert!(FileManager::is_allowed_audio(None, "talk.flac"));
}

#[test]
fn test_is_allowed_audio_withBothChecksFailing_shouldReject() {
    assert!(!FileManager::is_allowed_audio(Some("text/plain"), "notes.txt"));
    assert!(!FileManager::is_allowed_audio(None, "archive.zip"));
    assert!(!FileManager::is_allowed_audio(Some("video/mp4"), "movie"));
}

#[test]
fn test_translated_audio_file_name_shouldKeepOriginalExtension() {
    assert_eq!(FileManager::translated_audio_file_name("clip.wav"), "translated_clip.wav.mp3");
}
