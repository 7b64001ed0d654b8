/*!
 * Tests for chunked synthesis and reassembly
 */

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use linguawave::errors::SynthesisError;
use linguawave::pipeline::SynthesisStage;

use crate::common;
use crate::common::mock_providers::{FakeSynthesizer, RecordingConcatenator};

fn stage(
    synthesizer: &Arc<FakeSynthesizer>,
    concatenator: &Arc<RecordingConcatenator>,
    work_dir: &std::path::Path,
    max_chunk_chars: usize,
) -> SynthesisStage {
    SynthesisStage::new(
        synthesizer.clone(),
        concatenator.clone(),
        work_dir.to_path_buf(),
        max_chunk_chars,
    )
}

#[tokio::test]
async fn test_synthesize_withThreeChunks_shouldConcatenateInOrderAndCleanUp() -> Result<()> {
    common::init_test_logger();
    let work = common::create_temp_dir()?;
    let out = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());

    let text: String = ['a', 'b', 'c'].iter().map(|c| c.to_string().repeat(4000)).collect();
    assert_eq!(text.chars().count(), 12000);
    let output = out.path().join("speech.mp3");

    let written = stage(&synthesizer, &concatenator, work.path(), 5000)
        .synthesize(&text, &output, "es", Uuid::new_v4())
        .await?;

    assert_eq!(written, output);
    let chunks = synthesizer.received();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.iter().map(|c| c.chars().count()).collect::<Vec<_>>(), vec![5000, 5000, 2000]);

    let calls = concatenator.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let names: Vec<String> = calls[0]
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert!(names[0].ends_with("chunk_0000.mp3"));
    assert!(names[1].ends_with("chunk_0001.mp3"));
    assert!(names[2].ends_with("chunk_0002.mp3"));

    let expected: Vec<u8> = chunks
        .iter()
        .flat_map(|c| FakeSynthesizer::audio_for(c, "es"))
        .collect();
    assert_eq!(std::fs::read(&output)?, expected);

    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withManifest_shouldListAbsoluteChunkPaths() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());
    let output = work.path().join("out.mp3");

    stage(&synthesizer, &concatenator, work.path(), 3)
        .synthesize("abcdef", &output, "en", Uuid::new_v4())
        .await?;

    let manifests = concatenator.manifests.lock().unwrap().clone();
    let lines: Vec<&str> = manifests[0].lines().collect();
    assert_eq!(lines.len(), 2);
    for (ordinal, line) in lines.iter().enumerate() {
        assert!(line.starts_with("file '/"), "not absolute: {}", line);
        assert!(line.ends_with(&format!("chunk_{:04}.mp3'", ordinal)));
    }
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withSingleChunk_shouldMoveWithoutConcatenation() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());
    let stage = stage(&synthesizer, &concatenator, work.path(), 5000);

    let first = work.path().join("first.mp3");
    let second = work.path().join("second.mp3");
    stage.synthesize("Hola mundo", &first, "es", Uuid::new_v4()).await?;
    stage.synthesize("Hola mundo", &second, "es", Uuid::new_v4()).await?;

    assert_eq!(concatenator.call_count(), 0);
    assert_eq!(std::fs::read(&first)?, FakeSynthesizer::audio_for("Hola mundo", "es"));
    assert_eq!(std::fs::read(&first)?, std::fs::read(&second)?);
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withMissingOutputDir_shouldCreateIt() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());
    let output = work.path().join("nested").join("deeper").join("out.mp3");

    stage(&synthesizer, &concatenator, work.path(), 5000)
        .synthesize("text", &output, "es", Uuid::new_v4())
        .await?;

    assert!(output.is_file());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withWhitespaceChunk_shouldSkipIt() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());
    let output = work.path().join("out.mp3");

    stage(&synthesizer, &concatenator, work.path(), 4)
        .synthesize("aaaa    bbbb", &output, "es", Uuid::new_v4())
        .await?;

    assert_eq!(synthesizer.received(), vec!["aaaa", "bbbb"]);
    assert_eq!(concatenator.calls.lock().unwrap()[0].len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withBlankText_shouldFailWithNothingToSynthesize() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());

    let result = stage(&synthesizer, &concatenator, work.path(), 5000)
        .synthesize(" \n\t ", &work.path().join("out.mp3"), "es", Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(SynthesisError::NothingToSynthesize)));
    assert!(synthesizer.received().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withZeroChunkSize_shouldFailWithSplitError() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());

    let result = stage(&synthesizer, &concatenator, work.path(), 0)
        .synthesize("text", &work.path().join("out.mp3"), "es", Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(SynthesisError::Split(_))));
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withFailingChunk_shouldAbortAndRemoveWrittenChunks() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::failing_at(2));
    let concatenator = Arc::new(RecordingConcatenator::new());
    let output = work.path().join("out.mp3");

    let result = stage(&synthesizer, &concatenator, work.path(), 2)
        .synthesize("aabbccdd", &output, "es", Uuid::new_v4())
        .await;

    match result {
        Err(SynthesisError::Chunk { ordinal, .. }) => assert_eq!(ordinal, 2),
        other => panic!("expected chunk failure, got {:?}", other),
    }
    assert_eq!(synthesizer.received().len(), 3);
    assert_eq!(concatenator.call_count(), 0);
    assert!(!output.exists());
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withFailingConcatenation_shouldStillCleanUp() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::failing());

    let result = stage(&synthesizer, &concatenator, work.path(), 2)
        .synthesize("aabbcc", &work.path().join("out.mp3"), "es", Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(SynthesisError::Concat(_))));
    assert_eq!(concatenator.call_count(), 1);
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withFailingConcatenation_shouldRemovePartialOutput() -> Result<()> {
    let work = common::create_temp_dir()?;
    let output = work.path().join("out").join("translated.mp3");
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::failing());

    let result = stage(&synthesizer, &concatenator, work.path(), 2)
        .synthesize("aabbcc", &output, "es", Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(SynthesisError::Concat(_))));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_synthesize_withConcurrentRuns_shouldNotShareTempFiles() -> Result<()> {
    let work = common::create_temp_dir()?;
    let synthesizer = Arc::new(FakeSynthesizer::new());
    let concatenator = Arc::new(RecordingConcatenator::new());
    let stage = stage(&synthesizer, &concatenator, work.path(), 2);

    let out_a = work.path().join("a.mp3");
    let out_b = work.path().join("b.mp3");
    let (a, b) = tokio::join!(
        stage.synthesize("aaaaaa", &out_a, "es", Uuid::new_v4()),
        stage.synthesize("bbbbbb", &out_b, "es", Uuid::new_v4()),
    );
    a?;
    b?;

    assert_eq!(std::fs::read(&out_a)?, b"es:aa|es:aa|es:aa|".to_vec());
    assert_eq!(std::fs::read(&out_b)?, b"es:bb|es:bb|es:bb|".to_vec());
    assert!(common::leftover_temp_files(work.path()).is_empty());
    Ok(())
}
