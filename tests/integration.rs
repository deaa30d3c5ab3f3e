use image2sfx::admission::AdmissionGate;
use image2sfx::audio::{MockSoundBackend, SoundGenerationService};
use image2sfx::caption::{CaptionService, MockCaptioner};
use image2sfx::media::{AudioExtractionService, MockAudioExtractor};
use image2sfx::models::{BackendKind, ImageReference, MediaArtifact, MediaKind};
use image2sfx::pipeline::{Pipeline, PipelineServices};
use image2sfx::server::{create_router, AppState};
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

fn mock_pipeline(
    captioner: MockCaptioner,
    backends: Vec<MockSoundBackend>,
    extractor: MockAudioExtractor,
) -> Pipeline {
    Pipeline::with_services(PipelineServices {
        caption: Box::new(captioner),
        backends: backends
            .into_iter()
            .map(|backend| Box::new(backend) as Box<dyn SoundGenerationService>)
            .collect(),
        extractor: Box::new(extractor),
    })
}

fn default_backends() -> Vec<MockSoundBackend> {
    BackendKind::ALL
        .into_iter()
        .map(MockSoundBackend::new)
        .collect()
}

async fn spawn_server(state: AppState) -> SocketAddr {
    let router = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn test_state(pipeline: Pipeline, gate: AdmissionGate, work_dir: PathBuf) -> AppState {
    AppState {
        pipeline: Arc::new(pipeline),
        gate: Arc::new(gate),
        work_dir,
    }
}

#[tokio::test]
async fn test_full_workflow_with_mocks() {
    let captioner = MockCaptioner::new();
    let audiogen = MockSoundBackend::new(BackendKind::AudioGen);
    let extractor = MockAudioExtractor::new();

    // Caption extraction produces the fixed description.
    let caption = captioner
        .extract_caption(&ImageReference::parse("bird.png"))
        .await
        .unwrap();
    assert_eq!(caption.as_str(), "A small blue bird perched on a branch.");

    // A direct-audio backend returns an audio artifact.
    let artifact = audiogen.generate(caption.as_str()).await.unwrap();
    assert_eq!(artifact.kind, MediaKind::Audio);

    // The extractor only accepts video input.
    assert!(extractor.extract_audio_track(&artifact).await.is_err());
    let video = MediaArtifact::video("mock://clip.mp4");
    let extracted = extractor.extract_audio_track(&video).await.unwrap();
    assert_eq!(extracted.kind, MediaKind::Audio);
}

#[tokio::test]
async fn test_end_to_end_audiogen_returns_single_audio_artifact() {
    let extractor = MockAudioExtractor::new();
    let extractor_probe = extractor.clone();
    let pipeline = mock_pipeline(MockCaptioner::new(), default_backends(), extractor);

    let artifact = pipeline
        .run(&ImageReference::parse("bird.png"), BackendKind::AudioGen)
        .await
        .unwrap();

    assert_eq!(artifact.kind, MediaKind::Audio);
    assert_eq!(extractor_probe.get_call_count(), 0);
}

#[tokio::test]
async fn test_end_to_end_video_backend_triggers_extraction() {
    let extractor = MockAudioExtractor::new();
    let extractor_probe = extractor.clone();
    let pipeline = mock_pipeline(MockCaptioner::new(), default_backends(), extractor);

    let artifact = pipeline
        .run(&ImageReference::parse("bird.png"), BackendKind::AudioLdm2)
        .await
        .unwrap();

    assert_eq!(artifact.kind, MediaKind::Audio);
    assert_eq!(artifact.location, "mock://extracted.wav");
    assert_eq!(extractor_probe.get_call_count(), 1);
}

#[tokio::test]
async fn test_http_generate_with_image_url() {
    let work_dir = tempfile::tempdir().unwrap();
    let state = test_state(
        mock_pipeline(
            MockCaptioner::new(),
            default_backends(),
            MockAudioExtractor::new(),
        ),
        AdmissionGate::new(2, 10),
        work_dir.path().to_path_buf(),
    );
    let addr = spawn_server(state).await;

    let form = reqwest::multipart::Form::new()
        .text("image_url", "https://example.com/bird.png")
        .text("backend", "audiogen");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["backend"], "audiogen");
    assert_eq!(body["artifact"]["kind"], "audio");
}

#[tokio::test]
async fn test_http_generate_with_file_upload_discards_upload() {
    let work_dir = tempfile::tempdir().unwrap();
    let state = test_state(
        mock_pipeline(
            MockCaptioner::new(),
            default_backends(),
            MockAudioExtractor::new(),
        ),
        AdmissionGate::new(2, 10),
        work_dir.path().to_path_buf(),
    );
    let addr = spawn_server(state).await;

    let form = reqwest::multipart::Form::new()
        .part(
            "image",
            reqwest::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G'])
                .file_name("bird.png")
                .mime_str("image/png")
                .unwrap(),
        )
        .text("backend", "tango");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // The uploaded image is not retained after the response.
    let leftovers: Vec<_> = std::fs::read_dir(work_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with("upload_")
        })
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_http_generate_unknown_backend_is_bad_request() {
    let work_dir = tempfile::tempdir().unwrap();
    let state = test_state(
        mock_pipeline(
            MockCaptioner::new(),
            default_backends(),
            MockAudioExtractor::new(),
        ),
        AdmissionGate::new(2, 10),
        work_dir.path().to_path_buf(),
    );
    let addr = spawn_server(state).await;

    let form = reqwest::multipart::Form::new()
        .text("image_url", "https://example.com/bird.png")
        .text("backend", "musicgen");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_http_generate_at_capacity_is_rejected() {
    let work_dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(AdmissionGate::new(1, 0));
    let state = AppState {
        pipeline: Arc::new(mock_pipeline(
            MockCaptioner::new(),
            default_backends(),
            MockAudioExtractor::new(),
        )),
        gate: Arc::clone(&gate),
        work_dir: work_dir.path().to_path_buf(),
    };
    let addr = spawn_server(state).await;

    // Hold the only slot so the incoming request overflows the empty queue.
    let permit = gate.admit().await.unwrap();

    let form = reqwest::multipart::Form::new()
        .text("image_url", "https://example.com/bird.png")
        .text("backend", "magnet");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("queue is full"));

    drop(permit);
}

#[tokio::test]
async fn test_http_compare_reports_per_backend_outcomes() {
    let work_dir = tempfile::tempdir().unwrap();
    let backends = vec![
        MockSoundBackend::new(BackendKind::Magnet)
            .with_invocation_error("space crashed".to_string()),
        MockSoundBackend::new(BackendKind::AudioGen),
    ];
    let state = test_state(
        mock_pipeline(MockCaptioner::new(), backends, MockAudioExtractor::new()),
        AdmissionGate::new(2, 10),
        work_dir.path().to_path_buf(),
    );
    let addr = spawn_server(state).await;

    let form = reqwest::multipart::Form::new().text("image_url", "https://example.com/bird.png");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/compare", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["caption"], "A small blue bird perched on a branch.");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["backend"], "magnet");
    assert!(results[0]["error"].as_str().unwrap().contains("space crashed"));
    assert_eq!(results[1]["backend"], "audiogen");
    assert_eq!(results[1]["artifact"]["kind"], "audio");
}

#[tokio::test]
async fn test_http_health() {
    let work_dir = tempfile::tempdir().unwrap();
    let state = test_state(
        mock_pipeline(
            MockCaptioner::new(),
            default_backends(),
            MockAudioExtractor::new(),
        ),
        AdmissionGate::new(2, 10),
        work_dir.path().to_path_buf(),
    );
    let addr = spawn_server(state).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}
