//! Command runners for `devices`, `listen` and `feed`

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, info};

use crate::application::ports::ConfigStore;
use crate::application::{DetectorConfig, DetectorEvent, WakeDetector};
use crate::domain::audio::{read_wav, AudioFormat};
use crate::domain::config::AppConfig;
use crate::domain::error::PipelineError;
use crate::domain::recording::Duration;
use crate::infrastructure::recording::FrameConverter;
use crate::infrastructure::{create_backend, BackendKind, LoggingEngine, XdgConfigStore};

use super::args::{FeedOptions, ListenOptions};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the configured capture device
pub const DEVICE_ENV: &str = "WAKE_CAPTURE_DEVICE";

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    let env_config = AppConfig {
        device: env::var(DEVICE_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Resolve the configured capture backend
fn backend_from_config(config: &AppConfig) -> Result<BackendKind, String> {
    config
        .backend_or_default()
        .parse::<BackendKind>()
        .map_err(|e| e.to_string())
}

/// Run blocking detector control calls without stalling the runtime
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

/// Print input device information
pub fn run_devices(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let kind = match backend_from_config(config) {
        Ok(kind) => kind,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };
    let backend = match create_backend(&kind) {
        Ok(backend) => backend,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let names = backend.input_device_names();
    presenter.key_value("backend", backend.name());
    presenter.key_value("input devices", &backend.input_device_count().to_string());
    presenter.key_value(
        "default",
        backend.default_input_device().as_deref().unwrap_or("(none)"),
    );
    for name in &names {
        presenter.output(&format!("  {}", name));
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Save the trailing `window` (or the whole history) of `detector` to `path`
fn save_history(
    detector: &WakeDetector,
    presenter: &Presenter,
    path: &Path,
    window: Option<Duration>,
) -> Result<(), PipelineError> {
    let window = window.unwrap_or(detector.config().buffer_duration);
    let samples = detector.save_last_audio(window.as_millis(), path)?;
    let millis = AudioFormat::SPEECH.millis_for_samples(samples);
    presenter.success(&format!("Saved {} ms of audio to {}", millis, path.display()));
    Ok(())
}

/// Listen on the configured capture device until the duration elapses,
/// the engine ends the session, or Ctrl+C.
pub async fn run_listen(options: ListenOptions, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let kind = match &options.replay {
        Some(path) => BackendKind::Replay(path.clone()),
        None => match backend_from_config(&config) {
            Ok(kind) => kind,
            Err(e) => {
                presenter.error(&e);
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
    };
    let backend = match create_backend(&kind) {
        Ok(backend) => backend,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let engine = Arc::new(LoggingEngine::new());
    let mut detector =
        WakeDetector::new(engine, DetectorConfig::from_app_config(&config)).with_backend(backend);

    let (tx, mut rx) = mpsc::unbounded_channel::<DetectorEvent>();
    detector.set_callback(move |event| {
        let _ = tx.send(event.clone());
    });

    if let Err(e) = blocking(|| detector.start_with_microphone()) {
        presenter.error(&format!("Failed to start listening: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let total_ms = options.duration.as_millis();
    let started = Instant::now();
    presenter.start_spinner("Listening...");

    let mut ticker = interval(TokioDuration::from_millis(100));
    let mut engine_ended = false;
    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                presenter.event(&event);
                if matches!(event, DetectorEvent::Ended(_)) {
                    engine_ended = true;
                    break;
                }
            }
            _ = ticker.tick() => {
                let elapsed = started.elapsed().as_millis() as u64;
                presenter.update_listen_progress(elapsed.min(total_ms), total_ms);
                if elapsed >= total_ms {
                    debug!("listen duration elapsed");
                    break;
                }
                if shutdown.is_shutdown() {
                    info!("listen interrupted");
                    break;
                }
            }
        }
    }

    if let Err(e) = blocking(|| detector.stop()) {
        presenter.spinner_fail("Stop failed");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    while let Ok(event) = rx.try_recv() {
        presenter.event(&event);
    }

    let elapsed = Duration::from_secs(started.elapsed().as_secs());
    if engine_ended {
        presenter.spinner_success(&format!("Session ended by engine after {}", elapsed));
    } else {
        presenter.spinner_success(&format!("Listened for {}", elapsed));
    }

    if let Some(path) = &options.save {
        if let Err(e) = save_history(&detector, &presenter, path, options.window) {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Decode `path` into 16kHz mono samples
fn load_speech(path: &Path) -> Result<Vec<i16>, PipelineError> {
    let (format, samples) = read_wav(path)?;
    if format == AudioFormat::SPEECH {
        return Ok(samples);
    }
    debug!(%format, "converting input to speech format");
    FrameConverter::new(format.sample_rate, format.channels)?.convert_all(&samples)
}

/// Push a WAV file through the detector frame by frame
pub async fn run_feed(options: FeedOptions, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    if options.frame_ms == 0 {
        presenter.error("Frame length must be greater than zero");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let samples = match load_speech(&options.input) {
        Ok(samples) => samples,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let engine = Arc::new(LoggingEngine::new());
    let mut detector = WakeDetector::new(engine, DetectorConfig::from_app_config(&config));

    let (tx, mut rx) = mpsc::unbounded_channel::<DetectorEvent>();
    detector.set_callback(move |event| {
        let _ = tx.send(event.clone());
    });

    if let Err(e) = detector.start() {
        presenter.error(&format!("Failed to start detector: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let frame_len = AudioFormat::SPEECH.samples_for_millis(options.frame_ms).max(1);
    let mut frames = 0usize;
    for frame in samples.chunks(frame_len) {
        match detector.process_audio(frame) {
            Ok(()) => frames += 1,
            Err(PipelineError::NotReady(_)) if !detector.is_running() => {
                debug!(frames, "engine ended the session");
                break;
            }
            Err(e) => {
                while let Ok(event) = rx.try_recv() {
                    presenter.event(&event);
                }
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
        }
        while let Ok(event) = rx.try_recv() {
            presenter.event(&event);
        }
    }

    if let Err(e) = detector.stop() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    while let Ok(event) = rx.try_recv() {
        presenter.event(&event);
    }

    let fed = AudioFormat::SPEECH.millis_for_samples(samples.len().min(frames * frame_len));
    presenter.success(&format!("Fed {} frames ({} ms)", frames, fed));

    if let Some(path) = &options.save {
        if let Err(e) = save_history(&detector, &presenter, path, options.window) {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
