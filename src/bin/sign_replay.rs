//! sign_replay - run the recognition pipeline over a recorded landmark trace
//!
//! Frames come from the synthetic `stub://` source at the configured rate.
//! Landmarks come from a JSON-lines trace (`--trace`) or, without one, from
//! the synthetic hand generator. The recognized sign is shown live on stderr
//! and a summary is printed at the end.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sign_translator::config::TranslatorConfig;
use sign_translator::detect::{
    BackendRegistry, LandmarkSource, ReplayLandmarkSource, SyntheticLandmarkSource,
};
use sign_translator::ingest::{LatestFrame, SyntheticSource};
use sign_translator::pipeline::{self, worker, RecognitionMode};
use sign_translator::Readiness;

#[path = "../ui.rs"]
mod ui;

const DEFAULT_SYNTHETIC_FRAMES: u64 = 300;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON-lines landmark trace; synthetic hand when omitted.
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Restart the trace when it runs out.
    #[arg(long = "loop")]
    looping: bool,
    /// Frames to feed (defaults to the whole trace, or 300 for the synthetic hand).
    #[arg(long)]
    frames: Option<u64>,
    /// Label catalog (JSON array of { label, word, translation }).
    #[arg(long, env = "SIGN_CATALOG_PATH")]
    catalog: Option<PathBuf>,
    /// Classifier backend name (see --list-backends).
    #[arg(long)]
    classifier: Option<String>,
    /// Model file for the classifier backend (the centroid table for `centroid`).
    /// Without a trace or a model, the synthetic hand's poses are recognized.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Label file for the classifier backend.
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Recognition mode (words|alphabet).
    #[arg(long)]
    mode: Option<RecognitionMode>,
    /// Frames per second fed to the pipeline.
    #[arg(long)]
    fps: Option<u32>,
    /// Print the registered classifier backends and exit.
    #[arg(long)]
    list_backends: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let registry = BackendRegistry::with_builtin();
    if args.list_backends {
        for name in registry.list() {
            println!("{}", name);
        }
        return Ok(());
    }

    let cfg = {
        let _stage = ui.stage("Load configuration");
        let mut cfg = TranslatorConfig::load()?;
        apply_args(&mut cfg, &args)?;
        cfg
    };

    let (landmarks, trace_len): (Box<dyn LandmarkSource>, Option<u64>) = {
        let _stage = ui.stage("Open landmark source");
        match &args.trace {
            Some(path) => {
                let replay = ReplayLandmarkSource::from_path(path)?.looping(args.looping);
                let len = replay.len() as u64;
                log::info!("replaying {} recorded frames from {}", len, path.display());
                (Box::new(replay), (!args.looping).then_some(len))
            }
            None => (Box::new(SyntheticLandmarkSource::default()), None),
        }
    };
    let total_frames = args
        .frames
        .or(trace_len)
        .unwrap_or(DEFAULT_SYNTHETIC_FRAMES);
    // A dropped frame never reaches the landmark source, so a full trace
    // replay counts delivered frames instead of offered ones.
    let replay_whole_trace = args.frames.is_none() && trace_len.is_some();

    let translator = {
        let _stage = ui.stage("Load classifier");
        cfg.build_translator(&registry, landmarks).into_shared()
    };
    if let Readiness::Disabled(reason) = worker::lock(&translator).readiness() {
        log::warn!("continuing without recognition: {}", reason);
    }

    let mut frames = SyntheticSource::new(cfg.source.clone())?;
    frames.connect()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    let publisher = worker::lock(&translator).publisher();
    let session = worker::lock(&translator).start();
    let slot = Arc::new(LatestFrame::new());
    let handle = pipeline::spawn_worker(translator.clone(), slot.clone())?;

    {
        let title = format!("Recognize ({}, {} frames)", session, total_frames);
        let _stage = ui.stage(&title);
        let mut live = ui.live();
        let mut seen = publisher.version();
        let mut offered = 0;
        loop {
            if shutdown.load(Ordering::SeqCst) {
                log::info!("shutdown signal received, stopping replay...");
                break;
            }
            let fed = if replay_whole_trace {
                slot.stats().delivered()
            } else {
                offered
            };
            if fed >= total_frames {
                break;
            }
            slot.offer(frames.next_frame_paced()?);
            offered += 1;
            if let Some((publication, version)) =
                publisher.wait_for_change(seen, Duration::from_millis(1))
            {
                seen = version;
                live.update(&publication);
            }
        }
        handle.stop()?;
        live.update(&publisher.latest());
    }

    let mut guard = worker::lock(&translator);
    let last = publisher.latest();
    let stats = guard.stats();
    let slot_stats = slot.stats();
    guard.stop();
    guard.close();
    drop(guard);

    println!(
        "frames: offered={} processed={} dropped={}",
        slot_stats.offered, stats.frames_applied, slot_stats.dropped
    );
    println!(
        "no_hand={} landmark_failures={} classifier_failures={} gated_out={}",
        stats.frames_without_hands,
        stats.landmark_failures,
        stats.classifier_failures,
        stats.gated_out
    );
    match (&last.word, &last.translation) {
        (Some(word), Some(translation)) => println!(
            "last sign: {} ({}) confidence {:.2}",
            word, translation, last.confidence
        ),
        _ => println!("last sign: none"),
    }
    Ok(())
}

fn apply_args(cfg: &mut TranslatorConfig, args: &Args) -> Result<()> {
    if let Some(path) = &args.catalog {
        cfg.catalog_path = Some(path.clone());
    }
    if let Some(name) = &args.classifier {
        cfg.classifier.backend = name.trim().to_lowercase();
    }
    if let Some(path) = &args.model {
        cfg.classifier.settings.model_path = Some(path.clone());
    }
    if let Some(path) = &args.labels {
        cfg.classifier.settings.labels_path = Some(path.clone());
    }
    if let Some(mode) = args.mode {
        cfg.pipeline.mode = mode;
    }
    if args.trace.is_none()
        && cfg.classifier.backend == "centroid"
        && cfg.classifier.settings.model_path.is_none()
    {
        log::info!("no centroid table given; recognizing the synthetic hand's poses");
        cfg.classifier.backend = "synthetic".to_string();
    }
    if let Some(fps) = args.fps {
        if fps == 0 {
            return Err(anyhow!("fps must be >= 1"));
        }
        cfg.source.target_fps = fps;
    }
    Ok(())
}
