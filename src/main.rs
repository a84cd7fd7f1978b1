mod cli;
mod config;
mod dsp;
mod engine;
mod render;
mod sample;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use cli::Cli;
use dsp::fft::WindowKind;
use engine::{EngineConfig, HeatMapEngine};
use render::color::NormBounds;
use render::export::{self, ExportOptions};
use sample::{Sample, SampleFormat};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect specmap.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("specmap.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("specmap").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("specmap").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.threads == 1 {
                cli.threads = cfg.engine.threads;
            }
            if cli.window == "none" {
                cli.window = cfg.fft.window;
            }
            if cli.range_db == 100.0 {
                cli.range_db = cfg.render.range_db;
            }
            if !cli.rotate {
                cli.rotate = cfg.render.rotate;
            }
            if cli.max_ffts == 0 {
                cli.max_ffts = cfg.render.max_ffts_per_file;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.clone().context("Input capture file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let format = cli.format.context("Sample format is required (-y)")?;
    if cli.sample_rate <= 0.0 {
        anyhow::bail!("Sample rate must be positive (-s)");
    }
    if cli.fft_size == 0 {
        anyhow::bail!("FFT size must be positive (-f)");
    }
    if cli.time_step <= 0.0 {
        anyhow::bail!("Time between FFTs must be positive (-t)");
    }
    let window = cli.window.parse::<WindowKind>()?;
    match cli
        .output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
    {
        Some(ext) if ext == "png" || ext == "bmp" => {}
        _ => anyhow::bail!("Output must be a .png or .bmp path: {}", cli.output.display()),
    }
    if cli.rotate && cli.max_ffts > 0 {
        anyhow::bail!("--max-ffts splitting is only supported for the non-rotated layout");
    }
    if cli.normalize && cli.max_db.is_some() {
        log::warn!("--normalize overrides --max-db; ignoring the fixed ceiling");
        cli.max_db = None;
    }

    log::info!("specmap - IQ capture to spectrogram heat map");
    log::info!("Input: {} ({})", input.display(), format);
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "FFT: {} points every {}s @ {} Hz, {} worker(s)",
        cli.fft_size,
        cli.time_step,
        cli.sample_rate,
        cli.threads
    );

    match format {
        SampleFormat::I8 => run::<i8>(&cli, &input, window),
        SampleFormat::I16 => run::<i16>(&cli, &input, window),
        SampleFormat::I32 => run::<i32>(&cli, &input, window),
        SampleFormat::I64 => run::<i64>(&cli, &input, window),
        SampleFormat::U8 => run::<u8>(&cli, &input, window),
        SampleFormat::U16 => run::<u16>(&cli, &input, window),
        SampleFormat::U32 => run::<u32>(&cli, &input, window),
        SampleFormat::U64 => run::<u64>(&cli, &input, window),
        SampleFormat::F32 => run::<f32>(&cli, &input, window),
        SampleFormat::F64 => run::<f64>(&cli, &input, window),
    }
}

fn run<S: Sample>(cli: &Cli, input: &Path, window: WindowKind) -> Result<()> {
    let engine = HeatMapEngine::<S>::new(EngineConfig {
        input: input.to_path_buf(),
        sample_rate: cli.sample_rate,
        fft_size: cli.fft_size,
        time_step: cli.time_step,
        threads: cli.threads,
        start: cli.start,
        end: cli.end,
        window: dsp::fft::window_coef(window, cli.fft_size),
    });

    let num_ffts = engine.num_ffts();
    log::info!("Windows to compute: {}", num_ffts);

    let pb = ProgressBar::new(num_ffts as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} windows ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let map = engine.generate(|| pb.inc(1));
    pb.finish_and_clear();

    if let Some(range) = map.observed {
        log::info!(
            "Observed range: {:.1} dB .. {:.1} dB",
            range.min_db,
            range.max_db
        );
    }

    let bounds = NormBounds::resolve(
        cli.normalize,
        map.observed,
        cli.max_db,
        S::full_scale_db(),
        cli.range_db,
    );
    log::info!(
        "Rendering {}x{} with ceiling {:.1} dB, floor {:.1} dB",
        map.fft_size,
        map.num_ffts,
        bounds.max_db,
        bounds.min_db
    );

    export::save(
        &map,
        bounds,
        &cli.output,
        &ExportOptions {
            rotate: cli.rotate,
            max_ffts_per_file: cli.max_ffts,
        },
    )?;

    log::info!("Done");
    Ok(())
}
