use clap::Parser;
use std::path::PathBuf;

use crate::sample::SampleFormat;

#[derive(Parser, Debug)]
#[command(name = "specmap", about = "Render raw IQ captures into spectrogram heat-map images")]
pub struct Cli {
    /// Input capture: headerless interleaved IQ samples
    pub input: Option<PathBuf>,

    /// Output image (.png or .bmp)
    #[arg(short, long, default_value = "heatmap.png")]
    pub output: PathBuf,

    /// Sample rate of the capture in Hz
    #[arg(short, long, default_value_t = 0.0)]
    pub sample_rate: f64,

    /// Samples per FFT
    #[arg(short, long, default_value_t = 0)]
    pub fft_size: usize,

    /// Time between FFTs in seconds
    #[arg(short, long, default_value_t = 0.0)]
    pub time_step: f64,

    /// Sample numeric type: i8..i64, u8..u64, f32, f64 (C-style names accepted)
    #[arg(short = 'y', long)]
    pub format: Option<SampleFormat>,

    /// Worker slots used for concurrent FFTs
    #[arg(short = 'j', long, default_value_t = 1)]
    pub threads: usize,

    /// Capture start in bytes (negative counts from the end)
    #[arg(short = 'S', long, default_value_t = 0, allow_hyphen_values = true)]
    pub start: i64,

    /// Capture end in bytes (zero or negative counts from the end)
    #[arg(short = 'E', long, default_value_t = 0, allow_hyphen_values = true)]
    pub end: i64,

    /// Normalize the heat-map ceiling to the observed peak
    #[arg(short, long)]
    pub normalize: bool,

    /// Fixed heat-map ceiling in dB (default: sample type full scale)
    #[arg(short, long, allow_hyphen_values = true)]
    pub max_db: Option<f64>,

    /// Displayed dynamic range in dB
    #[arg(short, long, default_value_t = 100.0)]
    pub range_db: f64,

    /// Put time on the X axis and frequency on Y
    #[arg(long)]
    pub rotate: bool,

    /// Split the output every N windows (0 = single file)
    #[arg(short = 'M', long, default_value_t = 0)]
    pub max_ffts: usize,

    /// Window function applied before each FFT (none, hann)
    #[arg(short, long, default_value = "none")]
    pub window: String,

    /// Explicit config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}
