use std::str::FromStr;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner};
use thiserror::Error;

/// Plan a forward complex FFT of `size` points.
///
/// Planned once per run and shared by every compute slot; rustfft plans
/// are immutable and thread-safe.
pub fn plan_forward(size: usize) -> Arc<dyn Fft<f64>> {
    FftPlanner::<f64>::new().plan_fft_forward(size)
}

/// Window function applied to both channels before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    None,
    Hann,
}

#[derive(Debug, Error)]
#[error("unrecognized window '{0}' (expected none or hann)")]
pub struct UnknownWindow(String);

impl FromStr for WindowKind {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(WindowKind::None),
            "hann" => Ok(WindowKind::Hann),
            _ => Err(UnknownWindow(s.to_string())),
        }
    }
}

/// Coefficients for `kind`, or `None` when no windowing was requested.
pub fn window_coef(kind: WindowKind, size: usize) -> Option<Vec<f64>> {
    match kind {
        WindowKind::None => None,
        WindowKind::Hann => Some(hann_window(size)),
    }
}

fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}
