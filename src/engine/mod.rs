pub mod pool;
pub mod slice;
pub mod stats;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use crate::dsp::{fft, stage};
use crate::sample::Sample;
use pool::WorkerPool;
use slice::ResolvedSlice;
use stats::{DbRange, StatsAggregator};

/// Everything the engine needs to know about one run.
pub struct EngineConfig {
    pub input: PathBuf,
    /// Capture sample rate in Hz.
    pub sample_rate: f64,
    /// Complex samples per window.
    pub fft_size: usize,
    /// Seconds between consecutive windows; sets the byte stride.
    pub time_step: f64,
    /// Worker slots; clamped to a minimum of one.
    pub threads: usize,
    /// Requested byte range. Negative values count from the end of the
    /// file; an `end` of zero means the end of the file.
    pub start: i64,
    pub end: i64,
    /// Window coefficients, already generated for `fft_size` points.
    pub window: Option<Vec<f64>>,
}

/// A completed magnitude grid plus the aggregated dB range.
pub struct HeatMap {
    pub fft_size: usize,
    pub num_ffts: usize,
    /// `num_ffts * fft_size` dB values, row-major by window.
    pub grid: Vec<f64>,
    /// Observed extremes, `None` when no window was computed.
    pub observed: Option<DbRange>,
}

impl HeatMap {
    fn empty(fft_size: usize) -> Self {
        HeatMap {
            fft_size,
            num_ffts: 0,
            grid: Vec::new(),
            observed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_ffts == 0
    }
}

/// Turns a capture file into a [`HeatMap`].
///
/// Construction opens the capture and resolves the requested byte range;
/// failures there (and ranges resolving to nothing) leave the engine in
/// an empty state that yields zero windows rather than an error.
/// `generate` consumes the engine, so a heat map is computed exactly once.
pub struct HeatMapEngine<S: Sample> {
    input: PathBuf,
    fft_size: usize,
    threads: usize,
    window: Option<Vec<f64>>,
    file: Option<File>,
    slice: ResolvedSlice,
    stride_samples: usize,
    num_ffts: usize,
    _format: PhantomData<S>,
}

impl<S: Sample> HeatMapEngine<S> {
    pub fn new(cfg: EngineConfig) -> Self {
        let frame_bytes = 2 * S::WIDTH;
        // Negative or non-finite products cast to zero, which degenerates
        // to zero windows below.
        let stride_samples = (cfg.sample_rate * cfg.time_step).round() as usize;

        let opened = File::open(&cfg.input).and_then(|file| {
            let len = file.metadata()?.len();
            Ok((file, len))
        });

        let (file, resolved) = match opened {
            Ok((file, len)) => (Some(file), slice::resolve(len, cfg.start, cfg.end, frame_bytes)),
            Err(err) => {
                log::warn!("Failed to open {}: {}", cfg.input.display(), err);
                (None, None)
            }
        };

        let slice = resolved.unwrap_or(ResolvedSlice {
            offset: 0,
            num_samples: 0,
        });
        let num_ffts = slice::window_count(slice.num_samples, stride_samples, cfg.fft_size);

        HeatMapEngine {
            input: cfg.input,
            fft_size: cfg.fft_size,
            threads: cfg.threads.max(1),
            window: cfg.window,
            file,
            slice,
            stride_samples,
            num_ffts,
            _format: PhantomData,
        }
    }

    pub fn num_ffts(&self) -> usize {
        self.num_ffts
    }

    /// Compute every window and return the completed grid.
    ///
    /// One coordinator (this thread) reads the capture and dispatches;
    /// each window's transform runs on its own task, up to pool size in
    /// flight. `on_window` is invoked once per completed window, from the
    /// completing task.
    pub fn generate<F>(mut self, on_window: F) -> HeatMap
    where
        F: Fn() + Sync,
    {
        let fft_size = self.fft_size;
        let num_ffts = self.num_ffts;
        let mut file = match self.file.take() {
            Some(file) if num_ffts > 0 => file,
            _ => return HeatMap::empty(fft_size),
        };

        let plan = fft::plan_forward(fft_size);
        let scratch_len = plan.get_inplace_scratch_len();
        let pool = WorkerPool::new(
            (0..self.threads)
                .map(|_| stage::Slot::new(fft_size, S::WIDTH, scratch_len))
                .collect(),
        );
        let stats = StatsAggregator::new();
        let grid = Mutex::new(vec![0.0f64; num_ffts * fft_size]);
        let window = self.window.as_deref();
        let stride_bytes = self.stride_samples as u64 * 2 * S::WIDTH as u64;
        let offset = self.slice.offset;

        log::debug!(
            "Dispatching {} windows of {} from {}",
            num_ffts,
            fft_size,
            self.input.display()
        );

        thread::scope(|s| {
            let pool = &pool;
            let stats = &stats;
            let grid = &grid;
            let fft = plan.as_ref();
            let on_window = &on_window;

            for w in 0..num_ffts {
                let mut slot = pool.acquire();
                slot.window = w;
                read_window(&mut file, offset + w as u64 * stride_bytes, &mut slot.raw);

                s.spawn(move || {
                    stage::process::<S>(&mut slot, fft, window);
                    stats.merge(slot.min_db, slot.max_db);
                    {
                        let mut grid = grid.lock().unwrap();
                        let row = slot.window * fft_size;
                        grid[row..row + fft_size].copy_from_slice(&slot.row_db);
                    }
                    pool.release(slot);
                    on_window();
                });
            }

            // Every slot home again means every row has been published
            // and every min/max merged.
            pool.drain();
        });

        HeatMap {
            fft_size,
            num_ffts,
            grid: grid.into_inner().unwrap(),
            observed: stats.snapshot(),
        }
    }
}

/// Read one window's raw bytes at `offset`. A short read (truncated or
/// concurrently shrunk capture) zero-fills the tail instead of failing
/// the window.
fn read_window(file: &mut File, offset: u64, buf: &mut [u8]) {
    let mut filled = 0;
    match file.seek(SeekFrom::Start(offset)) {
        Ok(_) => {
            while filled < buf.len() {
                match file.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(ref err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        log::debug!("Read failed at byte {}: {}", offset, err);
                        break;
                    }
                }
            }
        }
        Err(err) => log::debug!("Seek to byte {} failed: {}", offset, err),
    }
    if filled < buf.len() {
        log::debug!(
            "Short read at byte {}: {} of {} bytes, zero-filling the rest",
            offset,
            filled,
            buf.len()
        );
        buf[filled..].fill(0);
    }
}
