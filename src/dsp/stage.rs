use rustfft::{num_complex::Complex, Fft};

use crate::sample::Sample;

/// Reusable scratch buffers for one in-flight window.
///
/// Allocated once per worker slot at engine construction and reused for
/// every window the slot processes; nothing here is resized mid-run. The
/// slot carries its own dB row plus the window index it belongs to, so a
/// task never holds a pointer into the shared grid.
pub struct Slot {
    /// Raw interleaved IQ bytes exactly as read from the capture.
    pub raw: Vec<u8>,
    i_chan: Vec<f64>,
    q_chan: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    /// Per-bin magnitude in dB for the current window.
    pub row_db: Vec<f64>,
    /// Window index this slot is currently assigned to.
    pub window: usize,
    pub min_db: f64,
    pub max_db: f64,
}

impl Slot {
    pub fn new(fft_size: usize, sample_width: usize, scratch_len: usize) -> Self {
        Slot {
            raw: vec![0; 2 * fft_size * sample_width],
            i_chan: vec![0.0; fft_size],
            q_chan: vec![0.0; fft_size],
            spectrum: vec![Complex::default(); fft_size],
            scratch: vec![Complex::default(); scratch_len],
            row_db: vec![0.0; fft_size],
            window: 0,
            min_db: 0.0,
            max_db: 0.0,
        }
    }
}

/// Run one window through the transform: de-interleave the raw bytes into
/// I and Q channels, apply the window coefficients if any, transform, and
/// fill the slot's dB row and local min/max.
pub fn process<S: Sample>(slot: &mut Slot, fft: &dyn Fft<f64>, window: Option<&[f64]>) {
    let n = slot.row_db.len();

    // Even sample positions are I, odd are Q.
    for i in 0..n {
        slot.i_chan[i] = S::decode(&slot.raw[2 * i * S::WIDTH..]);
        slot.q_chan[i] = S::decode(&slot.raw[(2 * i + 1) * S::WIDTH..]);
    }

    if let Some(coef) = window {
        for i in 0..n {
            slot.i_chan[i] *= coef[i];
            slot.q_chan[i] *= coef[i];
        }
    }

    for i in 0..n {
        slot.spectrum[i] = Complex::new(slot.i_chan[i], slot.q_chan[i]);
    }
    fft.process_with_scratch(&mut slot.spectrum, &mut slot.scratch);

    // Bin 0 seeds min/max so no sentinel is needed. A zero-magnitude bin
    // maps to -inf and is stored as-is.
    slot.row_db[0] = 10.0 * slot.spectrum[0].norm_sqr().log10();
    slot.min_db = slot.row_db[0];
    slot.max_db = slot.row_db[0];
    for i in 1..n {
        let db = 10.0 * slot.spectrum[i].norm_sqr().log10();
        slot.row_db[i] = db;
        if db > slot.max_db {
            slot.max_db = db;
        } else if db < slot.min_db {
            slot.min_db = db;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::fft;

    fn tone_slot(fft_size: usize, bin: usize, amp: f64) -> Slot {
        let plan = fft::plan_forward(fft_size);
        let mut slot = Slot::new(fft_size, 2, plan.get_inplace_scratch_len());
        for i in 0..fft_size {
            let phase = 2.0 * std::f64::consts::PI * bin as f64 * i as f64 / fft_size as f64;
            let i_val = (amp * phase.cos()).round() as i16;
            let q_val = (amp * phase.sin()).round() as i16;
            slot.raw[4 * i..4 * i + 2].copy_from_slice(&i_val.to_le_bytes());
            slot.raw[4 * i + 2..4 * i + 4].copy_from_slice(&q_val.to_le_bytes());
        }
        slot
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let fft_size = 64;
        let bin = 11;
        let plan = fft::plan_forward(fft_size);
        let mut slot = tone_slot(fft_size, bin, 8192.0);

        process::<i16>(&mut slot, plan.as_ref(), None);

        let peak = slot
            .row_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
        assert!(slot.min_db <= slot.max_db);
        assert!((slot.max_db - slot.row_db[bin]).abs() < 1e-12);
    }

    #[test]
    fn tone_level_matches_closed_form() {
        // A full bin accumulates amp * N in an unnormalized transform.
        let fft_size = 16;
        let amp = 8000.0;
        let plan = fft::plan_forward(fft_size);
        let mut slot = tone_slot(fft_size, 5, amp);

        process::<i16>(&mut slot, plan.as_ref(), None);

        let expected = 20.0 * (amp * fft_size as f64).log10();
        assert!((slot.row_db[5] - expected).abs() < 0.05);
    }

    #[test]
    fn silence_propagates_negative_infinity() {
        let fft_size = 8;
        let plan = fft::plan_forward(fft_size);
        let mut slot = Slot::new(fft_size, 2, plan.get_inplace_scratch_len());

        process::<i16>(&mut slot, plan.as_ref(), None);

        assert!(slot.row_db.iter().all(|db| *db == f64::NEG_INFINITY));
        assert_eq!(slot.min_db, f64::NEG_INFINITY);
        assert_eq!(slot.max_db, f64::NEG_INFINITY);
    }

    #[test]
    fn hann_window_suppresses_leakage() {
        // An off-grid tone leaks everywhere unwindowed; Hann pulls the
        // far-field bins down relative to the peak.
        let fft_size = 64;
        let plan = fft::plan_forward(fft_size);
        let coef = fft::window_coef(fft::WindowKind::Hann, fft_size).unwrap();

        let mut raw = vec![0u8; 4 * fft_size];
        for i in 0..fft_size {
            let phase = 2.0 * std::f64::consts::PI * 7.5 * i as f64 / fft_size as f64;
            let i_val = (8192.0 * phase.cos()).round() as i16;
            let q_val = (8192.0 * phase.sin()).round() as i16;
            raw[4 * i..4 * i + 2].copy_from_slice(&i_val.to_le_bytes());
            raw[4 * i + 2..4 * i + 4].copy_from_slice(&q_val.to_le_bytes());
        }

        let mut plain = Slot::new(fft_size, 2, plan.get_inplace_scratch_len());
        plain.raw.copy_from_slice(&raw);
        process::<i16>(&mut plain, plan.as_ref(), None);

        let mut windowed = Slot::new(fft_size, 2, plan.get_inplace_scratch_len());
        windowed.raw.copy_from_slice(&raw);
        process::<i16>(&mut windowed, plan.as_ref(), Some(&coef));

        let far_bin = 40;
        let plain_rel = plain.max_db - plain.row_db[far_bin];
        let windowed_rel = windowed.max_db - windowed.row_db[far_bin];
        assert!(windowed_rel > plain_rel + 20.0);
    }
}
