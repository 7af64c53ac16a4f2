use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
    BandPass,
}

pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Trapezoidal state-variable filter.
///
/// Cheap to retune per sample, which the wind layer relies on while its LFO
/// sweeps the band centre.
#[derive(Clone, Debug)]
pub struct Svf {
    mode: FilterMode,
    sample_rate: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
    ic1eq: f32,
    ic2eq: f32,
}

impl Svf {
    pub fn new(mode: FilterMode, cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let mut f = Self {
            mode,
            sample_rate,
            k: 1.0 / q.max(0.05),
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        f.set_cutoff(cutoff_hz);
        f
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterMode::LowPass, cutoff_hz, BUTTERWORTH_Q, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterMode::HighPass, cutoff_hz, BUTTERWORTH_Q, sample_rate)
    }

    pub fn bandpass(center_hz: f32, q: f32, sample_rate: f32) -> Self {
        Self::new(FilterMode::BandPass, center_hz, q, sample_rate)
    }

    #[inline]
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let nyquist_guard = self.sample_rate * 0.49;
        let fc = cutoff_hz.clamp(10.0, nyquist_guard);
        let g = (PI * fc / self.sample_rate).tan();
        self.a1 = 1.0 / (1.0 + g * (g + self.k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }

    #[inline]
    pub fn process(&mut self, v0: f32) -> f32 {
        let v3 = v0 - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        match self.mode {
            FilterMode::LowPass => v2,
            FilterMode::BandPass => self.k * v1, // unity gain at the centre
            FilterMode::HighPass => v0 - self.k * v1 - v2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    // steady-state peak of a filtered sine after the transient settles
    fn response(filter: &mut Svf, freq: f32) -> f32 {
        let n = (SR * 0.5) as usize;
        let mut peak = 0.0f32;
        for i in 0..n {
            let x = (2.0 * PI * freq * i as f32 / SR).sin();
            let y = filter.process(x);
            if i > n / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn lowpass_passes_lows_and_cuts_highs() {
        assert!(response(&mut Svf::lowpass(1000.0, SR), 100.0) > 0.9);
        assert!(response(&mut Svf::lowpass(1000.0, SR), 8000.0) < 0.05);
    }

    #[test]
    fn highpass_is_the_mirror() {
        assert!(response(&mut Svf::highpass(1200.0, SR), 100.0) < 0.05);
        assert!(response(&mut Svf::highpass(1200.0, SR), 8000.0) > 0.9);
    }

    #[test]
    fn bandpass_peaks_at_center() {
        let at_center = response(&mut Svf::bandpass(500.0, 0.5, SR), 500.0);
        let far_above = response(&mut Svf::bandpass(500.0, 0.5, SR), 12_000.0);
        assert!(at_center > 0.9);
        assert!(far_above < at_center * 0.2);
    }
}
