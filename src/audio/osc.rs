use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Triangle,
    Square,
}

// Naive (non band-limited) phase accumulator. The tones sit well below
// Nyquist and only the triangle/square shapes carry harmonics.
#[derive(Clone, Copy, Debug)]
pub struct Osc {
    wave: Wave,
    phase: f32, // 0..1
}

impl Osc {
    pub fn new(wave: Wave) -> Self {
        Self { wave, phase: 0.0 }
    }

    #[inline]
    pub fn next_sample(&mut self, freq: f32, sample_rate: f32) -> f32 {
        let p = self.phase;
        let out = match self.wave {
            Wave::Sine => (p * TAU).sin(),
            Wave::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Wave::Square => {
                if p < 0.5 { 1.0 } else { -1.0 }
            }
        };
        self.phase += freq / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waves_are_bounded_and_periodic() {
        // 375 Hz at 48 kHz is exactly 128 samples per cycle
        for wave in [Wave::Sine, Wave::Triangle, Wave::Square] {
            let mut osc = Osc::new(wave);
            let samples: Vec<f32> = (0..256).map(|_| osc.next_sample(375.0, 48_000.0)).collect();
            for i in 0..128 {
                assert!(samples[i].abs() <= 1.0);
                assert!((samples[i] - samples[i + 128]).abs() < 1e-4, "{wave:?} drifted");
            }
        }
    }

    #[test]
    fn triangle_starts_at_the_trough() {
        let mut osc = Osc::new(Wave::Triangle);
        assert_eq!(osc.next_sample(100.0, 1000.0), -1.0);
    }
}
