use super::envelope::Smoothed;
use super::frame::StereoFrame;

const VOLUME_TIME_CONSTANT: f32 = 0.05;
pub const DEFAULT_MASTER_VOLUME: f32 = 0.7;

fn amp_to_db(amp: f32) -> f32 {
    20.0 * amp.abs().max(1e-10).log10()
}

fn db_to_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Fixed at engine start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 40.0,
            ratio: 12.0,
            attack_secs: 0.0,
            release_secs: 0.25,
        }
    }
}

// Feed-forward, soft-knee, peak-detecting compressor.
struct Compressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    reduction_db: f32,
}

impl Compressor {
    fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        let coeff = |secs: f32| {
            if secs <= 0.0 { 0.0 } else { (-1.0 / (secs * sample_rate)).exp() }
        };
        Self {
            attack_coeff: coeff(settings.attack_secs),
            release_coeff: coeff(settings.release_secs),
            settings,
            reduction_db: 0.0,
        }
    }

    // Static curve: output level for an input level, both in dB.
    fn curve(&self, x: f32) -> f32 {
        let CompressorSettings { threshold_db: t, knee_db: w, ratio: r, .. } = self.settings;
        let over = x - t;
        if 2.0 * over < -w {
            x
        } else if w > 0.0 && 2.0 * over.abs() <= w {
            x + (1.0 / r - 1.0) * (over + w / 2.0).powi(2) / (2.0 * w)
        } else {
            t + over / r
        }
    }

    #[inline]
    fn process(&mut self, frame: StereoFrame) -> StereoFrame {
        let x = amp_to_db(frame.peak());
        let wanted = self.curve(x) - x;
        let coeff = if wanted < self.reduction_db { self.attack_coeff } else { self.release_coeff };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * wanted;
        frame.scaled(db_to_amp(self.reduction_db))
    }
}

/// The single point every voice, layer and the reverb return pass through.
pub struct MasterBus {
    volume: f32,
    muted: bool,
    gain: Smoothed,
    compressor: Compressor,
}

impl MasterBus {
    pub fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        Self {
            volume: DEFAULT_MASTER_VOLUME,
            muted: false,
            gain: Smoothed::new(DEFAULT_MASTER_VOLUME, VOLUME_TIME_CONSTANT, sample_rate),
            compressor: Compressor::new(settings, sample_rate),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.retarget();
    }

    // Mute leaves the stored volume alone so unmute can restore it.
    pub fn set_mute(&mut self, muted: bool) {
        self.muted = muted;
        self.retarget();
    }

    fn retarget(&mut self) {
        self.gain.set_target(if self.muted { 0.0 } else { self.volume });
    }

    #[cfg(test)]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[cfg(test)]
    pub fn effective_gain(&self) -> f32 {
        self.gain.value()
    }

    #[inline]
    pub fn process(&mut self, frame: StereoFrame) -> StereoFrame {
        let g = self.gain.next_value();
        let out = self.compressor.process(frame.scaled(g));
        StereoFrame {
            left: out.left.clamp(-1.0, 1.0),
            right: out.right.clamp(-1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 8000.0;

    fn settle(bus: &mut MasterBus, input: StereoFrame, secs: f32) -> StereoFrame {
        let mut out = StereoFrame::zero();
        for _ in 0..(secs * SR) as usize {
            out = bus.process(input);
        }
        out
    }

    #[test]
    fn mute_silences_and_unmute_restores() {
        let mut bus = MasterBus::new(CompressorSettings::default(), SR);
        bus.set_volume(0.5);
        bus.set_mute(true);
        let out = settle(&mut bus, StereoFrame::mono(0.001), 1.0);
        assert!(out.peak() < 1e-7);
        assert_eq!(bus.volume(), 0.5);

        bus.set_mute(false);
        let out = settle(&mut bus, StereoFrame::mono(0.001), 1.0);
        assert!((out.left - 0.0005).abs() < 1e-6, "{}", out.left);
    }

    #[test]
    fn quiet_signals_pass_untouched() {
        let mut bus = MasterBus::new(CompressorSettings::default(), SR);
        bus.set_volume(1.0);
        let out = settle(&mut bus, StereoFrame::mono(0.001), 1.0);
        assert!((out.left - 0.001).abs() < 1e-6);
    }

    #[test]
    fn loud_signals_are_held_down() {
        let mut bus = MasterBus::new(CompressorSettings::default(), SR);
        bus.set_volume(1.0);
        let out = settle(&mut bus, StereoFrame::mono(1.0), 1.0);
        // 0 dB in, far above the knee: -24 + 24/12 = -22 dB out
        assert!((amp_to_db(out.left) + 22.0).abs() < 0.1, "{} dB", amp_to_db(out.left));
    }

    #[test]
    fn volume_changes_are_ramped() {
        let mut bus = MasterBus::new(CompressorSettings::default(), SR);
        bus.set_volume(0.0);
        bus.process(StereoFrame::mono(0.001));
        assert!(bus.effective_gain() > 0.6, "no instant drop");
    }
}
