use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio_api::AudioCommand;
#[cfg(test)]
use crate::audio_api::AmbienceCategory;
use crate::config::AudioConfig;

use super::ambience::Ambience;
#[cfg(test)]
use super::ambience::LayerStatus;
use super::frame::StereoFrame;
use super::master::{CompressorSettings, MasterBus};
use super::noise::NoiseBuffer;
use super::reverb::{ImpulseResponse, Reverb};
use super::tone::ToneVoice;

/// Everything that makes sound, owned by whoever renders it: the cpal
/// callback in the app, a plain loop in tests.
///
/// Signal flow per frame:
///   tones ──────────────┬──────────────► master ─► compressor ─► out
///   ambience (dry) ─────┤                  ▲
///   tones + birds/thunder ─► reverb send ──┘ (return)
pub struct Engine {
    sample_rate: f32,
    tones: Vec<ToneVoice>, // fixed capacity, never grows in the callback
    max_tones: usize,
    ambience: Ambience,
    reverb: Reverb,
    master: MasterBus,
}

impl Engine {
    pub fn new(sample_rate: u32, config: &AudioConfig) -> Self {
        let sr = sample_rate as f32;
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let noise = NoiseBuffer::pink((config.noise_seconds * sr) as usize, &mut rng);
        let ir = ImpulseResponse::synthesize(
            (config.reverb_seconds * sr) as usize,
            config.reverb_decay,
            &mut rng,
        );
        let max_tones = config.max_tone_voices.max(1);
        Self {
            sample_rate: sr,
            tones: Vec::with_capacity(max_tones),
            max_tones,
            ambience: Ambience::new(noise, sr, config.seed.wrapping_add(1)),
            reverb: Reverb::new(&ir, config.reverb_block, config.reverb_return),
            master: MasterBus::new(CompressorSettings::default(), sr),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::PlayTone { frequency, timbre } => {
                if !frequency.is_finite() || frequency <= 0.0 {
                    return;
                }
                let voice = ToneVoice::new(frequency, timbre, self.sample_rate);
                if self.tones.len() < self.max_tones {
                    self.tones.push(voice);
                } else if let Some(slot) = self
                    .tones
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.remaining())
                    .map(|(i, _)| i)
                {
                    // full: replace whichever voice is closest to done anyway
                    self.tones[slot] = voice;
                }
            }
            AudioCommand::SetAmbience { category, active, volume } => {
                self.ambience.set(category, active, volume);
            }
            AudioCommand::SetMasterVolume(v) => self.master.set_volume(v),
            AudioCommand::SetMute(m) => self.master.set_mute(m),
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            let mut tone = 0.0;
            for v in self.tones.iter_mut() {
                tone += v.next_sample();
            }
            let (amb_dry, amb_send) = self.ambience.next_sample();
            let wet = self.reverb.process(tone + amb_send);
            let mut mix = StereoFrame::mono(tone + amb_dry);
            mix += wet;
            *frame = self.master.process(mix);
        }
        self.tones.retain(ToneVoice::is_active);
        self.ambience.reap();
    }

    #[cfg(test)]
    pub fn live_tones(&self) -> usize {
        self.tones.len()
    }

    #[cfg(test)]
    pub fn ambience_status(&self, category: AmbienceCategory) -> LayerStatus {
        self.ambience.status(category)
    }

    #[cfg(test)]
    pub fn master(&self) -> &MasterBus {
        &self.master
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::Timbre;
    use pretty_assertions::assert_eq;

    const SR: u32 = 8000;

    fn small_config() -> AudioConfig {
        AudioConfig {
            noise_seconds: 1.0,
            reverb_seconds: 0.5,
            reverb_block: 256,
            max_tone_voices: 4,
            ..AudioConfig::default()
        }
    }

    fn render(engine: &mut Engine, secs: f32) -> Vec<StereoFrame> {
        let mut out = vec![StereoFrame::zero(); (secs * SR as f32) as usize];
        for chunk in out.chunks_mut(512) {
            engine.render_block(chunk);
        }
        out
    }

    fn peak(frames: &[StereoFrame]) -> f32 {
        frames.iter().fold(0.0f32, |m, f| m.max(f.peak()))
    }

    #[test]
    fn silent_until_something_plays() {
        let mut engine = Engine::new(SR, &small_config());
        assert_eq!(peak(&render(&mut engine, 0.5)), 0.0);
    }

    #[test]
    fn tone_plays_then_cleans_itself_up() {
        let mut engine = Engine::new(SR, &small_config());
        engine.handle_cmd(AudioCommand::PlayTone { frequency: 440.0, timbre: Timbre::Wood });
        assert_eq!(engine.live_tones(), 1);
        let out = render(&mut engine, 0.5);
        assert!(peak(&out) > 0.05);
        render(&mut engine, 1.5);
        assert_eq!(engine.live_tones(), 0);
    }

    #[test]
    fn reverb_tail_outlives_the_dry_tone() {
        let mut engine = Engine::new(SR, &small_config());
        engine.handle_cmd(AudioCommand::PlayTone { frequency: 440.0, timbre: Timbre::Wood });
        render(&mut engine, 1.6);
        assert_eq!(engine.live_tones(), 0);
        let tail = render(&mut engine, 0.2);
        assert!(peak(&tail) > 0.0);
    }

    #[test]
    fn voice_pool_is_capped() {
        let mut engine = Engine::new(SR, &small_config());
        for i in 0..10 {
            engine.handle_cmd(AudioCommand::PlayTone {
                frequency: 220.0 + i as f32,
                timbre: Timbre::Ether,
            });
        }
        assert_eq!(engine.live_tones(), 4);
    }

    #[test]
    fn bad_frequencies_are_ignored() {
        let mut engine = Engine::new(SR, &small_config());
        engine.handle_cmd(AudioCommand::PlayTone { frequency: f32::NAN, timbre: Timbre::Crystal });
        engine.handle_cmd(AudioCommand::PlayTone { frequency: 0.0, timbre: Timbre::Crystal });
        assert_eq!(engine.live_tones(), 0);
    }

    #[test]
    fn repeated_set_ambience_keeps_one_source() {
        let mut engine = Engine::new(SR, &small_config());
        let cmd = AudioCommand::SetAmbience {
            category: AmbienceCategory::Wind,
            active: true,
            volume: 0.3,
        };
        engine.handle_cmd(cmd.clone());
        render(&mut engine, 0.1);
        engine.handle_cmd(cmd);
        let status = engine.ambience_status(AmbienceCategory::Wind);
        assert_eq!(status.sources_started, 1);
        assert!(status.active);
    }

    #[test]
    fn mute_is_a_master_override() {
        let mut engine = Engine::new(SR, &small_config());
        engine.handle_cmd(AudioCommand::SetAmbience {
            category: AmbienceCategory::Rain,
            active: true,
            volume: 0.5,
        });
        render(&mut engine, 2.0);
        engine.handle_cmd(AudioCommand::SetMute(true));
        render(&mut engine, 1.0);
        let muted = render(&mut engine, 0.5);
        assert!(peak(&muted) < 1e-5);

        let rain = engine.ambience_status(AmbienceCategory::Rain);
        assert!(rain.active);
        assert_eq!(rain.volume, 0.5);
        assert_eq!(engine.master().volume(), 0.7);
    }
}
