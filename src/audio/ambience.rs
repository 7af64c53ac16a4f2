// Background nature layers.
//
// Every category owns one `Layer`: a smoothed output gain, optionally a
// continuous noise bed that is created on first activation and then runs
// for the life of the engine, and optionally a recurrence chain that fires
// short one-shot events (chirps, claps, crackles) at jittered intervals.
// Chains run on the engine's sample clock, so stopping one is just
// clearing its countdown.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio_api::AmbienceCategory;

use super::envelope::{Envelope, EnvelopeCursor, Smoothed};
use super::filter::Svf;
use super::noise::{NoiseBuffer, NoiseReader};
use super::osc::{Osc, Wave};

// in-flight one-shots per layer; thunder is the longest at 6 s
const MAX_EVENTS_PER_LAYER: usize = 8;

const WIND_LFO_HZ: f32 = 0.08;
const WIND_CENTER_HZ: f32 = 500.0;
const WIND_SWEEP_HZ: f32 = 300.0;
const OCEAN_LFO_HZ: f32 = 0.12;
const OCEAN_SWELL_DEPTH: f32 = 0.27;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Recurrence {
    min_ms: f32,
    max_ms: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BedKind {
    Rain,
    Wind,
    Ocean,
    Fire,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventKind {
    Chirp,
    Clap,
    Buzz,
    Crackle,
}

// Static description of a category
struct Profile {
    scale: f32,
    time_constant: f32,
    bed: Option<BedKind>,
    event: Option<(EventKind, Recurrence)>,
    to_reverb: bool,
}

fn profile(category: AmbienceCategory) -> Profile {
    use AmbienceCategory::*;
    match category {
        Rain => Profile { scale: 0.8, time_constant: 0.5, bed: Some(BedKind::Rain), event: None, to_reverb: false },
        Wind => Profile { scale: 1.2, time_constant: 1.0, bed: Some(BedKind::Wind), event: None, to_reverb: false },
        Ocean => Profile { scale: 1.5, time_constant: 0.5, bed: Some(BedKind::Ocean), event: None, to_reverb: false },
        Fire => Profile {
            scale: 0.8,
            time_constant: 0.5,
            bed: Some(BedKind::Fire),
            event: Some((EventKind::Crackle, Recurrence { min_ms: 100.0, max_ms: 900.0 })),
            to_reverb: false,
        },
        Birds => Profile {
            scale: 1.0,
            time_constant: 0.5,
            bed: None,
            event: Some((EventKind::Chirp, Recurrence { min_ms: 3000.0, max_ms: 10_000.0 })),
            to_reverb: true,
        },
        Thunder => Profile {
            scale: 1.0,
            time_constant: 0.5,
            bed: None,
            event: Some((EventKind::Clap, Recurrence { min_ms: 15_000.0, max_ms: 40_000.0 })),
            to_reverb: true,
        },
        Crickets => Profile {
            scale: 1.0,
            time_constant: 0.5,
            bed: None,
            event: Some((EventKind::Buzz, Recurrence { min_ms: 1000.0, max_ms: 5000.0 })),
            to_reverb: false,
        },
    }
}

// Looping filtered noise, the continuous part of rain/wind/ocean/fire
struct Bed {
    kind: BedKind,
    noise: NoiseReader,
    filter: Svf,
    lfo: Osc,
}

impl Bed {
    fn new(kind: BedKind, noise: NoiseReader, sample_rate: f32) -> Self {
        let filter = match kind {
            BedKind::Rain => Svf::lowpass(1000.0, sample_rate),
            BedKind::Wind => Svf::bandpass(WIND_CENTER_HZ, 0.5, sample_rate),
            BedKind::Ocean => Svf::lowpass(400.0, sample_rate),
            BedKind::Fire => Svf::highpass(1200.0, sample_rate),
        };
        Self { kind, noise, filter, lfo: Osc::new(Wave::Sine) }
    }

    #[inline]
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.kind {
            BedKind::Wind => {
                let sweep = self.lfo.next_sample(WIND_LFO_HZ, sample_rate);
                self.filter.set_cutoff(WIND_CENTER_HZ + WIND_SWEEP_HZ * sweep);
                self.filter.process(self.noise.next_sample())
            }
            BedKind::Ocean => {
                let swell = 1.0 + OCEAN_SWELL_DEPTH * self.lfo.next_sample(OCEAN_LFO_HZ, sample_rate);
                self.filter.process(self.noise.next_sample()) * swell
            }
            BedKind::Rain | BedKind::Fire => self.filter.process(self.noise.next_sample()),
        }
    }
}

enum EventSource {
    Sweep { osc: Osc, freq: EnvelopeCursor },
    Buzz { carrier: Osc, modulator: Osc, freq: f32 },
    Noise { noise: NoiseReader, filter: Svf },
}

// One chirp / clap / crackle with a fixed lifetime
struct EventVoice {
    source: EventSource,
    gain: EnvelopeCursor,
    age: u32,
    stop_at: u32,
}

impl EventVoice {
    fn is_active(&self) -> bool {
        self.age < self.stop_at
    }

    #[inline]
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        self.age += 1;
        let s = match &mut self.source {
            EventSource::Sweep { osc, freq } => osc.next_sample(freq.next_value(), sample_rate),
            EventSource::Buzz { carrier, modulator, freq } => {
                let wobble = modulator.next_sample(50.0, sample_rate) * *freq * 0.1;
                carrier.next_sample(*freq + wobble, sample_rate)
            }
            EventSource::Noise { noise, filter } => filter.process(noise.next_sample()),
        };
        s * self.gain.next_value()
    }
}

// Countdown to the next event, in samples; None while the chain is stopped
#[derive(Clone, Copy, Debug)]
struct Chain {
    due_in: Option<u32>,
    every: Recurrence,
}

struct Layer {
    profile: Profile,
    gain: Smoothed,
    active: bool,
    volume: f32,
    bed: Option<Bed>,
    chain: Option<Chain>,
    events: Vec<EventVoice>,
    sources_started: u32,
    events_fired: u32,
}

/// Snapshot of one layer.
#[cfg(test)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStatus {
    pub active: bool,
    pub volume: f32,
    pub gain: f32,
    pub target_gain: f32,
    pub source_running: bool,
    pub sources_started: u32,
    pub chain_running: bool,
    pub events_fired: u32,
    pub events_in_flight: usize,
}

pub struct Ambience {
    layers: Vec<Layer>,
    noise: NoiseBuffer,
    rng: Pcg32,
    sample_rate: f32,
}

impl Ambience {
    pub fn new(noise: NoiseBuffer, sample_rate: f32, seed: u64) -> Self {
        let layers = AmbienceCategory::ALL
            .into_iter()
            .map(|category| {
                let profile = profile(category);
                let chain = profile
                    .event
                    .map(|(_, every)| Chain { due_in: None, every });
                Layer {
                    gain: Smoothed::new(0.0, profile.time_constant, sample_rate),
                    profile,
                    active: false,
                    volume: 0.0,
                    bed: None,
                    chain,
                    events: Vec::with_capacity(MAX_EVENTS_PER_LAYER),
                    sources_started: 0,
                    events_fired: 0,
                }
            })
            .collect();
        Self {
            layers,
            noise,
            rng: Pcg32::seed_from_u64(seed),
            sample_rate,
        }
    }

    /// Gate and level for one category. Safe to call repeatedly with the
    /// same arguments: the bed is only ever created once and a running chain
    /// is left alone.
    pub fn set(&mut self, category: AmbienceCategory, active: bool, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        let sample_rate = self.sample_rate;
        let noise_len = self.noise.len();
        let layer = &mut self.layers[category.index()];
        layer.active = active;
        layer.volume = volume;
        let target = if active { volume * layer.profile.scale } else { 0.0 };
        layer.gain.set_target(target);

        if active {
            if let (Some(kind), None) = (layer.profile.bed, layer.bed.as_ref()) {
                let offset = self.rng.random_range(0..noise_len);
                layer.bed = Some(Bed::new(kind, self.noise.reader(offset), sample_rate));
                layer.sources_started += 1;
            }
            if let Some(chain) = layer.chain.as_mut() {
                if chain.due_in.is_none() {
                    chain.due_in = Some(0);
                }
            }
        } else if let Some(chain) = layer.chain.as_mut() {
            chain.due_in = None;
        }
    }

    /// Next sample of the dry sum and of the reverb send.
    #[inline]
    pub fn next_sample(&mut self) -> (f32, f32) {
        let mut dry = 0.0;
        let mut send = 0.0;
        for i in 0..self.layers.len() {
            if self.tick_chain(i) {
                self.spawn_event(i);
            }
            let sample_rate = self.sample_rate;
            let layer = &mut self.layers[i];
            let g = layer.gain.next_value();
            if g.abs() < 1e-6 && layer.gain.target() == 0.0 && layer.events.is_empty() {
                continue;
            }
            let mut s = 0.0;
            if let Some(bed) = layer.bed.as_mut() {
                s += bed.next_sample(sample_rate);
            }
            for ev in layer.events.iter_mut() {
                s += ev.next_sample(sample_rate);
            }
            let out = s * g;
            dry += out;
            if layer.profile.to_reverb {
                send += out;
            }
        }
        (dry, send)
    }

    /// Drop finished one-shots. Called once per rendered block.
    pub fn reap(&mut self) {
        for layer in &mut self.layers {
            layer.events.retain(EventVoice::is_active);
        }
    }

    fn tick_chain(&mut self, i: usize) -> bool {
        let Some(chain) = self.layers[i].chain.as_mut() else {
            return false;
        };
        match chain.due_in {
            Some(0) => {
                let every = chain.every;
                let ms = if every.max_ms > every.min_ms {
                    self.rng.random_range(every.min_ms..every.max_ms)
                } else {
                    every.min_ms
                };
                let samples = ((ms / 1000.0) * self.sample_rate).max(1.0) as u32;
                chain.due_in = Some(samples - 1);
                true
            }
            Some(n) => {
                chain.due_in = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn spawn_event(&mut self, i: usize) {
        let Some((kind, _)) = self.layers[i].profile.event else {
            return;
        };
        let voice = self.make_event(kind);
        let layer = &mut self.layers[i];
        layer.events_fired += 1;
        if layer.events.len() < MAX_EVENTS_PER_LAYER {
            layer.events.push(voice);
        }
    }

    fn make_event(&mut self, kind: EventKind) -> EventVoice {
        let sr = self.sample_rate;
        let stop_secs;
        let (source, gain) = match kind {
            EventKind::Chirp => {
                let f: f32 = self.rng.random_range(1800.0..3000.0);
                stop_secs = 0.4;
                (
                    EventSource::Sweep {
                        osc: Osc::new(Wave::Sine),
                        freq: Envelope::starting_at(f).exponential_to(f + 500.0, 0.1).cursor(sr),
                    },
                    Envelope::starting_at(0.0).linear_to(0.08, 0.05).exponential_to(0.001, 0.3),
                )
            }
            EventKind::Clap => {
                stop_secs = 6.0;
                (
                    EventSource::Noise {
                        noise: self.random_noise_reader(),
                        filter: Svf::lowpass(180.0, sr),
                    },
                    Envelope::starting_at(0.0).linear_to(1.0, 0.1).exponential_to(0.01, 5.0),
                )
            }
            EventKind::Buzz => {
                let f: f32 = self.rng.random_range(4000.0..4500.0);
                stop_secs = 0.25;
                (
                    EventSource::Buzz {
                        carrier: Osc::new(Wave::Sine),
                        modulator: Osc::new(Wave::Square),
                        freq: f,
                    },
                    Envelope::starting_at(0.0).linear_to(0.02, 0.01).linear_to(0.0, 0.2),
                )
            }
            EventKind::Crackle => {
                let center: f32 = self.rng.random_range(3000.0..5000.0);
                stop_secs = 0.1;
                (
                    EventSource::Noise {
                        noise: self.random_noise_reader(),
                        filter: Svf::bandpass(center, 1.0, sr),
                    },
                    Envelope::starting_at(0.0).linear_to(0.3, 0.005).exponential_to(0.001, 0.05),
                )
            }
        };
        EventVoice {
            source,
            gain: gain.cursor(sr),
            age: 0,
            stop_at: (stop_secs * sr) as u32,
        }
    }

    fn random_noise_reader(&mut self) -> NoiseReader {
        let offset = self.rng.random_range(0..self.noise.len());
        self.noise.reader(offset)
    }

    #[cfg(test)]
    pub fn status(&self, category: AmbienceCategory) -> LayerStatus {
        let layer = &self.layers[category.index()];
        LayerStatus {
            active: layer.active,
            volume: layer.volume,
            gain: layer.gain.value(),
            target_gain: layer.gain.target(),
            source_running: layer.bed.is_some(),
            sources_started: layer.sources_started,
            chain_running: layer.chain.is_some_and(|c| c.due_in.is_some()),
            events_fired: layer.events_fired,
            events_in_flight: layer.events.len(),
        }
    }

    // Pin a category's interval so chain behaviour can be asserted exactly.
    #[cfg(test)]
    fn fix_interval(&mut self, category: AmbienceCategory, ms: f32) {
        if let Some(chain) = self.layers[category.index()].chain.as_mut() {
            chain.every = Recurrence { min_ms: ms, max_ms: ms };
        }
    }
}
