// Struck-pad tones.
//
// Each `Timbre` maps to a small additive recipe: a few partials at fixed
// frequency ratios, a linear attack from silence, an exponential decay down
// to a near-silent floor, and a stop time a little after that so the
// oscillators are never cut while audible.

use crate::audio_api::Timbre;

use super::envelope::{Envelope, EnvelopeCursor};
use super::osc::{Osc, Wave};

const MAX_PARTIALS: usize = 3;
const SILENCE_FLOOR: f32 = 0.001;

#[derive(Clone, Copy, Debug)]
struct Partial {
    ratio: f32,
    wave: Wave,
    weight: f32,
}

const fn partial(ratio: f32, wave: Wave, weight: f32) -> Partial {
    Partial { ratio, wave, weight }
}

#[derive(Debug)]
struct Recipe {
    partials: &'static [Partial],
    attack: f32,      // seconds of linear rise from silence
    level: f32,       // peak, relative to the loudness-compensated base gain
    decay_end: f32,   // seconds at which the exponential fall hits the floor
    stop: f32,        // seconds at which the oscillators stop
}

const CRYSTAL: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0)],
    attack: 0.02,
    level: 1.0,
    decay_end: 4.0,
    stop: 4.5,
};

const METALLIC: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0), partial(2.01, Wave::Triangle, 0.3)],
    attack: 0.03,
    level: 0.8,
    decay_end: 5.0,
    stop: 5.5,
};

const WOOD: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Triangle, 1.0)],
    attack: 0.01,
    level: 1.2,
    decay_end: 1.2,
    stop: 1.5,
};

const ETHER: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0)],
    attack: 0.5,
    level: 0.5,
    decay_end: 8.0,
    stop: 8.5,
};

const CELESTIAL: Recipe = Recipe {
    partials: &[
        partial(1.0, Wave::Sine, 1.0),
        partial(2.0, Wave::Sine, 0.25),
        partial(3.0, Wave::Sine, 0.1),
    ],
    attack: 0.08,
    level: 0.6,
    decay_end: 6.0,
    stop: 6.5,
};

const DEEP: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0), partial(0.5, Wave::Sine, 0.5)],
    attack: 0.02,
    level: 0.9,
    decay_end: 5.0,
    stop: 5.5,
};

const BAMBOO: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Triangle, 1.0), partial(2.76, Wave::Sine, 0.2)],
    attack: 0.008,
    level: 1.1,
    decay_end: 0.9,
    stop: 1.2,
};

const MUSIC_BOX: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0), partial(4.0, Wave::Sine, 0.25)],
    attack: 0.005,
    level: 0.9,
    decay_end: 2.5,
    stop: 3.0,
};

const KALIMBA: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0), partial(5.4, Wave::Sine, 0.15)],
    attack: 0.006,
    level: 1.0,
    decay_end: 2.0,
    stop: 2.5,
};

const FLUTE: Recipe = Recipe {
    partials: &[partial(1.0, Wave::Sine, 1.0), partial(2.0, Wave::Triangle, 0.12)],
    attack: 0.12,
    level: 0.7,
    decay_end: 3.0,
    stop: 3.5,
};

fn recipe(timbre: Timbre) -> &'static Recipe {
    match timbre {
        Timbre::Crystal => &CRYSTAL,
        Timbre::Metallic => &METALLIC,
        Timbre::Wood => &WOOD,
        Timbre::Ether => &ETHER,
        Timbre::Celestial => &CELESTIAL,
        Timbre::Deep => &DEEP,
        Timbre::Bamboo => &BAMBOO,
        Timbre::MusicBox => &MUSIC_BOX,
        Timbre::Kalimba => &KALIMBA,
        Timbre::Flute => &FLUTE,
    }
}

// Low notes sound quieter at the same amplitude; give them more.
pub fn base_gain(frequency: f32) -> f32 {
    if frequency < 200.0 { 0.7 } else { 0.5 }
}

pub fn envelope_for(frequency: f32, timbre: Timbre) -> Envelope {
    let r = recipe(timbre);
    Envelope::starting_at(0.0)
        .linear_to(base_gain(frequency) * r.level, r.attack)
        .exponential_to(SILENCE_FLOOR, r.decay_end)
}

/// One live struck note. Finite by construction: it goes inactive on its
/// own once the stop time is reached.
#[derive(Clone, Debug)]
pub struct ToneVoice {
    recipe: &'static Recipe,
    oscs: [Osc; MAX_PARTIALS],
    frequency: f32,
    env: EnvelopeCursor,
    age: u32,
    stop_at: u32,
    sample_rate: f32,
}

impl ToneVoice {
    pub fn new(frequency: f32, timbre: Timbre, sample_rate: f32) -> Self {
        let r = recipe(timbre);
        let mut oscs = [Osc::new(Wave::Sine); MAX_PARTIALS];
        for (osc, p) in oscs.iter_mut().zip(r.partials) {
            *osc = Osc::new(p.wave);
        }
        Self {
            recipe: r,
            oscs,
            frequency,
            env: envelope_for(frequency, timbre).cursor(sample_rate),
            age: 0,
            stop_at: (r.stop * sample_rate) as u32,
            sample_rate,
        }
    }

    #[cfg(test)]
    pub fn lifetime_secs(timbre: Timbre) -> f32 {
        recipe(timbre).stop
    }

    pub fn is_active(&self) -> bool {
        self.age < self.stop_at
    }

    pub fn remaining(&self) -> u32 {
        self.stop_at.saturating_sub(self.age)
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        let mut s = 0.0;
        for (osc, p) in self.oscs.iter_mut().zip(self.recipe.partials) {
            s += osc.next_sample(self.frequency * p.ratio, self.sample_rate) * p.weight;
        }
        self.age += 1;
        s * self.env.next_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 8000.0;

    fn render(freq: f32, timbre: Timbre) -> Vec<f32> {
        let mut v = ToneVoice::new(freq, timbre, SR);
        let mut out = Vec::new();
        while v.is_active() {
            out.push(v.next_sample());
        }
        out
    }

    fn peak(s: &[f32]) -> f32 {
        s.iter().fold(0.0f32, |m, x| m.max(x.abs()))
    }

    #[test]
    fn every_timbre_fades_to_silence_before_it_stops() {
        for timbre in Timbre::ALL {
            let out = render(440.0, timbre);
            let expected = (ToneVoice::lifetime_secs(timbre) * SR) as usize;
            assert_eq!(out.len(), expected, "{timbre:?} lifetime");
            let tail = &out[out.len() - 200..];
            assert!(peak(tail) < 0.002, "{timbre:?} ends with a click: {}", peak(tail));
            assert!(peak(&out) > 0.1, "{timbre:?} is silent");
        }
    }

    #[test]
    fn low_notes_get_more_gain() {
        let low = peak(&render(150.0, Timbre::Crystal));
        let high = peak(&render(400.0, Timbre::Crystal));
        assert!(low > high * 1.3, "low {low} vs high {high}");
    }

    #[test]
    fn wood_is_percussive_and_ether_swells() {
        let wood = envelope_for(440.0, Timbre::Wood);
        let ether = envelope_for(440.0, Timbre::Ether);
        // wood is already past its peak when ether is still rising
        assert!(wood.value_at(0.1) < wood.value_at(0.01));
        assert!(ether.value_at(0.1) < ether.value_at(0.4));
        assert!((ether.value_at(0.5) - 0.25).abs() < 1e-4);
        assert!(ToneVoice::lifetime_secs(Timbre::Wood) < ToneVoice::lifetime_secs(Timbre::Ether));
    }

    #[test]
    fn crystal_attack_hits_base_gain() {
        let env = envelope_for(440.0, Timbre::Crystal);
        assert!((env.value_at(0.02) - 0.5).abs() < 1e-4);
        assert!((env.value_at(4.0) - SILENCE_FLOOR).abs() < 1e-6);
    }
}
