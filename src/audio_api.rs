use serde::{Deserialize, Serialize};

// Instrument colour used when a pad is struck
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timbre {
    #[default]
    Crystal,
    Metallic,
    Wood,
    Ether,
    Celestial,
    Deep,
    Bamboo,
    MusicBox,
    Kalimba,
    Flute,
}

impl Timbre {
    pub const ALL: [Timbre; 10] = [
        Timbre::Crystal,
        Timbre::Metallic,
        Timbre::Wood,
        Timbre::Ether,
        Timbre::Celestial,
        Timbre::Deep,
        Timbre::Bamboo,
        Timbre::MusicBox,
        Timbre::Kalimba,
        Timbre::Flute,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Timbre::Crystal => "Crystal",
            Timbre::Metallic => "Metallic",
            Timbre::Wood => "Wood",
            Timbre::Ether => "Ether",
            Timbre::Celestial => "Celestial",
            Timbre::Deep => "Deep",
            Timbre::Bamboo => "Bamboo",
            Timbre::MusicBox => "MusicBox",
            Timbre::Kalimba => "Kalimba",
            Timbre::Flute => "Flute",
        }
    }
}

// One background nature layer. Serialized lowercase so the saved mixer
// reads as { "rain": {...}, "wind": {...} }.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbienceCategory {
    Rain,
    Wind,
    Birds,
    Thunder,
    Ocean,
    Fire,
    Crickets,
}

impl AmbienceCategory {
    pub const ALL: [AmbienceCategory; 7] = [
        AmbienceCategory::Rain,
        AmbienceCategory::Wind,
        AmbienceCategory::Birds,
        AmbienceCategory::Thunder,
        AmbienceCategory::Ocean,
        AmbienceCategory::Fire,
        AmbienceCategory::Crickets,
    ];

    pub fn id(self) -> &'static str {
        match self {
            AmbienceCategory::Rain => "rain",
            AmbienceCategory::Wind => "wind",
            AmbienceCategory::Birds => "birds",
            AmbienceCategory::Thunder => "thunder",
            AmbienceCategory::Ocean => "ocean",
            AmbienceCategory::Fire => "fire",
            AmbienceCategory::Crickets => "crickets",
        }
    }

    // Unknown ids resolve to None; callers treat that as a no-op.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    // One-shot struck note. The engine owns the voice until its envelope
    // finishes; the sender never hears about it again.
    PlayTone { frequency: f32, timbre: Timbre },

    // Idempotent: repeating the same call never starts a second source.
    SetAmbience { category: AmbienceCategory, active: bool, volume: f32 },

    SetMasterVolume(f32),

    // Master-bus override; per-category settings are left untouched.
    SetMute(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ids_round_trip() {
        for cat in AmbienceCategory::ALL {
            assert_eq!(AmbienceCategory::from_id(cat.id()), Some(cat));
        }
        assert_eq!(AmbienceCategory::from_id("frogs"), None);
    }

    #[test]
    fn timbre_cycle_wraps() {
        assert_eq!(Timbre::Flute.next(), Timbre::Crystal);
        assert_eq!(Timbre::Crystal.next(), Timbre::Metallic);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&AmbienceCategory::Crickets).unwrap();
        assert_eq!(json, "\"crickets\"");
    }
}
