// Everything that survives a restart: the song library, the mixer and a few
// scalar preferences. Plus the static theme table they refer to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_MASTER_VOLUME;
use crate::audio_api::{AmbienceCategory, Timbre};
use crate::pipeline::song::Song;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbienceSetting {
    pub active: bool,
    pub volume: f32, // 0-1, before per-category scaling
}

const fn setting(active: bool, volume: f32) -> AmbienceSetting {
    AmbienceSetting { active, volume }
}

/// One setting per category, saved as `{ "rain": {...}, ... }`. Unknown keys
/// in a saved file are dropped and missing ones keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, AmbienceSetting>", into = "BTreeMap<String, AmbienceSetting>")]
pub struct AmbienceSettings {
    layers: [AmbienceSetting; 7],
}

impl Default for AmbienceSettings {
    fn default() -> Self {
        // same order as AmbienceCategory::ALL
        Self {
            layers: [
                setting(true, 0.3),  // rain
                setting(false, 0.3), // wind
                setting(false, 0.3), // birds
                setting(false, 0.6), // thunder
                setting(false, 0.4), // ocean
                setting(false, 0.3), // fire
                setting(false, 0.2), // crickets
            ],
        }
    }
}

impl AmbienceSettings {
    pub fn get(&self, category: AmbienceCategory) -> AmbienceSetting {
        self.layers[category.index()]
    }

    pub fn set(&mut self, category: AmbienceCategory, active: bool, volume: f32) {
        self.layers[category.index()] = setting(active, volume.clamp(0.0, 1.0));
    }

    pub fn iter(&self) -> impl Iterator<Item = (AmbienceCategory, AmbienceSetting)> + '_ {
        AmbienceCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

impl From<BTreeMap<String, AmbienceSetting>> for AmbienceSettings {
    fn from(raw: BTreeMap<String, AmbienceSetting>) -> Self {
        let mut settings = Self::default();
        for (id, s) in raw {
            if let Some(category) = AmbienceCategory::from_id(&id) {
                settings.set(category, s.active, s.volume);
            }
        }
        settings
    }
}

impl From<AmbienceSettings> for BTreeMap<String, AmbienceSetting> {
    fn from(settings: AmbienceSettings) -> Self {
        settings.iter().map(|(c, s)| (c.id().to_string(), s)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Prefs {
    pub theme: String,
    pub timbre: Timbre,
    pub rain_density: f32, // 0 = no auto rain
    pub tutorial_seen: bool,
    pub master_volume: f32,
    pub visualize_notes: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            theme: THEMES[0].id.to_string(),
            timbre: Timbre::Crystal,
            rain_density: 0.0,
            tutorial_seen: false,
            master_volume: DEFAULT_MASTER_VOLUME,
            visualize_notes: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectState {
    pub songs: Vec<Song>,
    pub ambience: AmbienceSettings,
    pub prefs: Prefs,
}

pub type Rgb = (u8, u8, u8);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub drum: Rgb,
    pub rain: Rgb,
    pub accent: Rgb, // ripples and highlights
}

pub const THEMES: [Theme; 5] = [
    Theme { id: "forest", name: "Forest Echoes", drum: (25, 45, 40), rain: (200, 255, 240), accent: (134, 239, 172) },
    Theme { id: "bird_sanctuary", name: "Bird Sanctuary", drum: (63, 98, 18), rain: (254, 243, 199), accent: (253, 224, 71) },
    Theme { id: "waterfall", name: "Sacred Waterfall", drum: (21, 94, 117), rain: (207, 250, 254), accent: (34, 211, 238) },
    Theme { id: "night_sea", name: "Night Sea", drum: (12, 74, 110), rain: (224, 242, 254), accent: (56, 189, 248) },
    Theme { id: "city", name: "Night City", drum: (15, 23, 42), rain: (186, 230, 253), accent: (129, 140, 248) },
];

// An unknown id (e.g. from an older save) falls back to the first theme.
pub fn theme(id: &str) -> &'static Theme {
    THEMES.iter().find(|t| t.id == id).unwrap_or(&THEMES[0])
}

pub fn next_theme(id: &str) -> &'static Theme {
    let idx = THEMES.iter().position(|t| t.id == id).unwrap_or(0);
    &THEMES[(idx + 1) % THEMES.len()]
}
