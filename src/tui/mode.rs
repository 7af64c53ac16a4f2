use crate::audio_api::{AmbienceCategory, Timbre};
use crate::pipeline::project::AmbienceSetting;
use crate::shared::DisplayState;

// state local to the tui: cursors and the title being typed, plus a mirror of
// the bits of DisplayState that key resolution depends on (synced per frame)
#[derive(Clone, Debug)]
pub struct TuiState {
    pub selected_song: usize,
    pub selected_layer: usize,
    pub title_buffer: String,

    // synced from DisplayState each frame
    pub recording: bool,
    pub naming: bool,
    pub playing: bool,
    pub looping: bool,
    pub speed: f64,
    pub practicing: bool,
    pub muted: bool,
    pub master_volume: f32,
    pub timbre: Timbre,
    pub theme_id: &'static str,
    pub rain_density: f32,
    pub visualize_notes: bool,
    pub show_tutorial: bool,
    pub library_len: usize,
    pub built_in_songs: usize,
    pub ambience: Vec<(AmbienceCategory, AmbienceSetting)>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            selected_song: 0,
            selected_layer: 0,
            title_buffer: String::new(),
            recording: false,
            naming: false,
            playing: false,
            looping: false,
            speed: 1.0,
            practicing: false,
            muted: false,
            master_volume: 0.0,
            timbre: Timbre::default(),
            theme_id: "",
            rain_density: 0.0,
            visualize_notes: true,
            show_tutorial: false,
            library_len: 0,
            built_in_songs: 0,
            ambience: Vec::new(),
        }
    }
}

impl TuiState {
    pub fn sync(&mut self, ds: &DisplayState) {
        if !self.naming && ds.pending_title.is_some() {
            self.title_buffer.clear(); // a fresh take to name
        }
        self.recording = ds.recording;
        self.naming = ds.pending_title.is_some();
        self.playing = ds.playing.is_some();
        self.looping = ds.looping;
        self.speed = ds.speed;
        self.practicing = ds.practice.is_some();
        self.muted = ds.muted;
        self.master_volume = ds.master_volume;
        self.timbre = ds.timbre;
        self.theme_id = ds.theme.id;
        self.rain_density = ds.rain_density;
        self.visualize_notes = ds.visualize_notes;
        self.show_tutorial = ds.show_tutorial;
        self.library_len = ds.library.len();
        self.built_in_songs = ds.library.iter().filter(|s| s.built_in).count();
        self.ambience = ds.ambience.clone();
        // the library can shrink under the cursor after a delete
        self.selected_song = self.selected_song.min(self.library_len.saturating_sub(1));
        self.selected_layer = self.selected_layer.min(self.ambience.len().saturating_sub(1));
    }

    pub fn selected_category(&self) -> Option<(AmbienceCategory, AmbienceSetting)> {
        self.ambience.get(self.selected_layer).copied()
    }
}
