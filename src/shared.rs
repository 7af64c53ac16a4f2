// Key map (resolved in tui::input, sent to middle as InputEvents):
//
// Pads (the ring runs clockwise from the bottom, centre on space):
//   q w e r t y u i o p    //  Strike(n_a3 ... n_d4)
//   Space                  //  Strike(n_cs3)
//
// Recording / playback / practice:
//   1                      //  StartRecording / StopRecording
//   Up / Down              //  move the song cursor
//   Enter                  //  StartPlayback(cursor, speed)
//   2                      //  StopPlayback
//   3                      //  SetLooping(!looping)
//   , / .                  //  SetSpeed(-/+ 0.25)
//   4                      //  StartPractice(cursor) / StopPractice
//   Delete                 //  DeleteSong(cursor), saved songs only
//
// Naming a finished take (while a recording is pending):
//   any char / Backspace   //  edit the title
//   Enter                  //  SaveRecording(title or default)
//   Esc                    //  DiscardRecording
//
// Mixer:
//   Tab                    //  next ambience layer
//   a                      //  SetAmbience(layer, !active, volume)
//   [ / ]                  //  SetAmbience(layer, active, volume -/+ 0.05)
//   - / =                  //  SetMasterVolume(-/+ 0.05)
//   m                      //  SetMute(!muted)
//
// Look and feel:
//   s / c                  //  next timbre / next theme
//   z / x                  //  rain density -/+ 0.1
//   n                      //  toggle note particles
//   Backspace              //  ResetScene
//   h                      //  ShowTutorial / DismissTutorial
//   Esc                    //  Quit
//
// Rendering: every frame the TUI asks middle for a DisplayState and paints
// exactly that. No scheduler state lives in the front end.

use crate::audio_api::{AmbienceCategory, Timbre};
use crate::pipeline::project::{AmbienceSetting, Theme};
use crate::scene::{Hit, Particle, RainDrop, Ripple, Viewport};

pub const NUM_PADS: usize = 11;
pub const FRAME_MS: u64 = 16; // ~60fps
pub const SPEED_STEP: f64 = 0.25;
pub const VOLUME_STEP: f32 = 0.05;
pub const DENSITY_STEP: f32 = 0.1;
pub const PAD_FLASH_MS: f64 = 250.0;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Strike(String),

    StartRecording,
    StopRecording,
    SaveRecording(Option<String>), // None = default title
    DiscardRecording,

    StartPlayback { song: usize, speed: f64 },
    StopPlayback,
    SetLooping(bool),
    SetSpeed(f64),
    DeleteSong(usize),

    StartPractice(usize),
    StopPractice,

    SetAmbience { category: AmbienceCategory, active: bool, volume: f32 },
    SetMasterVolume(f32),
    SetMute(bool),

    SetTimbre(Timbre),
    SetTheme(String),
    SetRainDensity(f32),
    SetVisualizeNotes(bool),
    ShowTutorial,
    DismissTutorial,
    Resize(Viewport),

    ResetScene,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PadView {
    pub label: &'static str,
    pub left: f32,
    pub top: f32,
    pub flash: bool,       // struck in the last moment
    pub practice_next: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongEntry {
    pub title: String,
    pub date: String,
    pub notes: usize,
    pub built_in: bool,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub viewport: Viewport,
    pub drops: Vec<RainDrop>,
    pub ripples: Vec<Ripple>,
    pub particles: Vec<Particle>,
    pub hits: Vec<Hit>, // impacts since the previous frame
    pub pads: Vec<PadView>,
    pub theme: &'static Theme,

    pub recording: bool,
    pub recording_elapsed_ms: f64,
    pub pending_title: Option<String>, // a stopped take waiting for a name

    pub library: Vec<SongEntry>,
    pub playing: Option<String>,
    pub playback_progress: f32,
    pub looping: bool,
    pub speed: f64,

    pub practice: Option<PracticeView>,

    pub ambience: Vec<(AmbienceCategory, AmbienceSetting)>,
    pub master_volume: f32,
    pub muted: bool,
    pub timbre: Timbre,
    pub rain_density: f32,
    pub visualize_notes: bool,
    pub show_tutorial: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PracticeView {
    pub title: String,
    pub step: usize,
    pub total: usize,
}

pub fn format_time(ms: f64) -> String {
    let seconds = (ms.max(0.0) / 1000.0) as u64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65_400.0), "1:05");
    }
}
