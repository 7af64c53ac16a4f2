// The application core. The TUI feeds it InputEvents and frame ticks; it
// answers with AudioCommands for the audio thread and a DisplayState to paint.
// It owns every piece of scheduler state, so nothing here is shared.

use tracing::{debug, info};

use crate::audio_api::AudioCommand;
use crate::config::{Config, SchedulerConfig};
use crate::pipeline::layout;
use crate::pipeline::project::{self, ProjectState};
use crate::pipeline::song::{self, PendingSong, Song};
use crate::playback::Playback;
use crate::practice::{Practice, PracticeEvent};
use crate::recorder::Recorder;
use crate::scene::{AutoRain, Hit, Scene, Viewport};
use crate::shared::{
    DisplayState, InputEvent, NUM_PADS, PAD_FLASH_MS, PadView, PracticeView, SongEntry,
};

pub struct Middle {
    pub state: ProjectState,
    masterpieces: Vec<Song>,
    config: SchedulerConfig,
    scene: Scene,
    auto_rain: AutoRain,
    playback: Playback,
    recorder: Recorder,
    practice: Practice,
    pending: Option<PendingSong>,
    clock_ms: f64,
    muted: bool,
    pad_flash_ms: [f64; NUM_PADS],
    hits: Vec<Hit>,
    songs_dirty: bool,
    help_open: bool, // tutorial reopened after it was seen
}

impl Middle {
    pub fn with_state(state: ProjectState, config: &Config) -> Self {
        let scheduler = config.scheduler.clone();
        let mut auto_rain = AutoRain::default();
        auto_rain.set_density(state.prefs.rain_density);
        Self {
            masterpieces: song::masterpieces(),
            scene: Scene::new(Viewport::from(&config.viewport), &scheduler, config.audio.seed),
            auto_rain,
            playback: Playback::new(&scheduler),
            recorder: Recorder::default(),
            practice: Practice::new(scheduler.practice_debounce_ms),
            pending: None,
            clock_ms: 0.0,
            muted: false,
            pad_flash_ms: [0.0; NUM_PADS],
            hits: Vec::new(),
            songs_dirty: false,
            help_open: false,
            config: scheduler,
            state,
        }
    }

    /// Puts the audio thread in line with the saved mixer.
    pub fn startup_commands(&self) -> Vec<AudioCommand> {
        let mut cmds = vec![AudioCommand::SetMasterVolume(self.state.prefs.master_volume)];
        cmds.extend(self.state.ambience.iter().map(|(category, s)| AudioCommand::SetAmbience {
            category,
            active: s.active,
            volume: s.volume,
        }));
        cmds
    }

    // Built-in masterpieces first, then the player's own songs.
    fn song_at(&self, index: usize) -> Option<&Song> {
        let built_in = self.masterpieces.len();
        if index < built_in {
            self.masterpieces.get(index)
        } else {
            self.state.songs.get(index - built_in)
        }
    }

    /// True once after the song library changed, so the caller can save it.
    pub fn take_songs_dirty(&mut self) -> bool {
        std::mem::take(&mut self.songs_dirty)
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        match event {
            InputEvent::Strike(note_id) => self.strike(&note_id),

            InputEvent::StartRecording => {
                self.pending = None;
                self.recorder.start(self.clock_ms);
            }
            // a stray stop must not clobber a take that is waiting for its name
            InputEvent::StopRecording if self.recorder.is_recording() => {
                self.pending = self.recorder.stop(self.clock_ms);
            }
            InputEvent::StopRecording => {}
            InputEvent::SaveRecording(title) => {
                if let Some(pending) = self.pending.take() {
                    let title = title
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| song::default_title(self.state.songs.len()));
                    info!(%title, notes = pending.notes.len(), "song saved");
                    self.state.songs.push(Song::from_recording(title, pending));
                    self.songs_dirty = true;
                }
            }
            InputEvent::DiscardRecording => self.pending = None,

            InputEvent::StartPlayback { song, speed } => {
                if let Some(s) = self.song_at(song).cloned() {
                    self.practice.stop();
                    self.playback.start(&s, speed);
                }
            }
            InputEvent::StopPlayback => self.playback.stop(),
            InputEvent::SetLooping(looping) => self.playback.set_looping(looping),
            InputEvent::SetSpeed(speed) => self.playback.set_speed(speed),
            InputEvent::DeleteSong(index) => {
                if let Some(i) = index.checked_sub(self.masterpieces.len())
                    && i < self.state.songs.len()
                {
                    let removed = self.state.songs.remove(i);
                    info!(title = %removed.title, "song deleted");
                    self.songs_dirty = true;
                }
            }

            InputEvent::StartPractice(song) => {
                if let Some(s) = self.song_at(song).cloned() {
                    self.playback.stop();
                    self.practice.start(&s);
                }
            }
            InputEvent::StopPractice => self.practice.stop(),

            InputEvent::SetAmbience { category, active, volume } => {
                self.state.ambience.set(category, active, volume);
                let s = self.state.ambience.get(category);
                cmds.push(AudioCommand::SetAmbience { category, active: s.active, volume: s.volume });
            }
            InputEvent::SetMasterVolume(v) => {
                self.state.prefs.master_volume = v.clamp(0.0, 1.0);
                cmds.push(AudioCommand::SetMasterVolume(self.state.prefs.master_volume));
            }
            InputEvent::SetMute(muted) => {
                self.muted = muted;
                cmds.push(AudioCommand::SetMute(muted));
            }

            InputEvent::SetTimbre(timbre) => self.state.prefs.timbre = timbre,
            InputEvent::SetTheme(id) => self.state.prefs.theme = project::theme(&id).id.to_string(),
            InputEvent::SetRainDensity(d) => {
                self.auto_rain.set_density(d);
                self.state.prefs.rain_density = self.auto_rain.density();
            }
            InputEvent::SetVisualizeNotes(on) => self.state.prefs.visualize_notes = on,
            InputEvent::ShowTutorial => self.help_open = true,
            InputEvent::DismissTutorial => {
                self.state.prefs.tutorial_seen = true;
                self.help_open = false;
            }
            InputEvent::Resize(viewport) => self.scene.set_viewport(viewport),

            InputEvent::ResetScene => self.reset_scene(),
            InputEvent::Quit => {}
        }
        cmds
    }

    // A manual strike: spawn, record, and check against the practice target.
    // The tone itself sounds when the drop lands.
    fn strike(&mut self, note_id: &str) {
        if !self.scene.spawn_drop(note_id) {
            debug!(note_id, "strike on unknown note ignored");
            return;
        }
        self.recorder.record(note_id, self.clock_ms);
        if self.practice.strike(note_id) == PracticeEvent::Correct {
            debug!(note_id, "practice step hit");
        }
    }

    fn reset_scene(&mut self) {
        self.scene.clear();
        self.practice.stop();
        self.playback.stop();
        self.recorder.abandon();
        self.hits.clear();
        self.pad_flash_ms = [0.0; NUM_PADS];
        debug!("scene reset");
    }

    /// One animation frame. Order matters: drops move and land first, then
    /// playback spawns whatever is due (those drops start falling next frame).
    pub fn tick(&mut self, elapsed_secs: f64) -> Vec<AudioCommand> {
        let dt_ms = elapsed_secs.max(0.0) * 1000.0;
        self.clock_ms += dt_ms;
        let mut cmds = Vec::new();

        for flash in self.pad_flash_ms.iter_mut() {
            *flash = (*flash - dt_ms).max(0.0);
        }

        self.hits = self.scene.step(self.clock_ms);
        let accent = project::theme(&self.state.prefs.theme).accent;
        for hit in &self.hits {
            if let Some(note) = layout::find(hit.note_id) {
                cmds.push(AudioCommand::PlayTone {
                    frequency: note.frequency,
                    timbre: self.state.prefs.timbre,
                });
            }
            if let Some(i) = layout::index_of(hit.note_id) {
                self.pad_flash_ms[i] = PAD_FLASH_MS;
            }
            self.scene.add_ripple(hit, accent);
            if self.state.prefs.visualize_notes {
                self.scene.add_note_burst(hit);
            }
        }

        let played = self.playback.advance(dt_ms, self.scene.drops().len());
        for note_id in &played.due {
            self.scene.spawn_drop(note_id);
        }
        if played.finished {
            info!("playback finished");
        }

        // a suspended app shouldn't come back to a cloudburst either
        if dt_ms <= self.config.burst_guard_ms {
            for _ in 0..self.auto_rain.tick(dt_ms) {
                let id = self.scene.random_note_id();
                self.scene.spawn_drop(id);
            }
        }

        if self.practice.tick(dt_ms) == PracticeEvent::Completed {
            info!("practice complete");
            self.scene.celebrate();
        }
        cmds
    }

    pub fn display_state(&self) -> DisplayState {
        let practice_next = self.practice.target_note();
        let pads = layout::notes()
            .iter()
            .enumerate()
            .map(|(i, n)| PadView {
                label: n.label,
                left: n.left,
                top: n.top,
                flash: self.pad_flash_ms[i] > 0.0,
                practice_next: practice_next == Some(n.id),
            })
            .collect();
        let library = self
            .masterpieces
            .iter()
            .map(|s| (s, true))
            .chain(self.state.songs.iter().map(|s| (s, false)))
            .map(|(s, built_in)| SongEntry {
                title: s.title.clone(),
                date: s.date.clone(),
                notes: s.notes.len(),
                built_in,
            })
            .collect();
        let practice = match (self.practice.title(), self.practice.step()) {
            (Some(title), Some(step)) => Some(PracticeView {
                title: title.to_string(),
                step,
                total: self.practice.len(),
            }),
            _ => None,
        };
        let prefs = &self.state.prefs;

        DisplayState {
            viewport: self.scene.viewport(),
            drops: self.scene.drops().to_vec(),
            ripples: self.scene.ripples().to_vec(),
            particles: self.scene.particles().to_vec(),
            hits: self.hits.clone(),
            pads,
            theme: project::theme(&prefs.theme),
            recording: self.recorder.is_recording(),
            recording_elapsed_ms: self.recorder.elapsed_ms(self.clock_ms),
            pending_title: self
                .pending
                .as_ref()
                .map(|_| song::default_title(self.state.songs.len())),
            library,
            playing: self.playback.title().map(str::to_string),
            playback_progress: self.playback.progress_percent(),
            looping: self.playback.is_looping(),
            speed: self.playback.speed(),
            practice,
            ambience: self.state.ambience.iter().collect(),
            master_volume: prefs.master_volume,
            muted: self.muted,
            timbre: prefs.timbre,
            rain_density: prefs.rain_density,
            visualize_notes: prefs.visualize_notes,
            show_tutorial: self.help_open || !prefs.tutorial_seen,
        }
    }
}
