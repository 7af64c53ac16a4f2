use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::pipeline::{layout, project};
use crate::scene::Viewport;
use crate::shared::{InputEvent, DENSITY_STEP, SPEED_STEP, VOLUME_STEP};
use super::mode::TuiState;

// rough pixel size of one terminal cell, for the virtual viewport
const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 16.0;

// poll for input from the terminal, resolve keys against the tui state into
// semantic input events for middle
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(handle_key(key.code, ts)),
        Event::Resize(cols, rows) => Ok(vec![InputEvent::Resize(viewport_for(cols, rows))]),
        _ => Ok(vec![]),
    }
}

pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport { width: cols as f32 * CELL_WIDTH, height: rows as f32 * CELL_HEIGHT }
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    if ts.naming {
        return resolve_naming(code, ts);
    }
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],

        // pads: the ring on the top letter row, the centre on space
        KeyCode::Char(' ') => strike(0),
        KeyCode::Char(c @ ('q' | 'w' | 'e' | 'r' | 't' | 'y' | 'u' | 'i' | 'o' | 'p')) => {
            match char_to_pad(c) {
                Some(n) => strike(n),
                None => vec![],
            }
        }

        KeyCode::Char('1') if ts.recording => vec![InputEvent::StopRecording],
        KeyCode::Char('1') => vec![InputEvent::StartRecording],

        // song library
        KeyCode::Up => { ts.selected_song = ts.selected_song.saturating_sub(1); vec![] }
        KeyCode::Down => {
            if ts.selected_song + 1 < ts.library_len { ts.selected_song += 1; }
            vec![]
        }
        KeyCode::Enter => vec![InputEvent::StartPlayback { song: ts.selected_song, speed: ts.speed }],
        KeyCode::Char('2') => vec![InputEvent::StopPlayback],
        KeyCode::Char('3') => vec![InputEvent::SetLooping(!ts.looping)],
        KeyCode::Char(',') => vec![InputEvent::SetSpeed(ts.speed - SPEED_STEP)],
        KeyCode::Char('.') => vec![InputEvent::SetSpeed(ts.speed + SPEED_STEP)],
        KeyCode::Char('4') if ts.practicing => vec![InputEvent::StopPractice],
        KeyCode::Char('4') => vec![InputEvent::StartPractice(ts.selected_song)],
        KeyCode::Delete if ts.selected_song >= ts.built_in_songs => {
            vec![InputEvent::DeleteSong(ts.selected_song)]
        }

        // mixer
        KeyCode::Tab => {
            if !ts.ambience.is_empty() {
                ts.selected_layer = (ts.selected_layer + 1) % ts.ambience.len();
            }
            vec![]
        }
        KeyCode::Char('a') => resolve_layer(ts, |active, volume| (!active, volume)),
        KeyCode::Char('[') => resolve_layer(ts, |active, volume| (active, volume - VOLUME_STEP)),
        KeyCode::Char(']') => resolve_layer(ts, |active, volume| (active, volume + VOLUME_STEP)),
        KeyCode::Char('-') => vec![InputEvent::SetMasterVolume(ts.master_volume - VOLUME_STEP)],
        KeyCode::Char('=') => vec![InputEvent::SetMasterVolume(ts.master_volume + VOLUME_STEP)],
        KeyCode::Char('m') => vec![InputEvent::SetMute(!ts.muted)],

        // look and feel
        KeyCode::Char('s') => vec![InputEvent::SetTimbre(ts.timbre.next())],
        KeyCode::Char('c') => {
            vec![InputEvent::SetTheme(project::next_theme(ts.theme_id).id.to_string())]
        }
        KeyCode::Char('z') => vec![InputEvent::SetRainDensity(ts.rain_density - DENSITY_STEP)],
        KeyCode::Char('x') => vec![InputEvent::SetRainDensity(ts.rain_density + DENSITY_STEP)],
        KeyCode::Char('n') => vec![InputEvent::SetVisualizeNotes(!ts.visualize_notes)],
        KeyCode::Char('h') if ts.show_tutorial => vec![InputEvent::DismissTutorial],
        KeyCode::Char('h') => vec![InputEvent::ShowTutorial],
        KeyCode::Backspace => vec![InputEvent::ResetScene],

        _ => vec![],
    }
}

// while a finished take waits for its name, keys type into the title
fn resolve_naming(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Enter => {
            let title = std::mem::take(&mut ts.title_buffer);
            vec![InputEvent::SaveRecording(Some(title).filter(|t| !t.trim().is_empty()))]
        }
        KeyCode::Esc => {
            ts.title_buffer.clear();
            vec![InputEvent::DiscardRecording]
        }
        KeyCode::Backspace => { ts.title_buffer.pop(); vec![] }
        KeyCode::Char(c) => { ts.title_buffer.push(c); vec![] }
        _ => vec![],
    }
}

fn resolve_layer(ts: &TuiState, change: impl Fn(bool, f32) -> (bool, f32)) -> Vec<InputEvent> {
    match ts.selected_category() {
        Some((category, s)) => {
            let (active, volume) = change(s.active, s.volume);
            vec![InputEvent::SetAmbience { category, active, volume: volume.clamp(0.0, 1.0) }]
        }
        None => vec![],
    }
}

fn strike(pad: usize) -> Vec<InputEvent> {
    match layout::notes().get(pad) {
        Some(note) => vec![InputEvent::Strike(note.id.to_string())],
        None => vec![],
    }
}

// convert char to pad index; the ring starts at 1, 0 is the centre
fn char_to_pad(c: char) -> Option<usize> {
    let idx = match c {
        'q' => 1, 'w' => 2, 'e' => 3, 'r' => 4, 't' => 5,
        'y' => 6, 'u' => 7, 'i' => 8, 'o' => 9, 'p' => 10,
        _ => return None,
    };
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::AmbienceCategory;
    use crate::pipeline::project::AmbienceSettings;
    use pretty_assertions::assert_eq;

    #[test]
    fn pad_keys_strike_their_notes() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), vec![InputEvent::Strike("n_cs3".into())]);
        assert_eq!(handle_key(KeyCode::Char('p'), &mut ts), vec![InputEvent::Strike("n_d4".into())]);
    }

    #[test]
    fn record_key_toggles() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char('1'), &mut ts), vec![InputEvent::StartRecording]);
        ts.recording = true;
        assert_eq!(handle_key(KeyCode::Char('1'), &mut ts), vec![InputEvent::StopRecording]);
    }

    #[test]
    fn naming_captures_keys() {
        let mut ts = TuiState { naming: true, ..Default::default() };
        for c in "qx".chars() {
            assert!(handle_key(KeyCode::Char(c), &mut ts).is_empty());
        }
        handle_key(KeyCode::Backspace, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Enter, &mut ts),
            vec![InputEvent::SaveRecording(Some("q".into()))]
        );
        assert_eq!(handle_key(KeyCode::Enter, &mut ts), vec![InputEvent::SaveRecording(None)]);
    }

    #[test]
    fn mixer_keys_adjust_the_selected_layer() {
        let mut ts = TuiState {
            ambience: AmbienceSettings::default().iter().collect(),
            ..Default::default()
        };
        handle_key(KeyCode::Tab, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Char('a'), &mut ts),
            vec![InputEvent::SetAmbience { category: AmbienceCategory::Wind, active: true, volume: 0.3 }]
        );
        let raised = handle_key(KeyCode::Char(']'), &mut ts);
        assert!(matches!(
            raised[..],
            [InputEvent::SetAmbience { category: AmbienceCategory::Wind, active: false, volume }]
                if (volume - 0.35).abs() < 1e-6
        ));
    }

    #[test]
    fn help_key_toggles_the_tutorial() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char('h'), &mut ts), vec![InputEvent::ShowTutorial]);
        ts.show_tutorial = true;
        assert_eq!(handle_key(KeyCode::Char('h'), &mut ts), vec![InputEvent::DismissTutorial]);
    }

    #[test]
    fn built_in_songs_are_not_deletable() {
        let mut ts = TuiState { library_len: 3, built_in_songs: 2, ..Default::default() };
        assert!(handle_key(KeyCode::Delete, &mut ts).is_empty());
        ts.selected_song = 2;
        assert_eq!(handle_key(KeyCode::Delete, &mut ts), vec![InputEvent::DeleteSong(2)]);
    }
}
