// Recorded melodies and the built-in masterpieces.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Used when a song claims zero length, so playback still has a loop point.
pub const FALLBACK_DURATION_MS: u64 = 5000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedNote {
    pub timestamp: u64, // ms from the start of the recording
    pub note_id: String,
}

impl RecordedNote {
    pub fn new(timestamp: u64, note_id: impl Into<String>) -> Self {
        Self { timestamp, note_id: note_id.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub date: String,
    pub notes: Vec<RecordedNote>,
    pub duration: u64, // ms
}

impl Song {
    /// Finalizes a recording under a fresh id, dated today.
    pub fn from_recording(title: impl Into<String>, pending: PendingSong) -> Self {
        Self {
            id: format!("{:012x}", rand::rng().random::<u64>() & 0xffff_ffff_ffff),
            title: title.into(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            notes: pending.notes,
            duration: pending.duration,
        }
    }

    pub fn playback_duration(&self) -> u64 {
        if self.duration == 0 { FALLBACK_DURATION_MS } else { self.duration }
    }
}

/// A stopped recording waiting for a name.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSong {
    pub notes: Vec<RecordedNote>,
    pub duration: u64,
}

pub fn default_title(existing_songs: usize) -> String {
    format!("Rain Song {}", existing_songs + 1)
}

const BEAT_MS: u64 = 500;

// (note id, length in beats)
const TWINKLE: &[(&str, u64)] = &[
    ("n_d4", 1), ("n_d4", 1), ("n_a4", 1), ("n_a4", 1),
    ("n_b4", 1), ("n_b4", 1), ("n_a4", 2),
    ("n_g4", 1), ("n_g4", 1), ("n_fs4", 1), ("n_fs4", 1),
    ("n_e4", 1), ("n_e4", 1), ("n_d4", 2),
];

const RAIN_LULLABY: &[(&str, u64)] = &[
    ("n_d4", 1), ("n_fs4", 1), ("n_a4", 1), ("n_b4", 2),
    ("n_a4", 1), ("n_fs4", 1), ("n_e4", 1), ("n_d4", 2),
    ("n_a3", 1), ("n_d4", 1), ("n_e4", 1), ("n_fs4", 2),
    ("n_e4", 1), ("n_d4", 3),
];

fn authored(id: &str, title: &str, melody: &[(&str, u64)]) -> Song {
    let mut t = 0;
    let notes = melody
        .iter()
        .map(|&(note_id, beats)| {
            let note = RecordedNote::new(t * BEAT_MS, note_id);
            t += beats;
            note
        })
        .collect();
    Song {
        id: id.to_string(),
        title: title.to_string(),
        date: String::new(),
        notes,
        duration: t * BEAT_MS,
    }
}

pub fn masterpieces() -> Vec<Song> {
    vec![
        authored("mp_twinkle", "Twinkle Twinkle Little Star", TWINKLE),
        authored("mp_lullaby", "Rain Lullaby", RAIN_LULLABY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout;
    use pretty_assertions::assert_eq;

    #[test]
    fn masterpieces_only_use_real_pads() {
        for song in masterpieces() {
            for note in &song.notes {
                assert!(layout::find(&note.note_id).is_some(), "{} in {}", note.note_id, song.title);
            }
            assert!(song.notes.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            assert!(song.duration > song.notes.last().unwrap().timestamp);
        }
    }

    #[test]
    fn twinkle_timing() {
        let twinkle = &masterpieces()[0];
        assert_eq!(twinkle.notes.len(), 14);
        assert_eq!(twinkle.notes[7], RecordedNote::new(4000, "n_g4"));
        assert_eq!(twinkle.duration, 8000);
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let json = serde_json::to_string(&RecordedNote::new(900, "n_a4")).unwrap();
        assert_eq!(json, r#"{"timestamp":900,"noteId":"n_a4"}"#);
    }

    #[test]
    fn zero_length_songs_still_loop() {
        let song = Song {
            id: "x".into(),
            title: "x".into(),
            date: String::new(),
            notes: vec![],
            duration: 0,
        };
        assert_eq!(song.playback_duration(), FALLBACK_DURATION_MS);
        assert_eq!(default_title(2), "Rain Song 3");
    }
}
