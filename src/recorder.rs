// Idle -> Recording -> Idle. Only manual strikes land here; drops spawned by
// playback or auto rain are never recorded.

use tracing::debug;

use crate::pipeline::song::{PendingSong, RecordedNote};

#[derive(Debug, Default)]
pub enum Recorder {
    #[default]
    Idle,
    Recording {
        started_at_ms: f64,
        notes: Vec<RecordedNote>,
    },
}

impl Recorder {
    /// Starting while already recording throws the take away and starts over.
    pub fn start(&mut self, now_ms: f64) {
        if self.is_recording() {
            debug!("recording restarted");
        }
        *self = Recorder::Recording { started_at_ms: now_ms, notes: Vec::new() };
        debug!("recording started");
    }

    pub fn record(&mut self, note_id: &str, now_ms: f64) {
        if let Recorder::Recording { started_at_ms, notes } = self {
            let offset = (now_ms - *started_at_ms).max(0.0).round() as u64;
            notes.push(RecordedNote::new(offset, note_id));
        }
    }

    /// Ends the take. Returns it for naming unless nothing was played.
    pub fn stop(&mut self, now_ms: f64) -> Option<PendingSong> {
        match std::mem::take(self) {
            Recorder::Recording { started_at_ms, notes } if !notes.is_empty() => {
                let duration = (now_ms - started_at_ms).max(0.0).round() as u64;
                debug!(notes = notes.len(), duration, "recording stopped");
                Some(PendingSong { notes, duration })
            }
            _ => None,
        }
    }

    /// Drops the take without keeping anything.
    pub fn abandon(&mut self) {
        *self = Recorder::Idle;
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Recorder::Recording { .. })
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        match self {
            Recorder::Recording { started_at_ms, .. } => now_ms - started_at_ms,
            Recorder::Idle => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn two_strikes_make_a_song() {
        let mut rec = Recorder::default();
        rec.start(5_000.0);
        rec.record("n_d4", 5_000.0);
        rec.record("n_a4", 5_900.0);
        let song = rec.stop(5_900.0).unwrap();
        assert_eq!(
            song,
            PendingSong {
                notes: vec![RecordedNote::new(0, "n_d4"), RecordedNote::new(900, "n_a4")],
                duration: 900,
            }
        );
        assert!(!rec.is_recording());
    }

    #[test]
    fn empty_take_yields_nothing() {
        let mut rec = Recorder::default();
        rec.start(0.0);
        assert_eq!(rec.stop(1_000.0), None);
        assert_eq!(rec.stop(2_000.0), None);
    }

    #[test]
    fn strikes_while_idle_are_ignored() {
        let mut rec = Recorder::default();
        rec.record("n_d4", 10.0);
        rec.start(20.0);
        rec.record("n_e4", 520.0);
        assert_eq!(rec.elapsed_ms(620.0), 600.0);
        let song = rec.stop(620.0).unwrap();
        assert_eq!(song.notes, vec![RecordedNote::new(500, "n_e4")]);
    }

    #[test]
    fn starting_again_clears_the_take() {
        let mut rec = Recorder::default();
        rec.start(0.0);
        rec.record("n_d4", 100.0);
        rec.start(500.0);
        assert_eq!(rec.elapsed_ms(600.0), 100.0);
        rec.record("n_e4", 700.0);
        let song = rec.stop(900.0).unwrap();
        assert_eq!(song.notes, vec![RecordedNote::new(200, "n_e4")]);
        assert_eq!(song.duration, 400);
    }

    #[test]
    fn abandon_discards_the_take() {
        let mut rec = Recorder::default();
        rec.start(0.0);
        rec.record("n_d4", 10.0);
        rec.abandon();
        assert_eq!(rec.stop(20.0), None);
    }
}
