// Guided practice against a target melody.
//
// A correct strike does not move the cursor right away: the step is held in
// a short confirmation window first, and strikes during that window are
// ignored. One physical strike therefore advances exactly one step.

use tracing::debug;

use crate::pipeline::song::Song;

struct Session {
    title: String,
    target: Vec<String>,
    step: usize,
    confirming_ms: Option<f64>, // Some while a correct strike is being confirmed
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticeEvent {
    Ignored,
    Correct,
    Advanced,
    Completed,
}

pub struct Practice {
    session: Option<Session>,
    debounce_ms: f64,
}

impl Practice {
    pub fn new(debounce_ms: f64) -> Self {
        Self { session: None, debounce_ms: debounce_ms.max(0.0) }
    }

    /// An empty melody has nothing to practise and is refused.
    pub fn start(&mut self, song: &Song) -> bool {
        if song.notes.is_empty() {
            return false;
        }
        self.session = Some(Session {
            title: song.title.clone(),
            target: song.notes.iter().map(|n| n.note_id.clone()).collect(),
            step: 0,
            confirming_ms: None,
        });
        debug!(title = %song.title, steps = song.notes.len(), "practice started");
        true
    }

    pub fn stop(&mut self) {
        self.session = None;
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn step(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.step)
    }

    pub fn len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.target.len())
    }

    pub fn title(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.title.as_str())
    }

    /// The pad the player should strike next.
    pub fn target_note(&self) -> Option<&str> {
        let s = self.session.as_ref()?;
        s.target.get(s.step).map(String::as_str)
    }

    pub fn strike(&mut self, note_id: &str) -> PracticeEvent {
        let Some(s) = self.session.as_mut() else {
            return PracticeEvent::Ignored;
        };
        if s.confirming_ms.is_some() || s.target.get(s.step).map(String::as_str) != Some(note_id) {
            return PracticeEvent::Ignored;
        }
        s.confirming_ms = Some(0.0);
        PracticeEvent::Correct
    }

    /// Moves the cursor once a confirmation window has elapsed. Completion is
    /// reported on the frame the cursor passes the last note, and only then.
    pub fn tick(&mut self, dt_ms: f64) -> PracticeEvent {
        let debounce = self.debounce_ms;
        let Some(s) = self.session.as_mut() else {
            return PracticeEvent::Ignored;
        };
        let Some(waited) = s.confirming_ms.as_mut() else {
            return PracticeEvent::Ignored;
        };
        *waited += dt_ms;
        if *waited < debounce {
            return PracticeEvent::Ignored;
        }
        s.confirming_ms = None;
        s.step += 1;
        if s.step >= s.target.len() {
            debug!(title = %s.title, "practice complete");
            self.session = None;
            PracticeEvent::Completed
        } else {
            PracticeEvent::Advanced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::song::masterpieces;
    use pretty_assertions::assert_eq;

    #[test]
    fn n_correct_strikes_complete_exactly_once() {
        let song = masterpieces().remove(0);
        let mut practice = Practice::new(150.0);
        assert!(practice.start(&song));

        let mut completions = 0;
        for note in &song.notes {
            // a wrong pad first, never advances
            let wrong = if note.note_id == "n_cs3" { "n_d5" } else { "n_cs3" };
            assert_eq!(practice.strike(wrong), PracticeEvent::Ignored);

            assert_eq!(practice.strike(&note.note_id), PracticeEvent::Correct);
            for _ in 0..20 {
                if practice.tick(16.0) == PracticeEvent::Completed {
                    completions += 1;
                }
            }
        }
        assert_eq!(completions, 1);
        assert!(!practice.is_active());
        assert_eq!(practice.tick(16.0), PracticeEvent::Ignored);
    }

    #[test]
    fn one_strike_advances_one_step() {
        let song = masterpieces().remove(0); // starts d4 d4
        let mut practice = Practice::new(150.0);
        practice.start(&song);
        assert_eq!(practice.strike("n_d4"), PracticeEvent::Correct);
        // the same strike echoed within the window
        assert_eq!(practice.strike("n_d4"), PracticeEvent::Ignored);
        assert_eq!(practice.tick(100.0), PracticeEvent::Ignored);
        assert_eq!(practice.step(), Some(0));
        assert_eq!(practice.tick(60.0), PracticeEvent::Advanced);
        assert_eq!(practice.step(), Some(1));
        assert_eq!(practice.target_note(), Some("n_d4"));
    }

    #[test]
    fn wrong_strikes_keep_practice_going() {
        let song = masterpieces().remove(0);
        let mut practice = Practice::new(150.0);
        practice.start(&song);
        for _ in 0..10 {
            practice.strike("n_cs3");
            practice.tick(200.0);
        }
        assert_eq!(practice.step(), Some(0));
        assert!(practice.is_active());
    }

    #[test]
    fn empty_song_is_refused() {
        let mut song = masterpieces().remove(0);
        song.notes.clear();
        let mut practice = Practice::new(0.0);
        assert!(!practice.start(&song));
        assert!(!practice.is_active());
    }
}
