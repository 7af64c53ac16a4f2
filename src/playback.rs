// Melody playback driven by the frame loop.
//
// Playback keeps its own virtual clock: each frame adds the wall-clock delta
// times the speed factor, and every note whose timestamp has been reached is
// handed back to the caller to spawn as a drop. A frame gap longer than the
// burst guard (the app was suspended) adds nothing, so resuming never dumps
// a backlog of notes at once.

use tracing::debug;

use crate::config::SchedulerConfig;
use crate::pipeline::song::{RecordedNote, Song};

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

struct Session {
    title: String,
    notes: Vec<RecordedNote>,
    next_index: usize,
    elapsed_ms: f64, // virtual
    duration_ms: f64,
}

/// What one frame of playback produced.
#[derive(Debug, Default, PartialEq)]
pub struct PlaybackTick {
    pub due: Vec<String>,
    pub finished: bool,
}

pub struct Playback {
    session: Option<Session>,
    speed: f64,
    looping: bool,
    burst_guard_ms: f64,
    scale_guard_with_speed: bool,
    grace_ms: f64,
}

impl Playback {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            session: None,
            speed: 1.0,
            looping: false,
            burst_guard_ms: config.burst_guard_ms,
            scale_guard_with_speed: config.scale_guard_with_speed,
            grace_ms: config.completion_grace_ms,
        }
    }

    /// Replaces whatever was playing.
    pub fn start(&mut self, song: &Song, speed: f64) {
        self.set_speed(speed);
        self.session = Some(Session {
            title: song.title.clone(),
            notes: song.notes.clone(),
            next_index: 0,
            elapsed_ms: 0.0,
            duration_ms: song.playback_duration() as f64,
        });
        debug!(title = %song.title, speed = self.speed, "playback started");
    }

    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            debug!("playback stopped");
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn title(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.title.as_str())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn progress_percent(&self) -> f32 {
        match &self.session {
            Some(s) if s.duration_ms > 0.0 => (s.elapsed_ms / s.duration_ms * 100.0).min(100.0) as f32,
            _ => 0.0,
        }
    }

    fn guard_ms(&self) -> f64 {
        if self.scale_guard_with_speed {
            self.burst_guard_ms / self.speed
        } else {
            self.burst_guard_ms
        }
    }

    /// Advances by one frame of `dt_ms` real time. `live_drops` is how many
    /// drops are still falling; a finished melody waits for them to land.
    pub fn advance(&mut self, dt_ms: f64, live_drops: usize) -> PlaybackTick {
        let mut tick = PlaybackTick::default();
        let guard = self.guard_ms();
        let (speed, looping, grace) = (self.speed, self.looping, self.grace_ms);
        let Some(s) = self.session.as_mut() else {
            return tick;
        };
        if dt_ms > guard {
            debug!(dt_ms, "frame gap over burst guard, holding playback");
            return tick;
        }

        s.elapsed_ms += dt_ms * speed;

        if looping && s.duration_ms > 0.0 && s.elapsed_ms >= s.duration_ms {
            // finish this pass (a note stamped exactly at the end still plays)
            // before the cursor and clock go back to the top
            let end = s.duration_ms;
            collect_due(s, end, &mut tick.due);
            s.elapsed_ms %= s.duration_ms;
            s.next_index = 0;
        }

        let now = s.elapsed_ms;
        collect_due(s, now, &mut tick.due);

        if !looping
            && s.next_index >= s.notes.len()
            && live_drops == 0
            && s.elapsed_ms >= s.duration_ms + grace
        {
            self.session = None;
            tick.finished = true;
            debug!("playback finished");
        }
        tick
    }
}

fn collect_due(s: &mut Session, up_to_ms: f64, due: &mut Vec<String>) {
    while let Some(note) = s.notes.get(s.next_index) {
        if note.timestamp as f64 > up_to_ms {
            break;
        }
        due.push(note.note_id.clone());
        s.next_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn song(notes: &[(u64, &str)], duration: u64) -> Song {
        Song {
            id: "t".into(),
            title: "test".into(),
            date: String::new(),
            notes: notes.iter().map(|&(t, id)| RecordedNote::new(t, id)).collect(),
            duration,
        }
    }

    fn three_notes() -> Song {
        song(&[(0, "n_d4"), (600, "n_a4"), (1200, "n_b4")], 1800)
    }

    // Runs fixed frames and records (frame end time in ms, note id).
    fn run(pb: &mut Playback, dt: f64, frames: usize) -> Vec<(f64, String)> {
        let mut out = Vec::new();
        let mut t = 0.0;
        for _ in 0..frames {
            t += dt;
            for id in pb.advance(dt, 0).due {
                out.push((t, id));
            }
        }
        out
    }

    #[test]
    fn coarse_and_fine_frames_fire_the_same_notes() {
        let mut fine = Playback::new(&SchedulerConfig::default());
        fine.start(&three_notes(), 1.0);
        let fine_notes = run(&mut fine, 10.0, 150);

        let mut coarse = Playback::new(&SchedulerConfig::default());
        coarse.start(&three_notes(), 1.0);
        let coarse_notes = run(&mut coarse, 200.0, 8);

        let ids = |v: &[(f64, String)]| v.iter().map(|(_, id)| id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&fine_notes), vec!["n_d4", "n_a4", "n_b4"]);
        assert_eq!(ids(&fine_notes), ids(&coarse_notes));

        // each note fires on the first frame at or past its timestamp
        let times: Vec<f64> = fine_notes.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![10.0, 600.0, 1200.0]);
        let times: Vec<f64> = coarse_notes.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![200.0, 600.0, 1200.0]);
    }

    #[test]
    fn loop_wraps_to_the_first_note_without_repeats() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.set_looping(true);
        pb.start(&three_notes(), 1.0);
        let fired = run(&mut pb, 100.0, 19); // 1900 ms: one full pass plus 100
        let ids: Vec<&str> = fired.iter().map(|(_, id)| id.as_str()).collect();
        assert_eq!(ids, vec!["n_d4", "n_a4", "n_b4", "n_d4"]);
        assert_eq!(fired[3].0, 1800.0);
        assert!(pb.is_active());
        assert!(pb.progress_percent() < 10.0);
    }

    #[test]
    fn note_at_the_very_end_survives_the_wrap() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.set_looping(true);
        pb.start(&song(&[(0, "n_d4"), (900, "n_a4")], 900), 1.0);
        let ids: Vec<String> = run(&mut pb, 100.0, 10).into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!["n_d4", "n_a4", "n_d4"]);
    }

    #[test]
    fn long_frame_gap_spawns_nothing() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.start(&three_notes(), 1.0);
        assert!(pb.advance(300.0, 0).due.is_empty());
        assert!(pb.advance(5_000.0, 0).due.is_empty());
        assert_eq!(pb.progress_percent(), 0.0);
        // back to normal frames: starts from where it was
        assert_eq!(pb.advance(16.0, 0).due, vec!["n_d4".to_string()]);
    }

    #[test]
    fn guard_can_scale_with_speed() {
        let config = SchedulerConfig { scale_guard_with_speed: true, ..Default::default() };
        let mut pb = Playback::new(&config);
        pb.start(&three_notes(), 2.0);
        assert!(pb.advance(200.0, 0).due.is_empty()); // guard is 125 ms at 2x
        assert_eq!(pb.advance(100.0, 0).due.len(), 1);
    }

    #[test]
    fn double_speed_halves_the_wait() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.start(&song(&[(1000, "n_e4")], 2000), 2.0);
        assert!(run(&mut pb, 50.0, 9).is_empty()); // 450 ms real
        assert_eq!(pb.advance(50.0, 0).due, vec!["n_e4".to_string()]); // 500 ms real
    }

    #[test]
    fn stops_after_grace_once_drops_have_landed() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.start(&three_notes(), 1.0);
        run(&mut pb, 100.0, 27); // 2700 ms: last note long gone, grace not over
        assert!(pb.is_active());

        let tick = pb.advance(100.0, 2); // grace over, drops still falling
        assert!(!tick.finished);
        let tick = pb.advance(100.0, 1);
        assert!(!tick.finished);
        let tick = pb.advance(16.0, 0);
        assert!(tick.finished);
        assert!(!pb.is_active());
        assert!(pb.advance(16.0, 0).due.is_empty());
    }

    #[test]
    fn looping_never_auto_stops() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.set_looping(true);
        pb.start(&three_notes(), 1.0);
        run(&mut pb, 100.0, 100);
        assert!(pb.is_active());
    }

    #[test]
    fn starting_again_replaces_the_session() {
        let mut pb = Playback::new(&SchedulerConfig::default());
        pb.start(&three_notes(), 1.0);
        run(&mut pb, 100.0, 10);
        pb.start(&song(&[(0, "n_cs3")], 500), 1.0);
        assert_eq!(pb.title(), Some("test"));
        assert_eq!(pb.advance(16.0, 0).due, vec!["n_cs3".to_string()]);
    }
}
