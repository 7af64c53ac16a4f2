// Falling drops and the visual leftovers of their impacts.
//
// Everything here is in virtual pixels and advances once per frame. The
// scene never makes sound itself: `step` reports which drops reached the
// pad line and the caller decides what a hit means.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::{SchedulerConfig, ViewportConfig};
use crate::pipeline::layout;
use crate::pipeline::project::Rgb;

const SPAWN_HEIGHT: f32 = -60.0;
const SPAWN_JITTER: f32 = 40.0;
const SPEED_JITTER: f32 = 2.0;
const OFFSCREEN_MARGIN: f32 = 100.0;

const RIPPLE_START_SIZE: f32 = 14.0;
const RIPPLE_GROWTH: f32 = 1.4;
const RIPPLE_FADE: f32 = 0.02;

const PARTICLE_FADE: f32 = 0.012;
const SPARKLES_PER_HIT: usize = 4;
const STARS_ON_COMPLETION: usize = 30;
const NOTE_SYMBOLS: [char; 4] = ['♩', '♪', '♫', '♬'];

const MIN_AUTO_RAIN_MS: f64 = 300.0;
const MAX_AUTO_RAIN_MS: f64 = 3000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl From<&ViewportConfig> for Viewport {
    fn from(c: &ViewportConfig) -> Self {
        Self { width: c.width, height: c.height }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RainDrop {
    pub id: u64,
    pub note_id: &'static str,
    pub x: f32,
    pub y: f32,
    pub speed: f32, // pixels per frame
    pub target_y: f32,
    pub has_hit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
    pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleKind {
    Symbol(char),
    Sparkle,
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub kind: ParticleKind,
    pub opacity: f32,
    pub velocity: f32, // upward, pixels per frame
}

/// A drop reached the pad line this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub note_id: &'static str,
    pub x: f32,
    pub y: f32,
}

pub struct Scene {
    viewport: Viewport,
    drops: Vec<RainDrop>,
    ripples: Vec<Ripple>,
    particles: Vec<Particle>,
    next_id: u64,
    base_speed: f32,
    pad_line_percent: f32,
    rng: Pcg32,
}

impl Scene {
    pub fn new(viewport: Viewport, config: &SchedulerConfig, seed: u64) -> Self {
        Self {
            viewport,
            drops: Vec::new(),
            ripples: Vec::new(),
            particles: Vec::new(),
            next_id: 0,
            base_speed: config.drop_speed,
            pad_line_percent: config.pad_line_percent,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // Drops already in flight keep their old column and target.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Starts a drop above the note's cloud column. Unknown ids spawn nothing.
    pub fn spawn_drop(&mut self, note_id: &str) -> bool {
        let Some(note) = layout::find(note_id) else {
            return false;
        };
        let drop = RainDrop {
            id: self.next_id,
            note_id: note.id,
            x: self.viewport.width * note.cloud_left / 100.0,
            y: SPAWN_HEIGHT - self.rng.random::<f32>() * SPAWN_JITTER,
            speed: self.base_speed + self.rng.random::<f32>() * SPEED_JITTER,
            target_y: self.viewport.height * self.pad_line_percent / 100.0,
            has_hit: false,
        };
        self.next_id += 1;
        self.drops.push(drop);
        true
    }

    pub fn random_note_id(&mut self) -> &'static str {
        let notes = layout::notes();
        notes[self.rng.random_range(0..notes.len())].id
    }

    /// One frame: move drops, report impacts, then age ripples and particles.
    ///
    /// A drop that hits is parked on the pad line for exactly one frame so it
    /// can be drawn at the point of impact, then removed.
    pub fn step(&mut self, now_ms: f64) -> Vec<Hit> {
        let mut hits = Vec::new();
        let floor = self.viewport.height + OFFSCREEN_MARGIN;
        self.drops.retain_mut(|drop| {
            if drop.has_hit {
                return false;
            }
            let y = drop.y + drop.speed;
            if y >= drop.target_y {
                drop.y = drop.target_y;
                drop.has_hit = true;
                hits.push(Hit { note_id: drop.note_id, x: drop.x, y: drop.target_y });
                true
            } else {
                drop.y = y;
                y < floor
            }
        });

        self.ripples.retain_mut(|r| {
            r.size += RIPPLE_GROWTH;
            r.opacity -= RIPPLE_FADE;
            r.opacity > 0.0
        });

        let drift = ((now_ms / 200.0).sin() * 0.5) as f32;
        self.particles.retain_mut(|p| {
            p.y -= p.velocity;
            p.x += drift;
            p.opacity -= PARTICLE_FADE;
            p.opacity > 0.0
        });
        hits
    }

    pub fn add_ripple(&mut self, hit: &Hit, color: Rgb) {
        self.ripples.push(Ripple {
            x: hit.x,
            y: hit.y,
            size: RIPPLE_START_SIZE,
            opacity: 1.0,
            color,
        });
    }

    // One floating note symbol plus a few sparkles around the impact.
    pub fn add_note_burst(&mut self, hit: &Hit) {
        let symbol = NOTE_SYMBOLS[self.rng.random_range(0..NOTE_SYMBOLS.len())];
        self.particles.push(Particle {
            x: hit.x,
            y: hit.y - 10.0,
            kind: ParticleKind::Symbol(symbol),
            opacity: 1.0,
            velocity: 1.0 + self.rng.random::<f32>(),
        });
        for _ in 0..SPARKLES_PER_HIT {
            self.particles.push(Particle {
                x: hit.x + self.rng.random_range(-30.0..30.0),
                y: hit.y + self.rng.random_range(-10.0..10.0),
                kind: ParticleKind::Sparkle,
                opacity: 1.0,
                velocity: 0.8 + self.rng.random::<f32>() * 1.5,
            });
        }
    }

    pub fn celebrate(&mut self) {
        let cx = self.viewport.width / 2.0;
        let cy = self.viewport.height / 2.0;
        for _ in 0..STARS_ON_COMPLETION {
            self.particles.push(Particle {
                x: cx + self.rng.random_range(-200.0..200.0),
                y: cy + self.rng.random_range(-200.0..200.0),
                kind: ParticleKind::Star,
                opacity: 1.0,
                velocity: 0.5 + self.rng.random::<f32>() * 2.0,
            });
        }
    }

    pub fn clear(&mut self) {
        self.drops.clear();
        self.ripples.clear();
        self.particles.clear();
    }

    pub fn drops(&self) -> &[RainDrop] {
        &self.drops
    }

    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

/// Background drizzle: a random pad every so often, denser as `density`
/// goes from 0 to 1. Density 0 turns it off.
#[derive(Clone, Debug, Default)]
pub struct AutoRain {
    density: f32,
    since_last_ms: f64,
}

impl AutoRain {
    pub fn set_density(&mut self, density: f32) {
        self.density = density.clamp(0.0, 1.0);
        self.since_last_ms = 0.0;
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn interval_ms(&self) -> f64 {
        (MAX_AUTO_RAIN_MS - 2700.0 * self.density as f64).max(MIN_AUTO_RAIN_MS)
    }

    /// How many drops are due after `dt_ms` more of frame time.
    pub fn tick(&mut self, dt_ms: f64) -> usize {
        if self.density <= 0.0 {
            return 0;
        }
        self.since_last_ms += dt_ms;
        let interval = self.interval_ms();
        let mut due = 0;
        while self.since_last_ms >= interval {
            self.since_last_ms -= interval;
            due += 1;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn scene() -> Scene {
        Scene::new(
            Viewport { width: 1000.0, height: 700.0 },
            &SchedulerConfig::default(),
            7,
        )
    }

    #[test]
    fn drop_spawns_over_its_cloud() {
        let mut scene = scene();
        assert!(scene.spawn_drop("n_b4"));
        let drop = &scene.drops()[0];
        assert_eq!(drop.x, 410.0);
        assert_eq!(drop.target_y, 595.0);
        assert!((-100.0..=-60.0).contains(&drop.y));
        assert!((15.0..=17.0).contains(&drop.speed));
    }

    #[test]
    fn unknown_note_spawns_nothing() {
        let mut scene = scene();
        assert!(!scene.spawn_drop("n_nope"));
        assert!(scene.drops().is_empty());
    }

    #[test]
    fn every_drop_hits_exactly_once_on_the_first_frame_past_the_line() {
        let mut scene = scene();
        for note in layout::notes() {
            scene.spawn_drop(note.id);
        }
        let starts: Vec<(&str, f32, f32, f32)> = scene
            .drops()
            .iter()
            .map(|d| (d.note_id, d.y, d.speed, d.target_y))
            .collect();

        let mut hit_frames: HashMap<&str, Vec<usize>> = HashMap::new();
        for frame in 1..200 {
            for hit in scene.step(frame as f64 * 16.0) {
                hit_frames.entry(hit.note_id).or_default().push(frame);
            }
        }
        assert!(scene.drops().is_empty());

        for (note_id, y0, speed, target) in starts {
            // first k with y0 + k*speed >= target
            let mut y = y0;
            let mut k = 0;
            while y < target {
                y += speed;
                k += 1;
            }
            assert_eq!(hit_frames[note_id], vec![k], "{note_id}");
        }
    }

    #[test]
    fn hit_drop_is_shown_once_on_the_line_then_removed() {
        let mut scene = scene();
        scene.spawn_drop("n_cs3");
        let mut frames = 0;
        while scene.step(0.0).is_empty() {
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(scene.drops().len(), 1);
        assert!(scene.drops()[0].has_hit);
        assert_eq!(scene.drops()[0].y, 595.0);
        assert!(scene.step(0.0).is_empty());
        assert!(scene.drops().is_empty());
    }

    #[test]
    fn ripples_grow_and_fade_out() {
        let mut scene = scene();
        let hit = Hit { note_id: "n_a3", x: 10.0, y: 20.0 };
        scene.add_ripple(&hit, (1, 2, 3));
        scene.step(0.0);
        let r = &scene.ripples()[0];
        assert!((r.size - 15.4).abs() < 1e-5);
        assert!((r.opacity - 0.98).abs() < 1e-5);
        for _ in 0..47 {
            scene.step(0.0);
        }
        assert_eq!(scene.ripples().len(), 1);
        for _ in 0..3 {
            scene.step(0.0);
        }
        assert!(scene.ripples().is_empty());
    }

    #[test]
    fn hit_burst_and_celebration_sizes() {
        let mut scene = scene();
        scene.add_note_burst(&Hit { note_id: "n_a3", x: 100.0, y: 100.0 });
        assert_eq!(scene.particles().len(), 1 + SPARKLES_PER_HIT);
        assert!(matches!(scene.particles()[0].kind, ParticleKind::Symbol(_)));
        scene.celebrate();
        assert_eq!(scene.particles().len(), 5 + STARS_ON_COMPLETION);
        scene.clear();
        assert!(scene.particles().is_empty());
    }

    #[test]
    fn auto_rain_interval_tracks_density() {
        let mut rain = AutoRain::default();
        assert_eq!(rain.tick(10_000.0), 0);
        rain.set_density(0.5);
        assert_eq!(rain.interval_ms(), 1650.0);
        assert_eq!(rain.tick(1600.0), 0);
        assert_eq!(rain.tick(100.0), 1);
        rain.set_density(1.0);
        assert_eq!(rain.interval_ms(), 300.0);
        assert_eq!(rain.tick(900.0), 3);
    }
}
