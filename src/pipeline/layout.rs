// The drum: one centre pad and ten around it. Built once, never mutated.

use std::sync::OnceLock;

pub const RING_RADIUS: f32 = 38.0; // percent of the drum area

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: &'static str,
    pub label: &'static str,
    pub frequency: f32,
    pub left: f32, // 0-100 within the drum area
    pub top: f32,
    pub cloud_left: f32, // spawn column, 0-100 of the viewport width
}

// (id, label, Hz, angle in degrees; None = centre). Clockwise from the bottom.
const RAW: [(&str, &str, f32, Option<f32>); 11] = [
    ("n_cs3", "C#3", 138.59, None),
    ("n_a3", "A3", 220.00, Some(90.0)),
    ("n_e4", "E4", 329.63, Some(126.0)),
    ("n_g4", "G4", 392.00, Some(162.0)),
    ("n_b4", "B4", 493.88, Some(198.0)),
    ("n_d5", "D5", 587.33, Some(234.0)),
    ("n_b3", "B3", 246.94, Some(270.0)),
    ("n_cs5", "C#5", 554.37, Some(306.0)),
    ("n_a4", "A4", 440.00, Some(342.0)),
    ("n_fs4", "F#4", 369.99, Some(18.0)),
    ("n_d4", "D4", 293.66, Some(54.0)),
];

pub fn notes() -> &'static [Note] {
    static NOTES: OnceLock<Vec<Note>> = OnceLock::new();
    NOTES.get_or_init(|| {
        RAW.iter()
            .enumerate()
            .map(|(i, &(id, label, frequency, angle))| {
                let (left, top) = match angle {
                    Some(deg) => {
                        let rad = deg.to_radians();
                        (50.0 + RING_RADIUS * rad.cos(), 50.0 + RING_RADIUS * rad.sin())
                    }
                    None => (50.0, 50.0),
                };
                Note { id, label, frequency, left, top, cloud_left: 5.0 + 9.0 * i as f32 }
            })
            .collect()
    })
}

// Unknown ids are a lookup miss, not an error.
pub fn find(id: &str) -> Option<&'static Note> {
    notes().iter().find(|n| n.id == id)
}

pub fn index_of(id: &str) -> Option<usize> {
    notes().iter().position(|n| n.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn eleven_pads_with_spread_clouds() {
        let notes = notes();
        assert_eq!(notes.len(), 11);
        let clouds: Vec<f32> = notes.iter().map(|n| n.cloud_left).collect();
        assert_eq!(clouds, vec![5.0, 14.0, 23.0, 32.0, 41.0, 50.0, 59.0, 68.0, 77.0, 86.0, 95.0]);
    }

    #[test]
    fn ring_starts_at_the_bottom() {
        let a3 = find("n_a3").unwrap();
        assert!((a3.left - 50.0).abs() < 1e-4);
        assert!((a3.top - 88.0).abs() < 1e-4);
        let centre = find("n_cs3").unwrap();
        assert_eq!((centre.left, centre.top), (50.0, 50.0));
    }

    #[test]
    fn lookups_miss_quietly() {
        assert_eq!(find("n_zz"), None);
        assert_eq!(index_of("n_d4"), Some(10));
    }
}
