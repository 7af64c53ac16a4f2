use std::sync::Arc;

use rand::Rng;

// Shared, read-only pink-ish noise. Built once when the engine starts and
// handed out to every ambience source that needs a noise bed.
#[derive(Clone, Debug)]
pub struct NoiseBuffer {
    data: Arc<[f32]>,
}

impl NoiseBuffer {
    // Paul Kellet's pinking filter: six leaky integrators plus a delayed
    // white tap. The 0.11 trim keeps the sum inside [-1, 1].
    pub fn pink(len: usize, rng: &mut impl Rng) -> Self {
        let mut data = Vec::with_capacity(len.max(1));
        let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
            (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for _ in 0..len.max(1) {
            let white: f32 = rng.random_range(-1.0..1.0);
            b0 = 0.99886 * b0 + white * 0.0555179;
            b1 = 0.99332 * b1 + white * 0.0750759;
            b2 = 0.96900 * b2 + white * 0.1538520;
            b3 = 0.86650 * b3 + white * 0.3104856;
            b4 = 0.55000 * b4 + white * 0.5329522;
            b5 = -0.7616 * b5 - white * 0.0168981;
            let out = b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362;
            data.push(out * 0.11);
            b6 = white * 0.115926;
        }
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn reader(&self, offset: usize) -> NoiseReader {
        NoiseReader {
            data: Arc::clone(&self.data),
            pos: offset % self.data.len(),
        }
    }
}

// A looping read head into the shared buffer
#[derive(Clone, Debug)]
pub struct NoiseReader {
    data: Arc<[f32]>,
    pos: usize,
}

impl NoiseReader {
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let s = self.data[self.pos];
        self.pos += 1;
        if self.pos >= self.data.len() {
            self.pos = 0;
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn pink_noise_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let noise = NoiseBuffer::pink(48_000, &mut rng);
        assert_eq!(noise.len(), 48_000);
        let mut reader = noise.reader(0);
        let peak = (0..48_000)
            .map(|_| reader.next_sample().abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.05, "noise should not be silent, peak {peak}");
        assert!(peak <= 1.0, "noise must not clip, peak {peak}");
    }

    #[test]
    fn reader_loops_past_the_end() {
        let mut rng = Pcg32::seed_from_u64(1);
        let noise = NoiseBuffer::pink(4, &mut rng);
        let mut reader = noise.reader(3);
        reader.next_sample();
        let wrapped = reader.next_sample();
        let mut fresh = noise.reader(0);
        assert_eq!(wrapped, fresh.next_sample());
    }
}
