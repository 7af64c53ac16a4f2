// Parameter automation: breakpoint envelopes for one-shot voices and a
// one-pole smoother for long-lived gains.

// Exponential ramps can't start from or reach zero, so they bottom out here.
const EXP_FLOOR: f32 = 1e-4;

const MAX_SEGMENTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ramp {
    Linear,
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    end: f32, // seconds since the envelope started
    target: f32,
    ramp: Ramp,
}

const EMPTY: Segment = Segment { end: 0.0, target: 0.0, ramp: Ramp::Linear };

/// A finite list of ramps starting at a fixed value, in seconds from note-on.
/// After the last breakpoint the final value is held.
///
/// Value type on purpose: voices carry their own copy and need no
/// allocation when they're spawned inside the audio callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    start: f32,
    segments: [Segment; MAX_SEGMENTS],
    len: usize,
}

impl Envelope {
    pub fn starting_at(value: f32) -> Self {
        Self {
            start: value,
            segments: [EMPTY; MAX_SEGMENTS],
            len: 0,
        }
    }

    pub fn linear_to(self, target: f32, at: f32) -> Self {
        self.push(Ramp::Linear, target, at)
    }

    pub fn exponential_to(self, target: f32, at: f32) -> Self {
        self.push(Ramp::Exponential, target, at)
    }

    fn push(mut self, ramp: Ramp, target: f32, at: f32) -> Self {
        debug_assert!(self.len < MAX_SEGMENTS, "envelope has too many segments");
        if self.len < MAX_SEGMENTS {
            let prev_end = self.end_time();
            self.segments[self.len] = Segment { end: at.max(prev_end), target, ramp };
            self.len += 1;
        }
        self
    }

    pub fn end_time(&self) -> f32 {
        if self.len == 0 { 0.0 } else { self.segments[self.len - 1].end }
    }

    // Closed-form lookup; the audio path uses `EnvelopeCursor` instead.
    #[cfg(test)]
    pub fn value_at(&self, t: f32) -> f32 {
        let mut from_t = 0.0;
        let mut from_v = self.start;
        for seg in &self.segments[..self.len] {
            if t < seg.end {
                let span = seg.end - from_t;
                let x = if span > 0.0 { ((t - from_t) / span).clamp(0.0, 1.0) } else { 1.0 };
                return match seg.ramp {
                    Ramp::Linear => from_v + (seg.target - from_v) * x,
                    Ramp::Exponential => {
                        let a = from_v.max(EXP_FLOOR);
                        let b = seg.target.max(EXP_FLOOR);
                        a * (b / a).powf(x)
                    }
                };
            }
            from_t = seg.end;
            from_v = seg.target;
        }
        from_v
    }

    pub fn cursor(&self, sample_rate: f32) -> EnvelopeCursor {
        let mut c = EnvelopeCursor {
            env: *self,
            sample_rate,
            seg: 0,
            value: self.start,
            step: 0.0,
            remaining: 0,
        };
        c.enter(0);
        c
    }
}

/// Sample-by-sample walk over an `Envelope`.
#[derive(Clone, Debug)]
pub struct EnvelopeCursor {
    env: Envelope,
    sample_rate: f32,
    seg: usize,
    value: f32,
    step: f32, // additive for linear ramps, multiplicative for exponential
    remaining: u32,
}

impl EnvelopeCursor {
    fn enter(&mut self, mut seg: usize) {
        while seg < self.env.len {
            let s = self.env.segments[seg];
            let start_t = if seg == 0 { 0.0 } else { self.env.segments[seg - 1].end };
            let n = ((s.end - start_t) * self.sample_rate).round().max(0.0) as u32;
            if n == 0 {
                self.value = s.target;
                seg += 1;
                continue;
            }
            match s.ramp {
                Ramp::Linear => {
                    self.step = (s.target - self.value) / n as f32;
                }
                Ramp::Exponential => {
                    self.value = self.value.max(EXP_FLOOR);
                    self.step = (s.target.max(EXP_FLOOR) / self.value).powf(1.0 / n as f32);
                }
            }
            self.remaining = n;
            self.seg = seg;
            return;
        }
        self.seg = self.env.len;
    }

    #[inline]
    pub fn next_value(&mut self) -> f32 {
        let out = self.value;
        if self.seg < self.env.len {
            let s = self.env.segments[self.seg];
            match s.ramp {
                Ramp::Linear => self.value += self.step,
                Ramp::Exponential => self.value *= self.step,
            }
            self.remaining -= 1;
            if self.remaining == 0 {
                self.value = s.target;
                self.enter(self.seg + 1);
            }
        }
        out
    }
}

/// "Glide toward target with time constant tau". Every long-lived gain in
/// the engine moves through one of these so there are never hard steps.
#[derive(Clone, Debug)]
pub struct Smoothed {
    value: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
}

impl Smoothed {
    pub fn new(initial: f32, time_constant: f32, sample_rate: f32) -> Self {
        let mut s = Self {
            value: initial,
            target: initial,
            coeff: 1.0,
            sample_rate,
        };
        s.set_time_constant(time_constant);
        s
    }

    pub fn set_time_constant(&mut self, tau: f32) {
        self.coeff = if tau <= 0.0 {
            1.0
        } else {
            1.0 - (-1.0 / (tau * self.sample_rate)).exp()
        };
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    #[cfg(test)]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn next_value(&mut self) -> f32 {
        self.value += (self.target - self.value) * self.coeff;
        self.value
    }
}
