// Convolution reverb send bus.
//
// The room is a synthetic stereo impulse response: independent noise per
// channel under a `(1 - i/len)^decay` envelope. It is applied with uniformly
// partitioned overlap-save FFT convolution, so cost per sample stays flat no
// matter how long the tail is. Latency is one block.

use std::sync::Arc;

use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::frame::StereoFrame;

#[derive(Clone, Debug)]
pub struct ImpulseResponse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ImpulseResponse {
    pub fn synthesize(len: usize, decay: f32, rng: &mut impl Rng) -> Self {
        let len = len.max(1);
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for i in 0..len {
            let n = i as f32 / len as f32;
            let gain = (1.0 - n).powf(decay);
            left.push(rng.random_range(-1.0f32..1.0) * gain);
            right.push(rng.random_range(-1.0f32..1.0) * gain);
        }
        Self { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }
}

pub struct Reverb {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    // per-partition IR spectra, only the non-redundant half (block + 1 bins)
    ir_left: Vec<Vec<Complex<f32>>>,
    ir_right: Vec<Vec<Complex<f32>>>,
    // frequency-domain delay line of past input spectra
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,
    window: Vec<f32>, // [previous block | current block]
    fill: usize,
    ready: Vec<StereoFrame>,
    acc_left: Vec<Complex<f32>>,
    acc_right: Vec<Complex<f32>>,
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    return_gain: f32,
}

impl Reverb {
    pub fn new(ir: &ImpulseResponse, block: usize, return_gain: f32) -> Self {
        let block = block.max(1);
        let n = block * 2;
        let bins = block + 1;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let partitions = ir.len().div_ceil(block).max(1);
        let mut work = vec![Complex::default(); n];
        let mut split = |channel: &[f32]| -> Vec<Vec<Complex<f32>>> {
            (0..partitions)
                .map(|p| {
                    work.fill(Complex::default());
                    let start = p * block;
                    let end = (start + block).min(channel.len());
                    for (slot, &s) in work.iter_mut().zip(&channel[start..end]) {
                        *slot = Complex::new(s, 0.0);
                    }
                    fft.process_with_scratch(&mut work, &mut scratch);
                    work[..bins].to_vec()
                })
                .collect()
        };
        let ir_left = split(&ir.left);
        let ir_right = split(&ir.right);

        Self {
            block,
            fdl: vec![vec![Complex::default(); bins]; partitions],
            fdl_head: 0,
            window: vec![0.0; n],
            fill: 0,
            ready: vec![StereoFrame::zero(); block],
            acc_left: vec![Complex::default(); n],
            acc_right: vec![Complex::default(); n],
            work,
            scratch,
            fft,
            ifft,
            ir_left,
            ir_right,
            return_gain,
        }
    }

    /// Feed one sample of the mono send bus, get one stereo frame of return.
    #[inline]
    pub fn process(&mut self, send: f32) -> StereoFrame {
        let out = self.ready[self.fill];
        self.window[self.block + self.fill] = send;
        self.fill += 1;
        if self.fill == self.block {
            self.run_block();
            self.fill = 0;
        }
        out.scaled(self.return_gain)
    }

    fn run_block(&mut self) {
        let block = self.block;
        let n = block * 2;
        let bins = block + 1;
        let partitions = self.fdl.len();

        for (slot, &s) in self.work.iter_mut().zip(&self.window) {
            *slot = Complex::new(s, 0.0);
        }
        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);

        self.fdl_head = (self.fdl_head + partitions - 1) % partitions;
        self.fdl[self.fdl_head].copy_from_slice(&self.work[..bins]);

        self.acc_left.fill(Complex::default());
        self.acc_right.fill(Complex::default());
        for k in 0..partitions {
            let x = &self.fdl[(self.fdl_head + k) % partitions];
            let hl = &self.ir_left[k];
            let hr = &self.ir_right[k];
            for b in 0..bins {
                self.acc_left[b] += x[b] * hl[b];
                self.acc_right[b] += x[b] * hr[b];
            }
        }
        // real signal: rebuild the upper half from the lower
        for b in 1..block {
            self.acc_left[n - b] = self.acc_left[b].conj();
            self.acc_right[n - b] = self.acc_right[b].conj();
        }
        self.ifft.process_with_scratch(&mut self.acc_left, &mut self.scratch);
        self.ifft.process_with_scratch(&mut self.acc_right, &mut self.scratch);

        let norm = 1.0 / n as f32;
        for i in 0..block {
            self.ready[i] = StereoFrame {
                left: self.acc_left[block + i].re * norm,
                right: self.acc_right[block + i].re * norm,
            };
        }
        self.window.copy_within(block..n, 0);
    }
}
