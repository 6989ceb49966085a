use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seeded so that rendering the same score twice gives the same audio.
pub struct Noise {
    rng: StdRng,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn white(&mut self) -> f32 {
        self.rng.random::<f32>() * 2. - 1.
    }
}

/// One pole low pass filter, enough to darken noise.
pub struct LowPass {
    state: f32,
}

impl LowPass {
    pub fn new() -> Self {
        Self { state: 0.0 }
    }

    /// `ratio_01` near 0 filters heavily and 1 passes the input through.
    pub fn process(&mut self, x: f32, ratio_01: f32) -> f32 {
        self.state += (x - self.state) * ratio_01;
        self.state
    }
}

impl Default for LowPass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_seed_same_noise() {
        let mut a = Noise::new(7);
        let mut b = Noise::new(7);
        for _ in 0..100 {
            let x = a.white();
            assert_eq!(x, b.white());
            assert!((-1.0..1.0).contains(&x));
        }
    }

    #[test]
    fn low_pass_settles_on_a_constant_input() {
        let mut lpf = LowPass::new();
        let mut y = 0.0;
        for _ in 0..200 {
            y = lpf.process(1.0, 0.1);
        }
        assert!((y - 1.0).abs() < 1e-3);
    }
}
