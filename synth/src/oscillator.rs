use std::f32::consts::PI;

pub trait Waveform: Copy {
    fn sample(&self, state_01: f32) -> f32;
}

#[derive(Clone, Copy)]
pub struct Sine;
impl Waveform for Sine {
    fn sample(&self, state_01: f32) -> f32 {
        (state_01 * PI * 2.0).sin()
    }
}

#[derive(Clone, Copy)]
pub struct Triangle;
impl Waveform for Triangle {
    fn sample(&self, state_01: f32) -> f32 {
        (((state_01 * 2.0) - 1.0).abs() * 2.0) - 1.0
    }
}

#[derive(Clone, Copy)]
pub struct Saw;
impl Waveform for Saw {
    fn sample(&self, state_01: f32) -> f32 {
        (state_01 * 2.0) - 1.0
    }
}

/// Accumulates phase so the frequency can change from one sample to the next without clicks.
pub struct Oscillator<W: Waveform> {
    waveform: W,
    state_01: f32,
    sample_rate_hz: f32,
}

impl<W: Waveform> Oscillator<W> {
    pub fn new(waveform: W, sample_rate_hz: f32) -> Self {
        Self {
            waveform,
            state_01: 0.0,
            sample_rate_hz,
        }
    }

    /// Returns the current sample then advances by one sample at `freq_hz`.
    pub fn next_sample(&mut self, freq_hz: f32) -> f32 {
        let sample = self.waveform.sample(self.state_01);
        self.state_01 += freq_hz / self.sample_rate_hz;
        self.state_01 = self.state_01 - (self.state_01 - 0.5).round();
        sample
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn waveforms_span_minus_one_to_one() {
        assert_eq!(Saw.sample(0.0), -1.0);
        assert_eq!(Saw.sample(1.0), 1.0);
        assert_eq!(Triangle.sample(0.0), 1.0);
        assert_eq!(Triangle.sample(0.5), -1.0);
        assert!((Sine.sample(0.25) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn phase_wraps_once_per_period() {
        let mut osc = Oscillator::new(Saw, 8.0);
        let samples = (0..10).map(|_| osc.next_sample(2.0)).collect::<Vec<_>>();
        // a quarter of a period per sample
        assert_eq!(samples[..5], [-1.0, -0.5, 0.0, 0.5, -1.0]);
        assert!(samples.iter().all(|x| (-1.0..=1.0).contains(x)));
    }
}
