//! Unpitched one-shot sounds built from noise and oscillators.
use crate::{
    noise::{LowPass, Noise},
    oscillator::{Oscillator, Saw, Sine, Triangle},
};
use lifesong_core::SampleName;
use std::f32::consts::PI;

/// Inharmonic frequencies that give the cymbal its metallic ring.
const CYMBAL_FREQS_HZ: [f32; 6] = [205.3, 304.4, 369.6, 522.7, 540.0, 800.0];

fn frames(duration_s: f32, sample_rate_hz: f32) -> impl Iterator<Item = f32> {
    let n = (duration_s * sample_rate_hz).ceil() as usize;
    (0..n).map(move |i| i as f32 / sample_rate_hz)
}

fn decay(t_s: f32, time_constant_s: f32) -> f32 {
    (-t_s / time_constant_s).exp()
}

fn elec_tick(sample_rate_hz: f32, noise: &mut Noise) -> Vec<f32> {
    let mut osc = Oscillator::new(Triangle, sample_rate_hz);
    frames(0.03, sample_rate_hz)
        .map(|t_s| {
            (osc.next_sample(2500.0) * 0.6 * decay(t_s, 0.004))
                + (noise.white() * 0.4 * decay(t_s, 0.002))
        })
        .collect()
}

fn drum_heavy_kick(sample_rate_hz: f32, noise: &mut Noise) -> Vec<f32> {
    let mut osc = Oscillator::new(Sine, sample_rate_hz);
    frames(0.6, sample_rate_hz)
        .map(|t_s| {
            let freq_hz = 45.0 + (110.0 * decay(t_s, 0.04));
            let body = osc.next_sample(freq_hz) * decay(t_s, 0.25);
            let click = noise.white() * 0.3 * decay(t_s, 0.003);
            (body * 0.9) + click
        })
        .collect()
}

fn drum_cymbal_closed(sample_rate_hz: f32, noise: &mut Noise) -> Vec<f32> {
    let mut oscs = CYMBAL_FREQS_HZ
        .map(|freq_hz| (freq_hz * 8.0, Oscillator::new(Saw, sample_rate_hz)));
    let mut lpf = LowPass::new();
    frames(0.25, sample_rate_hz)
        .map(|t_s| {
            let metal = oscs
                .iter_mut()
                .map(|(freq_hz, osc)| osc.next_sample(*freq_hz))
                .sum::<f32>()
                / CYMBAL_FREQS_HZ.len() as f32;
            let x = (metal * 0.5) + (noise.white() * 0.5);
            // subtracting the low end leaves a crude high pass
            let high = x - lpf.process(x, 0.2);
            high * decay(t_s, 0.05)
        })
        .collect()
}

fn ambi_swoosh(sample_rate_hz: f32, noise: &mut Noise) -> Vec<f32> {
    const DURATION_S: f32 = 3.0;
    let mut lpf = LowPass::new();
    frames(DURATION_S, sample_rate_hz)
        .map(|t_s| {
            let shape_01 = (PI * t_s / DURATION_S).sin();
            let brightness_01 = 0.02 + (0.3 * shape_01);
            lpf.process(noise.white(), brightness_01) * shape_01 * shape_01 * 2.0
        })
        .collect()
}

/// Mono samples of one percussive sound at full amplitude.
pub fn render_sample(name: SampleName, sample_rate_hz: f32, noise: &mut Noise) -> Vec<f32> {
    match name {
        SampleName::ElecTick => elec_tick(sample_rate_hz, noise),
        SampleName::DrumHeavyKick => drum_heavy_kick(sample_rate_hz, noise),
        SampleName::DrumCymbalClosed => drum_cymbal_closed(sample_rate_hz, noise),
        SampleName::AmbiSwoosh => ambi_swoosh(sample_rate_hz, noise),
    }
}
