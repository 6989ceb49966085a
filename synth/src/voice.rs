//! Pitched instruments.
use crate::{
    envelope::AdsrLinear,
    oscillator::{Oscillator, Sine},
    pitch::PitchCurve,
};
use itertools::izip;
use lifesong_core::{SynthName, freq_hz_of_midi};

/// Frequency ratio, relative amplitude and decay time in seconds of each partial of the bell.
const BELL_PARTIALS: [(f32, f32, f32); 6] = [
    (0.5, 0.3, 1.2),
    (1.0, 1.0, 0.9),
    (2.0, 0.5, 0.6),
    (2.76, 0.35, 0.45),
    (5.4, 0.2, 0.25),
    (8.93, 0.1, 0.15),
];

fn num_frames(duration_s: f64, sample_rate_hz: f32) -> usize {
    (duration_s * f64::from(sample_rate_hz)).ceil() as usize
}

fn sine(pitch: &PitchCurve, env: &AdsrLinear, sample_rate_hz: f32) -> Vec<f32> {
    let mut osc = Oscillator::new(Sine, sample_rate_hz);
    (0..num_frames(env.duration_s(), sample_rate_hz))
        .map(|i| {
            let t_s = i as f64 / f64::from(sample_rate_hz);
            let freq_hz = freq_hz_of_midi(pitch.midi_at(t_s)) as f32;
            osc.next_sample(freq_hz) * env.level(t_s)
        })
        .collect()
}

fn pretty_bell(pitch: &PitchCurve, env: &AdsrLinear, sample_rate_hz: f32) -> Vec<f32> {
    let mut oscs = BELL_PARTIALS.map(|_| Oscillator::new(Sine, sample_rate_hz));
    let total_amp = BELL_PARTIALS.iter().map(|&(_, amp, _)| amp).sum::<f32>();
    (0..num_frames(env.duration_s(), sample_rate_hz))
        .map(|i| {
            let t_s = i as f64 / f64::from(sample_rate_hz);
            let freq_hz = freq_hz_of_midi(pitch.midi_at(t_s)) as f32;
            let mut sum = 0.0;
            for (&(ratio, amp, decay_s), osc) in izip!(&BELL_PARTIALS, &mut oscs) {
                sum += osc.next_sample(freq_hz * ratio) * amp * (-(t_s as f32) / decay_s).exp();
            }
            (sum / total_amp) * env.level(t_s)
        })
        .collect()
}

/// Mono samples of one note at full amplitude, lasting as long as its envelope.
pub fn render_note(
    synth: SynthName,
    pitch: &PitchCurve,
    env: &AdsrLinear,
    sample_rate_hz: f32,
) -> Vec<f32> {
    match synth {
        SynthName::Beep | SynthName::Sine => sine(pitch, env, sample_rate_hz),
        SynthName::PrettyBell => pretty_bell(pitch, env, sample_rate_hz),
    }
}
