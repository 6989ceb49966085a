use crate::{envelope::AdsrLinear, noise::Noise, pan, percussion, pitch::PitchCurve, voice};
use lifesong_core::{
    Envelope, Note, NoteOpts, Score, Sound, StereoBuffer, SynthName, Tempo, VoiceId,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub sample_rate_hz: u32,
    /// Seeds the noise used by the percussion.
    pub seed: u64,
    /// Silence appended after the last sound has finished.
    pub tail_s: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44_100,
            seed: 0,
            tail_s: 1.0,
        }
    }
}

fn adsr(tempo: Tempo, envelope: Envelope) -> AdsrLinear {
    AdsrLinear {
        attack_s: tempo.seconds(envelope.attack),
        decay_s: tempo.seconds(envelope.decay),
        sustain_s: tempo.seconds(envelope.sustain),
        release_s: tempo.seconds(envelope.release),
    }
}

fn mix(out: &mut StereoBuffer, start: usize, mono: &[f32], amp: f32, pan: f32) {
    out.add_mono(start, mono, pan::gains(pan).map(|gain| gain * amp));
}

struct Renderer<'a> {
    tempo: Tempo,
    sample_rate_hz: f32,
    controls: HashMap<VoiceId, Vec<(f64, Note)>>,
    noise: Noise,
    out: &'a mut StereoBuffer,
}

impl Renderer<'_> {
    fn frame(&self, t_s: f64) -> usize {
        (t_s * f64::from(self.sample_rate_hz)).round() as usize
    }

    fn note(
        &mut self,
        start_s: f64,
        synth: SynthName,
        note: Note,
        voice: Option<VoiceId>,
        opts: &NoteOpts,
    ) {
        let mut pitch = PitchCurve::new(f64::from(note.to_midi_index()));
        let slide_s = self.tempo.seconds(opts.note_slide);
        let controls = voice.and_then(|voice| self.controls.get(&voice));
        for &(at_s, target) in controls.into_iter().flatten() {
            pitch.slide_to(at_s - start_s, f64::from(target.to_midi_index()), slide_s);
        }
        let env = adsr(self.tempo, opts.envelope);
        let samples = voice::render_note(synth, &pitch, &env, self.sample_rate_hz);
        let start = self.frame(start_s);
        mix(self.out, start, &samples, opts.amp, opts.pan);
    }

    fn sound(&mut self, start_s: f64, sound: &Sound) {
        match sound {
            &Sound::Sample { name, amp, pan } => {
                let samples =
                    percussion::render_sample(name, self.sample_rate_hz, &mut self.noise);
                let start = self.frame(start_s);
                mix(self.out, start, &samples, amp, pan);
            }
            Sound::Note {
                voice,
                synth,
                note,
                opts,
            } => self.note(start_s, *synth, *note, Some(*voice), opts),
            Sound::Chord { synth, chord, opts } => {
                for note in chord.notes() {
                    self.note(start_s, *synth, note, None, opts);
                }
            }
            // applied when rendering the note the voice started with
            Sound::Control { .. } => (),
        }
    }
}

/// Renders every event of `score` into a stereo buffer. Rendering is deterministic for a given
/// seed. If the mix would clip, it is scaled down so its peak is at 1.
pub fn render(score: &Score, config: &RenderConfig) -> StereoBuffer {
    let mut controls = HashMap::<VoiceId, Vec<(f64, Note)>>::new();
    for event in &score.events {
        if let Sound::Control { voice, note } = event.sound {
            controls
                .entry(voice)
                .or_default()
                .push((score.tempo.seconds(event.at), note));
        }
    }
    let mut out = StereoBuffer::silent(0);
    let mut renderer = Renderer {
        tempo: score.tempo,
        sample_rate_hz: config.sample_rate_hz as f32,
        controls,
        noise: Noise::new(config.seed),
        out: &mut out,
    };
    for event in &score.events {
        renderer.sound(score.tempo.seconds(event.at), &event.sound);
    }
    let tail = renderer.frame(config.tail_s);
    out.extend_to(out.len() + tail);
    let peak = out.peak();
    log::info!(
        "rendered {:.1}s of audio with peak {:.2}",
        out.len() as f64 / f64::from(config.sample_rate_hz),
        peak
    );
    if peak > 1.0 {
        out.scale(peak.recip());
    }
    out
}
