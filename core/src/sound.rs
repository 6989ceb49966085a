//! The events a composition produces. A score is a list of sounds stamped with the beat they
//! start on, independent of how they are eventually turned into audio.
use crate::{
    music::{Chord, Note},
    time::{Beats, Tempo},
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Percussive one-shot sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleName {
    ElecTick,
    DrumHeavyKick,
    DrumCymbalClosed,
    AmbiSwoosh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthName {
    Beep,
    Sine,
    PrettyBell,
}

/// Durations of the stages of an amplitude envelope. The level is held at full amplitude through
/// decay and sustain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: Beats,
    pub decay: Beats,
    pub sustain: Beats,
    pub release: Beats,
}

impl Envelope {
    pub fn duration(&self) -> Beats {
        self.attack + self.decay + self.sustain + self.release
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: Beats::ZERO,
            decay: Beats::ZERO,
            sustain: Beats::ZERO,
            release: Beats(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteOpts {
    pub amp: f32,
    /// -1 is hard left, 1 is hard right
    pub pan: f32,
    pub envelope: Envelope,
    /// How long a voice takes to glide to a new note after a `Control`.
    pub note_slide: Beats,
}

impl NoteOpts {
    pub fn pan(self, pan: f32) -> Self {
        Self { pan, ..self }
    }

    pub fn amp(self, amp: f32) -> Self {
        Self { amp, ..self }
    }

    pub fn envelope(self, envelope: Envelope) -> Self {
        Self { envelope, ..self }
    }

    pub fn note_slide(self, note_slide: Beats) -> Self {
        Self { note_slide, ..self }
    }
}

impl Default for NoteOpts {
    fn default() -> Self {
        Self {
            amp: 1.0,
            pan: 0.0,
            envelope: Envelope::default(),
            note_slide: Beats::ZERO,
        }
    }
}

/// Identifies a sounding note so it can be controlled after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sound {
    Sample {
        name: SampleName,
        amp: f32,
        pan: f32,
    },
    Note {
        voice: VoiceId,
        synth: SynthName,
        note: Note,
        opts: NoteOpts,
    },
    Chord {
        synth: SynthName,
        chord: Chord,
        opts: NoteOpts,
    },
    /// Slide an already sounding voice to a new note.
    Control { voice: VoiceId, note: Note },
}

/// Which concurrent part of the piece emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Main,
    Ticks,
    ShepardTone,
    Weddings,
    Divorces,
}

impl Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Main => "main",
            Self::Ticks => "ticks",
            Self::ShepardTone => "shepard-tone",
            Self::Weddings => "weddings",
            Self::Divorces => "divorces",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub at: Beats,
    pub part: Part,
    pub sound: Sound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub tempo: Tempo,
    /// In the order they were played, which is also chronological.
    pub events: Vec<Event>,
}

impl Score {
    pub fn part(&self, part: Part) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.part == part)
    }

    pub fn samples(&self, name: SampleName) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| {
            matches!(event.sound, Sound::Sample { name: n, .. } if n == name)
        })
    }

    pub fn synth_notes(&self, synth: SynthName) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| {
            matches!(event.sound, Sound::Note { synth: s, .. } if s == synth)
        })
    }

    pub fn chords(&self) -> impl Iterator<Item = (Beats, Chord)> {
        self.events.iter().filter_map(|event| match event.sound {
            Sound::Chord { chord, .. } => Some((event.at, chord)),
            _ => None,
        })
    }

    /// The beat on which the last event starts. Sounds may ring on after this.
    pub fn last_onset(&self) -> Beats {
        self.events
            .iter()
            .map(|event| event.at)
            .fold(Beats::ZERO, Beats::max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(at: f64, part: Part, sound: Sound) -> Event {
        Event {
            at: Beats(at),
            part,
            sound,
        }
    }

    fn tick(pan: f32) -> Sound {
        Sound::Sample {
            name: SampleName::ElecTick,
            amp: 1.0,
            pan,
        }
    }

    fn score() -> Score {
        Score {
            tempo: Tempo::default(),
            events: vec![
                event(
                    1.0,
                    Part::Main,
                    Sound::Chord {
                        synth: SynthName::Beep,
                        chord: Chord::major(Note::D_4),
                        opts: NoteOpts::default().pan(-1.0),
                    },
                ),
                event(4.0, Part::Ticks, tick(-0.5)),
                event(5.0, Part::Ticks, tick(0.5)),
                event(
                    4.0,
                    Part::ShepardTone,
                    Sound::Note {
                        voice: VoiceId(0),
                        synth: SynthName::Sine,
                        note: Note::D_2,
                        opts: NoteOpts::default(),
                    },
                ),
            ],
        }
    }

    #[test]
    fn filters() {
        let score = score();
        assert_eq!(score.part(Part::Ticks).count(), 2);
        assert_eq!(score.samples(SampleName::ElecTick).count(), 2);
        assert_eq!(score.samples(SampleName::AmbiSwoosh).count(), 0);
        assert_eq!(score.synth_notes(SynthName::Sine).count(), 1);
        assert_eq!(
            score.chords().collect::<Vec<_>>(),
            [(Beats(1.0), Chord::major(Note::D_4))]
        );
        assert_eq!(score.last_onset(), Beats(5.0));
    }

    #[test]
    fn envelope_duration_sums_its_stages() {
        let envelope = Envelope {
            attack: Beats(4.0),
            sustain: Beats(12.0),
            release: Beats(4.0),
            ..Default::default()
        };
        assert_eq!(envelope.duration(), Beats(20.0));
        assert_eq!(Envelope::default().duration(), Beats(1.0));
    }

    #[test]
    fn sounds_are_tagged_in_json() {
        let json = serde_json::to_value(tick(0.5)).unwrap();
        assert_eq!(json["kind"], "sample");
        assert_eq!(json["name"], "elec_tick");
        let score = score();
        let text = serde_json::to_string(&score).unwrap();
        assert_eq!(serde_json::from_str::<Score>(&text).unwrap(), score);
    }
}
