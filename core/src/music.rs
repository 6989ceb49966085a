//! 12-tone equal temperament following the A_440Hz convention, restricted to MIDI notes. C_4 is
//! middle C (MIDI 60) and the lowest note is C in octave "-1" (MIDI 0).
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const NOTES_PER_OCTAVE: u8 = 12;
const MAX_MIDI_INDEX: u8 = 127;

/// A note without an octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteName {
    relative_midi_index: u8,
}

impl NoteName {
    const fn from_index(relative_midi_index: u8) -> Self {
        assert!(relative_midi_index < NOTES_PER_OCTAVE);
        Self {
            relative_midi_index,
        }
    }

    pub const C: Self = Self::from_index(0);
    pub const C_SHARP: Self = Self::from_index(1);
    pub const D: Self = Self::from_index(2);
    pub const D_SHARP: Self = Self::from_index(3);
    pub const E: Self = Self::from_index(4);
    pub const F: Self = Self::from_index(5);
    pub const F_SHARP: Self = Self::from_index(6);
    pub const G: Self = Self::from_index(7);
    pub const G_SHARP: Self = Self::from_index(8);
    pub const A: Self = Self::from_index(9);
    pub const A_SHARP: Self = Self::from_index(10);
    pub const B: Self = Self::from_index(11);

    /// Returns a str representation of the note name where all accidentals are sharp, formatted
    /// like "C" or "C#"
    pub const fn to_str_sharp(self) -> &'static str {
        match self.relative_midi_index {
            0 => "C",
            1 => "C#",
            2 => "D",
            3 => "D#",
            4 => "E",
            5 => "F",
            6 => "F#",
            7 => "G",
            8 => "G#",
            9 => "A",
            10 => "A#",
            11 => "B",
            _ => unreachable!(),
        }
    }

    /// Octaves are numbered the MIDI way, starting at -1.
    pub const fn in_octave(self, octave: i8) -> Note {
        Note::new(self, octave)
    }
}

const A_4_FREQ_HZ: f64 = 440.0;
const A_4_MIDI_INDEX: u8 = 69;

/// Frequency of a possibly fractional MIDI note. Fractional notes occur while a voice slides
/// between two notes.
pub fn freq_hz_of_midi(midi: f64) -> f64 {
    A_4_FREQ_HZ
        * 2_f64.powf((midi - A_4_MIDI_INDEX as f64) / NOTES_PER_OCTAVE as f64)
}

/// Definition of notes based on MIDI tuned to A_440
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Note {
    midi_index: u8,
}

impl Note {
    pub const D_2: Self = NoteName::D.in_octave(2);
    pub const D_3: Self = NoteName::D.in_octave(3);
    pub const D_4: Self = NoteName::D.in_octave(4);
    pub const D_5: Self = NoteName::D.in_octave(5);
    pub const D_6: Self = NoteName::D.in_octave(6);
    pub const G_4: Self = NoteName::G.in_octave(4);

    pub const fn new(name: NoteName, octave: i8) -> Self {
        assert!(octave >= -1);
        let midi_index = (octave as i16 + 1) * NOTES_PER_OCTAVE as i16
            + name.relative_midi_index as i16;
        assert!(midi_index <= MAX_MIDI_INDEX as i16);
        Self {
            midi_index: midi_index as u8,
        }
    }

    pub const fn from_midi_index(midi_index: u8) -> Option<Self> {
        if midi_index > MAX_MIDI_INDEX {
            None
        } else {
            Some(Self { midi_index })
        }
    }

    /// Rounds to the nearest MIDI note, returning `None` outside of 0..=127 or for NaN.
    pub fn from_midi_f64(midi: f64) -> Option<Self> {
        let rounded = midi.round();
        if rounded.is_finite() && (0.0..=MAX_MIDI_INDEX as f64).contains(&rounded) {
            Some(Self {
                midi_index: rounded as u8,
            })
        } else {
            None
        }
    }

    pub const fn to_midi_index(self) -> u8 {
        self.midi_index
    }

    pub fn freq_hz(self) -> f64 {
        freq_hz_of_midi(self.midi_index as f64)
    }

    pub const fn octave(self) -> i8 {
        (self.midi_index / NOTES_PER_OCTAVE) as i8 - 1
    }

    pub const fn note_name(self) -> NoteName {
        NoteName::from_index(self.midi_index % NOTES_PER_OCTAVE)
    }

    pub const fn add_semitones_checked(self, num_semitones: i16) -> Option<Self> {
        let midi_index = self.midi_index as i16 + num_semitones;
        if midi_index < 0 || midi_index > MAX_MIDI_INDEX as i16 {
            None
        } else {
            Some(Self {
                midi_index: midi_index as u8,
            })
        }
    }

    pub const fn add_octaves_checked(self, num_octaves: i8) -> Option<Self> {
        self.add_semitones_checked(num_octaves as i16 * NOTES_PER_OCTAVE as i16)
    }
}

impl TryFrom<u8> for Note {
    type Error = String;

    fn try_from(midi_index: u8) -> Result<Self, Self::Error> {
        Self::from_midi_index(midi_index)
            .ok_or_else(|| format!("{} is not a MIDI note", midi_index))
    }
}

impl From<Note> for u8 {
    fn from(note: Note) -> Self {
        note.midi_index
    }
}

/// Example formats: "C#4", "D2". Notes in octave "-1" are written like "C-1".
impl Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.note_name().to_str_sharp(), self.octave())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    /// The dominant seventh with the third replaced by a fourth. Neither major nor minor, which is
    /// why it closes the piece for someone who is still alive.
    Sus4Seventh,
}

impl ChordQuality {
    pub const fn intervals(self) -> &'static [i16] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Sus4Seventh => &[0, 5, 7, 10],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub root: Note,
    pub quality: ChordQuality,
}

impl Chord {
    pub const fn major(root: Note) -> Self {
        Self {
            root,
            quality: ChordQuality::Major,
        }
    }

    pub const fn minor(root: Note) -> Self {
        Self {
            root,
            quality: ChordQuality::Minor,
        }
    }

    pub const fn sus4_seventh(root: Note) -> Self {
        Self {
            root,
            quality: ChordQuality::Sus4Seventh,
        }
    }

    /// Calls `f` on each note of the chord from the root upwards, skipping notes that would fall
    /// above the MIDI range.
    pub fn with_notes<F: FnMut(Note)>(self, mut f: F) {
        for &interval in self.quality.intervals() {
            if let Some(note) = self.root.add_semitones_checked(interval) {
                f(note);
            }
        }
    }

    pub fn notes(self) -> Vec<Note> {
        let mut ret = Vec::new();
        self.with_notes(|note| ret.push(note));
        ret
    }
}

const MAJOR_SCALE_STEPS: [i16; 7] = [2, 2, 1, 2, 2, 2, 1];
const MAJOR_SEVENTH_ARPEGGIO_STEPS: [i16; 4] = [4, 3, 4, 1];

/// Repeats `steps` upwards from `root` and stops after `count` notes or at the top of the MIDI
/// range, whichever comes first.
fn stepped(root: Note, steps: &[i16], count: usize) -> Vec<Note> {
    // never more notes than there are MIDI indices
    let mut ret = Vec::with_capacity(count.min(usize::from(MAX_MIDI_INDEX) + 1));
    let mut current = Some(root);
    for step in steps.iter().cycle() {
        if ret.len() >= count {
            break;
        }
        match current {
            Some(note) => {
                ret.push(note);
                current = note.add_semitones_checked(*step);
            }
            None => break,
        }
    }
    ret
}

/// The root followed by `7 * octaves` notes of its major scale.
pub fn major_scale(root: Note, octaves: usize) -> Vec<Note> {
    stepped(root, &MAJOR_SCALE_STEPS, (octaves * MAJOR_SCALE_STEPS.len()) + 1)
}

/// `count` notes of a major seventh arpeggio extended through as many octaves as necessary.
pub fn major_seventh_arpeggio(root: Note, count: usize) -> Vec<Note> {
    stepped(root, &MAJOR_SEVENTH_ARPEGGIO_STEPS, count)
}

#[cfg(test)]
mod test {
    use super::*;

    fn midi(notes: &[Note]) -> Vec<u8> {
        notes.iter().map(|n| n.to_midi_index()).collect()
    }

    #[test]
    fn octave_numbering_matches_midi() {
        assert_eq!(Note::D_2.to_midi_index(), 38);
        assert_eq!(Note::D_4.to_midi_index(), 62);
        assert_eq!(Note::G_4.to_midi_index(), 67);
        assert_eq!(NoteName::C.in_octave(-1).to_midi_index(), 0);
        assert_eq!(Note::D_6.octave(), 6);
        assert_eq!(Note::D_6.note_name(), NoteName::D);
    }

    #[test]
    fn a_4_is_440_hz() {
        let a_4 = NoteName::A.in_octave(4);
        assert!((a_4.freq_hz() - 440.0).abs() < 1e-9);
        assert!((Note::D_3.freq_hz() * 2.0 - Note::D_4.freq_hz()).abs() < 1e-9);
    }

    #[test]
    fn display() {
        assert_eq!(Note::D_2.to_string(), "D2");
        assert_eq!(NoteName::F_SHARP.in_octave(3).to_string(), "F#3");
        assert_eq!(NoteName::C.in_octave(-1).to_string(), "C-1");
    }

    #[test]
    fn midi_range_is_checked() {
        assert!(Note::from_midi_index(127).is_some());
        assert!(Note::from_midi_index(128).is_none());
        assert_eq!(Note::from_midi_f64(47.6), Note::from_midi_index(48));
        assert!(Note::from_midi_f64(-0.7).is_none());
        assert!(Note::from_midi_f64(f64::NAN).is_none());
        assert!(Note::D_6.add_octaves_checked(6).is_none());
    }

    #[test]
    fn chords_on_d() {
        assert_eq!(midi(&Chord::major(Note::D_4).notes()), [62, 66, 69]);
        assert_eq!(midi(&Chord::minor(Note::D_4).notes()), [62, 65, 69]);
        assert_eq!(
            midi(&Chord::sus4_seventh(Note::D_4).notes()),
            [62, 67, 69, 72]
        );
    }

    #[test]
    fn d_major_scale_over_four_octaves() {
        let scale = major_scale(Note::D_2, 4);
        assert_eq!(scale.len(), 29);
        assert_eq!(midi(&scale[..8]), [38, 40, 42, 43, 45, 47, 49, 50]);
        assert_eq!(scale.last().copied(), Some(NoteName::D.in_octave(6)));
    }

    #[test]
    fn arpeggio_steps_through_major_sevenths() {
        assert_eq!(
            midi(&major_seventh_arpeggio(Note::G_4, 6)),
            [67, 71, 74, 78, 79, 83]
        );
        assert!(major_seventh_arpeggio(Note::G_4, 0).is_empty());
        // stops at the top of the MIDI range instead of overflowing
        assert!(major_seventh_arpeggio(Note::G_4, 1000).len() < 1000);
    }

    #[test]
    fn huge_counts_end_at_the_top_note() {
        for count in [u32::MAX as usize, usize::MAX] {
            let notes = major_seventh_arpeggio(Note::G_4, count);
            assert_eq!(notes.len(), 21);
            assert_eq!(notes.last().map(|note| note.to_midi_index()), Some(127));
        }
    }

    #[test]
    fn notes_serialize_as_midi_indices() {
        assert_eq!(serde_json::to_string(&Note::D_4).unwrap(), "62");
        assert!(serde_json::from_str::<Note>("200").is_err());
    }
}
