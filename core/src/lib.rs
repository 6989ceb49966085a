pub mod music;
pub use music::{
    Chord, ChordQuality, Note, NoteName, freq_hz_of_midi, major_scale,
    major_seventh_arpeggio,
};
pub mod record;
pub use record::{Gender, Place, Record, RecordError};
pub mod sound;
pub use sound::{
    Envelope, Event, NoteOpts, Part, SampleName, Score, Sound, SynthName,
    VoiceId,
};
pub mod stereo;
pub use stereo::{Channel, Stereo, StereoBuffer, StereoPair};
pub mod time;
pub use time::{Beats, Tempo};
