//! The parts of the piece that run alongside the main sequence: the ticking of the years, the
//! Shepard tone drone underneath them, and the wedding and divorce bells.
use crate::scheduler::{Cue, Latch, StopFlag, Timeline};
use lifesong_core::{
    Beats, Envelope, Note, NoteOpts, Part, SampleName, Sound, SynthName,
};

pub const TICK_PAN: f32 = 0.5;

/// Number of tick pairs still to come when the drone is told to stop. A voice that starts just
/// before then has exactly enough time to finish its climb as the ticking ends.
pub const DRONE_STOP_LEAD_PAIRS: u32 = 10;

/// Upper bound on the number of drone voices, however long the life.
pub const DRONE_MAX_VOICES: u32 = 100;

pub const DRONE_OCTAVE_BEATS: Beats = Beats(5.0);

/// A drone voice starts on D_2 and slides up through these.
pub const DRONE_STEPS: [Note; 4] = [Note::D_3, Note::D_4, Note::D_5, Note::D_6];

const DRONE_AMP: f32 = 0.05;

pub const WEDDING_BELL: Note = Note::D_6;
pub const DIVORCE_BELL: Note = Note::D_5;

pub(crate) fn sample(tl: &Timeline, name: SampleName, pan: f32) {
    tl.emit(Sound::Sample {
        name,
        amp: 1.0,
        pan,
    });
}

pub(crate) fn play(tl: &Timeline, synth: SynthName, note: Note, opts: NoteOpts) {
    let voice = tl.new_voice();
    tl.emit(Sound::Note {
        voice,
        synth,
        note,
        opts,
    });
}

/// One tick per year, alternating left and right, starting at `Go`. Opens `End` once done.
pub fn ticks(tl: &Timeline, age: u32, drone: &StopFlag) -> anyhow::Result<()> {
    let pairs = age / 2;
    let stop_drone_with_remaining = pairs.min(DRONE_STOP_LEAD_PAIRS);
    tl.wait(Latch::Go)?;
    for k in 0..pairs {
        let remaining = pairs - k;
        sample(tl, SampleName::ElecTick, -TICK_PAN);
        tl.sleep(Beats(1.0));
        sample(tl, SampleName::ElecTick, TICK_PAN);
        tl.sleep(Beats(1.0));
        if remaining == stop_drone_with_remaining {
            log::debug!("stopping the drone at {}", tl.now());
            drone.stop();
        }
    }
    if age % 2 == 1 {
        sample(tl, SampleName::ElecTick, -TICK_PAN);
        tl.sleep(Beats(1.0));
    }
    // lives too short to reach the stop point inside the loop
    drone.stop();
    tl.open(Latch::End);
    Ok(())
}

/// Starts a new rising voice on every `NewOctave` cue until `drone` is stopped.
pub fn shepard_tone(tl: &Timeline, drone: StopFlag) -> anyhow::Result<()> {
    for _ in 0..DRONE_MAX_VOICES {
        if drone.is_stopped() {
            break;
        }
        tl.sync(Cue::NewOctave)?;
        let voice_drone = drone.clone();
        tl.spawn(Part::ShepardTone, move |tl| {
            shepard_voice(tl, &voice_drone);
            Ok(())
        })?;
        tl.sleep(DRONE_OCTAVE_BEATS);
    }
    Ok(())
}

fn shepard_voice(tl: &Timeline, drone: &StopFlag) {
    if drone.is_stopped() {
        return;
    }
    let voice = tl.new_voice();
    tl.emit(Sound::Note {
        voice,
        synth: SynthName::Sine,
        note: Note::D_2,
        opts: NoteOpts::default()
            .amp(DRONE_AMP)
            .note_slide(DRONE_OCTAVE_BEATS)
            .envelope(Envelope {
                attack: Beats(4.0),
                decay: Beats::ZERO,
                sustain: Beats(12.0),
                release: Beats(4.0),
            }),
    });
    for note in DRONE_STEPS {
        tl.cue(Cue::NewOctave);
        tl.emit(Sound::Control { voice, note });
        tl.sleep(DRONE_OCTAVE_BEATS);
    }
}

/// Rings `note` at each offset after `Go`. Offsets are absolute so each sleep is the distance from
/// the previous one.
fn bells(
    tl: &Timeline,
    offsets: Option<&[Beats]>,
    note: Note,
    open_after_first: Option<Latch>,
) -> anyhow::Result<()> {
    let Some(offsets) = offsets else {
        return Ok(());
    };
    tl.wait(Latch::Go)?;
    let mut previous = Beats::ZERO;
    for (i, &offset) in offsets.iter().enumerate() {
        tl.sleep(offset - previous);
        previous = offset;
        play(
            tl,
            SynthName::PrettyBell,
            note,
            NoteOpts::default().envelope(Envelope {
                sustain: Beats(1.0),
                ..Default::default()
            }),
        );
        if i == 0 {
            if let Some(latch) = open_after_first {
                tl.open(latch);
            }
        }
    }
    Ok(())
}

/// The first wedding also lets the children in.
pub fn weddings(tl: &Timeline, offsets: Option<&[Beats]>) -> anyhow::Result<()> {
    bells(tl, offsets, WEDDING_BELL, Some(Latch::Children))
}

pub fn divorces(tl: &Timeline, offsets: Option<&[Beats]>) -> anyhow::Result<()> {
    bells(tl, offsets, DIVORCE_BELL, None)
}
