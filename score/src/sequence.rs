use crate::{
    scheduler::{self, Cue, Latch, StopFlag, Timeline},
    timelines::{self, play, sample},
};
use lifesong_core::{
    Beats, Chord, Gender, Note, NoteOpts, Part, Place, Record, SampleName, Score,
    Sound, SynthName, Tempo,
};

/// Birth is heard on the left and death on the right.
const BIRTH_PAN: f32 = -1.0;
const DEATH_PAN: f32 = 1.0;

const CHORD_ROOT: Note = Note::D_4;

fn play_chord(tl: &Timeline, chord: Chord, pan: f32) {
    tl.emit(Sound::Chord {
        synth: SynthName::Beep,
        chord,
        opts: NoteOpts::default().pan(pan),
    });
}

fn drums(tl: &Timeline, gender: Gender) {
    let second = match gender {
        Gender::Male => SampleName::DrumCymbalClosed,
        Gender::Female => SampleName::DrumHeavyKick,
    };
    sample(tl, SampleName::DrumHeavyKick, BIRTH_PAN);
    tl.sleep(Beats(1.0));
    sample(tl, second, BIRTH_PAN);
    tl.sleep(Beats(1.0));
}

/// A swoosh for the edge of the knowledge graph followed by the two pitches of the place.
fn announce_place(tl: &Timeline, place: Place, pan: f32) {
    sample(tl, SampleName::AmbiSwoosh, pan);
    tl.sleep(Beats(5.0));
    play(tl, SynthName::Beep, place.longitude, NoteOpts::default().pan(pan));
    tl.sleep(Beats(2.0));
    play(tl, SynthName::Beep, place.latitude, NoteOpts::default().pan(pan));
}

/// One note per beat, like a plain arpeggio.
fn play_pattern(tl: &Timeline, notes: &[Note]) {
    for &note in notes {
        play(tl, SynthName::Beep, note, NoteOpts::default());
        tl.sleep(Beats(1.0));
    }
}

/// The main timeline. Starts the other parts, introduces the person, lets the life run and
/// closes it.
pub fn main_sequence(tl: &Timeline, record: &Record) -> anyhow::Result<()> {
    let drone = StopFlag::new();
    {
        let age = record.age;
        let drone = drone.clone();
        tl.spawn(Part::Ticks, move |tl| timelines::ticks(tl, age, &drone))?;
    }
    tl.spawn(Part::ShepardTone, move |tl| timelines::shepard_tone(tl, drone))?;
    let weddings = record.weddings.clone();
    tl.spawn(Part::Weddings, move |tl| {
        timelines::weddings(tl, weddings.as_deref())
    })?;
    let divorces = record.divorces.clone();
    tl.spawn(Part::Divorces, move |tl| {
        timelines::divorces(tl, divorces.as_deref())
    })?;

    tl.sleep(Beats(1.0));
    play_chord(tl, Chord::major(CHORD_ROOT), BIRTH_PAN);
    tl.sleep(Beats(3.0));
    if let Some(gender) = record.gender {
        drums(tl, gender);
    }
    if let Some(birth) = record.birth {
        announce_place(tl, birth, BIRTH_PAN);
        tl.sleep(Beats(2.0));
    }

    tl.open(Latch::Go);
    tl.cue(Cue::NewOctave);

    tl.sleep(Beats(4.0));
    if let Some(children) = &record.children {
        // Only the first wedding opens the children latch, so without weddings there is nothing
        // to wait for.
        let has_weddings = record
            .weddings
            .as_ref()
            .is_some_and(|weddings| !weddings.is_empty());
        if has_weddings {
            tl.wait(Latch::Children)?;
        }
        tl.sleep(Beats(1.0));
        play_pattern(tl, children);
    }

    tl.wait(Latch::End)?;
    tl.sleep(Beats(1.0));
    let closing = if record.death.is_some() {
        Chord::minor(CHORD_ROOT)
    } else {
        Chord::sus4_seventh(CHORD_ROOT)
    };
    play_chord(tl, closing, DEATH_PAN);
    if let Some(death) = record.death {
        tl.sleep(Beats(3.0));
        announce_place(tl, death, DEATH_PAN);
    }
    Ok(())
}

/// Runs every part of the piece for `record` and collects what they play.
pub fn compose(record: Record, tempo: Tempo) -> anyhow::Result<Score> {
    record.validate()?;
    log::info!(
        "composing a life of {} beats at {} bpm",
        record.age,
        tempo.bpm()
    );
    let events = scheduler::run(move |tl| main_sequence(tl, &record))?;
    log::info!("composed {} events", events.len());
    Ok(Score { tempo, events })
}
