use lifesong_core::{
    Beats, Chord, Gender, Note, Part, Place, Record, RecordError, SampleName, Score, Sound,
    SynthName, Tempo,
};
use lifesong_score::{compose, timelines::DRONE_STEPS};

fn compose_record(record: Record) -> Score {
    let _ = env_logger::builder().is_test(true).try_init();
    compose(record, Tempo::default()).unwrap()
}

fn beats(xs: &[f64]) -> Option<Vec<Beats>> {
    Some(xs.iter().copied().map(Beats).collect())
}

fn onsets<'a>(events: impl Iterator<Item = &'a lifesong_core::Event>) -> Vec<f64> {
    events.map(|event| event.at.as_f64()).collect()
}

fn notes_played(score: &Score, part: Part) -> Vec<(f64, u8)> {
    score
        .part(part)
        .filter_map(|event| match event.sound {
            Sound::Note { note, .. } => Some((event.at.as_f64(), note.to_midi_index())),
            _ => None,
        })
        .collect()
}

fn pans(score: &Score, name: SampleName) -> Vec<f32> {
    score
        .samples(name)
        .filter_map(|event| match event.sound {
            Sound::Sample { pan, .. } => Some(pan),
            _ => None,
        })
        .collect()
}

fn place(longitude: u8, latitude: u8) -> Option<Place> {
    Some(Place {
        longitude: Note::from_midi_index(longitude).unwrap(),
        latitude: Note::from_midi_index(latitude).unwrap(),
    })
}

#[test]
fn short_life_with_birth_place() {
    // a ten year old boy whose birth place arrived as the notes 2 and 48
    let score = compose_record(Record {
        age: 10,
        gender: Some(Gender::Male),
        birth: place(2, 48),
        ..Default::default()
    });

    let chords = score.chords().map(|(at, c)| (at.as_f64(), c)).collect::<Vec<_>>();
    assert_eq!(
        chords,
        [
            (1.0, Chord::major(Note::D_4)),
            (26.0, Chord::sus4_seventh(Note::D_4)),
        ]
    );
    assert_eq!(onsets(score.samples(SampleName::DrumHeavyKick)), [4.0]);
    assert_eq!(onsets(score.samples(SampleName::DrumCymbalClosed)), [5.0]);
    assert_eq!(onsets(score.samples(SampleName::AmbiSwoosh)), [6.0]);
    assert_eq!(notes_played(&score, Part::Main), [(11.0, 2), (13.0, 48)]);

    let ticks = onsets(score.samples(SampleName::ElecTick));
    assert_eq!(ticks, (15..25).map(f64::from).collect::<Vec<_>>());
    let tick_pans = pans(&score, SampleName::ElecTick);
    assert_eq!(tick_pans.iter().filter(|&&pan| pan < 0.0).count(), 5);
    assert_eq!(tick_pans.iter().filter(|&&pan| pan > 0.0).count(), 5);

    // one drone voice, stopped before the second could start
    assert_eq!(notes_played(&score, Part::ShepardTone), [(15.0, 38)]);
    let controls = score
        .part(Part::ShepardTone)
        .filter_map(|event| match event.sound {
            Sound::Control { note, .. } => Some((event.at.as_f64(), note)),
            _ => None,
        })
        .collect::<Vec<_>>();
    let expected = [15.0, 20.0, 25.0, 30.0]
        .into_iter()
        .zip(DRONE_STEPS)
        .collect::<Vec<_>>();
    assert_eq!(controls, expected);

    assert_eq!(score.synth_notes(SynthName::PrettyBell).count(), 0);
    assert_eq!(score.part(Part::Weddings).count(), 0);
}

#[test]
fn one_tick_per_year() {
    for age in 0..30 {
        let score = compose_record(Record {
            age,
            ..Default::default()
        });
        let ticks = onsets(score.samples(SampleName::ElecTick));
        assert_eq!(ticks.len(), age as usize, "age {}", age);
        // without gender or birth the life starts straight after the opening chord
        let expected = (0..age).map(|i| f64::from(4 + i)).collect::<Vec<_>>();
        assert_eq!(ticks, expected);
        let pans = pans(&score, SampleName::ElecTick);
        assert!(pans.iter().step_by(2).all(|&pan| pan < 0.0));
        assert!(pans.iter().skip(1).step_by(2).all(|&pan| pan > 0.0));
        // main rests for four beats after go before it waits for the end
        let closing = score.chords().last().unwrap();
        assert_eq!(closing.0.as_f64(), f64::from((4 + age).max(8) + 1));
    }
}

#[test]
fn long_life_stops_the_drone_before_the_end() {
    let age = 80;
    let score = compose_record(Record {
        age,
        ..Default::default()
    });
    let starts = onsets(score.synth_notes(SynthName::Sine));
    assert!(starts.len() > 1);
    // ticks run from 4 to 84 and the drone stops with ten pairs to go, after the tick on 65
    assert_eq!(starts.first(), Some(&4.0));
    assert_eq!(starts.last(), Some(&64.0));
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], 5.0);
    }
    // every voice finishes its climb
    let controls = score
        .part(Part::ShepardTone)
        .filter(|event| matches!(event.sound, Sound::Control { .. }))
        .count();
    assert_eq!(controls, starts.len() * DRONE_STEPS.len());
}

#[test]
fn bells_ring_at_their_offsets() {
    let score = compose_record(Record {
        age: 20,
        weddings: beats(&[3.0, 7.0, 12.0]),
        divorces: beats(&[5.0]),
        ..Default::default()
    });
    assert_eq!(
        notes_played(&score, Part::Weddings),
        [(7.0, 86), (11.0, 86), (16.0, 86)]
    );
    assert_eq!(notes_played(&score, Part::Divorces), [(9.0, 74)]);
}

#[test]
fn children_wait_for_the_first_wedding() {
    let children = lifesong_core::major_seventh_arpeggio(Note::G_4, 3);
    let score = compose_record(Record {
        age: 40,
        weddings: beats(&[25.0]),
        children: Some(children.clone()),
        ..Default::default()
    });
    // go on 4, wedding on 29, then one beat of rest
    let expected = children
        .iter()
        .enumerate()
        .map(|(i, note)| (30.0 + i as f64, note.to_midi_index()))
        .collect::<Vec<_>>();
    assert_eq!(notes_played(&score, Part::Main), expected);
}

#[test]
fn children_without_weddings_follow_go() {
    let score = compose_record(Record {
        age: 10,
        children: Some(vec![Note::G_4]),
        ..Default::default()
    });
    assert_eq!(notes_played(&score, Part::Main), [(9.0, 67)]);
}

#[test]
fn death_closes_in_minor_and_announces_the_place() {
    let score = compose_record(Record {
        age: 4,
        death: place(50, 60),
        ..Default::default()
    });
    let closing = score.chords().last().unwrap();
    assert_eq!(closing, (Beats(9.0), Chord::minor(Note::D_4)));
    assert_eq!(onsets(score.samples(SampleName::AmbiSwoosh)), [12.0]);
    assert_eq!(pans(&score, SampleName::AmbiSwoosh), [1.0]);
    assert_eq!(notes_played(&score, Part::Main), [(17.0, 50), (19.0, 60)]);
}

#[test]
fn drums_follow_gender() {
    let drums = |gender| {
        let score = compose_record(Record {
            gender,
            ..Default::default()
        });
        score
            .part(Part::Main)
            .filter_map(|event| match event.sound {
                Sound::Sample { name, .. } => Some(name),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(
        drums(Some(Gender::Male)),
        [SampleName::DrumHeavyKick, SampleName::DrumCymbalClosed]
    );
    assert_eq!(
        drums(Some(Gender::Female)),
        [SampleName::DrumHeavyKick, SampleName::DrumHeavyKick]
    );
    assert!(drums(None).is_empty());
}

#[test]
fn decreasing_offsets_are_rejected_before_composing() {
    let result = compose(
        Record {
            age: 10,
            weddings: beats(&[8.0, 2.0]),
            ..Default::default()
        },
        Tempo::default(),
    );
    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<RecordError>(),
        Some(RecordError::Decreasing { index: 1, .. })
    ));
}
