//! Maps facts onto music: one beat per year, places onto a four octave D major scale, children
//! onto a major seventh arpeggio from G4.
use crate::facts::{Coordinates, Facts};
use lifesong_core::{
    Beats, Gender, Note, Place, Record, major_scale, major_seventh_arpeggio,
};

pub const PLACE_SCALE_ROOT: Note = Note::D_2;
pub const PLACE_SCALE_OCTAVES: usize = 4;
pub const CHILDREN_ROOT: Note = Note::G_4;

const MAX_LONGITUDE: f64 = 180.0;
const MAX_LATITUDE: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrepareError {
    #[error("the life ends in {end_year} which is before the birth year {birth_year}")]
    EndsBeforeBirth { birth_year: i32, end_year: i32 },
    #[error("{year} is too far from the birth year {birth_year}")]
    SpanTooLong { birth_year: i32, year: i32 },
    #[error("marriage year {year} is before the birth year {birth_year}")]
    MarriageBeforeBirth { year: i32, birth_year: i32 },
    #[error("{axis} {degrees} is outside of -{max}..={max} degrees")]
    CoordinateOutOfRange {
        axis: &'static str,
        degrees: f64,
        max: f64,
    },
}

/// Picks the note of `scale` at the same relative position as `degrees` within
/// -`max_degrees`..=`max_degrees`. Degrees are truncated towards zero first.
pub fn coordinate_note(scale: &[Note], degrees: f64, max_degrees: f64) -> Option<Note> {
    let last = scale.len().checked_sub(1)?;
    let scaled = (degrees.trunc() + max_degrees) / (2.0 * max_degrees);
    // the top of the range rounds to one past the last note
    let index = ((scaled * scale.len() as f64).round() as usize).min(last);
    scale.get(index).copied()
}

fn check_degrees(
    axis: &'static str,
    degrees: f64,
    max: f64,
) -> Result<f64, PrepareError> {
    if degrees.is_finite() && (-max..=max).contains(&degrees) {
        Ok(degrees)
    } else {
        Err(PrepareError::CoordinateOutOfRange { axis, degrees, max })
    }
}

fn place(scale: &[Note], coordinates: Coordinates) -> Result<Option<Place>, PrepareError> {
    let longitude = check_degrees("longitude", coordinates.longitude, MAX_LONGITUDE)?;
    let latitude = check_degrees("latitude", coordinates.latitude, MAX_LATITUDE)?;
    Ok(coordinate_note(scale, longitude, MAX_LONGITUDE)
        .zip(coordinate_note(scale, latitude, MAX_LATITUDE))
        .map(|(longitude, latitude)| Place {
            longitude,
            latitude,
        }))
}

fn gender(label: &str) -> Gender {
    if label.eq_ignore_ascii_case("male") {
        Gender::Male
    } else {
        Gender::Female
    }
}

type Offsets = Option<Vec<Beats>>;

/// Whole years from `birth_year` to `year`, or `None` if `year` comes first.
fn years_since(birth_year: i32, year: i32) -> Result<Option<u32>, PrepareError> {
    let years = year
        .checked_sub(birth_year)
        .ok_or(PrepareError::SpanTooLong { birth_year, year })?;
    Ok(u32::try_from(years).ok())
}

/// Sorted marriage years alternate between the start and end of marriages. A lone year is a
/// wedding.
fn marriages(facts: &Facts) -> Result<(Offsets, Offsets), PrepareError> {
    let mut years = facts.marriage_years.clone();
    years.sort_unstable();
    let mut offsets = Vec::with_capacity(years.len());
    for year in years {
        let offset = years_since(facts.birth_year, year)?.ok_or(
            PrepareError::MarriageBeforeBirth {
                year,
                birth_year: facts.birth_year,
            },
        )?;
        offsets.push(Beats(f64::from(offset)));
    }
    let weddings = offsets.iter().copied().step_by(2).collect::<Vec<_>>();
    let divorces = offsets.iter().copied().skip(1).step_by(2).collect::<Vec<_>>();
    let non_empty = |xs: Vec<Beats>| if xs.is_empty() { None } else { Some(xs) };
    Ok((non_empty(weddings), non_empty(divorces)))
}

/// `current_year` stands in for the death year of anyone still alive.
pub fn prepare(facts: &Facts, current_year: i32) -> Result<Record, PrepareError> {
    let end_year = facts.death_year.unwrap_or(current_year);
    let age = years_since(facts.birth_year, end_year)?.ok_or(
        PrepareError::EndsBeforeBirth {
            birth_year: facts.birth_year,
            end_year,
        },
    )?;
    let scale = major_scale(PLACE_SCALE_ROOT, PLACE_SCALE_OCTAVES);
    let birth = match facts.birth_place {
        Some(coordinates) => place(&scale, coordinates)?,
        None => None,
    };
    let death = match facts.death_place {
        Some(coordinates) => place(&scale, coordinates)?,
        None => None,
    };
    let children = if facts.children > 0 {
        let notes = major_seventh_arpeggio(CHILDREN_ROOT, facts.children as usize);
        if notes.len() < facts.children as usize {
            log::warn!(
                "only {} of {} children fit below the top MIDI note",
                notes.len(),
                facts.children
            );
        }
        Some(notes)
    } else {
        None
    };
    let (weddings, divorces) = marriages(facts)?;
    Ok(Record {
        age,
        gender: facts.gender.as_deref().map(gender),
        birth,
        death,
        children,
        weddings,
        divorces,
    })
}
