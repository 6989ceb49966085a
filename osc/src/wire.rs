//! Mapping between OSC messages and the fields of a record. Each field travels in its own message
//! whose address names the field. Fields that don't apply to a person are sent as the string
//! `"None"`.
use lifesong_core::{Beats, Gender, Note, Place, Record};
use rosc::{OscMessage, OscType};
use std::fmt::Display;

/// The absent-sentinel.
pub const SENTINEL: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Beats,
    Gender,
    Birth,
    Death,
    Children,
    Marriage,
    Divorce,
}

impl Field {
    /// In the order a sender transmits them.
    pub const ALL: [Self; 7] = [
        Self::Beats,
        Self::Gender,
        Self::Birth,
        Self::Death,
        Self::Children,
        Self::Marriage,
        Self::Divorce,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beats => "beats",
            Self::Gender => "gender",
            Self::Birth => "birth",
            Self::Death => "death",
            Self::Children => "children",
            Self::Marriage => "marriage",
            Self::Divorce => "divorce",
        }
    }

    pub fn address(self) -> String {
        format!("/{}", self.name())
    }

    /// Matches on the last path segment, so addresses that some servers prefix with the sender
    /// (e.g. "/osc:127.0.0.1:4560/beats") are recognized too.
    pub fn from_address(address: &str) -> Option<Self> {
        let last = address.rsplit('/').next()?;
        Self::ALL.into_iter().find(|field| field.name() == last)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn join(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    #[error("no field has the address {0}")]
    UnknownAddress(String),
    #[error("{field} expects {expected} but received {received}")]
    UnexpectedArgs {
        field: Field,
        expected: &'static str,
        received: String,
    },
    #[error("{field} value {value} is out of range")]
    OutOfRange { field: Field, value: f64 },
    #[error("fields never received: {}", join(.0))]
    Missing(Vec<Field>),
}

/// One decoded message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Beats(u32),
    Gender(Option<Gender>),
    Birth(Option<Place>),
    Death(Option<Place>),
    Children(Option<Vec<Note>>),
    Marriage(Option<Vec<Beats>>),
    Divorce(Option<Vec<Beats>>),
}

impl FieldValue {
    pub fn field(&self) -> Field {
        match self {
            Self::Beats(_) => Field::Beats,
            Self::Gender(_) => Field::Gender,
            Self::Birth(_) => Field::Birth,
            Self::Death(_) => Field::Death,
            Self::Children(_) => Field::Children,
            Self::Marriage(_) => Field::Marriage,
            Self::Divorce(_) => Field::Divorce,
        }
    }
}

fn number(arg: &OscType) -> Option<f64> {
    match *arg {
        OscType::Int(x) => Some(f64::from(x)),
        OscType::Long(x) => Some(x as f64),
        OscType::Float(x) => Some(f64::from(x)),
        OscType::Double(x) => Some(x),
        _ => None,
    }
}

fn is_absent(args: &[OscType]) -> bool {
    args.iter()
        .any(|arg| matches!(arg, OscType::String(s) if s == SENTINEL))
}

fn unexpected(field: Field, expected: &'static str, args: &[OscType]) -> WireError {
    WireError::UnexpectedArgs {
        field,
        expected,
        received: format!("{:?}", args),
    }
}

fn numbers(field: Field, args: &[OscType]) -> Result<Vec<f64>, WireError> {
    args.iter()
        .map(|arg| number(arg).ok_or_else(|| unexpected(field, "numbers", args)))
        .collect()
}

fn whole_number(field: Field, args: &[OscType]) -> Result<f64, WireError> {
    match numbers(field, args)?.as_slice() {
        &[value] if value.is_finite() && value.fract() == 0.0 => Ok(value),
        &[value] => Err(WireError::OutOfRange { field, value }),
        _ => Err(unexpected(field, "one whole number", args)),
    }
}

fn note(field: Field, value: f64) -> Result<Note, WireError> {
    Note::from_midi_f64(value).ok_or(WireError::OutOfRange { field, value })
}

fn place(field: Field, args: &[OscType]) -> Result<Option<Place>, WireError> {
    if is_absent(args) {
        return Ok(None);
    }
    match numbers(field, args)?.as_slice() {
        &[longitude, latitude] => Ok(Some(Place {
            longitude: note(field, longitude)?,
            latitude: note(field, latitude)?,
        })),
        _ => Err(unexpected(field, "two notes", args)),
    }
}

fn notes(field: Field, args: &[OscType]) -> Result<Option<Vec<Note>>, WireError> {
    if is_absent(args) || args.is_empty() {
        return Ok(None);
    }
    numbers(field, args)?
        .into_iter()
        .map(|value| note(field, value))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn offsets(field: Field, args: &[OscType]) -> Result<Option<Vec<Beats>>, WireError> {
    if is_absent(args) || args.is_empty() {
        return Ok(None);
    }
    numbers(field, args)?
        .into_iter()
        .map(|value| {
            if value.is_finite() {
                Ok(Beats(value))
            } else {
                Err(WireError::OutOfRange { field, value })
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn decode_field(message: &OscMessage) -> Result<FieldValue, WireError> {
    let field = Field::from_address(&message.addr)
        .ok_or_else(|| WireError::UnknownAddress(message.addr.clone()))?;
    let args = message.args.as_slice();
    let value = match field {
        Field::Beats => {
            let value = whole_number(field, args)?;
            if !(0.0..=f64::from(u32::MAX)).contains(&value) {
                return Err(WireError::OutOfRange { field, value });
            }
            FieldValue::Beats(value as u32)
        }
        Field::Gender => {
            if is_absent(args) {
                FieldValue::Gender(None)
            } else {
                let value = whole_number(field, args)?;
                let gender = Gender::from_code(value as i64)
                    .ok_or(WireError::OutOfRange { field, value })?;
                FieldValue::Gender(Some(gender))
            }
        }
        Field::Birth => FieldValue::Birth(place(field, args)?),
        Field::Death => FieldValue::Death(place(field, args)?),
        Field::Children => FieldValue::Children(notes(field, args)?),
        Field::Marriage => FieldValue::Marriage(offsets(field, args)?),
        Field::Divorce => FieldValue::Divorce(offsets(field, args)?),
    };
    Ok(value)
}

fn absent() -> Vec<OscType> {
    vec![OscType::String(SENTINEL.to_string())]
}

fn note_arg(note: Note) -> OscType {
    OscType::Int(i32::from(note.to_midi_index()))
}

/// Whole beats go out as integers like any other count.
fn beats_arg(beats: Beats) -> OscType {
    let value = beats.as_f64();
    if value.fract() == 0.0 && (0.0..=f64::from(i32::MAX)).contains(&value) {
        OscType::Int(value as i32)
    } else {
        OscType::Float(value as f32)
    }
}

fn place_args(place: Option<Place>) -> Vec<OscType> {
    match place {
        Some(Place {
            longitude,
            latitude,
        }) => vec![note_arg(longitude), note_arg(latitude)],
        None => absent(),
    }
}

fn sequence_args<T: Copy>(xs: Option<&[T]>, f: impl Fn(T) -> OscType) -> Vec<OscType> {
    match xs {
        Some(xs) if !xs.is_empty() => xs.iter().copied().map(f).collect(),
        _ => absent(),
    }
}

/// One message per field, in the order of `Field::ALL`.
pub fn encode_record(record: &Record) -> Vec<OscMessage> {
    Field::ALL
        .into_iter()
        .map(|field| {
            let args = match field {
                Field::Beats => vec![
                    i32::try_from(record.age)
                        .map(OscType::Int)
                        .unwrap_or(OscType::Long(i64::from(record.age))),
                ],
                Field::Gender => match record.gender {
                    Some(gender) => vec![OscType::Int(i32::from(gender.code()))],
                    None => absent(),
                },
                Field::Birth => place_args(record.birth),
                Field::Death => place_args(record.death),
                Field::Children => sequence_args(record.children.as_deref(), note_arg),
                Field::Marriage => sequence_args(record.weddings.as_deref(), beats_arg),
                Field::Divorce => sequence_args(record.divorces.as_deref(), beats_arg),
            };
            OscMessage {
                addr: field.address(),
                args,
            }
        })
        .collect()
}

/// Collects decoded fields until every one of them has arrived. A field that arrives twice
/// replaces the earlier value.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    age: Option<u32>,
    gender: Option<Option<Gender>>,
    birth: Option<Option<Place>>,
    death: Option<Option<Place>>,
    children: Option<Option<Vec<Note>>>,
    weddings: Option<Option<Vec<Beats>>>,
    divorces: Option<Option<Vec<Beats>>>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the field had already been set.
    pub fn set(&mut self, value: FieldValue) -> bool {
        fn replace<T>(slot: &mut Option<T>, value: T) -> bool {
            slot.replace(value).is_some()
        }
        match value {
            FieldValue::Beats(x) => replace(&mut self.age, x),
            FieldValue::Gender(x) => replace(&mut self.gender, x),
            FieldValue::Birth(x) => replace(&mut self.birth, x),
            FieldValue::Death(x) => replace(&mut self.death, x),
            FieldValue::Children(x) => replace(&mut self.children, x),
            FieldValue::Marriage(x) => replace(&mut self.weddings, x),
            FieldValue::Divorce(x) => replace(&mut self.divorces, x),
        }
    }

    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| match field {
                Field::Beats => self.age.is_none(),
                Field::Gender => self.gender.is_none(),
                Field::Birth => self.birth.is_none(),
                Field::Death => self.death.is_none(),
                Field::Children => self.children.is_none(),
                Field::Marriage => self.weddings.is_none(),
                Field::Divorce => self.divorces.is_none(),
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn build(self) -> Result<Record, WireError> {
        let missing = self.missing();
        match self {
            Self {
                age: Some(age),
                gender: Some(gender),
                birth: Some(birth),
                death: Some(death),
                children: Some(children),
                weddings: Some(weddings),
                divorces: Some(divorces),
            } => Ok(Record {
                age,
                gender,
                birth,
                death,
                children,
                weddings,
                divorces,
            }),
            _ => Err(WireError::Missing(missing)),
        }
    }
}
