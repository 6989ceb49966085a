//! The values describing one person, as received from the data preparation side. Every optional
//! field uses `None` for "not applicable", which the wire format calls the absent-sentinel.
use crate::{music::Note, time::Beats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn code(self) -> u8 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Male),
            1 => Some(Self::Female),
            _ => None,
        }
    }
}

/// A location already mapped to two pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub longitude: Note,
    pub latitude: Note,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Length of the life in beats, one beat per year.
    pub age: u32,
    pub gender: Option<Gender>,
    pub birth: Option<Place>,
    pub death: Option<Place>,
    /// One note per child, played as an arpeggio.
    pub children: Option<Vec<Note>>,
    /// Beats after the start of the life at which each marriage began.
    pub weddings: Option<Vec<Beats>>,
    /// Beats after the start of the life at which each marriage ended.
    pub divorces: Option<Vec<Beats>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("{field} offset {index} is {value} which is not a finite number of beats")]
    NotFinite {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error("{field} offset {index} is negative ({value})")]
    Negative {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error("{field} offset {index} ({value}) comes before the previous offset ({previous})")]
    Decreasing {
        field: &'static str,
        index: usize,
        value: f64,
        previous: f64,
    },
}

fn validate_offsets(field: &'static str, offsets: &[Beats]) -> Result<(), RecordError> {
    let mut previous = Beats::ZERO;
    for (index, &offset) in offsets.iter().enumerate() {
        let value = offset.as_f64();
        if !offset.is_finite() {
            return Err(RecordError::NotFinite {
                field,
                index,
                value,
            });
        }
        if value < 0.0 {
            return Err(RecordError::Negative {
                field,
                index,
                value,
            });
        }
        if offset < previous {
            return Err(RecordError::Decreasing {
                field,
                index,
                value,
                previous: previous.as_f64(),
            });
        }
        previous = offset;
    }
    Ok(())
}

impl Record {
    /// Offsets are turned into sleeps between bells, so they must never go backwards.
    pub fn validate(&self) -> Result<(), RecordError> {
        if let Some(weddings) = &self.weddings {
            validate_offsets("weddings", weddings)?;
        }
        if let Some(divorces) = &self.divorces {
            validate_offsets("divorces", divorces)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn beats(xs: &[f64]) -> Option<Vec<Beats>> {
        Some(xs.iter().copied().map(Beats).collect())
    }

    #[test]
    fn gender_codes() {
        assert_eq!(Gender::from_code(0), Some(Gender::Male));
        assert_eq!(Gender::from_code(1), Some(Gender::Female));
        assert_eq!(Gender::from_code(2), None);
        assert_eq!(Gender::Female.code(), 1);
    }

    #[test]
    fn absent_offsets_are_valid() {
        assert_eq!(Record::default().validate(), Ok(()));
    }

    #[test]
    fn equal_offsets_are_allowed() {
        let record = Record {
            weddings: beats(&[20.0, 20.0, 31.0]),
            ..Default::default()
        };
        assert_eq!(record.validate(), Ok(()));
    }

    #[test]
    fn decreasing_divorces_are_rejected() {
        let record = Record {
            divorces: beats(&[30.0, 12.0]),
            ..Default::default()
        };
        assert_eq!(
            record.validate(),
            Err(RecordError::Decreasing {
                field: "divorces",
                index: 1,
                value: 12.0,
                previous: 30.0,
            })
        );
    }

    #[test]
    fn negative_weddings_are_rejected() {
        let record = Record {
            weddings: beats(&[-1.0]),
            ..Default::default()
        };
        assert!(matches!(
            record.validate(),
            Err(RecordError::Negative { index: 0, .. })
        ));
    }
}
