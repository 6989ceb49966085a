//! What is known about a person before it is turned into music. Only years are kept from dates.
use anyhow::Context;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A point on the globe in degrees. Longitude grows eastward and latitude northward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Facts {
    pub name: Option<String>,
    pub birth_year: i32,
    /// Missing for people who are still alive.
    pub death_year: Option<i32>,
    pub gender: Option<String>,
    pub birth_place: Option<Coordinates>,
    pub death_place: Option<Coordinates>,
    pub children: u32,
    /// Years in which marriages started or ended, in any order.
    pub marriage_years: Vec<i32>,
}

pub fn load_facts(path: impl AsRef<Path>) -> anyhow::Result<Facts> {
    let path = path.as_ref();
    let json_string = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let facts = serde_json::from_str(json_string.as_str())
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(facts)
}

/// The age of anyone still alive is counted up to this year.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
