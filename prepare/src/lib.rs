pub mod facts;
pub use facts::{Coordinates, Facts, current_year, load_facts};
pub mod mapping;
pub use mapping::{PrepareError, coordinate_note, prepare};
