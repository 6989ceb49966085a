pub mod envelope;
pub use envelope::AdsrLinear;
pub mod noise;
pub mod oscillator;
pub use oscillator::{Oscillator, Saw, Sine, Triangle, Waveform};
pub mod pan;
pub mod percussion;
pub mod pitch;
pub use pitch::PitchCurve;
pub mod render;
pub use render::{RenderConfig, render};
pub mod voice;
