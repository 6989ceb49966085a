use lifesong_core::{Channel, Stereo, StereoPair};
use std::f32::consts::FRAC_PI_4;

/// Equal power gains for `pan` in -1 (left) ..= 1 (right). Out of range values are clamped.
pub fn gains(pan: f32) -> StereoPair<f32> {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    Stereo::new(angle.cos(), angle.sin())
}

pub fn gain(pan: f32, channel: Channel) -> f32 {
    *gains(pan).get(channel)
}
