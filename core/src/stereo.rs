#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    /// In the order they are interleaved.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stereo<L, R> {
    pub left: L,
    pub right: R,
}

pub type StereoPair<T> = Stereo<T, T>;

impl<L, R> Stereo<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<T> StereoPair<T> {
    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    pub fn map<U, F>(self, mut f: F) -> StereoPair<U>
    where
        F: FnMut(T) -> U,
    {
        Stereo {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

/// A rendered piece of audio, one buffer per channel. Both channels always have the same length.
pub type StereoBuffer = StereoPair<Vec<f32>>;

impl StereoBuffer {
    pub fn silent(num_frames: usize) -> Self {
        Stereo::new(vec![0.0; num_frames], vec![0.0; num_frames])
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Pads both channels with silence up to `num_frames`. Never shortens.
    pub fn extend_to(&mut self, num_frames: usize) {
        if self.len() < num_frames {
            self.left.resize(num_frames, 0.0);
            self.right.resize(num_frames, 0.0);
        }
    }

    /// Mixes a mono sound in from frame `start` with a separate gain per channel.
    pub fn add_mono(&mut self, start: usize, mono: &[f32], gains: StereoPair<f32>) {
        self.extend_to(start + mono.len());
        for (channel, gain) in [(&mut self.left, gains.left), (&mut self.right, gains.right)] {
            for (out, &x) in channel[start..].iter_mut().zip(mono) {
                *out += x * gain;
            }
        }
    }

    /// Silence past the end.
    pub fn frame(&self, index: usize) -> StereoPair<f32> {
        Stereo::new(
            self.left.get(index).copied().unwrap_or(0.0),
            self.right.get(index).copied().unwrap_or(0.0),
        )
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0, |peak, x| peak.max(x.abs()))
    }

    pub fn scale(&mut self, factor: f32) {
        for x in self.left.iter_mut().chain(self.right.iter_mut()) {
            *x *= factor;
        }
    }
}
