//! Pitch of a voice over time, in (possibly fractional) MIDI note numbers.

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slide {
    at_s: f64,
    from: f64,
    to: f64,
    duration_s: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchCurve {
    start: f64,
    slides: Vec<Slide>,
}

impl PitchCurve {
    pub fn new(start: f64) -> Self {
        Self {
            start,
            slides: Vec::new(),
        }
    }

    /// Glides linearly from wherever the pitch is at `at_s` to `to`. Slides must be added in
    /// chronological order.
    pub fn slide_to(&mut self, at_s: f64, to: f64, duration_s: f64) {
        let from = self.midi_at(at_s);
        self.slides.push(Slide {
            at_s,
            from,
            to,
            duration_s,
        });
    }

    pub fn midi_at(&self, t_s: f64) -> f64 {
        let Some(slide) = self.slides.iter().rev().find(|slide| slide.at_s <= t_s) else {
            return self.start;
        };
        if slide.duration_s <= 0.0 {
            return slide.to;
        }
        let progress_01 = ((t_s - slide.at_s) / slide.duration_s).min(1.0);
        slide.from + ((slide.to - slide.from) * progress_01)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constant_without_slides() {
        let pitch = PitchCurve::new(62.0);
        assert_eq!(pitch.midi_at(0.0), 62.0);
        assert_eq!(pitch.midi_at(100.0), 62.0);
    }

    #[test]
    fn consecutive_slides() {
        let mut pitch = PitchCurve::new(38.0);
        pitch.slide_to(0.0, 50.0, 5.0);
        pitch.slide_to(5.0, 62.0, 5.0);
        assert_eq!(pitch.midi_at(2.5), 44.0);
        assert_eq!(pitch.midi_at(5.0), 50.0);
        assert_eq!(pitch.midi_at(7.5), 56.0);
        assert_eq!(pitch.midi_at(20.0), 62.0);
    }

    #[test]
    fn interrupted_slide_continues_from_the_current_pitch() {
        let mut pitch = PitchCurve::new(0.0);
        pitch.slide_to(0.0, 10.0, 10.0);
        pitch.slide_to(5.0, 0.0, 0.0);
        assert_eq!(pitch.midi_at(4.0), 4.0);
        assert_eq!(pitch.midi_at(5.0), 0.0);
    }
}
