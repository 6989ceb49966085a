/// An ADSR envelope where all the slopes are linear. The level rises to 1 during the attack, is
/// held at 1 through decay and sustain, then falls to 0 during the release. All durations are in
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrLinear {
    pub attack_s: f64,
    pub decay_s: f64,
    pub sustain_s: f64,
    pub release_s: f64,
}

impl AdsrLinear {
    pub fn duration_s(&self) -> f64 {
        self.attack_s + self.decay_s + self.sustain_s + self.release_s
    }

    pub fn level(&self, t_s: f64) -> f32 {
        if t_s < 0.0 {
            return 0.0;
        }
        if t_s < self.attack_s {
            return (t_s / self.attack_s) as f32;
        }
        let release_start_s = self.attack_s + self.decay_s + self.sustain_s;
        if t_s < release_start_s {
            return 1.0;
        }
        let into_release_s = t_s - release_start_s;
        if into_release_s < self.release_s {
            (1.0 - (into_release_s / self.release_s)) as f32
        } else {
            0.0
        }
    }
}
