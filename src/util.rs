const STREAM_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const SEED_SALT: u64 = 0xB0BB_1E5E_ED5A_17ED;

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(STREAM_GAMMA);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Reproducible stream of floats in `[0, 1)` owned by a single item.
///
/// Two streams built from the same `(id, seed)` yield the same sequence, and
/// no state is shared between streams, so draw order elsewhere never leaks in.
#[derive(Clone, Debug)]
pub struct SeededStream {
    state: u64,
}

impl Iterator for SeededStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        Some(self.next_unit())
    }
}

impl SeededStream {
    pub fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_add(STREAM_GAMMA);
        let mixed = splitmix64(self.state);
        let top = mixed >> 40;
        top as f32 / (1u64 << 24) as f32
    }

    /// Uniform sample in `[-1, 1)`.
    pub fn next_signed(&mut self) -> f32 {
        (self.next_unit() * 2.0) - 1.0
    }
}

pub fn stream_for(id: u64, seed: u64) -> SeededStream {
    let seed_mix = splitmix64(seed ^ SEED_SALT);
    SeededStream {
        state: splitmix64(id ^ seed_mix),
    }
}

pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0 h".to_owned();
    }

    if hours < 1.0 {
        format!("{:.0} min", hours * 60.0)
    } else if hours < 100.0 {
        format!("{hours:.1} h")
    } else {
        format!("{hours:.0} h")
    }
}
