//! Random noise sources for the lab.

use careersim_logic::experiment::{NoNoise, Noise};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `StdRng`-backed noise. Seeded runs are reproducible.
#[derive(Debug, Clone)]
pub struct RngNoise {
    rng: StdRng,
}

impl RngNoise {
    /// Seeded when `seed` is given, from OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Noise for RngNoise {
    fn sample(&mut self, amplitude: f32) -> f32 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Noise picked at runtime from configuration.
#[derive(Debug, Clone)]
pub enum SessionNoise {
    Off(NoNoise),
    Rng(RngNoise),
}

impl SessionNoise {
    pub fn from_config(enabled: bool, seed: Option<u64>) -> Self {
        if enabled {
            SessionNoise::Rng(RngNoise::new(seed))
        } else {
            SessionNoise::Off(NoNoise)
        }
    }
}

impl Noise for SessionNoise {
    fn sample(&mut self, amplitude: f32) -> f32 {
        match self {
            SessionNoise::Off(n) => n.sample(amplitude),
            SessionNoise::Rng(n) => n.sample(amplitude),
        }
    }
}
