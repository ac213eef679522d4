use crate::consts::{DEFAULT_PIN_MAX_ATTEMPTS, PIN_DIGITS, PIN_SPACE};
use crate::error::AppError;

use rand::{rng, Rng};
use std::collections::HashSet;
use std::iter;
use tracing::{debug, trace};

/// Source of random fractional values in `[0, 1)`.
///
/// Swapped for a fixed sequence in tests.
pub trait RandSource: Send + Sync {
    fn fraction(&self) -> f64;
}

/// Draws from the thread-local RNG on every call.
#[derive(Default, Clone, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn fraction(&self) -> f64 {
        rng().random()
    }
}

/// Take the first `PIN_DIGITS` digits after the decimal point of `fraction`.  Short renderings are
/// padded with trailing zeros, so `0.5` becomes `5000` and `0.00099` becomes `0009`.
pub fn pin_from_fraction(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.fract().abs()
    } else {
        0.0
    };
    let rendered = fraction.to_string();
    let decimals = rendered.split_once('.').map_or("", |(_, d)| d);
    decimals
        .chars()
        .chain(iter::repeat('0'))
        .take(PIN_DIGITS)
        .collect()
}

pub struct PinGenerator {
    source: Box<dyn RandSource>,
    max_attempts: usize,
}

impl PinGenerator {
    pub fn new(source: Box<dyn RandSource>, max_attempts: usize) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Produce a pin not contained in `existing_pins`.
    pub fn generate(&self, existing_pins: &HashSet<String>) -> Result<String, AppError> {
        let taken = existing_pins
            .iter()
            .filter(|p| p.len() == PIN_DIGITS && p.bytes().all(|b| b.is_ascii_digit()))
            .count();
        if taken >= PIN_SPACE {
            return Err(AppError::PinSpaceExhausted { attempts: 0 });
        }

        for attempt in 1..=self.max_attempts {
            let pin = pin_from_fraction(self.source.fraction());
            if !existing_pins.contains(&pin) {
                debug!(attempt, "generated pin");
                return Ok(pin);
            }
            trace!(attempt, "pin collision, retrying");
        }

        Err(AppError::PinSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for PinGenerator {
    fn default() -> Self {
        Self::new(Box::new(ThreadRandom), DEFAULT_PIN_MAX_ATTEMPTS)
    }
}
