//! Pairing code generation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tvrelay_common::{PairingCode, CODE_ALPHABET, CODE_LENGTH};

/// Produces candidate pairing codes. Uniqueness is the registry's job.
pub trait CodeSource: Send + Sync {
    fn generate(&self) -> PairingCode;
}

/// Uniform random codes from a generator seeded once from OS entropy.
pub struct RandomCodes {
    rng: Mutex<StdRng>,
}

impl RandomCodes {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSource for RandomCodes {
    fn generate(&self) -> PairingCode {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut indices = [0usize; CODE_LENGTH];
        for slot in &mut indices {
            *slot = rng.gen_range(0..CODE_ALPHABET.len());
        }
        PairingCode::from_symbol_indices(indices)
    }
}

/// Replays a fixed list of codes, then keeps repeating the last one.
pub struct ScriptedCodes {
    codes: Vec<PairingCode>,
    next: AtomicUsize,
}

impl ScriptedCodes {
    pub fn new(codes: Vec<PairingCode>) -> Self {
        Self {
            codes,
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeSource for ScriptedCodes {
    fn generate(&self) -> PairingCode {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        match self.codes.get(i).or_else(|| self.codes.last()) {
            Some(code) => code.clone(),
            None => PairingCode::from_symbol_indices([0; CODE_LENGTH]),
        }
    }
}
