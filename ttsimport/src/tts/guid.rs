use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const GUID_LENGTH: usize = 6;
const GUID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Hands out six-character GUIDs, never the same one twice.
pub struct GuidGenerator<R = StdRng> {
    rng: R,
    issued: HashSet<String>,
}

impl GuidGenerator<StdRng> {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for GuidGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> GuidGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    pub fn next_guid(&mut self) -> String {
        loop {
            let guid: String = (0..GUID_LENGTH)
                .map(|_| GUID_ALPHABET[self.rng.gen_range(0..GUID_ALPHABET.len())] as char)
                .collect();
            if self.issued.insert(guid.clone()) {
                return guid;
            }
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}
