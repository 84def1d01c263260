use rand::prelude::*;
use serde::Serialize;

pub const FIRST_NAMES: [&str; 7] = ["Joe", "Marcus", "Peter", "Mike", "Steve", "Donald", "David"];
pub const LAST_NAMES: [&str; 5] = ["Biden", "Trump", "Peterson", "Stewart", "Merkel"];

const PLACEHOLDER_STATS: [u32; 3] = [0, 1, 2];
const PLACEHOLDER_BORN: &str = "2000/12/15";

/// One synthetic player record. Built per attempt and dropped after its outcome is logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub first: String,
    pub last: String,
    pub goals: Vec<u32>,
    pub assists: Vec<u32>,
    pub gp: Vec<u32>,
    pub born: String,
}

impl Document {
    pub fn new(first: &str, last: &str) -> Self {
        Self {
            first: first.to_string(),
            last: last.to_string(),
            goals: PLACEHOLDER_STATS.to_vec(),
            assists: PLACEHOLDER_STATS.to_vec(),
            gp: PLACEHOLDER_STATS.to_vec(),
            born: PLACEHOLDER_BORN.to_string(),
        }
    }

    pub fn full_name(&self) -> String { format!("{} {}", self.first, self.last) }
}

pub struct DocumentGenerator { rng: StdRng }

impl DocumentGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng: StdRng = match seed { Some(s) => SeedableRng::seed_from_u64(s), None => StdRng::from_entropy() };
        Self { rng }
    }

    pub fn generate(&mut self) -> Document { pick(&mut self.rng) }
}

/// Draws a document from the thread-local rng.
pub fn generate() -> Document { pick(&mut rand::thread_rng()) }

fn pick<R: Rng + ?Sized>(rng: &mut R) -> Document {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    Document::new(first, last)
}
