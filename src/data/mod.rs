pub mod frequency;
pub mod store;

pub use frequency::{parse_observations, FrequencyTable, Observation, MAX_MONSTERS_PER_BUCKET};
pub use store::{load_for_estimate, FileFrequencyStore, FrequencySource, MemoryFrequencyStore};
