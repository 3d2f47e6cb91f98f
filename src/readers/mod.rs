pub mod normalizer;
pub mod open_meteo;

pub use normalizer::{Field, HourlyNormalizer, NormalizedBatch, FIELD_ALIASES};
pub use open_meteo::{CityObservations, OpenMeteoReader};
