//! Named override generators for benchmark-shaped fixtures.
//!
//! These back the `fixture` override kind in fill configs. The TPC-C style
//! generators reproduce the classic skewed distributions; the person and
//! address ones lean on `fake` for plausible-looking text.

use fake::Fake;
use fake::faker::address::en::CityName;
use fake::faker::name::en::FirstName;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::errors::FillError;
use crate::generators::{BoxedGenerator, ValueGenerator};
use crate::value::Value;

/// All registered fixture ids.
pub fn ids() -> &'static [&'static str] {
    &[
        "tpcc.last_name",
        "tpcc.credit",
        "tpcc.zip",
        "person.first_name",
        "address.city",
        "flag.yn",
    ]
}

/// Look up a fixture generator by id.
pub fn generator(id: &str) -> Result<BoxedGenerator, FillError> {
    match id {
        "tpcc.last_name" => Ok(Box::new(LastNameGenerator)),
        "tpcc.credit" => Ok(Box::new(CreditGenerator)),
        "tpcc.zip" => Ok(Box::new(ZipGenerator)),
        "person.first_name" => Ok(Box::new(FirstNameGenerator)),
        "address.city" => Ok(Box::new(CityGenerator)),
        "flag.yn" => Ok(Box::new(YnFlagGenerator)),
        _ => Err(FillError::UnknownGenerator { id: id.to_string() }),
    }
}

const LAST_NAME_SYLLABLES: [&str; 10] = [
    "BAR", "OUGHT", "ABLE", "PRI", "PRES", "ESE", "ANTI", "CALLY", "ATION", "EING",
];

/// Three-syllable surname keyed by a number in 0..=999, so the value space
/// is exactly 1000 names with the benchmark's repetition pattern.
struct LastNameGenerator;

impl ValueGenerator for LastNameGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let key: usize = rng.random_range(0..1000);
        let name = format!(
            "{}{}{}",
            LAST_NAME_SYLLABLES[key / 100],
            LAST_NAME_SYLLABLES[(key / 10) % 10],
            LAST_NAME_SYLLABLES[key % 10],
        );
        Value::Text(name)
    }
}

/// 90% good credit, 10% bad.
struct CreditGenerator;

impl ValueGenerator for CreditGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let flag = if rng.random_range(0..10) < 9 { "GC" } else { "BC" };
        Value::Text(flag.to_string())
    }
}

/// Four random digits followed by the constant suffix.
struct ZipGenerator;

impl ValueGenerator for ZipGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let prefix: u32 = rng.random_range(0..10_000);
        Value::Text(format!("{prefix:04}11111"))
    }
}

struct FirstNameGenerator;

impl ValueGenerator for FirstNameGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let name: String = FirstName().fake_with_rng(rng);
        Value::Text(name)
    }
}

struct CityGenerator;

impl ValueGenerator for CityGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let city: String = CityName().fake_with_rng(rng);
        Value::Text(city)
    }
}

struct YnFlagGenerator;

impl ValueGenerator for YnFlagGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let flag = if rng.random_bool(0.5) { "Y" } else { "N" };
        Value::Text(flag.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn every_registered_id_resolves() {
        for id in ids() {
            assert!(generator(id).is_ok(), "fixture '{id}' did not resolve");
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        let err = generator("tpcc.bogus").unwrap_err();
        assert!(matches!(err, FillError::UnknownGenerator { ref id } if id == "tpcc.bogus"));
    }

    #[test]
    fn last_names_use_the_syllable_alphabet() {
        let mut generator = LastNameGenerator;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let Value::Text(name) = generator.generate(&mut rng) else {
                panic!("expected text");
            };
            assert!(name.chars().all(|c| c.is_ascii_uppercase()));
            assert!(name.len() >= 9 && name.len() <= 15, "odd name {name}");
        }
    }

    #[test]
    fn credit_skews_toward_good() {
        let mut generator = CreditGenerator;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let good = (0..1000)
            .filter(|_| generator.generate(&mut rng) == Value::Text("GC".to_string()))
            .count();
        assert!(good > 850 && good < 950, "unexpected skew: {good}");
    }

    #[test]
    fn zip_has_constant_suffix() {
        let mut generator = ZipGenerator;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let Value::Text(zip) = generator.generate(&mut rng) else {
            panic!("expected text");
        };
        assert_eq!(zip.len(), 9);
        assert!(zip.ends_with("11111"));
    }
}
