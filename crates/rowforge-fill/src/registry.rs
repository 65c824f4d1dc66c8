use std::collections::HashMap;

use rowforge_core::{Column, TypeTag};

use crate::errors::FillError;
use crate::generators::{
    BitLayout, BoolGenerator, BoxedGenerator, BytesGenerator, BytesLayout, DateGenerator,
    DateWindow, DecimalGenerator, DecimalLayout, FloatGenerator, FloatRange, InetGenerator,
    IntArrayGenerator, IntGenerator, IntRange, IntervalGenerator, JsonGenerator,
    TextArrayGenerator, TextGenerator, TextLayout, TimeGenerator, TimestampGenerator,
    UuidGenerator, VarbitGenerator, base_date,
};

/// Constructor for a column's generator. Plain function pointers so a
/// resolved mapping can be re-instantiated for stream replay.
pub type GeneratorFactory = fn(&Column) -> Result<BoxedGenerator, FillError>;

/// How a backend numbers insert parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    Dollar,
    Question,
}

/// Backend capability set: a name, a parameter placeholder style, and
/// per-type generator overrides consulted before the base dispatch table.
#[derive(Clone)]
pub struct Dialect {
    name: &'static str,
    placeholders: PlaceholderStyle,
    overrides: HashMap<TypeTag, GeneratorFactory>,
}

impl Dialect {
    pub fn postgres() -> Self {
        let mut overrides: HashMap<TypeTag, GeneratorFactory> = HashMap::new();
        overrides.insert(TypeTag::Array, postgres_array);
        overrides.insert(TypeTag::Other, postgres_other);
        Self {
            name: "postgres",
            placeholders: PlaceholderStyle::Dollar,
            overrides,
        }
    }

    pub fn cockroach() -> Self {
        let mut overrides: HashMap<TypeTag, GeneratorFactory> = HashMap::new();
        overrides.insert(TypeTag::Array, postgres_array);
        overrides.insert(TypeTag::Other, postgres_other);
        // unique_rowid-scale surrogate values.
        overrides.insert(TypeTag::BigInt, cockroach_big_int);
        Self {
            name: "cockroach",
            placeholders: PlaceholderStyle::Dollar,
            overrides,
        }
    }

    pub fn mysql() -> Self {
        let mut overrides: HashMap<TypeTag, GeneratorFactory> = HashMap::new();
        // tinyint(1) semantics: 0/1 instead of true/false literals.
        overrides.insert(TypeTag::Boolean, mysql_boolean);
        overrides.insert(TypeTag::Other, mysql_other);
        Self {
            name: "mysql",
            placeholders: PlaceholderStyle::Question,
            overrides,
        }
    }

    pub fn by_name(name: &str) -> Result<Self, FillError> {
        match name.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::postgres()),
            "cockroach" | "cockroachdb" => Ok(Self::cockroach()),
            "mysql" | "mariadb" => Ok(Self::mysql()),
            other => Err(FillError::InvalidConfig(format!(
                "unknown dialect '{other}'"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Replace or add one type's generator construction without touching
    /// the base dispatch table.
    pub fn with_override(mut self, tag: TypeTag, factory: GeneratorFactory) -> Self {
        self.overrides.insert(tag, factory);
        self
    }

    pub fn override_for(&self, tag: TypeTag) -> Option<GeneratorFactory> {
        self.overrides.get(&tag).copied()
    }

    /// Parameter placeholder for a 1-based index.
    pub fn placeholder(&self, index: usize) -> String {
        match self.placeholders {
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::Question => "?".to_string(),
        }
    }
}

impl std::fmt::Debug for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialect").field("name", &self.name).finish()
    }
}

/// Base type-to-generator dispatch table, shared by every dialect.
pub struct GeneratorRegistry {
    defaults: HashMap<TypeTag, GeneratorFactory>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        let mut defaults: HashMap<TypeTag, GeneratorFactory> = HashMap::new();
        defaults.insert(TypeTag::SmallInt, small_int);
        defaults.insert(TypeTag::Integer, integer);
        defaults.insert(TypeTag::BigInt, big_int);
        defaults.insert(TypeTag::Real, real);
        defaults.insert(TypeTag::Double, double);
        defaults.insert(TypeTag::Decimal, decimal);
        defaults.insert(TypeTag::Char, fixed_char);
        defaults.insert(TypeTag::VarChar, var_char);
        defaults.insert(TypeTag::Text, text);
        defaults.insert(TypeTag::Binary, binary);
        defaults.insert(TypeTag::VarBinary, binary);
        defaults.insert(TypeTag::Date, date);
        defaults.insert(TypeTag::Time, time);
        defaults.insert(TypeTag::Timestamp, timestamp);
        defaults.insert(TypeTag::TimestampTz, timestamp_tz);
        defaults.insert(TypeTag::Boolean, boolean);
        defaults.insert(TypeTag::Blob, binary);
        defaults.insert(TypeTag::Clob, text);
        defaults.insert(TypeTag::Struct, composite);
        // Array and Other are dialect buckets; the base table has no safe
        // default for them.
        Self { defaults }
    }

    /// Resolve the construction function for a column: dialect override
    /// first, then the base table.
    pub fn factory_for(
        &self,
        column: &Column,
        dialect: &Dialect,
    ) -> Result<GeneratorFactory, FillError> {
        if let Some(factory) = dialect.override_for(column.type_tag) {
            return Ok(factory);
        }
        self.defaults
            .get(&column.type_tag)
            .copied()
            .ok_or_else(|| unsupported(column))
    }

    /// Construct a generator for a column under a dialect.
    pub fn resolve(
        &self,
        column: &Column,
        dialect: &Dialect,
    ) -> Result<BoxedGenerator, FillError> {
        self.factory_for(column, dialect)?(column)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(column: &Column) -> FillError {
    FillError::UnsupportedType {
        column: column.id().to_string(),
        type_name: column.type_name.clone(),
    }
}

fn small_int(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(IntGenerator::new(IntRange { min: 1, max: 9_999 })))
}

fn integer(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(IntGenerator::new(IntRange {
        min: 1,
        max: 100_000,
    })))
}

fn big_int(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(IntGenerator::new(IntRange {
        min: 1,
        max: 1_000_000,
    })))
}

fn cockroach_big_int(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(IntGenerator::new(IntRange {
        min: 1,
        max: 1 << 40,
    })))
}

fn real(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(FloatGenerator::new(FloatRange {
        min: 0.0,
        max: 10_000.0,
    })))
}

fn double(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(FloatGenerator::new(FloatRange {
        min: 0.0,
        max: 100_000.0,
    })))
}

/// Declared precision is clamped to 25 total digits to keep literals
/// short; declared scale is honored exactly.
pub const MAX_DECIMAL_PRECISION: u32 = 25;

fn decimal(column: &Column) -> Result<BoxedGenerator, FillError> {
    let precision = column
        .max_size
        .unwrap_or(18)
        .clamp(1, MAX_DECIMAL_PRECISION);
    let scale = column.max_digits.unwrap_or(0).min(precision as u16);
    let whole_digits = (precision - scale as u32).max(1);
    Ok(Box::new(DecimalGenerator::new(DecimalLayout {
        whole_digits,
        scale,
    })))
}

fn fixed_char(column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TextGenerator::new(TextLayout {
        max_len: column.max_size.unwrap_or(1),
        exact: true,
    })))
}

fn var_char(column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TextGenerator::new(TextLayout {
        max_len: column.max_size.unwrap_or(24),
        exact: false,
    })))
}

fn text(column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TextGenerator::new(TextLayout {
        max_len: column.max_size.unwrap_or(24),
        exact: false,
    })))
}

fn binary(column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(BytesGenerator::new(BytesLayout {
        max_len: column.max_size.unwrap_or(16),
    })))
}

fn date(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(DateGenerator::new(DateWindow {
        base: base_date(),
        span_days: 365,
    })))
}

fn time(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TimeGenerator))
}

fn timestamp(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TimestampGenerator::new(
        DateWindow {
            base: base_date(),
            span_days: 365,
        },
        false,
    )))
}

fn timestamp_tz(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(TimestampGenerator::new(
        DateWindow {
            base: base_date(),
            span_days: 365,
        },
        true,
    )))
}

fn boolean(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(BoolGenerator))
}

fn composite(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(JsonGenerator))
}

fn mysql_boolean(_column: &Column) -> Result<BoxedGenerator, FillError> {
    Ok(Box::new(IntGenerator::new(IntRange { min: 0, max: 1 })))
}

fn postgres_array(column: &Column) -> Result<BoxedGenerator, FillError> {
    match column.type_name.to_lowercase().as_str() {
        "_text" => Ok(Box::new(TextArrayGenerator)),
        "_int4" | "_int8" => Ok(Box::new(IntArrayGenerator)),
        _ => Err(unsupported(column)),
    }
}

fn postgres_other(column: &Column) -> Result<BoxedGenerator, FillError> {
    match column.type_name.to_lowercase().as_str() {
        "uuid" => Ok(Box::new(UuidGenerator)),
        "inet" => Ok(Box::new(InetGenerator)),
        "interval" => Ok(Box::new(IntervalGenerator)),
        "jsonb" | "json" => Ok(Box::new(JsonGenerator)),
        "varbit" | "bit varying" => Ok(Box::new(VarbitGenerator::new(BitLayout {
            max_bits: column.max_size.unwrap_or(16),
        }))),
        _ => Err(unsupported(column)),
    }
}

fn mysql_other(column: &Column) -> Result<BoxedGenerator, FillError> {
    match column.type_name.to_lowercase().as_str() {
        "json" => Ok(Box::new(JsonGenerator)),
        "year" => Ok(Box::new(IntGenerator::new(IntRange {
            min: 1970,
            max: 2055,
        }))),
        _ => Err(unsupported(column)),
    }
}
