use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::value::Value;

/// Anchor date for generated temporal values. Fixed so that runs are
/// reproducible regardless of wall clock.
pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// A value generator for one column.
///
/// Generators may hold state (the sequential generator does); a fill owns
/// one instance per column and drives it row by row.
pub trait ValueGenerator: Send {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value;
}

pub type BoxedGenerator = Box<dyn ValueGenerator>;

impl std::fmt::Debug for dyn ValueGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<dyn ValueGenerator>")
    }
}

/// Inclusive integer range configuration.
#[derive(Debug, Clone, Copy)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

pub struct IntGenerator {
    range: IntRange,
}

impl IntGenerator {
    pub fn new(range: IntRange) -> Self {
        Self { range }
    }
}

impl ValueGenerator for IntGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        Value::Int(rng.random_range(self.range.min..=self.range.max))
    }
}

/// Inclusive float range configuration.
#[derive(Debug, Clone, Copy)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

pub struct FloatGenerator {
    range: FloatRange,
}

impl FloatGenerator {
    pub fn new(range: FloatRange) -> Self {
        Self { range }
    }
}

impl ValueGenerator for FloatGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        Value::Float(rng.random_range(self.range.min..=self.range.max))
    }
}

/// Decimal layout: digits before the point and exact fractional digits.
#[derive(Debug, Clone, Copy)]
pub struct DecimalLayout {
    pub whole_digits: u32,
    pub scale: u16,
}

pub struct DecimalGenerator {
    layout: DecimalLayout,
}

impl DecimalGenerator {
    pub fn new(layout: DecimalLayout) -> Self {
        // Whole part must fit an i64 literal.
        let whole_digits = layout.whole_digits.clamp(1, 15);
        Self {
            layout: DecimalLayout {
                whole_digits,
                scale: layout.scale,
            },
        }
    }
}

impl ValueGenerator for DecimalGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let whole_max = 10_i64.pow(self.layout.whole_digits) - 1;
        let whole = rng.random_range(0..=whole_max);
        if self.layout.scale == 0 {
            return Value::Decimal(whole.to_string());
        }
        let scale = self.layout.scale as u32;
        let frac_max = 10_i64.pow(scale.min(15)) - 1;
        let frac = rng.random_range(0..=frac_max);
        let width = scale as usize;
        Value::Decimal(format!("{whole}.{frac:0width$}"))
    }
}

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_text(rng: &mut ChaCha8Rng, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Text layout: upper length bound and whether the length is exact
/// (fixed-width CHAR columns) or drawn at random.
#[derive(Debug, Clone, Copy)]
pub struct TextLayout {
    pub max_len: u32,
    pub exact: bool,
}

pub struct TextGenerator {
    layout: TextLayout,
}

impl TextGenerator {
    pub fn new(layout: TextLayout) -> Self {
        Self { layout }
    }
}

impl ValueGenerator for TextGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let cap = self.layout.max_len.clamp(1, 24) as usize;
        let len = if self.layout.exact {
            self.layout.max_len.max(1) as usize
        } else {
            rng.random_range(1..=cap)
        };
        Value::Text(random_text(rng, len))
    }
}

/// Byte-string layout for binary columns.
#[derive(Debug, Clone, Copy)]
pub struct BytesLayout {
    pub max_len: u32,
}

pub struct BytesGenerator {
    layout: BytesLayout,
}

impl BytesGenerator {
    pub fn new(layout: BytesLayout) -> Self {
        Self { layout }
    }
}

impl ValueGenerator for BytesGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let cap = self.layout.max_len.clamp(1, 16) as usize;
        let len = rng.random_range(1..=cap);
        let bytes = (0..len).map(|_| rng.random()).collect();
        Value::Bytes(bytes)
    }
}

pub struct BoolGenerator;

impl ValueGenerator for BoolGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        Value::Bool(rng.random_bool(0.5))
    }
}

/// Date window configuration: `span_days` days starting at `base`.
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    pub base: NaiveDate,
    pub span_days: i64,
}

pub struct DateGenerator {
    window: DateWindow,
}

impl DateGenerator {
    pub fn new(window: DateWindow) -> Self {
        Self { window }
    }
}

impl ValueGenerator for DateGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let offset = rng.random_range(0..=self.window.span_days.max(0));
        Value::Date(self.window.base + Duration::days(offset))
    }
}

pub struct TimeGenerator;

impl ValueGenerator for TimeGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let seconds = rng.random_range(0..86_400);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default();
        Value::Time(time)
    }
}

pub struct TimestampGenerator {
    window: DateWindow,
    with_zone: bool,
}

impl TimestampGenerator {
    pub fn new(window: DateWindow, with_zone: bool) -> Self {
        Self { window, with_zone }
    }
}

impl ValueGenerator for TimestampGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let offset = rng.random_range(0..=self.window.span_days.max(0));
        let seconds = rng.random_range(0..86_400);
        let date = self.window.base + Duration::days(offset);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default();
        let stamp = NaiveDateTime::new(date, time);
        if self.with_zone {
            Value::TimestampTz(Utc.from_utc_datetime(&stamp))
        } else {
            Value::Timestamp(stamp)
        }
    }
}

pub struct UuidGenerator;

impl ValueGenerator for UuidGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let mut bytes = [0_u8; 16];
        rng.fill(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Value::Uuid(uuid::Uuid::from_bytes(bytes).to_string())
    }
}

pub struct InetGenerator;

impl ValueGenerator for InetGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let octets: [u8; 3] = [rng.random(), rng.random(), rng.random()];
        Value::Text(format!("10.{}.{}.{}", octets[0], octets[1], octets[2]))
    }
}

pub struct IntervalGenerator;

impl ValueGenerator for IntervalGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let days = rng.random_range(0..365);
        let hours = rng.random_range(0..24);
        Value::Text(format!("{days} days {hours:02}:00:00"))
    }
}

pub struct JsonGenerator;

impl ValueGenerator for JsonGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let key = random_text(rng, 6);
        let number: i64 = rng.random_range(0..100_000);
        Value::Json(serde_json::json!({ "key": key, "value": number }))
    }
}

/// Bit-string layout for VARBIT columns.
#[derive(Debug, Clone, Copy)]
pub struct BitLayout {
    pub max_bits: u32,
}

pub struct VarbitGenerator {
    layout: BitLayout,
}

impl VarbitGenerator {
    pub fn new(layout: BitLayout) -> Self {
        Self { layout }
    }
}

impl ValueGenerator for VarbitGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let cap = self.layout.max_bits.clamp(1, 32) as usize;
        let len = rng.random_range(1..=cap);
        let bits = (0..len)
            .map(|_| if rng.random_bool(0.5) { '1' } else { '0' })
            .collect();
        Value::Text(bits)
    }
}

pub struct TextArrayGenerator;

impl ValueGenerator for TextArrayGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let len = rng.random_range(1..=4);
        let items = (0..len).map(|_| random_text(rng, 8)).collect();
        Value::TextArray(items)
    }
}

pub struct IntArrayGenerator;

impl ValueGenerator for IntArrayGenerator {
    fn generate(&mut self, rng: &mut ChaCha8Rng) -> Value {
        let len = rng.random_range(1..=4);
        let items = (0..len).map(|_| rng.random_range(0..100_000)).collect();
        Value::IntArray(items)
    }
}

/// Sequential surrogate-key configuration.
#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    pub start: i64,
    pub max: i64,
}

/// Monotonic counter owned by one column's fill context. Wraps back to its
/// starting value once `max` has been handed out; never global.
pub struct SequentialGenerator {
    sequence: Sequence,
    next: i64,
}

impl SequentialGenerator {
    pub fn new(sequence: Sequence) -> Self {
        Self {
            sequence,
            next: sequence.start,
        }
    }
}

impl ValueGenerator for SequentialGenerator {
    fn generate(&mut self, _rng: &mut ChaCha8Rng) -> Value {
        let value = self.next;
        self.next = if value >= self.sequence.max {
            self.sequence.start
        } else {
            value + 1
        };
        Value::Int(value)
    }
}

/// Emits the same value for every row.
pub struct FixedGenerator {
    value: Value,
}

impl FixedGenerator {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ValueGenerator for FixedGenerator {
    fn generate(&mut self, _rng: &mut ChaCha8Rng) -> Value {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(99)
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut left_rng = rng();
        let mut right_rng = rng();
        let mut left = IntGenerator::new(IntRange { min: 0, max: 1000 });
        let mut right = IntGenerator::new(IntRange { min: 0, max: 1000 });
        for _ in 0..16 {
            assert_eq!(left.generate(&mut left_rng), right.generate(&mut right_rng));
        }
    }

    #[test]
    fn decimal_honors_scale_exactly() {
        let mut generator = DecimalGenerator::new(DecimalLayout {
            whole_digits: 5,
            scale: 2,
        });
        let mut rng = rng();
        for _ in 0..32 {
            let value = generator.generate(&mut rng);
            let text = value.as_str().unwrap().to_string();
            let (_, frac) = text.split_once('.').unwrap();
            assert_eq!(frac.len(), 2, "unexpected scale in {text}");
        }
    }

    #[test]
    fn text_respects_max_len() {
        let mut generator = TextGenerator::new(TextLayout {
            max_len: 10,
            exact: false,
        });
        let mut rng = rng();
        for _ in 0..32 {
            let value = generator.generate(&mut rng);
            assert!(value.as_str().unwrap().len() <= 10);
        }
    }

    #[test]
    fn fixed_char_emits_exact_width() {
        let mut generator = TextGenerator::new(TextLayout {
            max_len: 9,
            exact: true,
        });
        let mut rng = rng();
        let value = generator.generate(&mut rng);
        assert_eq!(value.as_str().unwrap().len(), 9);
    }

    #[test]
    fn sequential_wraps_to_start() {
        let mut generator = SequentialGenerator::new(Sequence { start: 1, max: 3 });
        let mut rng = rng();
        let drawn: Vec<i64> = (0..5)
            .map(|_| generator.generate(&mut rng).as_i64().unwrap())
            .collect();
        assert_eq!(drawn, [1, 2, 3, 1, 2]);
    }

    #[test]
    fn uuid_sets_version_and_variant_bits() {
        let mut generator = UuidGenerator;
        let mut rng = rng();
        let Value::Uuid(text) = generator.generate(&mut rng) else {
            panic!("expected uuid");
        };
        let parsed = uuid::Uuid::parse_str(&text).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
