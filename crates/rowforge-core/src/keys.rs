use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::schema::Column;

/// A deterministic pseudo-random value stream owned by a key column.
///
/// The stream is seeded from the column's identity hash, so the same column
/// always produces the same value sequence. `reset` rewinds to the initial
/// state; the cursor counts whole values drawn, not raw RNG calls, so a
/// generator may consume any number of calls per value and replay still
/// lines up value-for-value.
///
/// Serializes as its seed alone; a deserialized stream starts rewound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct KeyStream {
    seed: u64,
    rng: ChaCha8Rng,
    cursor: u64,
}

impl KeyStream {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cursor: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn since construction or the last reset.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Rewind to the initial state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.cursor = 0;
    }

    /// Draw one value, advancing the cursor by exactly one.
    pub fn draw<T>(&mut self, produce: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        self.cursor += 1;
        produce(&mut self.rng)
    }
}

impl From<u64> for KeyStream {
    fn from(seed: u64) -> Self {
        KeyStream::new(seed)
    }
}

impl From<KeyStream> for u64 {
    fn from(stream: KeyStream) -> Self {
        stream.seed
    }
}

/// A column participating in a key, with its 1-based position within that
/// key and the seeded stream used to generate its values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyColumn {
    column: Column,
    sequence: u16,
    stream: KeyStream,
}

impl KeyColumn {
    pub fn new(column: Column, sequence: u16) -> Self {
        let stream = KeyStream::new(column.id().seed());
        Self {
            column,
            sequence,
            stream,
        }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn stream(&self) -> &KeyStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut KeyStream {
        &mut self.stream
    }

    /// A fresh rewound copy of the stream, for a second consumer replaying
    /// the same sequence.
    pub fn replay(&self) -> KeyStream {
        KeyStream::new(self.stream.seed())
    }
}

/// Primary key: owning table plus its key columns ordered by sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryKey {
    table: String,
    columns: Vec<KeyColumn>,
}

impl PrimaryKey {
    pub fn new(table: &str, mut columns: Vec<KeyColumn>) -> Self {
        columns.sort_by_key(KeyColumn::sequence);
        Self {
            table: table.to_lowercase(),
            columns,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn column_at(&self, sequence: u16) -> Option<&KeyColumn> {
        self.columns
            .iter()
            .find(|key_column| key_column.sequence() == sequence)
    }
}

/// Foreign key: referencing columns on the child table plus the primary key
/// they reference on the parent. Referencing sequence *i* always pairs with
/// referenced sequence *i*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    columns: Vec<KeyColumn>,
    references: PrimaryKey,
}

impl ForeignKey {
    pub fn new(mut columns: Vec<KeyColumn>, references: PrimaryKey) -> Self {
        columns.sort_by_key(KeyColumn::sequence);
        Self {
            columns,
            references,
        }
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn references(&self) -> &PrimaryKey {
        &self.references
    }

    /// The referenced key column paired with a referencing column.
    pub fn referenced_for(&self, column: &str) -> Option<&KeyColumn> {
        let column = column.to_lowercase();
        let sequence = self
            .columns
            .iter()
            .find(|key_column| key_column.column().name() == column)?
            .sequence();
        self.references.column_at(sequence)
    }
}
