use async_trait::async_trait;
use rowforge_core::TypeTag;

use crate::errors::{ExecutorError, FillError};
use crate::value::Value;

/// One insert parameter slot: column name plus its abstract type, so an
/// executor can bind typed NULLs.
#[derive(Debug, Clone)]
pub struct InsertColumn {
    pub name: String,
    pub type_tag: TypeTag,
}

/// A fully rendered insert statement for one table: parameters in column
/// declaration order, one per non-skipped column.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: String,
    pub sql: String,
    pub columns: Vec<InsertColumn>,
}

/// Opaque token for a prepared statement, issued by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub u64);

/// External SQL execution seam.
///
/// Implementations own their connection and statement cache. `execute_batch`
/// receives fully bound rows; nothing here retries, rolls back, or inspects
/// the statement beyond running it.
#[async_trait]
pub trait SqlExecutor: Send {
    async fn prepare(&mut self, statement: &InsertStatement)
    -> Result<StatementHandle, ExecutorError>;

    async fn execute_batch(
        &mut self,
        handle: StatementHandle,
        rows: &[Vec<Value>],
    ) -> Result<u64, ExecutorError>;
}

/// Totals for one table's fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStats {
    pub rows: u64,
    pub flushes: u64,
}

/// Buffers bound rows and flushes them at fixed batch boundaries.
///
/// A flush failure aborts the table's fill with the failed row range;
/// batches flushed earlier stay in place. Flush is the only await point,
/// so cancelling a fill between flushes never leaves a batch half-sent.
pub struct BatchExecutor<'a, E: SqlExecutor + ?Sized> {
    executor: &'a mut E,
    statement: InsertStatement,
    handle: StatementHandle,
    capacity: usize,
    buffer: Vec<Vec<Value>>,
    flushed_rows: u64,
    flushes: u64,
}

impl<'a, E: SqlExecutor + ?Sized> BatchExecutor<'a, E> {
    pub async fn prepare(
        executor: &'a mut E,
        statement: InsertStatement,
        capacity: usize,
    ) -> Result<Self, FillError> {
        if capacity == 0 {
            return Err(FillError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        let handle = executor
            .prepare(&statement)
            .await
            .map_err(|source| FillError::BatchExecution {
                table: statement.table.clone(),
                first_row: 0,
                last_row: 0,
                source,
            })?;
        Ok(Self {
            executor,
            statement,
            handle,
            capacity,
            buffer: Vec::with_capacity(capacity),
            flushed_rows: 0,
            flushes: 0,
        })
    }

    pub async fn push(&mut self, row: Vec<Value>) -> Result<(), FillError> {
        self.buffer.push(row);
        if self.buffer.len() == self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), FillError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let first_row = self.flushed_rows;
        let last_row = first_row + self.buffer.len() as u64 - 1;
        match self.executor.execute_batch(self.handle, &self.buffer).await {
            Ok(_) => {
                self.flushed_rows = last_row + 1;
                self.flushes += 1;
                self.buffer.clear();
                Ok(())
            }
            Err(source) => Err(FillError::BatchExecution {
                table: self.statement.table.clone(),
                first_row,
                last_row,
                source,
            }),
        }
    }

    /// Flush any partial batch and return the totals.
    pub async fn finish(mut self) -> Result<BatchStats, FillError> {
        self.flush().await?;
        Ok(BatchStats {
            rows: self.flushed_rows,
            flushes: self.flushes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;

    fn statement() -> InsertStatement {
        InsertStatement {
            table: "orders".to_string(),
            sql: "INSERT INTO orders (id) VALUES ($1)".to_string(),
            columns: vec![InsertColumn {
                name: "id".to_string(),
                type_tag: TypeTag::Integer,
            }],
        }
    }

    #[tokio::test]
    async fn flushes_at_exact_batch_boundaries() {
        let mut executor = RecordingExecutor::default();
        let mut batch = BatchExecutor::prepare(&mut executor, statement(), 128)
            .await
            .unwrap();
        for i in 0..300 {
            batch.push(vec![Value::Int(i)]).await.unwrap();
        }
        let stats = batch.finish().await.unwrap();

        assert_eq!(stats.rows, 300);
        assert_eq!(stats.flushes, 3);
        let sizes: Vec<usize> = executor.batches.iter().map(|batch| batch.len()).collect();
        assert_eq!(sizes, [128, 128, 44]);
    }

    #[tokio::test]
    async fn exact_multiple_leaves_no_partial_batch() {
        let mut executor = RecordingExecutor::default();
        let mut batch = BatchExecutor::prepare(&mut executor, statement(), 50)
            .await
            .unwrap();
        for i in 0..100 {
            batch.push(vec![Value::Int(i)]).await.unwrap();
        }
        let stats = batch.finish().await.unwrap();
        assert_eq!(stats.flushes, 2);
        let sizes: Vec<usize> = executor.batches.iter().map(|batch| batch.len()).collect();
        assert_eq!(sizes, [50, 50]);
    }

    #[tokio::test]
    async fn flush_failure_reports_the_row_range() {
        let mut executor = RecordingExecutor::failing_on(1);
        let mut batch = BatchExecutor::prepare(&mut executor, statement(), 10)
            .await
            .unwrap();
        let mut outcome = Ok(());
        for i in 0..25 {
            outcome = batch.push(vec![Value::Int(i)]).await;
            if outcome.is_err() {
                break;
            }
        }
        let err = outcome.unwrap_err();
        let FillError::BatchExecution {
            table,
            first_row,
            last_row,
            ..
        } = err
        else {
            panic!("expected BatchExecution");
        };
        assert_eq!(table, "orders");
        assert_eq!((first_row, last_row), (10, 19));
        // The first batch stays flushed.
        assert_eq!(executor.batches.len(), 1);
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let mut executor = RecordingExecutor::default();
        let result = BatchExecutor::prepare(&mut executor, statement(), 0).await;
        assert!(matches!(result, Err(FillError::InvalidConfig(_))));
    }
}
