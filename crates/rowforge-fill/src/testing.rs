//! Test doubles for the SQL execution seam.

use async_trait::async_trait;

use crate::batch::{InsertStatement, SqlExecutor, StatementHandle};
use crate::errors::ExecutorError;
use crate::value::Value;

/// Executor that records every prepared statement and flushed batch.
///
/// `fail_on_flush` makes the nth flush (0-based) fail, for exercising the
/// abort path.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub statements: Vec<InsertStatement>,
    /// One entry per successful flush, in order.
    pub batches: Vec<Vec<Vec<Value>>>,
    /// Handle each flushed batch was executed against.
    pub flush_log: Vec<StatementHandle>,
    pub fail_on_flush: Option<usize>,
    flushes_seen: usize,
}

impl RecordingExecutor {
    /// An executor whose nth flush (0-based) fails.
    pub fn failing_on(flush: usize) -> Self {
        Self {
            fail_on_flush: Some(flush),
            ..Self::default()
        }
    }

    /// Rows flushed for one table, flattened across batches.
    pub fn rows_for(&self, table: &str) -> Vec<&Vec<Value>> {
        let handles: Vec<u64> = self
            .statements
            .iter()
            .enumerate()
            .filter(|(_, statement)| statement.table == table)
            .map(|(index, _)| index as u64)
            .collect();
        self.flush_log
            .iter()
            .zip(&self.batches)
            .filter(|(handle, _)| handles.contains(&handle.0))
            .flat_map(|(_, batch)| batch.iter())
            .collect()
    }

    /// Batch sizes flushed for one table, in order.
    pub fn batch_sizes_for(&self, table: &str) -> Vec<usize> {
        let handles: Vec<u64> = self
            .statements
            .iter()
            .enumerate()
            .filter(|(_, statement)| statement.table == table)
            .map(|(index, _)| index as u64)
            .collect();
        self.flush_log
            .iter()
            .zip(&self.batches)
            .filter(|(handle, _)| handles.contains(&handle.0))
            .map(|(_, batch)| batch.len())
            .collect()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn prepare(
        &mut self,
        statement: &InsertStatement,
    ) -> Result<StatementHandle, ExecutorError> {
        self.statements.push(statement.clone());
        Ok(StatementHandle(self.statements.len() as u64 - 1))
    }

    async fn execute_batch(
        &mut self,
        handle: StatementHandle,
        rows: &[Vec<Value>],
    ) -> Result<u64, ExecutorError> {
        let flush_index = self.flushes_seen;
        self.flushes_seen += 1;
        if self.fail_on_flush == Some(flush_index) {
            return Err(ExecutorError("injected flush failure".to_string()));
        }
        self.flush_log.push(handle);
        self.batches.push(rows.to_vec());
        Ok(rows.len() as u64)
    }
}
