use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use rowforge_core::{Database, build_fk_graph_report};

use crate::config::FillConfig;
use crate::errors::FillError;

/// Planned fill for one table.
#[derive(Debug, Clone)]
pub struct FillTask {
    pub table: String,
    pub rows: u64,
    pub batch_size: usize,
}

/// Order tables parents-first and settle row counts.
///
/// Tables the config leaves out but that are referenced (directly or
/// transitively) by a configured child inherit the child's row count, so a
/// fill never plans a child whose parent would stay empty. Unresolvable
/// cycles across two or more tables fail here, before any insert.
pub fn plan(database: &Database, config: &FillConfig) -> Result<Vec<FillTask>, FillError> {
    let mut rows_by_table: BTreeMap<String, u64> = BTreeMap::new();
    for (name, table_config) in &config.tables {
        let key = name.to_lowercase();
        if database.table(&key).is_none() {
            return Err(FillError::InvalidConfig(format!(
                "configured table '{name}' not found in schema"
            )));
        }
        rows_by_table.insert(key, table_config.rows);
    }

    if rows_by_table.is_empty() {
        return Err(FillError::InvalidConfig(
            "no tables configured for filling".to_string(),
        ));
    }

    let parents = parent_map(database);
    let mut queue: VecDeque<(String, u64)> = rows_by_table
        .iter()
        .map(|(name, rows)| (name.clone(), *rows))
        .collect();
    let mut visited: BTreeSet<String> = rows_by_table.keys().cloned().collect();

    while let Some((child, child_rows)) = queue.pop_front() {
        if let Some(parent_names) = parents.get(&child) {
            for parent in parent_names {
                rows_by_table.entry(parent.clone()).or_insert(child_rows);
                if visited.insert(parent.clone()) {
                    let rows = *rows_by_table.get(parent).unwrap_or(&child_rows);
                    queue.push_back((parent.clone(), rows));
                }
            }
        }
    }

    let report = build_fk_graph_report(database);
    let Some(order) = report.topo_order else {
        let path = report.cycle.unwrap_or_default().join(" -> ");
        return Err(FillError::CyclicReference { path });
    };

    let tasks: Vec<FillTask> = order
        .into_iter()
        .filter_map(|name| {
            rows_by_table.get(&name).map(|rows| FillTask {
                batch_size: config.batch_size_for(&name),
                rows: *rows,
                table: name,
            })
        })
        .collect();

    Ok(tasks)
}

fn parent_map(database: &Database) -> HashMap<String, BTreeSet<String>> {
    let mut parents: HashMap<String, BTreeSet<String>> = HashMap::new();
    for table in database.tables() {
        let child = table.name().to_lowercase();
        let entry = parents.entry(child.clone()).or_default();
        for fk in table.foreign_keys() {
            let parent = fk.references().table().to_string();
            if parent != child {
                entry.insert(parent);
            }
        }
    }
    parents
}
