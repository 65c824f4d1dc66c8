use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::Database;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
///
/// `topo_order` lists table names parents-first; `cycle` names the tables
/// left over when ordering is impossible. Self-referencing foreign keys do
/// not contribute edges here, they are handled by the fill policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a database.
///
/// Ties between independent tables break on discovery order, so a schema
/// without foreign keys orders exactly as introspected.
pub fn build_fk_graph_report(database: &Database) -> FkGraphReport {
    let nodes: Vec<String> = database
        .tables()
        .iter()
        .map(|table| table.name().to_lowercase())
        .collect();
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(position, name)| (name.as_str(), position))
        .collect();

    // children[p] holds the nodes that must come after p.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut indegree: Vec<usize> = vec![0; nodes.len()];
    let mut edges = 0;

    for (child_idx, table) in database.tables().iter().enumerate() {
        for fk in table.foreign_keys() {
            let parent = fk.references().table();
            let Some(&parent_idx) = index.get(parent) else {
                continue;
            };
            if parent_idx == child_idx {
                continue;
            }
            children[parent_idx].push(child_idx);
            indegree[child_idx] += 1;
            edges += 1;
        }
    }

    let summary = FkGraphSummary {
        nodes: nodes.len(),
        edges,
    };

    let mut order = Vec::with_capacity(nodes.len());
    let mut emitted = vec![false; nodes.len()];
    loop {
        // Lowest discovery index with no unmet dependency keeps the order stable.
        let next = (0..nodes.len()).find(|&idx| !emitted[idx] && indegree[idx] == 0);
        let Some(idx) = next else {
            break;
        };
        emitted[idx] = true;
        order.push(nodes[idx].clone());
        for &child in &children[idx] {
            indegree[child] -= 1;
        }
    }

    if order.len() == nodes.len() {
        FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        }
    } else {
        let cycle: Vec<String> = (0..nodes.len())
            .filter(|&idx| !emitted[idx])
            .map(|idx| nodes[idx].clone())
            .collect();
        FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        }
    }
}
