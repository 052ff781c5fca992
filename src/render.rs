use clap::ValueEnum;
use comfy_table::presets::NOTHING;
use comfy_table::{Cell, Color, Table};

use crate::report::{ALL_PODS, AllowedPods, NO_PODS, PodRecord, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

const UNSCHEDULED: &str = "<none>";

/// Node name cell; palette entries 1..=6 skip black and white.
fn node_cell(name: &str, color: Option<u8>) -> Cell {
    let label = if name.is_empty() { UNSCHEDULED } else { name };
    match color {
        Some(index) => Cell::new(label).fg(Color::AnsiValue(index + 1)),
        None => Cell::new(label),
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .enforce_styling()
        .set_header(header.to_vec());
    table
}

fn finish(mut table: Table) -> String {
    for column in table.column_iter_mut() {
        column.set_padding((0, 3));
    }
    let mut out = String::new();
    for line in table.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/* ============================= NODE TABLE ============================= */

pub fn node_table(report: &Report) -> String {
    let mut table = new_table(&["NODE", "TAINTS", "ALLOW POD"]);

    for node in &report.nodes {
        let allowed: Vec<&str> = match &node.allowed {
            AllowedPods::All => vec![ALL_PODS],
            AllowedPods::Only(pods) if pods.is_empty() => vec![NO_PODS],
            AllowedPods::Only(pods) => pods.iter().map(String::as_str).collect(),
        };
        for pod in allowed {
            table.add_row(vec![
                node_cell(&node.name, node.color),
                Cell::new(&node.taints),
                Cell::new(pod),
            ]);
        }
    }

    finish(table)
}

/* ============================= POD TABLE ============================= */

pub fn pod_table(pods: &[PodRecord]) -> String {
    let mut table = new_table(&["NODE", "NAMESPACE", "POD", "STATUS", "AGE", "KIND OWNER"]);

    for pod in pods {
        table.add_row(vec![
            node_cell(&pod.node_name, pod.node_color),
            Cell::new(&pod.namespace),
            Cell::new(&pod.name),
            Cell::new(&pod.status),
            Cell::new(&pod.age),
            Cell::new(&pod.owner_kind),
        ]);
    }

    finish(table)
}

/* ============================= OUTPUT ============================= */

pub fn render(report: &Report, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(format!(
            "{}\n{}\nTotal: {} nodes, {} pods\n",
            node_table(report),
            pod_table(&report.pods),
            report.nodes.len(),
            report.pods.len()
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
    }
}

/* ============================= TESTS ============================= */
