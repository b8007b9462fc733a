//! Export plan — the concrete exports an export graph multiplies out to.
//!
//! Every lane of the graph is one output file:
//!
//! ```text
//! graph.configurations() → [ExportConfig] → output_name() → plan / warnings
//! ```

use std::io::Write;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use crate::graph::MultiplicationGraph;
use crate::model::*;
use crate::{Error, Result};

/// Problems found before exporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWarnings {
    /// Export cannot proceed.
    pub errors: Vec<String>,
    /// Export can proceed but the result is probably not what was meant.
    pub warnings: Vec<String>,
    /// Output names produced by more than one configuration.
    pub conflicting_filenames: Vec<String>,
}

impl ExportWarnings {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.conflicting_filenames.is_empty()
    }
}

fn label<G>(graph: &G, id: NodeId) -> Result<String>
where
    G: MultiplicationGraph + ?Sized,
{
    graph
        .node(id)?
        .map(|n| n.label)
        .ok_or(Error::NodeNotFound(id))
}

/// Keep `[A-Za-z0-9-_]`, everything else becomes `_`.
fn sanitize(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// File name for one configuration: `{filename}_{timespan}_{channels}.{format}`.
pub fn output_name<G>(graph: &G, config: &ExportConfig) -> Result<String>
where
    G: MultiplicationGraph + ?Sized,
{
    Ok(format!(
        "{}_{}_{}.{}",
        sanitize(&label(graph, config.filename)?),
        sanitize(&label(graph, config.timespan)?),
        sanitize(&label(graph, config.channel_config)?),
        sanitize(&label(graph, config.format)?).to_lowercase(),
    ))
}

/// Check the graph before exporting.
pub fn check<G>(graph: &G) -> Result<ExportWarnings>
where
    G: MultiplicationGraph + ?Sized,
{
    let mut report = ExportWarnings::default();

    for level in Level::ALL {
        let nodes = graph.nodes(level)?;
        if nodes.is_empty() {
            report.errors.push(format!("No {} has been selected!", level.name()));
            continue;
        }
        for id in nodes {
            if label(graph, id)?.trim().is_empty() {
                report.warnings.push(format!("Unnamed {} (node {id})", level.name()));
            }
        }
    }
    if !report.errors.is_empty() {
        return Ok(report);
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for config in graph.configurations()? {
        *seen.entry(output_name(graph, &config)?).or_default() += 1;
    }
    let mut conflicts: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    conflicts.sort();
    report.conflicting_filenames = conflicts;

    Ok(report)
}

/// Write the export plan as plain text, one configuration per line.
pub fn write_plan<G>(graph: &G, writer: &mut dyn Write) -> Result<()>
where
    G: MultiplicationGraph + ?Sized,
{
    let configs = graph.configurations()?;

    writeln!(writer, "# export plan")?;
    writeln!(writer, "# files: {}", configs.len())?;

    for (i, config) in configs.iter().enumerate() {
        writeln!(
            writer,
            "{i}\t{}\t{}\t{}\t{}\t{}",
            label(graph, config.timespan)?,
            label(graph, config.channel_config)?,
            label(graph, config.format)?,
            label(graph, config.filename)?,
            output_name(graph, config)?,
        )?;
    }
    Ok(())
}
