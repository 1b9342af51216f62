//! Text rendering for the `graph` and `outputs` commands.

use std::fmt::Write;

use shared::Result;
use tracing::warn;

use crate::template::{Bindings, Template};

/// One line per resource in creation order: `Id (Type) <- Dep, Dep`.
pub fn render_graph(template: &Template) -> Result<String> {
    let mut out = String::new();
    for id in template.creation_order()? {
        let resource_type = &template.resources[&id].resource_type;
        let deps: Vec<String> = template.dependencies(&id).into_iter().collect();
        if deps.is_empty() {
            let _ = writeln!(out, "{} ({})", id, resource_type);
        } else {
            let _ = writeln!(out, "{} ({}) <- {}", id, resource_type, deps.join(", "));
        }
    }
    Ok(out)
}

/// `Name = value` for every output the bindings can resolve.
///
/// Outputs that need an unbound value are skipped with a warning.
pub fn render_outputs(template: &Template, bindings: &Bindings) -> String {
    let mut out = String::new();
    for name in template.outputs.keys() {
        match template.resolve_output(name, bindings) {
            Ok(value) => {
                let _ = writeln!(out, "{} = {}", name, value);
            }
            Err(e) => warn!("{} not rendered: {}", name, e),
        }
    }
    out
}
