//! Human-readable rendering of search results.

use crate::graph::registry::{Find, FindRegistry};
use crate::graph::resolver::ResolvedProfiles;
use crate::types::NodeId;

pub fn format_chain(chain: &[NodeId]) -> String {
    chain.join(" → ")
}

/// Headline for a finished search, or `None` when nothing was found.
pub fn render_summary(registry: &FindRegistry, primary_target: Option<&str>) -> Option<String> {
    let (min, max) = registry.depth_range()?;
    let primary = match primary_target.and_then(|id| registry.get(id)) {
        Some(find) => format!("Yes! At depth {}", find.depth),
        None => "No".to_string(),
    };
    Some(format!(
        "Found {} targets!\n\tMin depth: {min}. Max depth: {max}\n\tContains primary target: {primary}",
        registry.len()
    ))
}

/// One find with every chain, using display names where resolved.
pub fn render_find(find: &Find, profiles: &ResolvedProfiles) -> String {
    let mut out = format!(
        "Found {} at depth={}.",
        profiles.identifier(&find.target),
        find.depth
    );
    for chain in &find.chains {
        let mut names: Vec<&str> = chain.iter().map(|id| profiles.name(id)).collect();
        let target = format!("{} (target)", profiles.name(&find.target));
        names.push(&target);
        out.push_str(&format!("\n\tChain: {}", names.join(" → ")));
    }
    out
}
