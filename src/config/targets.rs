//! Target list parsing: comma splitting and alias expansion.
//!
//! Runs once before traversal; the engine only ever sees a flat id set.

use std::collections::{BTreeMap, HashSet};

use crate::config::schema::GABE_NEWELL_STEAM_ID;
use crate::types::NodeId;

/// Alias names known without any config file. `OtherValveEmployees` is empty
/// until a config file supplies the list.
pub fn builtin_aliases() -> BTreeMap<String, Vec<NodeId>> {
    let mut aliases = BTreeMap::new();
    aliases.insert("GabeNewell".to_string(), vec![GABE_NEWELL_STEAM_ID.to_string()]);
    aliases.insert("OtherValveEmployees".to_string(), Vec::new());
    aliases
}

/// Flatten `values` into target ids.
///
/// Each value is split on commas; pieces are trimmed and empty ones dropped.
/// A piece naming an alias (user aliases shadow built-ins) is replaced by its
/// ids, anything else is taken as an id. Duplicates keep their first position.
pub fn resolve_targets(values: &[String], user_aliases: &BTreeMap<String, Vec<NodeId>>) -> Vec<NodeId> {
    let mut aliases = builtin_aliases();
    aliases.extend(user_aliases.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for piece in values.iter().flat_map(|v| v.split(',')) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let expanded = match aliases.get(piece) {
            Some(ids) => ids.clone(),
            None => vec![piece.to_string()],
        };
        for id in expanded {
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_ids_pass_through() {
        assert_eq!(resolve_targets(&strs(&["1", "2"]), &BTreeMap::new()), strs(&["1", "2"]));
    }

    #[test]
    fn comma_separated_values_are_split() {
        assert_eq!(
            resolve_targets(&strs(&["1, 2", "3,,"]), &BTreeMap::new()),
            strs(&["1", "2", "3"])
        );
    }

    #[test]
    fn builtin_alias_expands() {
        assert_eq!(
            resolve_targets(&strs(&["GabeNewell,OtherValveEmployees"]), &BTreeMap::new()),
            strs(&[GABE_NEWELL_STEAM_ID])
        );
    }

    #[test]
    fn user_alias_shadows_builtin() {
        let mut user = BTreeMap::new();
        user.insert("OtherValveEmployees".to_string(), strs(&["10", "11"]));
        user.insert("Friends".to_string(), strs(&["11", "12"]));
        assert_eq!(
            resolve_targets(&strs(&["OtherValveEmployees", "Friends"]), &user),
            strs(&["10", "11", "12"])
        );
    }

    #[test]
    fn duplicates_keep_first_position() {
        assert_eq!(
            resolve_targets(&strs(&["2", "1", "2"]), &BTreeMap::new()),
            strs(&["2", "1"])
        );
    }
}
