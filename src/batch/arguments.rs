//! Turning command arguments into the list of targets to run.
//!
//! ```text
//! args -> expand aliases -> (filter tokens? resolve) -> dedup -> sort?
//! ```
//!
//! Alias expansion is a one-level, order-preserving substitution. Only when
//! some argument carries a `~` or `!` marker is the label index consulted,
//! so plain argument lists never need the catalog.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::config::Settings;
use crate::labels::{parse_tokens, FilterToken, LabelIndex, Resolver};

/// Replace every argument naming a non-empty alias with the alias members.
///
/// Members are inserted in place and are not expanded again.
pub fn expand_aliases<S: AsRef<str>>(
    args: &[S],
    aliases: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let mut expanded = Vec::with_capacity(args.len());
    for arg in args {
        let arg = arg.as_ref();
        match aliases.get(arg) {
            Some(members) if !members.is_empty() => expanded.extend(members.iter().cloned()),
            _ => expanded.push(arg.to_string()),
        }
    }
    expanded
}

/// Remove repeated names, keeping each name's first occurrence.
pub fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// The final, ordered target list for `args`.
///
/// `load_index` is only called when the arguments contain filter markers.
pub fn select_targets<S, F>(args: &[S], settings: &Settings, load_index: F) -> Vec<String>
where
    S: AsRef<str>,
    F: FnOnce() -> LabelIndex,
{
    let expanded = expand_aliases(args, &settings.repos.aliases);

    let selected = if expanded.iter().any(|a| FilterToken::has_markers(a)) {
        let index = load_index();
        let tokens = parse_tokens(&expanded);
        Resolver::new(&index, &settings.repos.unwanted_labels)
            .resolve(&tokens, settings.repos.skip_unwanted)
            .into_iter()
            .collect()
    } else {
        expanded
    };

    let mut targets = dedup(selected);
    if settings.repos.sort {
        targets.sort();
    }

    debug!("selected targets: {:?}", targets);
    targets
}
