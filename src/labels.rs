//! # Labels and Repository Filters
//!
//! This module turns filter expressions such as `api ~go !~deprecated` into a
//! concrete set of repository names.
//!
//! ## Label index
//!
//! [`LabelIndex::build`] maps every label to the repositories carrying it.
//! Labels come from two places:
//!
//! - the catalog, where each repository lists its labels, and
//! - the locally configured aliases, which are merged into a label of the
//!   same name by union, so a catalog label and an alias sharing a name
//!   accumulate members from both.
//!
//! The synthetic `all` label is always set to exactly the catalog's
//! repository names.
//!
//! ## Filter tokens
//!
//! A token is a plain string with two optional markers, each of which may
//! appear anywhere in it:
//!
//! - `~` marks a label reference (`~go`, `go~`),
//! - `!` marks an exclusion (`!api`, `!~deprecated`).
//!
//! ## Resolution
//!
//! All included sets are unioned, all excluded sets are unioned, and the
//! result is the first minus the second. An excluded repository can never
//! be re-included by another token in the same call. Unknown labels resolve
//! to nothing; unknown repository names are passed through unchecked.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::catalog::Catalog;
use crate::defaults::SUPERSET_LABEL;

/// Marks a token as a label reference.
pub const LABEL_MARKER: char = '~';

/// Marks a token as an exclusion.
pub const EXCLUDE_MARKER: char = '!';

/// One parsed filter argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterToken {
    /// The label or repository name with markers removed.
    pub name: String,
    pub is_label: bool,
    pub is_exclude: bool,
}

impl FilterToken {
    /// Parse a raw argument.
    pub fn parse(raw: &str) -> Self {
        Self {
            name: raw.replace([LABEL_MARKER, EXCLUDE_MARKER], ""),
            is_label: raw.contains(LABEL_MARKER),
            is_exclude: raw.contains(EXCLUDE_MARKER),
        }
    }

    /// Whether `raw` carries a label or exclude marker.
    pub fn has_markers(raw: &str) -> bool {
        raw.contains(LABEL_MARKER) || raw.contains(EXCLUDE_MARKER)
    }

    /// A token that excludes every repository carrying `label`.
    pub fn exclude_label(label: &str) -> Self {
        Self {
            name: label.to_string(),
            is_label: true,
            is_exclude: true,
        }
    }
}

impl fmt::Display for FilterToken {
    /// Normalised form used in set expressions: `~name` for labels, `name`
    /// for repositories. Exclusion is expressed by placement, not a marker.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_label {
            write!(f, "{}{}", LABEL_MARKER, self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Parse every raw argument into a token.
pub fn parse_tokens<S: AsRef<str>>(raw: &[S]) -> Vec<FilterToken> {
    raw.iter().map(|r| FilterToken::parse(r.as_ref())).collect()
}

/// Label name to member repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    labels: BTreeMap<String, BTreeSet<String>>,
}

impl LabelIndex {
    /// Build the index from the catalog and the configured aliases.
    pub fn build(catalog: &Catalog, aliases: &BTreeMap<String, Vec<String>>) -> Self {
        let mut labels: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for repo in catalog.repositories.values() {
            for label in &repo.labels {
                labels
                    .entry(label.clone())
                    .or_default()
                    .insert(repo.name.clone());
            }
        }

        for (alias, members) in aliases {
            labels
                .entry(alias.clone())
                .or_default()
                .extend(members.iter().cloned());
        }

        labels.insert(
            SUPERSET_LABEL.to_string(),
            catalog.names().map(str::to_string).collect(),
        );

        Self { labels }
    }

    /// Members of `label`, if the label is known.
    pub fn get(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.labels.get(label)
    }

    /// Every known label name, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Evaluates filter tokens against a label index.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a LabelIndex,
    unwanted: &'a [String],
}

impl<'a> Resolver<'a> {
    /// `unwanted` lists the labels excluded when `skip_unwanted` is requested.
    pub fn new(index: &'a LabelIndex, unwanted: &'a [String]) -> Self {
        Self { index, unwanted }
    }

    /// The tokens that will actually be evaluated: `tokens` followed by one
    /// label exclusion per unwanted label when `skip_unwanted` is set.
    pub fn effective_tokens(
        &self,
        tokens: &[FilterToken],
        skip_unwanted: bool,
    ) -> Vec<FilterToken> {
        let mut effective = tokens.to_vec();
        if skip_unwanted {
            effective.extend(self.unwanted.iter().map(|l| FilterToken::exclude_label(l)));
        }
        effective
    }

    /// Resolve `tokens` into a set of repository names.
    pub fn resolve(&self, tokens: &[FilterToken], skip_unwanted: bool) -> BTreeSet<String> {
        let mut include = BTreeSet::new();
        let mut exclude = BTreeSet::new();

        for token in self.effective_tokens(tokens, skip_unwanted) {
            let bucket = if token.is_exclude {
                &mut exclude
            } else {
                &mut include
            };

            if token.is_label {
                if let Some(members) = self.index.get(&token.name) {
                    bucket.extend(members.iter().cloned());
                }
            } else {
                bucket.insert(token.name);
            }
        }

        include.difference(&exclude).cloned().collect()
    }
}

/// Render labels and their members.
///
/// With no `labels`, every label except the synthetic `all` label is listed.
pub fn render_labels(index: &LabelIndex, labels: &[String]) -> String {
    let mut selected: Vec<String> = if labels.is_empty() {
        index
            .names()
            .filter(|name| *name != SUPERSET_LABEL)
            .map(str::to_string)
            .collect()
    } else {
        labels.to_vec()
    };
    selected.sort();

    let mut out = String::new();
    for label in selected {
        match index.get(&label) {
            Some(members) if !members.is_empty() => {
                let members: Vec<&str> = members.iter().map(String::as_str).collect();
                out.push_str(&format!("  ~ {} ~\n{}\n", label, members.join(", ")));
            }
            _ => out.push_str(&format!("  ~ {} ~ (empty label)\n", label)),
        }
    }
    out
}

/// Render the set expression for `tokens`, what it matches and, when
/// `verbose`, the members of every label it references.
pub fn render_set(
    resolver: &Resolver<'_>,
    tokens: &[FilterToken],
    skip_unwanted: bool,
    verbose: bool,
) -> String {
    let effective = resolver.effective_tokens(tokens, skip_unwanted);

    let includes: BTreeSet<&FilterToken> = effective.iter().filter(|t| !t.is_exclude).collect();
    let excludes: BTreeSet<&FilterToken> = effective.iter().filter(|t| t.is_exclude).collect();

    let join = |set: &BTreeSet<&FilterToken>| {
        set.iter()
            .map(|t| t.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(" \u{222A} ")
    };

    let mut expression = format!("({})", join(&includes));
    if !excludes.is_empty() {
        expression.push_str(&format!(" \u{2216} ({})", join(&excludes)));
    }

    let matched: Vec<String> = resolver.resolve(tokens, skip_unwanted).into_iter().collect();

    let mut out = format!("You've selected the following set:\n{}\n\n", expression);
    match matched.len() {
        0 => out.push_str("This matches no known repositories\n"),
        1 => out.push_str(&format!("This matches 1 repository: {}\n", matched[0])),
        n => out.push_str(&format!(
            "This matches {} repositories, listed below:\n{}\n",
            n,
            matched.join(", ")
        )),
    }

    if verbose {
        let label_names = |set: &BTreeSet<&FilterToken>| -> Vec<String> {
            set.iter()
                .filter(|t| t.is_label)
                .map(|t| t.name.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        let included = label_names(&includes);
        if !included.is_empty() {
            out.push_str("\nIncluded labels:\n");
            out.push_str(&render_labels(resolver.index, &included));
        }

        let excluded = label_names(&excludes);
        if !excluded.is_empty() {
            out.push_str("\nExcluded labels:\n");
            out.push_str(&render_labels(resolver.index, &excluded));
        }
    }

    out
}
