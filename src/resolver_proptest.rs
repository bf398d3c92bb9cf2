//! Property-based tests for the label index, the resolver and alias
//! expansion.
//!
//! These tests use proptest to generate random catalogs and filter
//! expressions and verify that the set algebra holds for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{BTreeMap, BTreeSet};

    use crate::batch::arguments::{dedup, expand_aliases};
    use crate::catalog::{Catalog, Repository};
    use crate::labels::{FilterToken, LabelIndex, Resolver};
    use proptest::prelude::*;

    const NAMES: [&str; 6] = ["api", "web", "cli", "db", "docs", "ops"];
    const LABELS: [&str; 4] = ["go", "js", "deprecated", "poc"];

    fn catalog_strategy() -> impl Strategy<Value = Catalog> {
        prop::collection::btree_map(
            prop::sample::select(NAMES.to_vec()),
            prop::collection::btree_set(prop::sample::select(LABELS.to_vec()), 0..3),
            0..NAMES.len(),
        )
        .prop_map(|repos| {
            Catalog::from_repositories(
                repos
                    .into_iter()
                    .map(|(name, labels)| Repository::new(name, "P").with_labels(labels)),
            )
        })
    }

    fn token_strategy() -> impl Strategy<Value = FilterToken> {
        let names: Vec<&str> = NAMES.iter().chain(LABELS.iter()).copied().collect();
        (prop::sample::select(names), any::<bool>(), any::<bool>()).prop_map(
            |(name, is_label, is_exclude)| FilterToken {
                name: name.to_string(),
                is_label,
                is_exclude,
            },
        )
    }

    fn unwanted() -> Vec<String> {
        vec!["deprecated".to_string(), "poc".to_string()]
    }

    // ============================================================================
    // resolver properties
    // ============================================================================

    proptest! {
        /// Property: repeating any token never changes the result
        #[test]
        fn duplicate_tokens_are_idempotent(
            catalog in catalog_strategy(),
            tokens in prop::collection::vec(token_strategy(), 0..8),
            pick in any::<prop::sample::Index>(),
            skip in any::<bool>(),
        ) {
            let index = LabelIndex::build(&catalog, &BTreeMap::new());
            let unwanted = unwanted();
            let resolver = Resolver::new(&index, &unwanted);

            let before = resolver.resolve(&tokens, skip);

            let mut doubled = tokens.clone();
            if !tokens.is_empty() {
                doubled.push(pick.get(&tokens).clone());
            }
            prop_assert_eq!(resolver.resolve(&doubled, skip), before);
        }

        /// Property: anything matched by an exclusion is never in the result
        #[test]
        fn difference_dominates(
            catalog in catalog_strategy(),
            tokens in prop::collection::vec(token_strategy(), 0..8),
        ) {
            let index = LabelIndex::build(&catalog, &BTreeMap::new());
            let resolver = Resolver::new(&index, &[]);
            let result = resolver.resolve(&tokens, false);

            for token in tokens.iter().filter(|t| t.is_exclude) {
                let excluded: BTreeSet<String> = if token.is_label {
                    index.get(&token.name).cloned().unwrap_or_default()
                } else {
                    BTreeSet::from([token.name.clone()])
                };
                prop_assert!(result.is_disjoint(&excluded));
            }
        }

        /// Property: the result only holds names some include token matched
        #[test]
        fn result_is_subset_of_includes(
            catalog in catalog_strategy(),
            tokens in prop::collection::vec(token_strategy(), 0..8),
        ) {
            let index = LabelIndex::build(&catalog, &BTreeMap::new());
            let resolver = Resolver::new(&index, &[]);

            let includes: Vec<FilterToken> =
                tokens.iter().filter(|t| !t.is_exclude).cloned().collect();
            let upper = resolver.resolve(&includes, false);

            prop_assert!(resolver.resolve(&tokens, false).is_subset(&upper));
        }

        /// Property: skipping unwanted labels removes every repository carrying one
        #[test]
        fn unwanted_labels_are_never_resolved(
            catalog in catalog_strategy(),
            tokens in prop::collection::vec(token_strategy(), 0..8),
        ) {
            let index = LabelIndex::build(&catalog, &BTreeMap::new());
            let unwanted = unwanted();
            let resolver = Resolver::new(&index, &unwanted);

            for name in resolver.resolve(&tokens, true) {
                if let Some(repo) = catalog.get(&name) {
                    prop_assert!(repo.labels.iter().all(|l| !unwanted.contains(l)));
                }
            }
        }

        /// Property: token order does not matter
        #[test]
        fn resolution_ignores_token_order(
            catalog in catalog_strategy(),
            tokens in prop::collection::vec(token_strategy(), 0..8),
        ) {
            let index = LabelIndex::build(&catalog, &BTreeMap::new());
            let resolver = Resolver::new(&index, &[]);

            let mut reversed = tokens.clone();
            reversed.reverse();
            prop_assert_eq!(resolver.resolve(&tokens, false), resolver.resolve(&reversed, false));
        }
    }

    // ============================================================================
    // label index properties
    // ============================================================================

    proptest! {
        /// Property: an alias and a catalog label of the same name are unioned
        #[test]
        fn alias_members_union_with_label(
            catalog in catalog_strategy(),
            members in prop::collection::vec(prop::sample::select(NAMES.to_vec()), 0..4),
        ) {
            let aliases = BTreeMap::from([(
                "go".to_string(),
                members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            )]);
            let plain = LabelIndex::build(&catalog, &BTreeMap::new());
            let merged = LabelIndex::build(&catalog, &aliases);

            let mut expected = plain.get("go").cloned().unwrap_or_default();
            expected.extend(members.iter().map(|m| m.to_string()));
            prop_assert_eq!(merged.get("go").cloned().unwrap_or_default(), expected);
        }

        /// Property: the superset label is exactly the catalog, whatever the aliases say
        #[test]
        fn superset_label_matches_catalog(
            catalog in catalog_strategy(),
            members in prop::collection::vec(prop::sample::select(NAMES.to_vec()), 0..4),
        ) {
            let aliases = BTreeMap::from([(
                "all".to_string(),
                members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            )]);
            let index = LabelIndex::build(&catalog, &aliases);

            let expected: BTreeSet<String> = catalog.names().map(str::to_string).collect();
            prop_assert_eq!(index.get("all").cloned().unwrap_or_default(), expected);
        }

        /// Property: building twice from the same inputs gives the same index
        #[test]
        fn index_build_is_deterministic(catalog in catalog_strategy()) {
            let aliases = BTreeMap::from([("grp".to_string(), vec!["api".to_string()])]);
            prop_assert_eq!(
                LabelIndex::build(&catalog, &aliases),
                LabelIndex::build(&catalog, &aliases)
            );
        }
    }

    // ============================================================================
    // alias expansion properties
    // ============================================================================

    proptest! {
        /// Property: arguments that are not aliases pass through in order
        #[test]
        fn non_alias_arguments_pass_through(
            args in prop::collection::vec("[a-z]{1,6}", 0..8),
        ) {
            let aliases = BTreeMap::from([("ALIAS".to_string(), vec!["x".to_string()])]);
            prop_assert_eq!(expand_aliases(&args, &aliases), args);
        }

        /// Property: expansion replaces an alias in place with its members
        #[test]
        fn alias_is_replaced_in_place(
            before in prop::collection::vec("[a-z]{1,6}", 0..4),
            after in prop::collection::vec("[a-z]{1,6}", 0..4),
            members in prop::collection::vec("[a-z]{1,6}", 1..4),
        ) {
            let aliases = BTreeMap::from([("GROUP".to_string(), members.clone())]);

            let mut args = before.clone();
            args.push("GROUP".to_string());
            args.extend(after.iter().cloned());

            let mut expected = before;
            expected.extend(members);
            expected.extend(after);

            prop_assert_eq!(expand_aliases(&args, &aliases), expected);
        }

        /// Property: dedup keeps one copy of every name in first-seen order
        #[test]
        fn dedup_keeps_first_occurrences(
            names in prop::collection::vec("[a-c]{1,2}", 0..12),
        ) {
            let deduped = dedup(names.clone());

            let unique: BTreeSet<&String> = deduped.iter().collect();
            prop_assert_eq!(unique.len(), deduped.len());

            let all: BTreeSet<&String> = names.iter().collect();
            prop_assert_eq!(unique, all);

            for pair in deduped.windows(2) {
                let first = names.iter().position(|n| n == &pair[0]);
                let second = names.iter().position(|n| n == &pair[1]);
                prop_assert!(first < second);
            }
        }
    }
}
