//! Property-based tests for ignore-pattern classification.
//!
//! The `check` fold is order-sensitive by contract (each matching pattern
//! flips the ignored state to its own polarity, last match wins), so these
//! tests enumerate pattern order explicitly rather than assuming gitignore
//! compatibility.

#[cfg(test)]
mod proptest_tests {
    use crate::ignore::Ignore;
    use proptest::prelude::*;
    use std::path::Path;

    fn ignore(lines: &str) -> Ignore {
        Ignore::from_patterns(Path::new("/work"), lines).unwrap()
    }

    proptest! {
        /// Property: classification is deterministic (same patterns, same
        /// path, same answer).
        #[test]
        fn check_is_deterministic(name in "[a-z][a-z0-9_]{0,12}") {
            let ig = ignore("*.md\n!keep.md\n");
            let path = format!("{}.md", name);
            let first = ig.check(Path::new(&path));
            let second = ig.check(Path::new(&path));
            prop_assert_eq!(first, second);
        }

        /// Property: a trailing exact-match pattern always decides the
        /// outcome, whatever came before it.
        #[test]
        fn last_exact_match_wins(
            name in "[a-z][a-z0-9_]{0,12}",
            earlier_negated in any::<bool>(),
            last_negated in any::<bool>(),
        ) {
            let path = format!("{}.md", name);
            let earlier = if earlier_negated { "!*.md" } else { "*.md" };
            let last = if last_negated {
                format!("!{}", path)
            } else {
                path.clone()
            };
            let ig = ignore(&format!("{}\n{}\n", earlier, last));
            prop_assert_eq!(ig.check(Path::new(&path)), !last_negated);
        }

        /// Property: with no matching pattern, the hidden-file default is
        /// the answer.
        #[test]
        fn unmatched_paths_fall_back_to_hidden_default(
            name in "[a-z][a-z0-9_]{0,12}",
            hidden in any::<bool>(),
        ) {
            let ig = ignore("*.txt\n");
            let path = if hidden {
                format!(".{}.md", name)
            } else {
                format!("{}.md", name)
            };
            prop_assert_eq!(ig.check(Path::new(&path)), hidden);
        }

        /// Property: duplicating the whole pattern list changes nothing.
        /// Re-applying a pattern sets the state to the value it already has.
        #[test]
        fn doubled_pattern_list_is_equivalent(name in "[a-z][a-z0-9_]{0,12}") {
            let lines = "*.md\n!keep.md\n";
            let once = ignore(lines);
            let twice = ignore(&format!("{}{}", lines, lines));
            let path = format!("{}.md", name);
            prop_assert_eq!(
                once.check(Path::new(&path)),
                twice.check(Path::new(&path))
            );
            prop_assert_eq!(
                once.check(Path::new("keep.md")),
                twice.check(Path::new("keep.md"))
            );
        }

        /// Property: swapping a pattern with its negation at the tail
        /// inverts the classification of paths that match it.
        #[test]
        fn tail_negation_inverts(name in "[a-z][a-z0-9_]{0,12}") {
            let path = format!("{}.md", name);
            let kept = ignore(&format!("*.md\n!{}\n", path));
            let dropped = ignore(&format!("*.md\n{}\n", path));
            prop_assert!(!kept.check(Path::new(&path)));
            prop_assert!(dropped.check(Path::new(&path)));
        }
    }
}
