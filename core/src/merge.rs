//! Order-sensitive merging of token sets.

use crate::{Node, TokenDocument, TokenGroup};

/// Merges `source` into `target` and returns `target`.
///
/// A key holding a group on both sides is merged recursively. Anything else
/// (scalars, lists, a group meeting a non-group, a new key) takes the source
/// value as a whole. Keys `target` already had keep their position; new keys
/// are appended in `source` order.
pub fn deep_merge<'a>(target: &'a mut TokenGroup, source: &TokenGroup) -> &'a mut TokenGroup {
    for (key, value) in source {
        if let (Some(Node::Group(existing)), Node::Group(incoming)) = (target.get_mut(key), value) {
            deep_merge(existing, incoming);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
    target
}

/// Folds the named token sets of `document` into a fresh tree, in order.
///
/// Names that are missing from the document, or that do not name a mapping,
/// are skipped.
pub fn merge_by_order<S: AsRef<str>>(document: &TokenDocument, order: &[S]) -> TokenGroup {
    order
        .iter()
        .filter_map(|name| document.token_set(name.as_ref()))
        .fold(TokenGroup::new(), |mut merged, set| {
            deep_merge(&mut merged, set);
            merged
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(json: &str) -> TokenGroup {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn nested_groups_merge_by_key() {
        let mut target = group(r##"{ "color": { "bg": "#fff", "border": "#ccc" } }"##);
        let source = group(r##"{ "color": { "fg": "#000", "border": "#333" } }"##);
        deep_merge(&mut target, &source);

        assert_eq!(
            target,
            group(r##"{ "color": { "bg": "#fff", "border": "#333", "fg": "#000" } }"##)
        );
    }

    #[test]
    fn key_order_keeps_existing_then_appends_new() {
        let mut target = group(r#"{ "b": 1, "a": 2 }"#);
        deep_merge(&mut target, &group(r#"{ "c": 3, "a": 4, "d": 5 }"#));
        assert_eq!(target.keys().collect::<Vec<_>>(), ["b", "a", "c", "d"]);
        assert_eq!(target["a"], Node::Leaf(4.into()));
    }

    #[test]
    fn lists_are_replaced_not_merged() {
        let mut target = group(r#"{ "shadow": [{ "x": 1 }, { "x": 2 }] }"#);
        deep_merge(&mut target, &group(r#"{ "shadow": [{ "y": 3 }] }"#));
        assert_eq!(target, group(r#"{ "shadow": [{ "y": 3 }] }"#));
    }

    #[test]
    fn non_group_source_wins_over_anything() {
        let mut target = group(r#"{ "a": { "nested": true }, "b": "text", "c": [1] }"#);
        let source = group(r#"{ "a": "flat", "b": { "now": "nested" }, "c": null }"#);
        deep_merge(&mut target, &source);
        assert_eq!(target, source);
    }

    #[test]
    fn empty_source_is_identity() {
        let original = group(r#"{ "a": { "b": 1 }, "c": [2] }"#);
        let mut target = original.clone();
        deep_merge(&mut target, &TokenGroup::new());
        assert_eq!(target, original);
    }

    #[test]
    fn sequential_merges_fold_left_to_right() {
        let a = group(r#"{ "x": { "p": 1, "q": 1 } }"#);
        let b = group(r#"{ "x": { "q": 2, "r": 2 } }"#);
        let c = group(r#"{ "x": { "r": 3 }, "y": 3 }"#);

        let mut sequential = TokenGroup::new();
        deep_merge(&mut sequential, &a);
        deep_merge(&mut sequential, &b);
        deep_merge(&mut sequential, &c);

        let folded = [&a, &b, &c].into_iter().fold(TokenGroup::new(), |mut acc, set| {
            deep_merge(&mut acc, set);
            acc
        });

        assert_eq!(sequential, folded);
        assert_eq!(sequential, group(r#"{ "x": { "p": 1, "q": 2, "r": 3 }, "y": 3 }"#));
    }

    #[test]
    fn merge_by_order_skips_unknown_and_non_group_sets() {
        let document = TokenDocument::from_json(
            r#"{
                "global": { "size": { "value": 4 } },
                "$themes": [{ "name": "light" }],
                "broken": "not a set"
            }"#,
        )
        .unwrap();

        let with_missing = merge_by_order(&document, &["global", "missing-set", "$themes", "broken"]);
        assert_eq!(with_missing, merge_by_order(&document, &["global"]));
        assert_eq!(with_missing, group(r#"{ "size": { "value": 4 } }"#));
    }

    #[test]
    fn later_sets_take_precedence() {
        let document = TokenDocument::from_json(
            r#"{
                "base": { "radius": { "value": 2 }, "gap": { "value": 8 } },
                "override": { "radius": { "value": 6 } }
            }"#,
        )
        .unwrap();

        let merged = merge_by_order(&document, &["base", "override"]);
        assert_eq!(
            merged,
            group(r#"{ "radius": { "value": 6 }, "gap": { "value": 8 } }"#)
        );

        let reversed = merge_by_order(&document, &["override", "base"]);
        assert_eq!(
            reversed,
            group(r#"{ "radius": { "value": 2 }, "gap": { "value": 8 } }"#)
        );
    }

    #[test]
    fn merge_by_order_leaves_document_untouched() {
        let document = TokenDocument::from_json(r#"{ "a": { "x": { "y": 1 } }, "b": { "x": { "z": 2 } } }"#)
            .unwrap();
        let before = document.clone();
        let _ = merge_by_order(&document, &["a", "b"]);
        assert_eq!(document, before);
    }
}
