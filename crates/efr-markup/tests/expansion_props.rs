//! Property tests for marker expansion and document assembly

use efr_markup::{assemble, build_equation, expand, expand_figures, expand_references};
use proptest::prelude::*;

fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_/]{0,15}\\.(png|pdf|jpg)"
}

fn caption_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ,.]{0,24}"
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_:-]{0,12}"
}

fn prose_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,\n]{0,40}"
}

proptest! {
    #[test]
    fn figure_expands_to_single_ordered_block(
        before in prose_strategy(),
        path in path_strategy(),
        caption in caption_strategy(),
        label in label_strategy(),
        after in prose_strategy(),
    ) {
        let text = format!("{}{{{{figure:{}|{}|{}}}}}{}", before, path, caption, label, after);
        let out = expand_figures(&text);

        let include = format!("\\includegraphics{{{}}}", path);
        let cap = format!("\\caption{{{}}}", caption);
        let lbl = format!("\\label{{fig:{}}}", label);

        prop_assert_eq!(out.matches(&include).count(), 1);
        prop_assert_eq!(out.matches(&cap).count(), 1);
        prop_assert_eq!(out.matches(&lbl).count(), 1);

        let begin = out.find("\\begin{figure}[h]").unwrap();
        let i = out.find(&include).unwrap();
        let c = out.find(&cap).unwrap();
        let l = out.find(&lbl).unwrap();
        let end = out.find("\\end{figure}").unwrap();
        prop_assert!(begin < i && i < c && c < l && l < end);
        prop_assert!(out.starts_with(&before));
        prop_assert!(out.ends_with(&after));
        prop_assert!(!out.contains("{{figure:"));
    }

    #[test]
    fn reference_expands_to_figure_ref(
        before in prose_strategy(),
        label in label_strategy(),
        after in prose_strategy(),
    ) {
        let text = format!("{}{{{{ref:{}}}}}{}", before, label, after);
        let out = expand_references(&text);
        prop_assert_eq!(out, format!("{}Figure \\ref{{fig:{}}}{}", before, label, after));
    }

    #[test]
    fn expansion_is_idempotent(
        parts in prop::collection::vec(
            prop_oneof![
                prose_strategy(),
                (path_strategy(), caption_strategy(), label_strategy())
                    .prop_map(|(p, c, l)| format!("{{{{figure:{}|{}|{}}}}}", p, c, l)),
                label_strategy().prop_map(|l| format!("{{{{ref:{}}}}}", l)),
            ],
            0..8,
        )
    ) {
        let text = parts.concat();
        let once = expand(&text);
        let twice = expand(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn assembled_source_has_one_frame(
        style in "[A-Za-z0-9 \\\\{}]{0,40}",
        body in "[A-Za-z0-9 .\n]{0,80}",
    ) {
        let src = assemble(&style, &body);
        prop_assert_eq!(src.matches("\\documentclass{article}").count(), 1);
        prop_assert_eq!(src.matches("\\begin{document}").count(), 1);
        prop_assert_eq!(src.matches("\\end{document}").count(), 1);
        let expected_tail = format!("\n{}\n\\begin{{document}}\n{}\n\\end{{document}}", style, body);
        prop_assert!(src.ends_with(&expected_tail));
    }

    #[test]
    fn equation_is_framed(
        lhs in "[A-Za-z]{1,5}",
        rhs in "[A-Za-z0-9^+ ]{1,12}",
        label in prop::option::of(label_strategy()),
    ) {
        let eq = build_equation(&lhs, &rhs, label.as_deref());
        prop_assert!(eq.starts_with("\\begin{equation}"), "unexpected start: {}", eq);
        prop_assert!(eq.ends_with("\\end{equation}"), "unexpected end: {}", eq);
        let expected = format!("{} = {}", lhs, rhs);
        prop_assert!(eq.contains(&expected));
        match label {
            Some(l) => {
                let expected = format!("\\label{{eq:{}}}", l);
                prop_assert_eq!(eq.matches(&expected).count(), 1);
            }
            None => prop_assert!(!eq.contains("\\label")),
        }
    }
}
