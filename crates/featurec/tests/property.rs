//! Random implication graphs must propagate to their transitive closure.

mod support;

use featurec::{EmitOptions, compile};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use support::Preprocessor;

const MAX_FEATURES: usize = 8;

fn feature(index: usize) -> String {
    format!("F{index}")
}

fn closure(enabled: &BTreeSet<usize>, edges: &[(usize, usize)]) -> BTreeSet<usize> {
    let mut reached = enabled.clone();
    loop {
        let before = reached.len();
        for &(from, to) in edges {
            if reached.contains(&from) {
                reached.insert(to);
            }
        }
        if reached.len() == before {
            return reached;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn implications_reach_the_transitive_closure(
        count in 2..=MAX_FEATURES,
        raw_edges in prop::collection::vec((0..MAX_FEATURES, 0..MAX_FEATURES), 0..20),
        switches in prop::collection::vec(any::<bool>(), MAX_FEATURES),
        reversed in any::<bool>(),
    ) {
        // Forward edges only, so the graph is acyclic.
        let edges: Vec<(usize, usize)> = raw_edges
            .into_iter()
            .map(|(a, b)| (a % count, b % count))
            .filter(|(a, b)| a < b)
            .collect();

        let mut order: Vec<usize> = (0..count).collect();
        let mut rule_order = edges.clone();
        if reversed {
            order.reverse();
            rule_order.reverse();
        }

        let mut defs = String::new();
        for &i in &order {
            writeln!(defs, "{}", feature(i)).unwrap();
        }
        for &(from, to) in &rule_order {
            writeln!(defs, "{} implies {}", feature(from), feature(to)).unwrap();
        }

        let enabled: BTreeSet<usize> = (0..count).filter(|&i| switches[i]).collect();
        let mut user = String::new();
        for &i in &enabled {
            writeln!(user, "#define {}", feature(i)).unwrap();
        }

        let artifacts = compile(&defs, &EmitOptions::default()).unwrap();
        let result = Preprocessor::new().file("myconfig-final.hpp", &user).run(&artifacts.header);

        let features: BTreeSet<String> = (0..count).map(feature).collect();
        let defined: BTreeSet<String> = result.defined.intersection(&features).cloned().collect();
        let expected: BTreeSet<String> = closure(&enabled, &edges).into_iter().map(feature).collect();
        prop_assert_eq!(defined, expected);
    }

    #[test]
    fn arbitrary_text_never_panics(text in "[A-Za-z_ ()!&|#/*\n]{0,80}") {
        let _ = compile(&text, &EmitOptions::default());
    }
}
