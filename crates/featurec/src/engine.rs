//! Dependency & consistency engine.
//!
//! Turns a parsed [`RuleSet`] into a [`ValidatedRuleSet`] whose implications
//! and derivations are ordered so a single top-to-bottom preprocessor pass
//! propagates every chain.

use crate::error::{Conflict, RuleKind, ValidationError, Violation};
use crate::graph::DependencyGraph;
use crate::model::{
    Declaration, FeatureKind, FeatureName, ImplicationRule, RuleSet, ValidatedRuleSet,
};
use fxhash::{FxHashMap, FxHashSet};

/// Validates `rules` and orders them for emission.
///
/// Every check runs even after the first failure, so one invocation reports
/// every problem in the document.
///
/// # Errors
/// Returns [`ValidationError`] listing duplicates, unresolved references,
/// kind conflicts and dependency cycles.
pub fn validate(rules: RuleSet) -> Result<ValidatedRuleSet, ValidationError> {
    let mut violations = Vec::new();

    let kinds = check_uniqueness(&rules.declarations, &mut violations);
    check_references(&rules, &kinds, &mut violations);
    check_implication_kinds(&rules.implications, &kinds, &mut violations);
    let ranks = rank_rules(&rules).map_err(|cycles| violations.extend(cycles)).ok();

    match ranks {
        Some(ranks) if violations.is_empty() => {
            let validated = order_rules(rules, &ranks);
            tracing::info!(
                externals = validated.externals.len(),
                basics = validated.basics.len(),
                derived = validated.derived.len(),
                implications = validated.implications.len(),
                "Validated feature definitions"
            );
            Ok(validated)
        },
        _ => {
            tracing::debug!(count = violations.len(), "Feature definitions failed validation");
            Err(ValidationError { violations })
        },
    }
}

/// Records the first declaration of every name and reports redeclarations.
fn check_uniqueness<'a>(
    declarations: &'a [Declaration],
    violations: &mut Vec<Violation>,
) -> FxHashMap<&'a str, FeatureKind> {
    let mut first: FxHashMap<&str, &Declaration> = FxHashMap::default();

    for decl in declarations {
        let Some(earlier) = first.get(decl.name.as_str()).copied() else {
            first.insert(decl.name.as_str(), decl);
            continue;
        };

        let external_derived = matches!(
            (earlier.kind, decl.kind),
            (FeatureKind::External, FeatureKind::Derived) | (FeatureKind::Derived, FeatureKind::External)
        );
        violations.push(if external_derived {
            let derived_line = if decl.kind == FeatureKind::Derived { decl.line } else { earlier.line };
            Violation::KindConflict {
                name: decl.name.clone(),
                conflict: Conflict::ExternalDerived,
                line: derived_line,
            }
        } else {
            Violation::Duplicate {
                name: decl.name.clone(),
                kind: decl.kind,
                line: decl.line,
                first_kind: earlier.kind,
                first_line: earlier.line,
            }
        });
    }

    first.into_iter().map(|(name, decl)| (name, decl.kind)).collect()
}

fn check_references(
    rules: &RuleSet,
    kinds: &FxHashMap<&str, FeatureKind>,
    violations: &mut Vec<Violation>,
) {
    let mut reported: FxHashSet<(String, usize)> = FxHashSet::default();
    let mut check = |name: &FeatureName, rule: RuleKind, line: usize| {
        if !kinds.contains_key(name.as_str()) && reported.insert((name.to_string(), line)) {
            violations.push(Violation::Unresolved { name: name.clone(), rule, line });
        }
    };

    for rule in &rules.implications {
        check(&rule.antecedent, RuleKind::Implication, rule.line);
        check(&rule.consequent, RuleKind::Implication, rule.line);
    }
    for rule in &rules.derivations {
        for name in &rule.expr.references {
            check(name, RuleKind::Derivation, rule.line);
        }
    }
    for rule in &rules.requirements {
        check(&rule.feature, RuleKind::Requirement, rule.line);
        for name in &rule.expr.references {
            check(name, RuleKind::Requirement, rule.line);
        }
    }
}

/// Implications may not override externals, force derived features, or hang off
/// derived features (derivation blocks come after implication blocks).
fn check_implication_kinds(
    implications: &[ImplicationRule],
    kinds: &FxHashMap<&str, FeatureKind>,
    violations: &mut Vec<Violation>,
) {
    for rule in implications {
        let line = rule.line;
        match kinds.get(rule.consequent.as_str()) {
            Some(FeatureKind::External) => violations.push(Violation::KindConflict {
                name: rule.consequent.clone(),
                conflict: Conflict::ImpliedExternal { by: rule.antecedent.clone() },
                line,
            }),
            Some(FeatureKind::Derived) => violations.push(Violation::KindConflict {
                name: rule.consequent.clone(),
                conflict: Conflict::ImpliedDerived { by: rule.antecedent.clone() },
                line,
            }),
            Some(FeatureKind::Basic) | None => {},
        }
        if kinds.get(rule.antecedent.as_str()) == Some(&FeatureKind::Derived) {
            violations.push(Violation::KindConflict {
                name: rule.antecedent.clone(),
                conflict: Conflict::DerivedAntecedent { implies: rule.consequent.clone() },
                line,
            });
        }
    }
}

/// Topological rank of each implication's antecedent and each derived feature.
#[derive(Debug)]
struct Ranks {
    implications: Vec<usize>,
    derivations: Vec<usize>,
}

/// Builds the unified dependency graph (implication edges plus
/// "referenced -> derived" edges) and ranks every rule by it.
fn rank_rules(rules: &RuleSet) -> Result<Ranks, Vec<Violation>> {
    let mut graph = DependencyGraph::new(rules.declarations.iter().map(|d| &d.name));

    for rule in &rules.implications {
        graph.add_edge(rule.antecedent.as_str(), rule.consequent.as_str());
    }
    for rule in &rules.derivations {
        for name in &rule.expr.references {
            graph.add_edge(name.as_str(), rule.feature.as_str());
        }
    }

    let order = graph.topological_order().map_err(|cycles| {
        cycles
            .into_iter()
            .map(|members| Violation::Cycle {
                members: members.into_iter().map(|n| graph.name(n).clone()).collect(),
            })
            .collect::<Vec<_>>()
    })?;

    let mut rank = vec![0; order.len()];
    for (position, &node) in order.iter().enumerate() {
        rank[node] = position;
    }
    let rank_of = |name: &FeatureName| graph.position(name.as_str()).map_or(usize::MAX, |n| rank[n]);

    Ok(Ranks {
        implications: rules.implications.iter().map(|r| rank_of(&r.antecedent)).collect(),
        derivations: rules.derivations.iter().map(|r| rank_of(&r.feature)).collect(),
    })
}

fn order_rules(rules: RuleSet, ranks: &Ranks) -> ValidatedRuleSet {
    let by_kind = |kind: FeatureKind| -> Vec<FeatureName> {
        rules.declarations.iter().filter(|d| d.kind == kind).map(|d| d.name.clone()).collect()
    };
    let externals = by_kind(FeatureKind::External);
    let basics = by_kind(FeatureKind::Basic);
    let derived = by_kind(FeatureKind::Derived);

    let mut implications: Vec<(usize, usize, ImplicationRule)> = rules
        .implications
        .into_iter()
        .enumerate()
        .map(|(index, rule)| (ranks.implications[index], index, rule))
        .collect();
    implications.sort_by_key(|&(rank, index, _)| (rank, index));

    let mut seen = FxHashSet::default();
    let implications = implications
        .into_iter()
        .map(|(_, _, rule)| rule)
        .filter(|rule| {
            let fresh = seen.insert((rule.antecedent.clone(), rule.consequent.clone()));
            if !fresh {
                tracing::warn!(
                    line = rule.line,
                    "Ignoring repeated implication {} implies {}",
                    rule.antecedent,
                    rule.consequent
                );
            }
            fresh
        })
        .collect();

    let mut derivations: Vec<_> = rules.derivations.into_iter().enumerate().collect();
    derivations.sort_by_key(|(index, _)| ranks.derivations[*index]);

    ValidatedRuleSet {
        externals,
        basics,
        derived,
        implications,
        derivations: derivations.into_iter().map(|(_, rule)| rule).collect(),
        requirements: rules.requirements,
    }
}
