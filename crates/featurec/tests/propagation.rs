//! Runs generated artifacts through a preprocessor model and checks the
//! guarantees the host build relies on.

mod support;

use chrono::{TimeZone, Utc};
use featurec::{Artifacts, EmitOptions, compile};
use support::{Outcome, Preprocessor};

const BUILD_CONFIG: &str = "cmake_config.hpp";
const USER_CONFIG: &str = "myconfig-final.hpp";
const CONFIG_HEADER: &str = "config.hpp";

fn artifacts(defs: &str) -> Artifacts {
    compile(defs, &EmitOptions::default()).expect("definitions should compile")
}

/// Preprocesses the header with the given build-system and user configs.
fn run_header(artifacts: &Artifacts, build: &str, user: &str) -> Outcome {
    Preprocessor::new()
        .file(BUILD_CONFIG, build)
        .file(USER_CONFIG, user)
        .run(&artifacts.header)
}

/// Preprocesses the source unit, which pulls in the header through `config.hpp`.
fn run_source(artifacts: &Artifacts, build: &str, user: &str) -> Outcome {
    Preprocessor::new()
        .file(BUILD_CONFIG, build)
        .file(USER_CONFIG, user)
        .file(CONFIG_HEADER, &artifacts.header)
        .run(&artifacts.source)
}

#[test]
fn implications_propagate_transitively_in_one_pass() {
    let out = artifacts("external E\nA\nB\nC\nA implies B\nB implies C\n");
    let result = run_header(&out, "#define E\n#define A\n", "");

    for name in ["E", "A", "B", "C"] {
        assert!(result.is_defined(name), "{name} should be defined");
    }
    assert!(result.warnings.is_empty());
}

#[test]
fn propagation_does_not_depend_on_declaration_order() {
    let out = artifacts("C\nB\nA\nB implies C\nA implies B\n");
    let result = run_header(&out, "", "#define A\n");

    assert!(result.is_defined("B"));
    assert!(result.is_defined("C"));
}

#[test]
fn implications_only_switch_features_on() {
    let out = artifacts("A\nB\nC\nA implies B\nB implies C\n");
    let result = run_header(&out, "", "#define B\n");

    assert!(!result.is_defined("A"));
    assert!(result.is_defined("C"));
}

#[test]
fn user_config_cannot_enable_externals() {
    let out = artifacts("external FFTW\nexternal CUDA\n");
    let result = run_header(&out, "#define CUDA\n", "#define FFTW\n#define CUDA\n");

    assert!(!result.is_defined("FFTW"));
    assert!(result.is_defined("CUDA"));
}

#[test]
fn derived_feature_follows_its_expression() {
    let out = artifacts("A\nB\nD equals (A && B)\n");

    let both = run_header(&out, "", "#define A\n#define B\n");
    assert!(both.is_defined("D"));
    assert!(both.warnings.is_empty());

    let one = run_header(&out, "", "#define A\n");
    assert!(!one.is_defined("D"));
}

#[test]
fn manually_set_derived_feature_warns_once() {
    let out = artifacts("A\nB\nD equals (A && B)\n");
    let result = run_header(&out, "", "#define A\n#define B\n#define D\n");

    assert_eq!(result.warnings, ["D is a derived switch and should not be set manually!"]);
    assert!(result.is_defined("D"));
    assert!(result.errors.is_empty());
}

#[test]
fn derived_feature_sees_implied_features() {
    let out = artifacts("A\nB\nA implies B\nD equals B\n");
    let result = run_header(&out, "", "#define A\n");

    assert!(result.is_defined("D"));
}

#[test]
fn unmet_requirement_fails_the_source_unit() {
    let out = artifacts("A\nB\nR\nR requires (A || B)\n");

    let failed = run_source(&out, "", "#define R\n");
    assert_eq!(failed.errors.len(), 1);
    let message = &failed.errors[0];
    assert!(message.contains('R'));
    assert!(message.contains("A || B"), "unexpected message: {message}");

    let satisfied = run_source(&out, "", "#define R\n#define B\n");
    assert!(satisfied.errors.is_empty());

    let unused = run_source(&out, "", "");
    assert!(unused.errors.is_empty());
}

#[test]
fn requirements_see_propagated_features() {
    let out = artifacts("A\nB\nR\nA implies B\nR requires B\n");
    let result = run_source(&out, "", "#define R\n#define A\n");

    assert!(result.errors.is_empty());
}

#[test]
fn reflection_table_lists_exactly_the_enabled_features() {
    let defs = "external E\nexternal X\nA\nB\nC\nA implies B\nD equals B or C\n";
    let out = artifacts(defs);
    let result = run_source(&out, "#define E\n", "#define A\n#define X\n");

    let mut listed = result.table_entries();
    listed.sort();
    assert_eq!(listed, ["A", "B", "D", "E"]);

    let declared = ["E", "X", "A", "B", "C", "D"];
    for name in declared {
        assert_eq!(listed.contains(&name.to_owned()), result.is_defined(name), "{name}");
    }
}

#[test]
fn output_is_idempotent_for_a_fixed_timestamp() {
    let defs = "external E\nA\nB\nA implies B\nD equals A\nA requires E\n";
    let options = EmitOptions {
        timestamp: Some(Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap()),
        ..EmitOptions::default()
    };

    let first = compile(defs, &options).unwrap();
    let second = compile(defs, &options).unwrap();
    assert_eq!(first, second);
    assert!(first.header.contains("featurec on Sun Oct 18 09:05:00 2026"));
}

#[test]
fn header_is_include_guarded() {
    let out = artifacts("A\n");
    let twice = format!("{}\n{}", out.header, out.header);
    let result = Preprocessor::new().file(USER_CONFIG, "#define A\n").run(&twice);

    assert!(result.is_defined("A"));
    assert_eq!(
        result.text.iter().filter(|line| line.starts_with("extern const char*")).count(),
        1
    );
}
