//! End-to-end workflow checks against a real project directory.

mod common;

use common::{TestProject, APPROVED_STACK};
use indoc::indoc;
use phasegate::core::ViolationKind;
use phasegate::io::RealFileSystem;
use phasegate::orchestrator::{ComplianceOrchestrator, EditOperation};
use phasegate::phases::{NextAction, PhaseState};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CHECKOUT: &str = indoc! {r#"
    import os
    import requests


    def total(items):
        return sum(item.price for item in items)
"#};

const CHECKOUT_TESTS: &str = indoc! {r#"
    from checkout import total


    def test_total_sums_prices():
        assert total([]) == 0
"#};

fn orchestrator(project: &TestProject) -> ComplianceOrchestrator {
    ComplianceOrchestrator::from_config(project.config(), Arc::new(RealFileSystem::new())).unwrap()
}

#[test]
fn test_fresh_project_starts_with_product_manager() {
    let project = TestProject::new();
    let status = orchestrator(&project).status().unwrap();

    assert_eq!(status.project_name, "shop");
    assert_eq!(status.current_phase, 0);
    assert_eq!(status.completion_percentage, 0.0);
    assert_eq!(
        status.next_action,
        Some(NextAction::Execute {
            phase: "product-manager".to_string()
        })
    );
    assert!(status.phases.iter().all(|p| p.state == PhaseState::NotStarted));
    assert!(!status.ready_for_downstream);
}

#[test]
fn test_design_phases_unlock_in_order() {
    let project = TestProject::new();
    let gate = orchestrator(&project);

    assert!(!gate.check_agent_readiness("solution-architect").unwrap().passed);
    let blocked = gate
        .check_edit(Path::new("docs/design/shop/architecture_guide.md"), EditOperation::Create)
        .unwrap();
    assert!(!blocked.allowed);

    project.complete_phase("product-manager");
    assert!(gate.check_agent_readiness("solution-architect").unwrap().passed);

    project.complete_phase("solution-architect");
    project.complete_phase("ux-designer");
    let data = gate.check_agent_readiness("data-architect").unwrap();
    assert!(!data.passed);
    assert!(data
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::MissingAllowList));

    project.approve(APPROVED_STACK);
    assert!(gate.check_agent_readiness("data-architect").unwrap().passed);

    let status = gate.status().unwrap();
    assert_eq!(status.current_phase, 3);
    assert_eq!(
        status.next_action,
        Some(NextAction::Execute {
            phase: "visual-style-specialist".to_string()
        })
    );
}

#[test]
fn test_all_design_phases_make_project_ready_for_downstream() {
    let project = TestProject::new();
    project.approve(APPROVED_STACK);
    for phase in [
        "product-manager",
        "solution-architect",
        "ux-designer",
        "visual-style-specialist",
        "data-architect",
        "senior-api-developer",
        "project-planner",
    ] {
        project.complete_phase(phase);
    }

    let gate = orchestrator(&project);
    let status = gate.status().unwrap();
    assert!(status.ready_for_downstream);
    assert_eq!(status.current_phase, 7);
    assert!(gate.validate_phase_completion(7).passed);
    assert!(!gate.validate_phase_completion(8).passed);
}

#[test]
fn test_test_first_round_trip() {
    let project = TestProject::new();
    let gate = orchestrator(&project);
    let unit = PathBuf::from("src/checkout.py");

    assert!(!gate.can_edit(&unit, EditOperation::Create).unwrap());

    project.write("src/tests/test_checkout.py", CHECKOUT_TESTS);
    assert!(gate.can_edit(&unit, EditOperation::Create).unwrap());

    project.write("src/checkout.py", CHECKOUT);
    let verdict = gate.validate_unit(&unit, CHECKOUT);
    assert!(verdict.compliant, "{:?}", verdict.violations);
}

#[test]
fn test_commit_blocks_untested_unit() {
    let project = TestProject::new();
    project.write("src/checkout.py", CHECKOUT);

    let verdict = orchestrator(&project)
        .can_commit(&[PathBuf::from("src/checkout.py")])
        .unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.coverage_percent, None);
    assert_eq!(verdict.violations[0].kind, ViolationKind::MissingTests);
}

#[test]
fn test_commit_checks_dependencies_against_allow_list() {
    let project = TestProject::new();
    project.approve(APPROVED_STACK);
    project.write("src/tests/test_checkout.py", CHECKOUT_TESTS);
    project.write("src/checkout.py", CHECKOUT);
    let gate = orchestrator(&project);

    let verdict = gate.can_commit(&[PathBuf::from("src/checkout.py")]).unwrap();
    assert!(verdict.passed, "{:?}", verdict.violations);

    project.write("src/checkout.py", &format!("import flask\n{CHECKOUT}"));
    let verdict = gate.can_commit(&[PathBuf::from("src/checkout.py")]).unwrap();
    assert!(!verdict.passed);
    let unauthorized: Vec<_> = verdict
        .violations
        .iter()
        .filter(|v| v.kind == ViolationKind::UnauthorizedDependency)
        .collect();
    assert_eq!(unauthorized.len(), 1);
    assert_eq!(unauthorized[0].line, Some(1));
}

#[test]
fn test_validate_dependencies_requires_allow_list() {
    let project = TestProject::new();
    project.write("requirements.txt", "fastapi==0.110\n");
    let gate = orchestrator(&project);

    assert!(gate
        .validate_dependencies(&[PathBuf::from("requirements.txt")])
        .is_err());

    project.approve(APPROVED_STACK);
    let violations = gate
        .validate_dependencies(&[PathBuf::from("requirements.txt")])
        .unwrap();
    assert!(violations.is_empty());
}
