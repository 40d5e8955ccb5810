// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use flowprobe::domain::models::verdict::{FlowVerdict, RunReport, StepState, StepVerdict, Tier};
use flowprobe::utils::errors::FailureKind;

fn passed_step(name: &str) -> StepVerdict {
    StepVerdict {
        step_name: name.to_string(),
        state: StepState::Passed,
        elapsed_ms: 42,
        status_code: Some(200),
        matched_keywords: vec!["perfil".to_string()],
        evaluations: Vec::new(),
        failure_kind: None,
        failure_reason: None,
    }
}

#[test]
fn test_report_serializes_states_and_kinds() {
    let flow = FlowVerdict::from_steps(
        "integracion",
        vec![
            passed_step("registro"),
            StepVerdict::skipped(
                "login",
                FailureKind::Precondition,
                "skipped: step 'registro' did not pass".to_string(),
            ),
        ],
    );
    let report = RunReport::new(Tier::Integration, Utc::now(), vec![flow]);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["tier"], "integration");
    assert_eq!(json["passed"], false);
    assert_eq!(json["flows"][0]["state"], "FAILED");
    assert_eq!(json["flows"][0]["steps"][0]["state"], "PASSED");
    assert_eq!(json["flows"][0]["steps"][1]["failure_kind"], "precondition");
    assert!(json["run_id"].as_str().unwrap().len() == 36);
}

#[test]
fn test_flow_fails_on_any_non_passing_step() {
    let mut failed = passed_step("perfil");
    failed.state = StepState::Failed;
    failed.failure_kind = Some(FailureKind::EmptyCorpus);

    let flow = FlowVerdict::from_steps("usabilidad", vec![passed_step("registro"), failed]);
    assert_eq!(flow.state, StepState::Failed);
    assert_eq!(flow.first_failure().unwrap().step_name, "perfil");
}

#[test]
fn test_all_passing_flows_make_passing_report() {
    let flow = FlowVerdict::from_steps("leer_carga", vec![passed_step("leer_carga")]);
    let report = RunReport::new(Tier::Unit, Utc::now(), vec![flow]);
    assert!(report.passed);
}
