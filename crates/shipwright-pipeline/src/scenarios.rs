//! Whole-engine behaviour over mock collaborators and a real temp project.

use std::fs;
use std::path::PathBuf;

use shipwright_core::{
    ErrorKind, FileAction, Feature, IngressEvent, OverallStatus, RunHistory, StageId,
    StageOutcome, TestResult, WorkflowRecord,
};

use crate::engine::PipelineEngine;
use crate::error::EngineError;
use crate::mocks::{
    FailingStage, MockDeployer, MockHealthCheck, MockSetup, MockTestRunner, ORIGINAL_APP_CSS,
    ORIGINAL_APP_JSX, PanickingStage, ScriptedCodeGenerator, setup_project,
};
use crate::stage::Stage;
use crate::stages::{AuditStage, VerifyStage};
use crate::transition::{Checkpoint, Guard, TransitionTable};

fn search_event() -> IngressEvent {
    IngressEvent::new("SHIP-1", "Task search")
        .with_type("Story")
        .with_description("needs search")
}

fn visits(record: &WorkflowRecord, stage: StageId) -> Vec<StageOutcome> {
    record
        .stage_log()
        .iter()
        .filter(|v| v.stage == stage)
        .map(|v| v.outcome)
        .collect()
}

fn executed_audits(record: &WorkflowRecord) -> usize {
    visits(record, StageId::Audit)
        .into_iter()
        .filter(|o| *o != StageOutcome::Skipped)
        .count()
}

#[test]
fn search_request_runs_to_success() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new();
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    let requirements = record
        .requirements()
        .ok_or_else(|| anyhow::anyhow!("no requirements"))?;
    assert!(requirements.has_feature(Feature::Search));
    assert!(
        record
            .generated_artifacts()
            .keys()
            .any(|p| p.starts_with("frontend/src/components"))
    );
    assert!(dir.path().join("frontend/src/components/SearchBar.jsx").is_file());
    assert!(record.errors().is_empty());
    assert_eq!(record.overall_status(), Some(OverallStatus::Success));
    assert_eq!(executed_audits(&record), 1);
    assert!(
        record
            .stage_log()
            .iter()
            .all(|v| v.outcome == StageOutcome::Completed)
    );
    assert_eq!(record.stage_log().len(), StageId::ALL.len());
    Ok(())
}

#[test]
fn unverified_event_is_audited_without_touching_files() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new();
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(IngressEvent::new("", "Task search")))?;

    assert_eq!(record.overall_status(), Some(OverallStatus::CriticalFailure));
    assert!(record.file_changes().is_empty());
    assert_eq!(record.errors().len(), 1);
    assert_eq!(record.errors()[0].kind, ErrorKind::Verification);
    assert!(!dir.path().join("backups").exists());
    assert_eq!(mocks.generator.calls(), 0);
    for stage in &StageId::ALL[1..8] {
        assert_eq!(visits(&record, *stage), vec![StageOutcome::Skipped]);
    }
    assert_eq!(executed_audits(&record), 1);
    Ok(())
}

#[test]
fn failed_tests_skip_deploy_and_keep_files() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new().with_test_runner(MockTestRunner::with_results(vec![
        TestResult {
            suite: "SearchBar".to_string(),
            passed: 0,
            failed: 2,
            output: Some("expected input".to_string()),
        },
    ]));
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert_eq!(record.files_written(), 3);
    assert!(!record.tests_passed());
    assert!(!record.deployment_attempted());
    assert!(!record.rollback_triggered());
    assert_eq!(visits(&record, StageId::Deploy), vec![StageOutcome::Skipped]);
    assert_eq!(
        visits(&record, StageId::RollbackGuard),
        vec![StageOutcome::Skipped]
    );
    assert!(matches!(
        record.overall_status(),
        Some(OverallStatus::PartialSuccess | OverallStatus::Failed)
    ));
    for change in record.file_changes() {
        assert_eq!(
            fs::read_to_string(dir.path().join(change.path()))?,
            format!("// {}\n", change.path().display())
        );
    }
    assert_eq!(mocks.deployer.calls(), 0);
    Ok(())
}

#[test]
fn unhealthy_deployment_is_rolled_back() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new()
        .with_health_check(MockHealthCheck::reporting(["p95 latency above threshold"]));
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert!(record.deployment_successful());
    assert!(record.rollback_triggered());
    assert_eq!(
        fs::read_to_string(dir.path().join("frontend/src/App.jsx"))?,
        ORIGINAL_APP_JSX
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("frontend/src/App.css"))?,
        ORIGINAL_APP_CSS
    );
    assert!(!dir.path().join("frontend/src/components/SearchBar.jsx").exists());
    assert!(record.errors().iter().any(|e| e.kind == ErrorKind::Health));
    assert!(
        record
            .rollback()
            .is_some_and(|summary| summary.is_clean() && summary.removed == 1)
    );
    assert_eq!(record.overall_status(), Some(OverallStatus::PartialSuccess));
    Ok(())
}

#[test]
fn finished_runs_release_their_file_bookkeeping() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(
        MockSetup::new()
            .with_health_check(MockHealthCheck::reporting(["error rate above 5%"]))
            .context(dir.path()),
    );

    for _ in 0..5 {
        let record = engine.run(WorkflowRecord::new(search_event()))?;
        assert!(record.rollback_triggered());
    }

    assert_eq!(engine.context().files().active_traces(), 0);
    Ok(())
}

#[test]
fn failed_deployment_is_rolled_back() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new().with_deployer(MockDeployer::always_failing());
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert!(record.deployment_attempted());
    assert!(!record.deployment_successful());
    assert!(record.rollback_triggered());
    assert_eq!(mocks.deployer.calls(), 2);
    assert!(!dir.path().join("frontend/src/components/SearchBar.jsx").exists());
    assert_ne!(record.overall_status(), Some(OverallStatus::Success));
    Ok(())
}

#[test]
fn generation_failure_without_output_is_critical() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks =
        MockSetup::new().with_generator(ScriptedCodeGenerator::new().always_failing());
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert_eq!(record.overall_status(), Some(OverallStatus::CriticalFailure));
    assert!(record.file_changes().is_empty());
    assert_eq!(visits(&record, StageId::Persist), vec![StageOutcome::Completed]);
    assert_eq!(visits(&record, StageId::Test), vec![StageOutcome::Skipped]);
    Ok(())
}

#[test]
fn modified_files_keep_their_original_as_backup() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(MockSetup::new().context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    let originals = [
        (PathBuf::from("frontend/src/App.jsx"), ORIGINAL_APP_JSX),
        (PathBuf::from("frontend/src/App.css"), ORIGINAL_APP_CSS),
    ];
    for change in record
        .file_changes()
        .iter()
        .filter(|c| c.action() == FileAction::Modified)
    {
        let backup = change
            .backup_path()
            .ok_or_else(|| anyhow::anyhow!("modified change without backup"))?;
        let (_, original) = originals
            .iter()
            .find(|(path, _)| path == change.path())
            .ok_or_else(|| anyhow::anyhow!("unexpected change {}", change.path().display()))?;
        assert_eq!(fs::read_to_string(dir.path().join(backup))?, *original);
        assert!(backup.starts_with(format!("backups/{}", record.trace_id())));
    }
    Ok(())
}

#[test]
fn every_failure_path_audits_exactly_once() -> anyhow::Result<()> {
    let setups = vec![
        MockSetup::new(),
        MockSetup::new().with_generator(ScriptedCodeGenerator::new().always_failing()),
        MockSetup::new().with_test_runner(MockTestRunner::failing()),
        MockSetup::new().with_deployer(MockDeployer::always_failing()),
        MockSetup::new().with_health_check(MockHealthCheck::failing()),
        MockSetup::new().with_failing_commit(),
        MockSetup::new().with_failing_tracker(),
    ];

    for mocks in setups {
        let dir = setup_project()?;
        let engine = PipelineEngine::new(mocks.context(dir.path()));

        let record = engine.run(WorkflowRecord::new(search_event()))?;

        assert!(record.is_final());
        assert_eq!(executed_audits(&record), 1);
        assert_eq!(mocks.reports.writes().len(), 1);
    }
    Ok(())
}

#[test]
fn panicking_stage_is_a_framework_fault() -> anyhow::Result<()> {
    for stage in &StageId::ALL[..8] {
        let dir = setup_project()?;
        let engine = PipelineEngine::new(MockSetup::new().context(dir.path()))
            .with_stage(Box::new(PanickingStage(*stage)));

        let record = engine.run(WorkflowRecord::new(search_event()))?;

        assert_eq!(visits(&record, *stage), vec![StageOutcome::Faulted]);
        assert!(
            record
                .errors()
                .iter()
                .any(|e| e.kind == ErrorKind::Framework && e.message.contains("blew up"))
        );
        assert_eq!(executed_audits(&record), 1);
        assert!(record.is_final());
    }
    Ok(())
}

#[test]
fn erroring_stage_routes_straight_to_audit() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(MockSetup::new().context(dir.path()))
        .with_stage(Box::new(FailingStage(StageId::Test)));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert_eq!(visits(&record, StageId::Test), vec![StageOutcome::Faulted]);
    assert_eq!(visits(&record, StageId::Deploy), vec![StageOutcome::Skipped]);
    assert!(!record.deployment_attempted());
    assert_eq!(executed_audits(&record), 1);
    Ok(())
}

#[test]
fn faulting_audit_still_finalizes() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(MockSetup::new().context(dir.path()))
        .with_stage(Box::new(PanickingStage(StageId::Audit)));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert!(record.is_final());
    assert_eq!(visits(&record, StageId::Audit), vec![StageOutcome::Faulted]);
    let report = record.report().ok_or_else(|| anyhow::anyhow!("no report"))?;
    assert!(report.report_path.is_none());
    Ok(())
}

#[test]
fn finalized_record_is_not_run_again() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(MockSetup::new().context(dir.path()));
    let record = engine.run(WorkflowRecord::new(search_event()))?;

    let result = engine.run(record);

    assert!(matches!(result, Err(EngineError::AlreadyFinalized { .. })));
    Ok(())
}

#[test]
fn run_history_refuses_duplicate_traces() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let engine = PipelineEngine::new(MockSetup::new().context(dir.path()));
    let mut history = RunHistory::new();
    let record = WorkflowRecord::new(search_event());
    let duplicate = WorkflowRecord::with_trace_id(record.trace_id(), search_event());

    let finished = engine.run_recorded(&mut history, record)?;
    let result = engine.run_recorded(&mut history, duplicate);

    assert!(matches!(result, Err(EngineError::Record(_))));
    assert_eq!(history.len(), 1);
    let summary = history
        .get(finished.trace_id())
        .ok_or_else(|| anyhow::anyhow!("missing summary"))?;
    assert_eq!(summary.overall_status, OverallStatus::Success);
    Ok(())
}

#[test]
fn missing_stage_is_an_engine_error() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let stages: Vec<Box<dyn Stage>> = vec![Box::new(VerifyStage), Box::new(AuditStage)];
    let engine = PipelineEngine::from_stages(MockSetup::new().context(dir.path()), stages);

    let result = engine.run(WorkflowRecord::new(search_event()));

    assert!(matches!(
        result,
        Err(EngineError::StageNotRegistered {
            stage: StageId::Analyze
        })
    ));
    Ok(())
}

#[test]
fn shortened_table_runs_only_its_stages() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let stages: Vec<Box<dyn Stage>> = vec![Box::new(VerifyStage), Box::new(AuditStage)];
    let table = TransitionTable::new(
        vec![StageId::Verify, StageId::Audit],
        vec![Checkpoint {
            after: StageId::Verify,
            guard: Guard::VerificationFailed,
            target: StageId::Audit,
        }],
    )?;
    let engine = PipelineEngine::from_stages(MockSetup::new().context(dir.path()), stages)
        .with_transitions(table);

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    assert_eq!(record.stage_log().len(), 2);
    assert_eq!(record.overall_status(), Some(OverallStatus::CriticalFailure));
    Ok(())
}

#[test]
fn tracker_sees_progress_and_summary() -> anyhow::Result<()> {
    let dir = setup_project()?;
    let mocks = MockSetup::new();
    let engine = PipelineEngine::new(mocks.context(dir.path()));

    let record = engine.run(WorkflowRecord::new(search_event()))?;

    let updates = mocks.tracker.updates();
    assert_eq!(updates.len(), record.trace_log().len());
    assert!(updates.iter().all(|(key, _, _)| key == "SHIP-1"));
    let comments = mocks.tracker.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].1.contains("SUCCESS"));
    Ok(())
}
