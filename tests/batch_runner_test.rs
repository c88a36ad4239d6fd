use batch_grader::error::{AppError, ConfigError, EngineError};
use batch_grader::infrastructure::seeded_rng;
use batch_grader::models::{Artifact, OracleFixture, Origin, RecordStatus, RubricInput, RunStatus};
use batch_grader::orchestrator::{ChannelObserver, NoopObserver, ProgressEvent};
use batch_grader::services::{CriterionRole, FixtureOracle, ScoreOracle};
use batch_grader::{BatchRunner, CancellationToken, SubmissionQueue};
use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use tokio_test::{assert_err, assert_ok};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn queue_of(count: usize, submitted_at: DateTime<Utc>) -> SubmissionQueue {
    let artifacts = (1..=count)
        .map(|i| Artifact::new(format!("f{}", i), format!("student{}.pdf", i), Origin::Drive, submitted_at))
        .collect();
    SubmissionQueue::from_artifacts(artifacts).unwrap()
}

fn essay_rubric() -> RubricInput {
    RubricInput::banded("medium").with_answer_key("参考范文")
}

fn runner(seed: u64) -> BatchRunner {
    BatchRunner::new(Box::new(FixtureOracle::random()), seeded_rng(seed))
}

/// 第 `cancel_at` 次判定时发出取消信号
struct CancellingOracle {
    calls: usize,
    cancel_at: usize,
    token: CancellationToken,
}

impl ScoreOracle for CancellingOracle {
    fn criterion_met(&mut self, _: &Artifact, _: usize, _: CriterionRole, _: &mut dyn RngCore) -> bool {
        self.calls += 1;
        if self.calls == self.cancel_at {
            self.token.cancel();
        }
        true
    }
}

#[tokio::test]
async fn cancel_after_two_of_five() {
    let mut queue = queue_of(5, day(1));
    let mut runner = runner(7);
    let token = CancellationToken::new();

    let cancel = token.clone();
    let mut observer = move |event: &ProgressEvent| {
        if event.completed == 2 {
            cancel.cancel();
        }
    };

    let status = assert_ok!(runner.start(&mut queue, &essay_rubric(), &token, &mut observer).await);

    assert_eq!(status, RunStatus::Aborted);
    let report = runner.report();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.run_status, RunStatus::Aborted);
    assert_eq!(report.progress_percent, 40.0);
    assert!(report.interrupted.is_none());
    assert_eq!(report.records[0].artifact_id, "f1");
    assert_eq!(report.records[1].artifact_id, "f2");
}

#[tokio::test]
async fn completed_run_reaches_full_progress_in_queue_order() {
    let mut queue = queue_of(4, day(1));
    let mut runner = runner(1);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut observer = ChannelObserver::new(tx);

    let status = assert_ok!(
        runner
            .start(&mut queue, &essay_rubric(), &CancellationToken::new(), &mut observer)
            .await
    );
    drop(observer);

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(runner.report().progress_percent, 100.0);

    let ids: Vec<_> = runner.report().records.iter().map(|r| r.artifact_id.as_str()).collect();
    assert_eq!(ids, ["f1", "f2", "f3", "f4"]);

    let mut percents = Vec::new();
    while let Some(event) = rx.recv().await {
        assert_eq!(event.total, 4);
        percents.push(event.percent);
    }
    assert_eq!(percents, vec![25.0, 50.0, 75.0, 100.0]);
}

#[tokio::test]
async fn same_seed_gives_identical_records() {
    let rubric = RubricInput::itemized(3, 4.0, 6.0).with_deadline(day(5)).with_late_penalty(20);

    let mut first = runner(2024);
    let mut second = runner(2024);
    assert_ok!(first.start(&mut queue_of(6, day(6)), &rubric, &CancellationToken::new(), &mut NoopObserver).await);
    assert_ok!(second.start(&mut queue_of(6, day(6)), &rubric, &CancellationToken::new(), &mut NoopObserver).await);

    assert_eq!(first.report().records, second.report().records);
}

#[tokio::test]
async fn no_deadline_is_never_late() {
    let mut runner = runner(3);
    let rubric = essay_rubric().with_late_penalty(50);
    assert_ok!(runner.start(&mut queue_of(5, day(28)), &rubric, &CancellationToken::new(), &mut NoopObserver).await);

    for record in &runner.report().records {
        assert!(!record.is_late);
        assert_eq!(record.final_score, record.raw_score);
        assert!(!record.explanation.starts_with("[逾期扣分"));
    }
}

#[tokio::test]
async fn late_submissions_are_penalised() {
    let mut runner = runner(11);
    let rubric = RubricInput::banded("easy")
        .with_answer_key("范文")
        .with_deadline(day(10))
        .with_late_penalty(50);
    assert_ok!(runner.start(&mut queue_of(5, day(11)), &rubric, &CancellationToken::new(), &mut NoopObserver).await);

    for record in &runner.report().records {
        assert!(record.is_late);
        let expected = ((record.raw_score * 0.5) * 10.0).round() / 10.0;
        assert_eq!(record.final_score, expected);
        assert!(record.final_score <= record.raw_score);
        assert!(record.explanation.starts_with("[逾期扣分 50%]"));
    }
}

#[tokio::test]
async fn itemized_totals_stay_in_range() {
    let mut runner = BatchRunner::new(Box::new(FixtureOracle::random().with_pass_rate(0.5)), seeded_rng(99));
    assert_ok!(
        runner
            .start(&mut queue_of(8, day(1)), &RubricInput::itemized(4, 3.0, 7.0), &CancellationToken::new(), &mut NoopObserver)
            .await
    );

    for record in &runner.report().records {
        let items = record.per_item.as_ref().unwrap();
        assert_eq!(items.len(), 4);
        for item in items {
            assert!((0.0..=10.0).contains(&item.total));
            assert!(((item.total * 10.0).round() - item.total * 10.0).abs() < 1e-9);
        }
        assert!((0.0..=40.0).contains(&record.raw_score));
    }
}

#[tokio::test]
async fn fixture_signals_drive_itemized_scores() {
    let oracle = FixtureOracle::new(&[OracleFixture {
        pattern: "student1".into(),
        signals: vec![true, false, false, true],
    }]);
    let mut runner = BatchRunner::new(Box::new(oracle), seeded_rng(5));
    assert_ok!(
        runner
            .start(&mut queue_of(1, day(1)), &RubricInput::itemized(2, 5.0, 5.0), &CancellationToken::new(), &mut NoopObserver)
            .await
    );

    let items = runner.report().records[0].per_item.clone().unwrap();
    assert_eq!((items[0].objective_score, items[0].practical_score, items[0].total), (5.0, 0.0, 5.0));
    assert_eq!(items[1].objective_score, 0.0);
    assert!((4.5..=5.0).contains(&items[1].practical_score));
    assert!((4.5..=5.0).contains(&items[1].total));
}

#[tokio::test]
async fn cancelling_between_items_keeps_in_flight_record_out() {
    let token = CancellationToken::new();
    let oracle = CancellingOracle {
        calls: 0,
        cancel_at: 1,
        token: token.clone(),
    };
    let mut runner = BatchRunner::new(Box::new(oracle), seeded_rng(8));
    let mut queue = queue_of(3, day(1));

    let status = assert_ok!(
        runner
            .start(&mut queue, &RubricInput::itemized(3, 5.0, 5.0), &token, &mut NoopObserver)
            .await
    );

    assert_eq!(status, RunStatus::Aborted);
    let report = runner.report();
    assert!(report.records.is_empty());
    assert_eq!(report.progress_percent, 0.0);

    let interrupted = report.interrupted.as_ref().unwrap();
    assert_eq!(interrupted.artifact_id, "f1");
    assert_eq!(interrupted.status(), RecordStatus::Aborted);
    assert_eq!(interrupted.per_item.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn pre_cancelled_token_scores_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let mut runner = runner(4);
    let mut queue = queue_of(3, day(1));

    let status = assert_ok!(runner.start(&mut queue, &essay_rubric(), &token, &mut NoopObserver).await);

    assert_eq!(status, RunStatus::Aborted);
    assert!(runner.report().records.is_empty());
    assert_eq!(runner.report().progress_percent, 0.0);
    assert_eq!(queue.pending_len(), 3);
}

#[tokio::test]
async fn invalid_rubric_leaves_runner_idle() {
    let mut runner = runner(1);
    let mut queue = queue_of(2, day(1));

    let err = assert_err!(
        runner
            .start(&mut queue, &RubricInput::itemized(0, 5.0, 5.0), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert!(matches!(err, AppError::Config(ConfigError::InvalidItemCount { item_count: 0 })));
    assert_eq!(runner.state(), RunStatus::Idle);
    assert_eq!(queue.pending_len(), 2);

    let err = assert_err!(
        runner
            .start(&mut queue, &RubricInput::banded("hard"), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert!(matches!(err, AppError::Config(ConfigError::MissingReference { .. })));
    assert_eq!(runner.state(), RunStatus::Idle);
}

#[tokio::test]
async fn huge_item_count_is_a_config_error() {
    let mut runner = runner(1);
    let mut queue = queue_of(1, day(1));

    let err = assert_err!(
        runner
            .start(&mut queue, &RubricInput::itemized(i64::MAX, 1.0, 1.0), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert!(matches!(err, AppError::Config(ConfigError::InvalidItemCount { item_count: i64::MAX })));
    assert_eq!(runner.state(), RunStatus::Idle);
    assert_eq!(queue.pending_len(), 1);
}

#[tokio::test]
async fn restart_requires_reset_and_skips_started_artifacts() {
    let mut runner = runner(6);
    let mut queue = queue_of(5, day(1));
    let token = CancellationToken::new();

    let cancel = token.clone();
    let mut stop_after_first = move |_: &ProgressEvent| cancel.cancel();
    assert_ok!(runner.start(&mut queue, &essay_rubric(), &token, &mut stop_after_first).await);
    assert_eq!(runner.state(), RunStatus::Aborted);

    let err = assert_err!(
        runner
            .start(&mut queue, &essay_rubric(), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert!(matches!(err, AppError::Engine(EngineError::InvalidState { .. })));

    let locked = assert_err!(queue.remove("f1"));
    assert_eq!(locked, EngineError::ArtifactLocked { artifact_id: "f1".into() });
    assert_eq!(assert_ok!(queue.remove("f5")).map(|a| a.id), Some("f5".to_string()));

    assert_ok!(runner.reset());
    assert_eq!(runner.state(), RunStatus::Idle);
    assert!(runner.report().records.is_empty());

    let status = assert_ok!(
        runner
            .start(&mut queue, &essay_rubric(), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert_eq!(status, RunStatus::Completed);
    let ids: Vec<_> = runner.report().records.iter().map(|r| r.artifact_id.as_str()).collect();
    assert_eq!(ids, ["f2", "f3", "f4"]);
    assert_eq!(queue.pending_len(), 0);
}

#[tokio::test]
async fn empty_queue_completes_immediately() {
    let mut runner = runner(1);
    let status = assert_ok!(
        runner
            .start(&mut SubmissionQueue::new(), &essay_rubric(), &CancellationToken::new(), &mut NoopObserver)
            .await
    );
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(runner.report().progress_percent, 100.0);
}
