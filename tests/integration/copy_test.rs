//! Integration tests for copy-set decomposition and the batch job lifecycle.

use std::time::Duration;

use datacopy_core::ErrorKind;
use datacopy_core::config::AppConfig;
use datacopy_core::types::JobId;
use datacopy_entity::job::{CopyJobState, CopyJobStatus, JobSummary};
use tokio::time::Instant;

use crate::helpers::{TestEnv, uri};

#[tokio::test]
async fn test_decompose_files_and_folder() {
    let env = TestEnv::new();
    let a = env.store.add_file("src", "/run/fileA", 10, None);
    let b = env.store.add_file("src", "/run/fileB", 20, None);
    env.store.add_file("src", "/run/folderC/x.txt", 30, None);

    let plan = env
        .ctx
        .decomposer()
        .decompose(
            &[
                uri("icav2://src/run/fileA"),
                uri("icav2://src/run/fileB"),
                uri("icav2://src/run/folderC/"),
            ],
            &uri("icav2://dst/out/"),
        )
        .await
        .unwrap();

    assert_eq!(plan.source_data_list, vec![a.data_ref(), b.data_ref()]);
    assert_eq!(plan.recursive_copy_jobs_uri_list.len(), 1);
    assert_eq!(
        plan.recursive_copy_jobs_uri_list[0].destination_uri.to_string(),
        "icav2://dst/out/folderC/"
    );
    assert!(env.store.find("dst", "/out/").is_some());
}

#[tokio::test]
async fn test_recursive_walk_keeps_one_folder_per_job() {
    let env = TestEnv::new();
    env.store.add_file("src", "/run/top.txt", 1, None);
    env.store.add_file("src", "/run/sub/mid.txt", 2, None);
    env.store.add_file("src", "/run/sub/deep/leaf.txt", 3, None);

    let decomposer = env.ctx.decomposer();
    let mut pending = vec![(uri("icav2://src/run/"), uri("icav2://dst/out/run/"))];
    let mut plans = Vec::new();

    while let Some((source, destination)) = pending.pop() {
        let children = decomposer.expand_folder(&source).await.unwrap();
        let plan = decomposer.decompose(&children, &destination).await.unwrap();
        for job in &plan.recursive_copy_jobs_uri_list {
            pending.push((job.source_uri.clone(), job.destination_uri.clone()));
        }
        plans.push((destination.to_string(), plan));
    }

    assert_eq!(plans.len(), 3);
    let resolver = env.ctx.resolver();
    for (destination, plan) in &plans {
        assert_eq!(plan.source_data_list.len(), 1, "one file per level at {destination}");
        for data_ref in &plan.source_data_list {
            assert!(resolver.resolve_ref(data_ref).await.unwrap().is_file());
        }
    }
    assert!(env.store.find("dst", "/out/run/sub/deep/").is_some());
}

#[tokio::test]
async fn test_decompose_rejects_file_destination() {
    let env = TestEnv::new();
    env.store.add_file("src", "/run/fileA", 10, None);
    let err = env
        .ctx
        .decomposer()
        .decompose(&[uri("icav2://src/run/fileA")], &uri("icav2://dst/out"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidDestination);
}

#[tokio::test]
async fn test_job_lifecycle_with_one_retry() {
    let env = TestEnv::new();
    let destination = env.store.add_folder("dst", "/out/").data_ref();
    let sources = vec![env.store.add_file("src", "/run/fileA", 10, None).data_ref()];
    let lifecycle = env.ctx.lifecycle();

    let state = lifecycle.launch(&destination, &sources).await.unwrap();
    let persisted = serde_json::to_string(&state).unwrap();

    env.store
        .set_job_status(&JobId::new("job-1"), CopyJobStatus::Running);
    let state: CopyJobState = serde_json::from_str(&persisted).unwrap();
    let state = lifecycle.advance(state, &destination, &sources).await.unwrap();
    assert_eq!(state.status, JobSummary::Running);
    assert_eq!(state.wait_time_seconds, 20);

    env.store
        .set_job_status(&JobId::new("job-1"), CopyJobStatus::Stopped);
    let state = lifecycle.advance(state, &destination, &sources).await.unwrap();
    assert_eq!(state.job_id.as_str(), "job-2");
    assert_eq!(state.failed_job_list, vec![JobId::new("job-1")]);
    assert_eq!(state.attempt_count, 2);

    env.store
        .set_job_status(&JobId::new("job-2"), CopyJobStatus::Succeeded);
    let state = lifecycle.advance(state, &destination, &sources).await.unwrap();
    assert!(state.is_done());
    assert_eq!(env.store.submissions().len(), 2);
}

#[tokio::test]
async fn test_retries_exhausted_submits_nothing_more() {
    let mut config = AppConfig::default();
    config.job.max_attempts = 4;
    let env = TestEnv::with_config(config);
    let destination = env.store.add_folder("dst", "/out/").data_ref();
    let sources = vec![env.store.add_file("src", "/run/fileA", 10, None).data_ref()];
    let lifecycle = env.ctx.lifecycle();

    let mut state = lifecycle.launch(&destination, &sources).await.unwrap();
    let mut failures = 0;
    let err = loop {
        env.store.set_job_status(&state.job_id, CopyJobStatus::Failed);
        failures += 1;
        match lifecycle.advance(state, &destination, &sources).await {
            Ok(next) => state = next,
            Err(e) => break e,
        }
    };

    assert_eq!(err.kind, ErrorKind::JobRetriesExhausted);
    assert_eq!(failures, 4);
    assert_eq!(env.store.submissions().len(), 4);
}

#[tokio::test]
async fn test_original_state_keys_are_accepted() {
    let env = TestEnv::new();
    let destination = env.store.add_folder("dst", "/out/").data_ref();
    let sources = vec![env.store.add_file("src", "/run/fileA", 10, None).data_ref()];
    let lifecycle = env.ctx.lifecycle();
    lifecycle.launch(&destination, &sources).await.unwrap();

    let state: CopyJobState = serde_json::from_value(serde_json::json!({
        "job_id": "job-1",
        "wait_time_seconds": 10,
        "job_status": "RUNNING",
        "failed_job_list": []
    }))
    .unwrap();
    let next = lifecycle.advance(state, &destination, &sources).await.unwrap();
    assert_eq!(next.status, JobSummary::Running);
    assert_eq!(next.attempt_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_clears_partial_destination_once() {
    let env = TestEnv::new();
    let destination = env.store.add_folder("dst", "/out/").data_ref();
    let sources = vec![env.store.add_file("src", "/run/fileA", 10, None).data_ref()];
    let partial = env.store.add_partial_file("dst", "/out/fileA");
    env.store.add_partial_file("dst", "/out/unrelated");

    let start = Instant::now();
    env.ctx.lifecycle().submit(&destination, &sources).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(env.store.deleted(), vec![partial.data_id]);
    assert!(env.store.find("dst", "/out/unrelated").is_some());

    let start = Instant::now();
    env.ctx.lifecycle().submit(&destination, &sources).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(env.store.deleted().len(), 1);
}
