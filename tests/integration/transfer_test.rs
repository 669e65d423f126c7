//! Integration tests for classification and idempotent single-object uploads.

use std::time::Duration;

use datacopy_core::ErrorKind;
use datacopy_core::types::S3Uri;
use datacopy_entity::transfer::{TransferOutcome, TransferStrategy};
use tokio::time::Instant;

use crate::helpers::TestEnv;

#[tokio::test]
async fn test_partition_by_tag_pattern() {
    let env = TestEnv::new();
    let multi = env.store.add_file("src", "/run/a.bam", 10, Some("a1b2c3-5")).data_ref();
    let single = env.store.add_file("src", "/run/b.txt", 1, Some("a1b2c3d4e5f6")).data_ref();

    let partition = env
        .ctx
        .classifier()
        .partition(&[multi.clone(), single.clone()])
        .await
        .unwrap();
    assert_eq!(partition.multi_part_data_list, vec![multi]);
    assert_eq!(partition.single_part_data_list, vec![single]);

    let json = serde_json::to_value(&partition).unwrap();
    assert!(json.get("multiPartDataList").is_some());
    assert!(json.get("singlePartDataList").is_some());
}

#[tokio::test]
async fn test_second_upload_is_skip() {
    let env = TestEnv::new();
    let source = env.store.add_file("src", "/run/fileA", 42, None).data_ref();
    let folder = env.store.add_folder("dst", "/out/").data_ref();
    let transfers = env.ctx.transfers();

    assert_eq!(
        transfers.upload_single_part(&source, &folder).await.unwrap(),
        TransferOutcome::Success
    );
    assert_eq!(
        transfers.upload_single_part(&source, &folder).await.unwrap(),
        TransferOutcome::Skip
    );
    assert_eq!(env.transfer_count(), 1);
}

#[tokio::test]
async fn test_existing_identical_size_moves_zero_bytes() {
    let env = TestEnv::new();
    let source = env.store.add_file("src", "/run/fileA", 42, None).data_ref();
    let folder = env.store.add_folder("dst", "/out/").data_ref();
    env.store.add_file("dst", "/out/fileA", 42, None);

    let outcome = env
        .ctx
        .transfers()
        .upload_single_part(&source, &folder)
        .await
        .unwrap();
    assert_eq!(outcome, TransferOutcome::Skip);
    assert_eq!(env.transfer_count(), 0);
    assert_eq!(env.bytes_streamed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_existing_partial_is_deleted_then_uploaded() {
    let env = TestEnv::new();
    let source = env.store.add_file("src", "/run/fileA", 42, None).data_ref();
    let folder = env.store.add_folder("dst", "/out/").data_ref();
    let partial = env.store.add_partial_file("dst", "/out/fileA");

    let start = Instant::now();
    let outcome = env
        .ctx
        .transfers()
        .upload_single_part(&source, &folder)
        .await
        .unwrap();

    assert_eq!(outcome, TransferOutcome::Success);
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(env.store.deleted(), vec![partial.data_id]);
    assert_eq!(env.pipe.count(), 1);
    assert_eq!(env.store.find("dst", "/out/fileA").unwrap().size(), 42);
}

#[tokio::test]
async fn test_conflicting_destination_is_fatal() {
    let env = TestEnv::new();
    let source = env.store.add_file("src", "/run/fileA", 42, None).data_ref();
    let folder = env.store.add_folder("dst", "/out/").data_ref();
    env.store.add_file("dst", "/out/fileA", 41, None);

    let err = env
        .ctx
        .transfers()
        .upload_single_part(&source, &folder)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DestinationConflict);
    assert_eq!(env.transfer_count(), 0);
}

#[tokio::test]
async fn test_external_uploads_choose_strategy_by_tag() {
    let env = TestEnv::new();
    env.external.insert("s3://lab/run/small.txt", 100, "5d41402abc4b2a76");
    env.external.insert("s3://lab/run/large.bam", 80_000_000, "5d41402abc4b2a76-10");
    let folder = env.store.add_folder("dst", "/out/").data_ref();
    let external = env.ctx.external_transfers();

    let small = S3Uri::parse("s3://lab/run/small.txt").unwrap();
    let large = S3Uri::parse("s3://lab/run/large.bam").unwrap();
    let large_metadata = external.source_metadata(&large).await.unwrap();
    assert!(large_metadata.is_multipart_file);

    external.upload_external(&small, &folder, None).await.unwrap();
    external
        .upload_external(&large, &folder, Some(large_metadata))
        .await
        .unwrap();

    assert_eq!(env.pipe.count(), 1);
    let streamed = env.stream.transfers();
    assert_eq!(streamed.len(), 1);
    assert_eq!(streamed[0].strategy, TransferStrategy::SizeAwareStream);
    assert!(streamed[0].had_credentials);
    assert_eq!(env.store.find("dst", "/out/large.bam").unwrap().size(), 80_000_000);

    let again = external.upload_external(&large, &folder, None).await.unwrap();
    assert_eq!(again, TransferOutcome::Skip);
    assert_eq!(env.stream.count(), 1);
}
