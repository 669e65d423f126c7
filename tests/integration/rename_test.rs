//! Integration tests for rename mapping and the rename two-step commit.

use datacopy_core::ErrorKind;
use datacopy_entity::data::DataRef;
use datacopy_entity::rename::RenameMappingRequest;
use datacopy_entity::transfer::TransferOutcome;

use crate::helpers::{TestEnv, uri};

fn mapping_request(data_id: &str, output: &str) -> RenameMappingRequest {
    serde_json::from_value(serde_json::json!({
        "sourceUriList": ["icav2://src/run/fileA", "icav2://src/run/folderC/"],
        "externalSourceUriList": [],
        "destinationUri": "icav2://dst/out/",
        "dataId": data_id,
        "outputFileName": output
    }))
    .unwrap()
}

#[tokio::test]
async fn test_map_then_rename_copied_file() {
    let env = TestEnv::new();
    let original = env.store.add_file("src", "/run/folderC/lane1/reads.fq", 64, None);
    env.store.add_file("src", "/run/fileA", 1, None);
    env.store.add_file("dst", "/out/folderC/lane1/reads.fq", 64, None);

    let mapping = env
        .ctx
        .rename_mapper()
        .renaming_map_params(&mapping_request(original.data_id.as_str(), "sample.fq"))
        .await
        .unwrap();
    assert_eq!(
        mapping.output_data_uri.to_string(),
        "icav2://dst/out/folderC/lane1/sample.fq"
    );

    let outcome = env
        .ctx
        .renamer()
        .rename(
            &DataRef::new(mapping.project_id.clone(), mapping.input_data_id.clone()),
            &mapping.output_data_uri,
        )
        .await
        .unwrap();

    assert_eq!(outcome, TransferOutcome::Success);
    assert!(env.store.find("dst", "/out/folderC/lane1/reads.fq").is_none());
    assert_eq!(
        env.store.find("dst", "/out/folderC/lane1/sample.fq").unwrap().size(),
        64
    );
    assert!(env.store.find("src", "/run/folderC/lane1/reads.fq").is_some());
}

#[tokio::test]
async fn test_rename_incomplete_then_complete() {
    let env = TestEnv::new();
    let copied = env.store.add_file("dst", "/out/fileA", 8, None);
    env.store.fail_deletes_of(&copied.data_id);
    let renamer = env.ctx.renamer();

    let err = renamer
        .rename(&copied.data_ref(), &uri("icav2://dst/out/fileB"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RenameIncomplete);
    assert!(err.message.contains(copied.data_id.as_str()));

    env.store.allow_deletes_of(&copied.data_id);
    renamer.complete_rename(&copied.data_ref()).await.unwrap();
    assert!(env.store.find("dst", "/out/fileA").is_none());
    assert!(env.store.find("dst", "/out/fileB").is_some());
}

#[tokio::test]
async fn test_multi_part_rename_uses_server_side_move() {
    let env = TestEnv::new();
    let copied = env.store.add_file("dst", "/out/a.bam", 900, Some("c0ffee-7"));

    let outcome = env
        .ctx
        .renamer()
        .rename(&copied.data_ref(), &uri("icav2://dst/out/sample.bam"))
        .await
        .unwrap();

    assert_eq!(outcome, TransferOutcome::Success);
    assert_eq!(env.mover.count(), 1);
    assert_eq!(env.pipe.count(), 0);
    assert_eq!(env.bytes_streamed(), 0);
    assert_eq!(env.store.find("dst", "/out/sample.bam").unwrap().size(), 900);
}
