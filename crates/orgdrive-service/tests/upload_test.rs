//! Integration tests for upload ingestion.

mod helpers;

use bytes::Bytes;
use chrono::Utc;
use orgdrive_core::error::ErrorKind;
use orgdrive_core::types::path::CanonicalPath;
use orgdrive_entity::grant::{AccessLevel, CreateGrant};
use orgdrive_entity::user::Role;

use helpers::TestEnv;

fn p(s: &str) -> CanonicalPath {
    CanonicalPath::parse(s)
}

fn dated(name: &str) -> String {
    format!("{}_{name}", Utc::now().format("%Y%m%d"))
}

#[tokio::test]
async fn test_upload_lands_with_date_prefix_and_index_row() {
    let env = TestEnv::new().await;
    let lead = env.create_user("alice", Role::Lead, Some("RD")).await;
    let ctx = env.ctx(&lead);

    let record = env
        .upload
        .accept(&ctx, "rd/Specs", "api.md", Bytes::from("# API"))
        .await
        .unwrap();

    let expected = format!("研发部 (RD)/Specs/{}", dated("api.md"));
    assert_eq!(record.path, expected);
    assert_eq!(record.uploader_id, Some(lead.id));
    assert_eq!(record.size_bytes, 5);
    assert_eq!(record.access_count, 0);
    assert!(env.gateway.exists(&p(&expected)).await.unwrap());
}

#[tokio::test]
async fn test_read_only_grant_rejected_before_any_write() {
    let env = TestEnv::new().await;
    let outsider = env.create_user("bob", Role::Member, None).await;
    env.grants
        .create(CreateGrant {
            user_id: outsider.id,
            folder_path: "研发部 (RD)/Drop".into(),
            access: AccessLevel::Read,
            expires_at: None,
        })
        .await
        .unwrap();
    let ctx = env.ctx(&outsider);

    let err = env
        .upload
        .accept(&ctx, "RD/Drop", "report.pdf", Bytes::from("pdf bytes"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Denied);

    // No orphan anywhere: target folder untouched, staging area empty.
    assert!(!env.gateway.exists(&p("研发部 (RD)/Drop")).await.unwrap());
    let staging = env.storage_root().join(".staging");
    let staged = std::fs::read_dir(&staging)
        .map(|d| d.count())
        .unwrap_or(0);
    assert_eq!(staged, 0);
}

#[tokio::test]
async fn test_full_grant_allows_upload() {
    let env = TestEnv::new().await;
    let outsider = env.create_user("carol", Role::Member, None).await;
    env.grants
        .create(CreateGrant {
            user_id: outsider.id,
            folder_path: "研发部 (RD)/Drop".into(),
            access: AccessLevel::Full,
            expires_at: None,
        })
        .await
        .unwrap();
    let ctx = env.ctx(&outsider);

    let record = env
        .upload
        .accept(&ctx, "RD/Drop", "handoff.zip", Bytes::from("zip"))
        .await
        .unwrap();
    assert!(env.gateway.exists(&p(&record.path)).await.unwrap());
}

#[tokio::test]
async fn test_empty_target_defaults_to_personal_space() {
    let env = TestEnv::new().await;
    let member = env.create_user("dina", Role::Member, Some("MS")).await;
    let ctx = env.ctx(&member);

    let record = env
        .upload
        .accept(&ctx, "", "notes.txt", Bytes::from("todo"))
        .await
        .unwrap();
    assert_eq!(record.path, format!("Members/dina/{}", dated("notes.txt")));

    // The bare Members bucket behaves the same for non-admins.
    let record = env
        .upload
        .accept(&ctx, "members", "more.txt", Bytes::from("more"))
        .await
        .unwrap();
    assert!(record.path.starts_with("Members/dina/"));
}

#[tokio::test]
async fn test_same_day_reupload_overwrites_and_keeps_counters() {
    let env = TestEnv::new().await;
    let lead = env.create_user("egon", Role::Lead, Some("MS")).await;
    let ctx = env.ctx(&lead);

    let first = env
        .upload
        .accept(&ctx, "MS", "weekly.xlsx", Bytes::from("v1"))
        .await
        .unwrap();
    env.files
        .record_access(&first.path, Utc::now())
        .await
        .unwrap();

    let second = env
        .upload
        .accept(&ctx, "MS", "weekly.xlsx", Bytes::from("v2 longer"))
        .await
        .unwrap();

    // Same path, refreshed size, counters preserved.
    assert_eq!(second.path, first.path);
    assert_eq!(second.size_bytes, 9);
    assert_eq!(second.access_count, 1);

    let listing = env.browse.list(&ctx, "MS").await.unwrap();
    let matches = listing
        .items
        .iter()
        .filter(|i| i.meta.path.as_str() == first.path)
        .count();
    assert_eq!(matches, 1, "overwrite must not duplicate the physical file");
}

#[tokio::test]
async fn test_invalid_file_names_rejected() {
    let env = TestEnv::new().await;
    let lead = env.create_user("fred", Role::Lead, Some("MS")).await;
    let ctx = env.ctx(&lead);

    for bad in ["", "..", "a/b.txt", "..\\escape.txt"] {
        let err = env
            .upload
            .accept(&ctx, "MS", bad, Bytes::from("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "name {bad:?} must be rejected");
    }
}
