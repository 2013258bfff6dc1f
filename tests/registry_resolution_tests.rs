//! Registry + ResolutionEngine + ScanManager 联合测试
//!
//! 三个组件共享同一个 SQLite store，和服务启动时的组装方式一致。

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use qrlinker::analytics::{ScanCounter, ScanManager};
use qrlinker::config::DatabaseConfig;
use qrlinker::errors::QrLinkerError;
use qrlinker::services::{
    CallerIdentity, CodeRegistry, CreateQrCodeRequest, FallbackReason, Resolution,
    ResolutionEngine, ResolutionOptions, RegistryOptions,
};
use qrlinker::storage::{CodeStatus, CodeStore, QrCodePatch, SeaOrmStorage};

const FALLBACK: &str = "https://brand.example/unavailable";

struct Harness {
    _dir: TempDir,
    store: Arc<dyn CodeStore>,
    registry: CodeRegistry,
    engine: ResolutionEngine,
    manager: Arc<ScanManager>,
}

async fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("qr.db").display());
    let config = DatabaseConfig {
        database_url: db_url.clone(),
        ..Default::default()
    };
    let store: Arc<dyn CodeStore> = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite", &config)
            .await
            .expect("Failed to create SQLite storage"),
    );

    let manager = Arc::new(ScanManager::new(
        store.as_scan_sink(),
        Duration::from_secs(3600),
        10_000,
        Duration::from_secs(5),
    ));
    let counter: Arc<dyn ScanCounter> = manager.clone();

    Harness {
        registry: CodeRegistry::new(store.clone(), RegistryOptions::default()),
        engine: ResolutionEngine::new(
            store.clone(),
            counter,
            ResolutionOptions {
                fallback_url: FALLBACK.to_string(),
                lookup_timeout: Duration::from_secs(2),
            },
        ),
        store,
        manager,
        _dir: dir,
    }
}

fn promo_request() -> CreateQrCodeRequest {
    let mut req = CreateQrCodeRequest::new("Promo", "https://shop.example/promo");
    req.slug = Some("promo1".to_string());
    req
}

#[tokio::test]
async fn test_promo_lifecycle() {
    let h = harness().await;
    let owner = CallerIdentity::new("owner-a");

    let code = h.registry.create(Some(&owner), promo_request()).await.unwrap();
    assert_eq!(code.slug, "promo1");
    assert_eq!(code.scan_count, 0);

    let first = h.engine.resolve("promo1").await.unwrap();
    assert_eq!(first.location(), Some("https://shop.example/promo"));

    let patch = QrCodePatch {
        target_url: Some("https://shop.example/summer".to_string()),
        ..Default::default()
    };
    h.registry.update(&code.id, Some(&owner), patch).await.unwrap();

    let second = h.engine.resolve("promo1").await.unwrap();
    assert_eq!(second.location(), Some("https://shop.example/summer"));

    let patch = QrCodePatch {
        is_active: Some(false),
        ..Default::default()
    };
    h.registry.update(&code.id, Some(&owner), patch).await.unwrap();

    match h.engine.resolve("promo1").await.unwrap() {
        Resolution::Fallback { url, reason, .. } => {
            assert_eq!(url, FALLBACK);
            assert_eq!(reason, FallbackReason::Inactive);
        }
        other => panic!("expected fallback, got {:?}", other),
    }

    h.manager.flush().await;
    let stored = h.registry.get(&code.id, Some(&owner)).await.unwrap();
    assert_eq!(stored.scan_count, 3);
    assert_eq!(stored.target_url, "https://shop.example/summer");
}

#[tokio::test]
async fn test_expiry_is_evaluated_at_scan_time() {
    let h = harness().await;
    let owner = CallerIdentity::new("owner-a");

    let mut req = promo_request();
    req.valid_until = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    h.registry.create(Some(&owner), req).await.unwrap();

    let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    assert!(matches!(
        h.engine.resolve_at("promo1", before).await.unwrap(),
        Resolution::Target { .. }
    ));
    match h.engine.resolve_at("promo1", after).await.unwrap() {
        Resolution::Fallback { reason, code, .. } => {
            assert_eq!(reason, FallbackReason::Expired);
            assert_eq!(code.status_at(after), CodeStatus::Expired);
        }
        other => panic!("expected expired fallback, got {:?}", other),
    }

    let stats = h.registry.stats_at(Some(&owner), after).await.unwrap();
    assert_eq!(stats.total_codes, 1);
    assert_eq!(stats.active_codes, 0);
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let h = harness().await;
    let owner = CallerIdentity::new("owner-a");
    let intruder = CallerIdentity::new("owner-b");

    let code = h.registry.create(Some(&owner), promo_request()).await.unwrap();

    let patch = QrCodePatch {
        target_url: Some("https://evil.example".to_string()),
        ..Default::default()
    };
    let err = h
        .registry
        .update(&code.id, Some(&intruder), patch)
        .await
        .unwrap_err();
    assert!(matches!(err, QrLinkerError::Authorization(_)), "got {:?}", err);

    let err = h.registry.delete(&code.id, Some(&intruder)).await.unwrap_err();
    assert!(matches!(err, QrLinkerError::Authorization(_)));

    let err = h.registry.get(&code.id, None).await.unwrap_err();
    assert!(matches!(err, QrLinkerError::Authorization(_)));

    let unchanged = h.store.get(&code.id).await.unwrap().unwrap();
    assert_eq!(unchanged.target_url, "https://shop.example/promo");
    assert!(h.registry.list(Some(&intruder)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_code_is_gone() {
    let h = harness().await;
    let owner = CallerIdentity::new("owner-a");

    let code = h.registry.create(Some(&owner), promo_request()).await.unwrap();
    h.engine.resolve("promo1").await.unwrap();

    h.registry.delete(&code.id, Some(&owner)).await.unwrap();

    assert_eq!(h.engine.resolve("promo1").await.unwrap(), Resolution::NotFound);
    let err = h.registry.get(&code.id, Some(&owner)).await.unwrap_err();
    assert!(matches!(err, QrLinkerError::NotFound(_)));
    let err = h.registry.delete(&code.id, Some(&owner)).await.unwrap_err();
    assert!(matches!(err, QrLinkerError::NotFound(_)));

    // 删除前缓冲的扫码落库时被忽略
    h.manager.flush().await;
    assert_eq!(h.manager.pending(), 0);
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_resolutions_are_all_counted() {
    let h = harness().await;
    let owner = CallerIdentity::new("owner-a");
    let code = h.registry.create(Some(&owner), promo_request()).await.unwrap();

    let engine = Arc::new(h.engine);
    const SCANS: u64 = 64;
    let mut handles = Vec::new();
    for _ in 0..SCANS {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.resolve("promo1").await.unwrap()
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), Resolution::Target { .. }));
    }

    h.manager.flush().await;
    let stored = h.store.get(&code.id).await.unwrap().unwrap();
    assert_eq!(stored.scan_count, SCANS);
}

#[tokio::test]
async fn test_unknown_and_malformed_slugs_are_not_counted() {
    let h = harness().await;

    assert_eq!(h.engine.resolve("missing").await.unwrap(), Resolution::NotFound);
    assert_eq!(h.engine.resolve("bad slug!").await.unwrap(), Resolution::NotFound);
    assert_eq!(h.manager.pending(), 0);
}
