//! End-to-end searches through `CardvaultSdk` over the sample snapshot tables.

mod common;

use std::time::Duration;

use cardvault_sdk::models::SourceKind;
use cardvault_sdk::queries::{FilterDimension, QueryContext, Scope, SortKey, SortOrder, SourceMode};
use cardvault_sdk::{CardvaultSdk, CatalogConfig, CatalogError};

fn sdk() -> (CardvaultSdk, tempfile::TempDir) {
    let (conn, tmp) = common::setup_sample_db();
    (CardvaultSdk::with_connection(conn, CatalogConfig::default()), tmp)
}

fn ids(page: &cardvault_sdk::CatalogResultPage) -> Vec<&str> {
    page.items.iter().map(|i| i.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[test]
fn global_text_search_merges_and_excludes() {
    let (sdk, _tmp) = sdk();

    let page = sdk
        .search(&QueryContext::text("Charizard").sort(SortKey::Number, SortOrder::Asc))
        .unwrap();

    // s-006 lives in "Jumbo Cards" and is excluded, but still counted.
    assert_eq!(page.total, 5);
    assert_eq!(page.len(), 4);
    assert_eq!(&ids(&page)[..2], &["s-004", "s-001"]);
    assert!(page.items[2..].iter().all(|i| i.source() == SourceKind::Bundles));
    assert!(!page.has_more);
    assert!(!page.partial);
    assert!(page.corrections.is_empty());
}

#[test]
fn normalized_items_carry_display_fields() {
    let (sdk, _tmp) = sdk();

    let page = sdk
        .search(&QueryContext::text("Charizard").sort(SortKey::PricingMarket, SortOrder::Asc))
        .unwrap();

    let charizard_ex = page.items.iter().find(|i| i.id == "s-001").unwrap();
    assert_eq!(charizard_ex.display_name, "Charizard ex #125");
    assert_eq!(charizard_ex.label.as_deref(), Some("Double Rare"));
    assert_eq!(charizard_ex.display_price, Some(45.5));
    assert_eq!(charizard_ex.trends.seven_day(), Some(3.2));

    let bundles: Vec<_> = page
        .items
        .iter()
        .filter(|i| i.source() == SourceKind::Bundles)
        .collect();
    assert_eq!(bundles[0].id, "b-002");
    assert_eq!(bundles[0].label.as_deref(), Some("Sealed"));
    assert_eq!(bundles[0].display_price, Some(43.2));
    assert_eq!(bundles[1].display_price, Some(162.54));

    // pricing_market is a bundles-only key; singles fell back to number.
    assert_eq!(page.corrections.len(), 1);
}

#[test]
fn group_browse_in_singles_mode() {
    let (sdk, _tmp) = sdk();

    let page = sdk
        .search(&QueryContext::browse("base1", SourceMode::Singles))
        .unwrap();
    assert_eq!(ids(&page), vec!["s-004", "s-005"]);
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|i| i.group_name == "Base Set"));
}

#[test]
fn group_browse_in_sealed_mode() {
    let (sdk, _tmp) = sdk();

    let page = sdk
        .search(
            &QueryContext::browse("sv3", SourceMode::Sealed)
                .sort(SortKey::PricingMarket, SortOrder::Desc),
        )
        .unwrap();
    assert_eq!(ids(&page), vec!["b-001", "b-002"]);
    assert_eq!(page.items[0].display_price, Some(108.0));
}

#[test]
fn rarity_filter_does_not_restrict_bundles() {
    let (sdk, _tmp) = sdk();

    let ctx = QueryContext::browse("sv3", SourceMode::Both).filter(FilterDimension::Rarity, "Common");
    let page = sdk.search(&ctx).unwrap();

    assert_eq!(ids(&page), vec!["s-002", "b-002", "b-001"]);
    assert_eq!(page.total, 3);
}

#[test]
fn paging_through_a_group() {
    let (sdk, _tmp) = sdk();

    let ctx = QueryContext::browse("sv3", SourceMode::Singles).page_size(3);
    let first = sdk.search(&ctx.clone().page(1)).unwrap();
    assert_eq!(first.len(), 3);
    assert!(first.has_more);

    let second = sdk.search(&ctx.page(2)).unwrap();
    assert_eq!(ids(&second), vec!["s-007"]);
    assert!(!second.has_more);
}

#[test]
fn far_page_with_oversized_page_size_is_empty() {
    let (sdk, _tmp) = sdk();

    let ctx = QueryContext::browse("base1", SourceMode::Both)
        .page(usize::MAX / 2)
        .page_size(usize::MAX / 2);
    let page = sdk.search(&ctx).unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total, 3);
    assert!(!page.has_more);
    assert!(page.corrections.iter().any(|c| c.field == "page_size"));
}

// ---------------------------------------------------------------------------
// Snapshot-backed helpers
// ---------------------------------------------------------------------------

#[test]
fn sdk_exposes_lookups_and_filter_values() {
    let (sdk, _tmp) = sdk();

    assert_eq!(sdk.get_single("s-007").unwrap().unwrap().name, "Pikachu");
    assert!(sdk.get_bundle("b-999").unwrap().is_none());
    assert_eq!(sdk.groups().unwrap().len(), 3);
    assert_eq!(
        sdk.filter_values(FilterDimension::Resistance, &Scope::Global).unwrap(),
        vec!["Fighting", "Metal"]
    );
}

#[test]
fn sql_runs_against_snapshot_tables() {
    let (sdk, _tmp) = sdk();

    let rows = sdk
        .sql("SELECT COUNT(*) AS n FROM bundles WHERE group_id = ?", &["sv3".to_string()])
        .unwrap();
    assert_eq!(rows[0]["n"], 2);
    assert_eq!(sdk.tables(), vec!["bundles", "singles"]);
    assert!(sdk.to_string().starts_with("CardvaultSdk(snapshot"));
}

#[test]
fn refresh_offline_without_version_resets_tables() {
    let (sdk, _tmp) = sdk();

    assert!(sdk.refresh().unwrap());
    assert!(sdk.tables().is_empty());
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn offline_builder_without_snapshots_fails_all_sources() {
    let tmp = tempfile::tempdir().unwrap();
    let sdk = CardvaultSdk::builder()
        .config(CatalogConfig::default())
        .cache_dir(tmp.path())
        .offline(true)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let err = sdk.search(&QueryContext::text("Charizard")).unwrap_err();
    assert!(matches!(err, CatalogError::AllSourcesFailed { .. }));
}

#[test]
fn builder_overrides_config_values() {
    let tmp = tempfile::tempdir().unwrap();
    let sdk = CardvaultSdk::builder()
        .config(CatalogConfig::default())
        .cache_dir(tmp.path())
        .offline(true)
        .conversion_rate(1.2)
        .excluded_tokens(["Promo"])
        .page_size(40)
        .build()
        .unwrap();

    assert_eq!(sdk.config().conversion_rate, 1.2);
    assert_eq!(sdk.config().page_size, 40);
    assert_eq!(sdk.pipeline().conversion_rate(), 1.2);
    assert_eq!(sdk.pipeline().exclusions().tokens(), &["promo".to_string()]);
}

#[test]
fn builder_reads_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    std::fs::write(&config_path, r#"{ "conversion_rate": 1.1, "page_size": 10 }"#).unwrap();

    let sdk = CardvaultSdk::builder()
        .config_file(&config_path)
        .cache_dir(tmp.path().join("cache"))
        .offline(true)
        .build()
        .unwrap();

    assert_eq!(sdk.config().conversion_rate, 1.1);
    assert_eq!(sdk.config().page_size, 10);
    assert_eq!(sdk.config().excluded_tokens, vec!["Code Card", "Jumbo"]);
}
