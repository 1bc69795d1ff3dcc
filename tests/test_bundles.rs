//! Sealed product query integration tests against in-memory sample data.

mod common;

use cardvault_sdk::models::CatalogBundle;
use cardvault_sdk::queries::{
    BundlesQuery, CatalogSource, FetchRequest, FilterDimension, Filters, Scope, SortKey, SortOrder,
    SourcePage,
};

fn request() -> FetchRequest {
    FetchRequest {
        scope: Scope::Global,
        text: None,
        filters: Filters::new(),
        sort_key: SortKey::Name,
        sort_order: SortOrder::Asc,
        page: 1,
        page_size: 30,
    }
}

fn ids(page: &SourcePage<CatalogBundle>) -> Vec<&str> {
    page.records.iter().map(|b| b.id.as_str()).collect()
}

#[test]
fn get_decodes_price_points() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let bundle = bq.get("b-001").unwrap().unwrap();
    assert_eq!(bundle.name, "Obsidian Flames Booster Box");
    assert_eq!(bundle.group_name, "Obsidian Flames");
    assert_eq!(bundle.price.market, Some(100.0));
    assert_eq!(bundle.price.low, Some(90.0));
    assert_eq!(bundle.price.high, Some(130.0));
    assert_eq!(bundle.price.currency, "EUR");
    assert_eq!(bundle.display_price(1.08), Some(108.0));
}

#[test]
fn get_bundle_without_market_price() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let bundle = bq.get("b-003").unwrap().unwrap();
    assert!(bundle.price.market.is_none());
    assert!(bundle.display_price(1.08).is_none());
    assert!(bundle.image_url.is_none());
}

#[test]
fn get_returns_none_for_unknown() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    assert!(bq.get("nonexistent").unwrap().is_none());
}

#[test]
fn fetch_text_matches_name() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let page = bq
        .fetch(&FetchRequest {
            text: Some("CHARIZARD".into()),
            sort_key: SortKey::PricingMarket,
            ..request()
        })
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec!["b-002", "b-004"]);
}

#[test]
fn fetch_text_wildcards_match_literally() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    for text in ["%", "Booster_Box", "%Premium%"] {
        let page = bq
            .fetch(&FetchRequest {
                text: Some(text.into()),
                ..request()
            })
            .unwrap();
        assert_eq!(page.total, 0, "{text:?} should not act as a wildcard");
    }
}

#[test]
fn fetch_group_scope() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let page = bq
        .fetch(&FetchRequest {
            scope: Scope::group("sv3"),
            ..request()
        })
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec!["b-002", "b-001"]);
}

#[test]
fn fetch_sorts_by_pricing_market_desc_with_nulls_last() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let page = bq
        .fetch(&FetchRequest {
            sort_key: SortKey::PricingMarket,
            sort_order: SortOrder::Desc,
            ..request()
        })
        .unwrap();
    assert_eq!(ids(&page), vec!["b-004", "b-001", "b-002", "b-003"]);
}

#[test]
fn fetch_ignores_filters() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let page = bq
        .fetch(&FetchRequest {
            filters: Filters::new().with(FilterDimension::Rarity, "Rare"),
            ..request()
        })
        .unwrap();
    assert_eq!(page.total, 4);
}

#[test]
fn fetch_paginates_with_total() {
    let (conn, _tmp) = common::setup_sample_db();
    let bq = BundlesQuery::new(conn);

    let page = bq
        .fetch(&FetchRequest {
            sort_key: SortKey::PricingMarket,
            page: 2,
            page_size: 3,
            ..request()
        })
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(ids(&page), vec!["b-003"]);
}

#[test]
fn build_query_uses_name_for_singles_keys() {
    let qb = BundlesQuery::build_query(&FetchRequest {
        sort_key: SortKey::RawMarket,
        sort_order: SortOrder::Desc,
        ..request()
    });
    let (sql, _) = qb.build();
    assert!(sql.contains("ORDER BY name DESC, CAST(id AS VARCHAR) ASC"));
}
