//! Unit tests for the SqlBuilder query construction.

use cardvault_sdk::sql_builder::escape_like;
use cardvault_sdk::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("singles").build();
    assert_eq!(sql, "SELECT *\nFROM singles");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("singles")
        .select(&["name", "number"])
        .build();
    assert!(sql.starts_with("SELECT name, number\n"));
}

#[test]
fn distinct_adds_keyword() {
    let (sql, _) = SqlBuilder::new("singles").distinct().build();
    assert!(sql.starts_with("SELECT DISTINCT *"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_eq("group_id", "sv3")
        .build();
    assert!(sql.contains("WHERE group_id = ?"));
    assert_eq!(params, vec!["sv3"]);
}

#[test]
fn where_like_adds_case_insensitive_like() {
    let (sql, params) = SqlBuilder::new("bundles")
        .where_like("name", "%charizard%")
        .build();
    assert!(sql.contains("LOWER(name) LIKE LOWER(?)"));
    assert_eq!(params, vec!["%charizard%"]);
}

#[test]
fn where_contains_escapes_like_wildcards() {
    let (sql, params) = SqlBuilder::new("bundles")
        .where_contains("name", r"100% Char_\")
        .build();
    assert!(sql.contains(r"LOWER(name) LIKE LOWER(?) ESCAPE '\'"));
    assert_eq!(params, vec![r"%100\% Char\_\\%"]);
}

#[test]
fn escape_like_leaves_plain_text_alone() {
    assert_eq!(escape_like("Charizard ex"), "Charizard ex");
    assert_eq!(escape_like("a_b%c"), r"a\_b\%c");
}

#[test]
fn where_in_adds_in_clause() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_in("rarity", ["Rare", "Rare Holo"])
        .build();
    assert!(sql.contains("rarity IN (?, ?)"));
    assert_eq!(params, vec!["Rare", "Rare Holo"]);
}

#[test]
fn where_in_empty_produces_false() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_in("rarity", Vec::<&str>::new())
        .build();
    assert!(sql.contains("WHERE FALSE"));
    assert!(params.is_empty());
}

#[test]
fn where_any_in_splits_list_column() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_any_in("types", ["Fire", "Water"])
        .build();
    assert!(sql.contains(
        "list_has_any(string_split(COALESCE(types, ''), ', '), list_value(?, ?))"
    ));
    assert_eq!(params, vec!["Fire", "Water"]);
}

#[test]
fn where_any_in_empty_produces_false() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_any_in("types", Vec::<String>::new())
        .build();
    assert!(sql.contains("WHERE FALSE"));
    assert!(params.is_empty());
}

#[test]
fn where_or_creates_or_group() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_or(&[("LOWER(name) LIKE LOWER(?)", "%pika%"), ("number = ?", "25")])
        .build();
    assert!(sql.contains("(LOWER(name) LIKE LOWER(?) OR number = ?)"));
    assert_eq!(params, vec!["%pika%", "25"]);
}

#[test]
fn where_or_empty_is_noop() {
    let (sql, params) = SqlBuilder::new("singles").where_or(&[]).build();
    assert!(!sql.contains("WHERE"));
    assert!(params.is_empty());
}

#[test]
fn where_clause_appends_params_in_order() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_eq("group_id", "sv3")
        .where_clause("raw_market > ?", &["10"])
        .build();
    assert!(sql.contains("group_id = ?"));
    assert!(sql.contains("raw_market > ?"));
    assert_eq!(params, vec!["sv3", "10"]);
}

#[test]
fn multiple_where_clauses_joined_with_and() {
    let (sql, _) = SqlBuilder::new("singles")
        .where_eq("group_id", "sv3")
        .where_eq("rarity", "Rare")
        .build();
    assert!(sql.contains("WHERE group_id = ? AND rarity = ?"));
}

// ---------------------------------------------------------------------------
// GROUP BY / ORDER BY / LIMIT / OFFSET
// ---------------------------------------------------------------------------

#[test]
fn group_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("singles")
        .select(&["group_id", "COUNT(*) AS cnt"])
        .group_by(&["group_id"])
        .build();
    assert!(sql.contains("GROUP BY group_id"));
}

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("singles")
        .order_by(&["name ASC", "raw_market DESC NULLS LAST"])
        .build();
    assert!(sql.contains("ORDER BY name ASC, raw_market DESC NULLS LAST"));
}

#[test]
fn limit_and_offset_together() {
    let (sql, _) = SqlBuilder::new("singles").limit(15).offset(30).build();
    assert!(sql.ends_with("LIMIT 15\nOFFSET 30"));
}

// ---------------------------------------------------------------------------
// COUNT
// ---------------------------------------------------------------------------

#[test]
fn build_count_keeps_where_and_drops_paging() {
    let mut qb = SqlBuilder::new("singles");
    qb.select(&["name"])
        .where_eq("group_id", "sv3")
        .where_in("rarity", ["Rare"])
        .order_by(&["name ASC"])
        .limit(15)
        .offset(15);

    let (sql, params) = qb.build_count();
    assert_eq!(
        sql,
        "SELECT COUNT(*) AS total\nFROM singles\nWHERE group_id = ? AND rarity IN (?)"
    );
    assert_eq!(params, vec!["sv3", "Rare"]);
}

#[test]
fn build_count_without_conditions() {
    let (sql, params) = SqlBuilder::new("bundles").build_count();
    assert_eq!(sql, "SELECT COUNT(*) AS total\nFROM bundles");
    assert!(params.is_empty());
}

#[test]
fn combined_builder_chains_correctly() {
    let (sql, params) = SqlBuilder::new("singles")
        .where_eq("group_id", "sv3")
        .where_like("name", "char%")
        .where_any_in("weaknesses", ["Water"])
        .order_by(&["name ASC"])
        .limit(10)
        .offset(0)
        .build();

    assert!(sql.contains("group_id = ?"));
    assert!(sql.contains("LOWER(name) LIKE LOWER(?)"));
    assert!(sql.contains("ORDER BY name ASC"));
    assert!(sql.contains("LIMIT 10"));
    assert!(sql.contains("OFFSET 0"));
    assert_eq!(params, vec!["sv3", "char%", "Water"]);
}
