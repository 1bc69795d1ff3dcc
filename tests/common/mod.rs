//! Shared test fixtures for the Cardvault SDK integration tests.
//!
//! Provides `setup_sample_db()` which creates an in-memory DuckDB connection
//! populated with small `singles` and `bundles` tables via NDJSON temp files,
//! and `StubSingles` / `StubBundles` sources for pipeline tests that need
//! exact control over what a store returns.

#![allow(dead_code)]

use cardvault_sdk::config::SNAPSHOT_BASE;
use cardvault_sdk::models::{CatalogBundle, CatalogSingle, SourceKind};
use cardvault_sdk::queries::{CatalogSource, FetchRequest, SourcePage};
use cardvault_sdk::{CatalogError, Connection, Result, SnapshotCache};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Create a `Connection` backed by a temporary offline cache directory with
/// sample data loaded into DuckDB tables via NDJSON temp files.
///
/// The caller must keep the returned `TempDir` alive for the duration of the
/// test so the cache directory is not deleted prematurely.
pub fn setup_sample_db() -> (Arc<Connection>, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cache = SnapshotCache::new(
        Some(tmp_dir.path().to_path_buf()),
        SNAPSHOT_BASE,
        true,
        Duration::from_secs(30),
    )
    .unwrap();
    let conn = Connection::new(cache).unwrap();

    register_rows(&conn, "singles", &sample_singles());
    register_rows(&conn, "bundles", &sample_bundles());

    (Arc::new(conn), tmp_dir)
}

/// Write `rows` to a temp NDJSON file and register it as `table`.
pub fn register_rows(conn: &Connection, table: &str, rows: &[Value]) {
    let mut tmp = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(tmp, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    tmp.flush().unwrap();

    conn.register_table_from_ndjson(table, tmp.path().to_str().unwrap())
        .unwrap();
}

#[allow(clippy::too_many_arguments)]
fn single(
    id: &str,
    name: &str,
    number: &str,
    group: (&str, &str),
    rarity: &str,
    supertype: &str,
    types: &[&str],
    subtypes: &[&str],
    artist: &str,
    weaknesses: &[&str],
    resistances: &[&str],
    raw: (Option<f64>, Option<f64>),
    graded: (Option<f64>, Option<f64>),
) -> Value {
    json!({
        "id": id,
        "name": name,
        "number": number,
        "group_id": group.0,
        "group_name": group.1,
        "rarity": rarity,
        "supertype": supertype,
        "types": types,
        "subtypes": subtypes,
        "artist": artist,
        "weaknesses": weaknesses,
        "resistances": resistances,
        "image_url": format!("https://img.example/{}.png", id),
        "raw_market": raw.0,
        "raw_change_7d": raw.1,
        "graded_market": graded.0,
        "graded_change_7d": graded.1,
    })
}

const OBF: (&str, &str) = ("sv3", "Obsidian Flames");
const BASE: (&str, &str) = ("base1", "Base Set");
const JUMBO: (&str, &str) = ("jumbo", "Jumbo Cards");

pub fn sample_singles() -> Vec<Value> {
    vec![
        single(
            "s-001", "Charizard ex", "125", OBF, "Double Rare", "Pokémon",
            &["Darkness"], &["Stage 2", "ex"], "5ban Graphics",
            &["Grass"], &[],
            (Some(45.5), Some(3.2)), (Some(210.0), None),
        ),
        single(
            "s-002", "Charmander", "26", OBF, "Common", "Pokémon",
            &["Fire"], &["Basic"], "Mitsuhiro Arita",
            &["Water"], &[],
            (Some(0.25), None), (None, None),
        ),
        single(
            "s-003", "Charmeleon", "27", OBF, "Uncommon", "Pokémon",
            &["Fire"], &["Stage 1"], "Mitsuhiro Arita",
            &["Water"], &[],
            (None, None), (Some(12.0), Some(-1.5)),
        ),
        single(
            "s-004", "Charizard", "4", BASE, "Rare Holo", "Pokémon",
            &["Fire"], &["Stage 2"], "Mitsuhiro Arita",
            &["Water"], &["Fighting"],
            (Some(350.0), Some(1.0)), (Some(5000.0), None),
        ),
        single(
            "s-005", "Energy Retrieval", "81", BASE, "Uncommon", "Trainer",
            &[], &["Item"], "Keiji Kinebuchi",
            &[], &[],
            (Some(1.1), None), (None, None),
        ),
        single(
            "s-006", "Charizard", "4", JUMBO, "Rare", "Pokémon",
            &["Fire"], &["Stage 2"], "Mitsuhiro Arita",
            &["Water"], &[],
            (Some(20.0), None), (None, None),
        ),
        single(
            "s-007", "Pikachu", "215", OBF, "Illustration Rare", "Pokémon",
            &["Lightning"], &["Basic"], "Kagemaru Himeno",
            &["Fighting"], &["Metal"],
            (None, None), (None, None),
        ),
    ]
}

pub fn sample_bundles() -> Vec<Value> {
    vec![
        json!({
            "id": "b-001",
            "name": "Obsidian Flames Booster Box",
            "group_id": "sv3",
            "group_name": "Obsidian Flames",
            "market_price": 100.0,
            "low_price": 90.0,
            "mid_price": 105.0,
            "high_price": 130.0,
            "currency": "EUR",
            "image_url": "https://img.example/b-001.png"
        }),
        json!({
            "id": "b-002",
            "name": "Charizard ex Premium Collection",
            "group_id": "sv3",
            "group_name": "Obsidian Flames",
            "market_price": 40.0,
            "low_price": 35.0,
            "mid_price": 42.0,
            "high_price": 60.0,
            "currency": "EUR",
            "image_url": "https://img.example/b-002.png"
        }),
        json!({
            "id": "b-003",
            "name": "Base Set Booster Pack",
            "group_id": "base1",
            "group_name": "Base Set",
            "market_price": null,
            "low_price": null,
            "mid_price": null,
            "high_price": null,
            "currency": "EUR",
            "image_url": null
        }),
        json!({
            "id": "b-004",
            "name": "Charizard Ultra Premium Collection",
            "group_id": "swsh",
            "group_name": "Sword & Shield",
            "market_price": 150.5,
            "low_price": 140.0,
            "mid_price": 155.0,
            "high_price": 200.0,
            "currency": "EUR",
            "image_url": "https://img.example/b-004.png"
        }),
    ]
}

// ---------------------------------------------------------------------------
// Stub sources
// ---------------------------------------------------------------------------

/// What a stub source answers with.
#[derive(Clone)]
pub enum Reply<T> {
    Page(Vec<T>, u64),
    Fail(String),
}

/// A scripted source that records every request it receives.
pub struct Stub<T> {
    kind: SourceKind,
    reply: Reply<T>,
    delay: Duration,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl<T: Clone + Send + Sync> Stub<T> {
    pub fn new(kind: SourceKind, reply: Reply<T>) -> Self {
        Self {
            kind,
            reply,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl<T: Clone + Send + Sync> CatalogSource for Stub<T> {
    type Record = T;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<T>> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &self.reply {
            Reply::Page(records, total) => Ok(SourcePage::new(records.clone(), *total)),
            Reply::Fail(message) => Err(CatalogError::Internal(message.clone())),
        }
    }
}

/// `Arc`-backed source handle so a test can keep inspecting the stub after
/// handing it to a pipeline.
pub struct Shared<T>(pub Arc<Stub<T>>);

impl<T: Clone + Send + Sync> CatalogSource for Shared<T> {
    type Record = T;

    fn kind(&self) -> SourceKind {
        self.0.kind()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<T>> {
        self.0.fetch(request)
    }
}

pub type StubSingles = Stub<CatalogSingle>;
pub type StubBundles = Stub<CatalogBundle>;

/// A minimal single with the given name, number and raw market price.
pub fn make_single(id: &str, name: &str, number: Option<&str>, raw: Option<f64>) -> CatalogSingle {
    CatalogSingle::from_row(json!({
        "id": id,
        "name": name,
        "number": number,
        "group_id": "sv3",
        "group_name": "Obsidian Flames",
        "rarity": "Rare",
        "raw_market": raw,
    }))
    .unwrap()
}

/// A minimal bundle with the given name and EUR market price.
pub fn make_bundle(id: &str, name: &str, market: Option<f64>) -> CatalogBundle {
    CatalogBundle::from_row(json!({
        "id": id,
        "name": name,
        "group_id": "sv3",
        "group_name": "Obsidian Flames",
        "market_price": market,
    }))
    .unwrap()
}

/// `n` singles named `"<name> <i>"` numbered 1..=n.
pub fn singles_named(name: &str, n: usize) -> Vec<CatalogSingle> {
    (1..=n)
        .map(|i| {
            make_single(
                &format!("s-{}", i),
                name,
                Some(&i.to_string()),
                Some(i as f64),
            )
        })
        .collect()
}
