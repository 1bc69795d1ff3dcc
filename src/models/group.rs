use serde::{Deserialize, Serialize};

/// A browsable group (expansion / set) and how many singles it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGroup {
    pub group_id: String,
    pub group_name: String,
    pub single_count: u64,
}
