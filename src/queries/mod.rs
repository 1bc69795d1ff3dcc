//! Query vocabulary and the per-source fetch interfaces.
//!
//! [`SinglesQuery`] and [`BundlesQuery`] share an `Arc<Connection>` to the
//! DuckDB snapshot tables; [`SupabaseStore`](crate::rest::SupabaseStore)
//! answers the same [`CatalogSource`] trait over HTTP.

pub mod bundles;
pub mod context;
pub mod singles;
pub mod source;

pub use bundles::BundlesQuery;
pub use context::{FilterDimension, Filters, QueryContext, Scope, SortKey, SortOrder, SourceMode};
pub use singles::SinglesQuery;
pub use source::{BundlesSource, CatalogSource, FetchRequest, SinglesSource, SourcePage};
