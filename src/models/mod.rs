pub mod bundle;
mod de;
pub mod group;
pub mod item;
pub mod page;
pub mod single;

pub use bundle::*;
pub use group::*;
pub use item::*;
pub use page::*;
pub use single::*;
