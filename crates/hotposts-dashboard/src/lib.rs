pub mod controller;
pub mod read_state;
pub mod refresh;
pub mod state;
pub mod view;

pub use controller::{crawl_notice, CrawlError, Dashboard, DashboardConfig};
pub use read_state::{JsonFileStore, KeyValueStore, MemoryStore, ReadSet, ReadState, StoreError};
pub use refresh::KeywordRefresh;
pub use state::{DashboardState, Dataset, FilterChange, FilterState, Notice, NoticeKind};
pub use view::DashboardView;
