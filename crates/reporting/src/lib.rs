//! Campaign performance reporting: date windows, grouping, aggregation,
//! trend classification, daily highlights, and CSV export over an immutable
//! record batch.

pub mod aggregate;
pub mod export;
pub mod highlight;
pub mod index;
pub mod store;
pub mod summary;
pub mod trend;
pub mod window;

pub use aggregate::{aggregate, daily_series, DailyPoint};
pub use highlight::{highlights, HighlightCategory, HighlightItem, HighlightReport};
pub use index::{filter, group_by, normalize, CompositeKey, GroupBy, RecordIndex};
pub use store::{Batch, BatchStore, ViewSlot};
pub use summary::{summarize, WindowSummary};
pub use trend::{classify, classify_tiered, Trend, TrendDirection};
pub use window::{DateRange, DateWindow};
