pub mod chart;
pub mod event;
pub mod view;

pub use chart::{Aggregation, TimeBucketRow, BUCKET_LABEL_KEY};
pub use event::{Alert, Event, EventKind, MetricSample};
pub use view::{AlertCard, ChartView, DashboardSnapshot, DimensionOption};
