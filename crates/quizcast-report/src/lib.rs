//! quizcast-report — operator-facing report rendering.
//!
//! Turns the core's statistics into chat-friendly text (tables,
//! paginated messages) and a serializable snapshot for export.

pub mod snapshot;
pub mod text;

pub use snapshot::StatsSnapshot;
pub use text::paginate;
