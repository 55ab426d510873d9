//! Health-staff tools: directory search and worker drill-down.

pub mod detail;
pub mod driver;
pub mod search;

pub use detail::{load_worker_detail, WorkerDetail};
pub use driver::{spawn_search, SearchEvent, SearchHandle};
pub use search::{SearchController, SearchPhase, SearchSnapshot, WorkerHit};
