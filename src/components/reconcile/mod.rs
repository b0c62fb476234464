mod engine;

pub use engine::{
    build_entry, has_exact_title, schedule, ReconcileOptions, ReconciliationEngine, RunReport,
    ScheduledEvent, ENTRY_TIME_ZONE,
};
