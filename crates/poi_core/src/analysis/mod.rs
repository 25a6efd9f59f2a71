mod aggregate;
mod assign;
mod export;
mod outcome;
mod pipeline;
mod report;

pub use aggregate::{
    aggregate_death_locations, aggregate_zones, apply_survival_scores, DeathLocationAggregate,
    ZoneAggregate, MAX_SURVIVAL_SCORE,
};
pub use assign::{assign_landing, landing_point, LandingPoint, NoBreadcrumbsError, PlayerLanding};
pub use export::{
    export_report, ExportError, ManifestFile, RunManifest, DEATH_LOCATIONS_FILE,
    PLAYER_SUMMARY_FILE, RUN_MANIFEST_FILE, RUN_MANIFEST_FORMAT_VERSION, ZONE_AGGREGATES_FILE,
};
pub use outcome::{is_defeated, player_outcome, PlayerOutcome};
pub use pipeline::{analyze, run_analysis, AnalysisError, AnalysisRun};
pub use report::{AnalysisReport, RunTotals};
