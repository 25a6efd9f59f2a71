use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{load_zone_catalog, CatalogError, ZoneCatalog};
use crate::config::{AnalysisConfig, ConfigError};
use crate::crumbs::{load_breadcrumbs, BreadcrumbError, BreadcrumbTable};
use crate::render::{render_heatmaps, RenderError};

use super::aggregate::{aggregate_death_locations, aggregate_zones};
use super::assign::assign_landing;
use super::export::{export_report, ExportError, RunManifest};
use super::outcome::player_outcome;
use super::report::{AnalysisReport, RunTotals};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Breadcrumbs(#[from] BreadcrumbError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub report: AnalysisReport,
    pub manifest: RunManifest,
    pub heatmaps: Vec<PathBuf>,
}

/// Pure part of the pipeline: zone assignment, outcomes and aggregation.
/// Players without breadcrumbs are logged and skipped.
pub fn analyze(
    catalog: &ZoneCatalog,
    table: &BreadcrumbTable,
    config: &AnalysisConfig,
) -> AnalysisReport {
    let mut report = AnalysisReport::default();
    for (player_id, breadcrumbs) in table.players() {
        let landing = assign_landing(player_id, breadcrumbs, catalog, config.landing_window);
        let outcome = player_outcome(player_id, breadcrumbs, config.defeat_life_threshold);
        match (landing, outcome) {
            (Ok(landing), Ok(outcome)) => {
                report.landings.push(landing);
                report.outcomes.push(outcome);
            }
            (Err(error), _) | (_, Err(error)) => {
                warn!(player_id = %error.player_id, "player_skipped_no_breadcrumbs");
                report.skipped_players.push(error);
            }
        }
    }

    report.zone_aggregates = aggregate_zones(catalog, &report.landings, &report.outcomes);
    report.death_locations = aggregate_death_locations(catalog, &report.outcomes);

    let players_zoned = report
        .landings
        .iter()
        .filter(|landing| landing.zone_name.is_some())
        .count();
    report.totals = RunTotals {
        players_total: table.player_count(),
        players_zoned,
        players_unzoned: report.landings.len() - players_zoned,
        players_skipped: report.skipped_players.len(),
        deaths_total: report.outcomes.iter().filter(|outcome| outcome.died).count(),
        breadcrumb_rows: table.row_count(),
        skipped_rows: table.skipped_rows(),
    };
    info!(
        players = report.totals.players_total,
        zoned = report.totals.players_zoned,
        unzoned = report.totals.players_unzoned,
        skipped = report.totals.players_skipped,
        deaths = report.totals.deaths_total,
        zones_with_landings = report.zone_aggregates.len(),
        "analysis_complete"
    );
    report
}

/// Load, analyze, export and optionally render one match.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisRun, AnalysisError> {
    config.validate()?;
    info!(
        catalog_path = %config.catalog_path.display(),
        breadcrumbs_path = %config.breadcrumbs_path.display(),
        output_dir = %config.output_dir.display(),
        landing_window = config.landing_window,
        "analysis_started"
    );

    let catalog = load_zone_catalog(&config.catalog_path)?;
    let table = load_breadcrumbs(&config.breadcrumbs_path)?;
    let report = analyze(&catalog, &table, config);
    let manifest = export_report(&report, &catalog, config)?;

    let heatmaps = if config.render.enabled {
        render_heatmaps(&report, &catalog, &config.render, &config.output_dir)?
    } else {
        info!("heatmaps_disabled");
        Vec::new()
    };

    Ok(AnalysisRun {
        report,
        manifest,
        heatmaps,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::analysis::export::{PLAYER_SUMMARY_FILE, ZONE_AGGREGATES_FILE};
    use crate::analysis::{PlayerOutcome, ZoneAggregate};
    use crate::crumbs::Breadcrumb;
    use crate::geometry::Point2;
    use crate::MissingInputError;

    const CATALOG: &str = "zone,x,y\nA,0,0\nA,0,10\nA,10,10\nA,10,0\n";

    fn scenario_csv() -> String {
        let mut csv = String::from("player_id,time_step,x,y,z,life\n");
        for t in 0..45 {
            csv.push_str(&format!("p1,{t},5,5,{},1\n", 100 - t));
        }
        csv.push_str("p1,50,5,5,0,0\n");
        csv
    }

    fn write_inputs(dir: &Path, crumbs: &str) -> AnalysisConfig {
        fs::write(dir.join("zones.csv"), CATALOG).expect("write catalog");
        fs::write(dir.join("crumbs.csv"), crumbs).expect("write crumbs");
        let mut config = AnalysisConfig {
            catalog_path: dir.join("zones.csv"),
            breadcrumbs_path: dir.join("crumbs.csv"),
            output_dir: dir.join("reports"),
            ..AnalysisConfig::default()
        };
        config.render.image_size_px = 64;
        config.render.density_bins = 8;
        config
    }

    #[test]
    fn scenario_player_lands_in_a_and_dies() {
        let temp = TempDir::new().expect("temp");
        let config = write_inputs(temp.path(), &scenario_csv());
        let run = run_analysis(&config).expect("run");

        let report = &run.report;
        assert_eq!(report.landings[0].player_id, "p1");
        assert_eq!(report.landings[0].zone_name.as_deref(), Some("A"));
        assert_eq!(
            report.outcomes[0],
            PlayerOutcome {
                player_id: "p1".to_string(),
                survival_time: 50,
                died: true,
                final_position: Point2::new(5.0, 5.0),
            }
        );
        assert_eq!(
            report.zone_aggregates,
            vec![ZoneAggregate {
                zone_name: "A".to_string(),
                label: "A".to_string(),
                landing_count: 1,
                death_count: 1,
                avg_survival_time: 50.0,
                survival_score: 100.0,
            }]
        );
        assert_eq!(run.heatmaps.len(), 5);
        assert!(config.output_dir.join(PLAYER_SUMMARY_FILE).is_file());
    }

    #[test]
    fn repeated_runs_produce_identical_tables() {
        let temp = TempDir::new().expect("temp");
        let mut crumbs = scenario_csv();
        crumbs.push_str("p2,0,50,50,10,1\np2,3,40,40,2,1\np2,9,40,40,2,\n");
        let mut config = write_inputs(temp.path(), &crumbs);
        config.render.enabled = false;

        run_analysis(&config).expect("first");
        let first = fs::read(config.output_dir.join(ZONE_AGGREGATES_FILE)).expect("read");
        let run = run_analysis(&config).expect("second");
        let second = fs::read(config.output_dir.join(ZONE_AGGREGATES_FILE)).expect("read");
        assert_eq!(first, second);
        assert!(run.heatmaps.is_empty());
        assert_eq!(run.report.totals.players_unzoned, 1);
    }

    #[test]
    fn player_with_only_invalid_rows_is_skipped() {
        let catalog = ZoneCatalog::from_zones(Vec::new()).expect("catalog");
        let mut table = BreadcrumbTable::from_breadcrumbs([Breadcrumb {
            player_id: "ok".to_string(),
            time_step: 0,
            x: 1.0,
            y: 1.0,
            z: 1.0,
            life: Some(1.0),
        }]);
        table.record_skipped_row("ghost");
        let report = analyze(&catalog, &table, &AnalysisConfig::default());
        assert_eq!(report.landings.len(), 1);
        assert_eq!(report.skipped_players.len(), 1);
        assert_eq!(report.skipped_players[0].player_id, "ghost");
        assert_eq!(report.totals.players_total, 2);
        assert_eq!(report.totals.skipped_rows, 1);
    }

    #[test]
    fn missing_catalog_aborts_the_run() {
        let temp = TempDir::new().expect("temp");
        let mut config = write_inputs(temp.path(), &scenario_csv());
        config.catalog_path = temp.path().join("absent.csv");
        let err = run_analysis(&config).expect_err("missing catalog");
        assert!(matches!(
            err,
            AnalysisError::Catalog(CatalogError::MissingInput(MissingInputError { .. }))
        ));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let config = AnalysisConfig {
            landing_window: 0,
            ..AnalysisConfig::default()
        };
        let err = run_analysis(&config).expect_err("invalid");
        assert!(matches!(err, AnalysisError::Config(ConfigError::ZeroLandingWindow)));
    }
}
