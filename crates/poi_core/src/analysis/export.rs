use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::catalog::ZoneCatalog;
use crate::config::AnalysisConfig;
use crate::hashing::{sha256_file_hex, sha256_hex};
use crate::staging::write_output;

use super::report::{AnalysisReport, RunTotals};

pub const ZONE_AGGREGATES_FILE: &str = "zone_aggregates.csv";
pub const DEATH_LOCATIONS_FILE: &str = "death_locations.csv";
pub const PLAYER_SUMMARY_FILE: &str = "player_summary.csv";
pub const RUN_MANIFEST_FILE: &str = "run_manifest.json";
pub const RUN_MANIFEST_FORMAT_VERSION: u16 = 1;

const ZONE_AGGREGATES_HEADER: [&str; 6] = [
    "zone_name",
    "label",
    "landing_count",
    "death_count",
    "avg_survival_time",
    "survival_score",
];
const DEATH_LOCATIONS_HEADER: [&str; 3] = ["zone_name", "label", "death_count"];
const PLAYER_SUMMARY_HEADER: [&str; 9] = [
    "player_id",
    "landing_zone",
    "landing_x",
    "landing_y",
    "landing_z",
    "landing_time_step",
    "survival_time",
    "died",
    "death_zone",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode table {path}: {source}")]
    EncodeTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to encode run manifest {path}: {source}")]
    EncodeManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to hash input {path}: {source}")]
    HashInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestFile {
    pub role: String,
    pub path: String,
    pub sha256_hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunManifest {
    pub format_version: u16,
    pub inputs: Vec<ManifestFile>,
    pub outputs: Vec<ManifestFile>,
    pub config: AnalysisConfig,
    pub totals: RunTotals,
}

#[derive(Debug, Serialize)]
struct PlayerSummaryRow<'a> {
    player_id: &'a str,
    landing_zone: Option<&'a str>,
    landing_x: f64,
    landing_y: f64,
    landing_z: f64,
    landing_time_step: i64,
    survival_time: i64,
    died: bool,
    death_zone: Option<&'a str>,
}

/// Writes the three tables and `run_manifest.json` into `config.output_dir`.
/// Each file is replaced atomically; the manifest goes last.
pub fn export_report(
    report: &AnalysisReport,
    catalog: &ZoneCatalog,
    config: &AnalysisConfig,
) -> Result<RunManifest, ExportError> {
    let out_dir = &config.output_dir;
    let mut outputs = Vec::with_capacity(3);

    let path = out_dir.join(ZONE_AGGREGATES_FILE);
    let bytes = encode_table(&path, &ZONE_AGGREGATES_HEADER, &report.zone_aggregates)?;
    outputs.push(write_table(&path, "zone_aggregates", &bytes)?);

    let path = out_dir.join(DEATH_LOCATIONS_FILE);
    let bytes = encode_table(&path, &DEATH_LOCATIONS_HEADER, &report.death_locations)?;
    outputs.push(write_table(&path, "death_locations", &bytes)?);

    let path = out_dir.join(PLAYER_SUMMARY_FILE);
    let rows = player_summary_rows(report, catalog);
    let bytes = encode_table(&path, &PLAYER_SUMMARY_HEADER, &rows)?;
    outputs.push(write_table(&path, "player_summary", &bytes)?);

    let inputs = vec![
        hash_input("zone_catalog", &config.catalog_path)?,
        hash_input("breadcrumbs", &config.breadcrumbs_path)?,
    ];
    let manifest = RunManifest {
        format_version: RUN_MANIFEST_FORMAT_VERSION,
        inputs,
        outputs,
        config: config.clone(),
        totals: report.totals,
    };

    let manifest_path = out_dir.join(RUN_MANIFEST_FILE);
    let text = serde_json::to_string_pretty(&manifest).map_err(|source| {
        ExportError::EncodeManifest {
            path: manifest_path.clone(),
            source,
        }
    })?;
    write_output(&manifest_path, text.as_bytes()).map_err(|source| ExportError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    info!(
        manifest_path = %manifest_path.display(),
        table_count = manifest.outputs.len(),
        "run_manifest_written"
    );
    Ok(manifest)
}

fn player_summary_rows<'a>(
    report: &'a AnalysisReport,
    catalog: &'a ZoneCatalog,
) -> Vec<PlayerSummaryRow<'a>> {
    report
        .landings
        .iter()
        .zip(&report.outcomes)
        .map(|(landing, outcome)| {
            let death_zone = if outcome.died {
                catalog
                    .classify(outcome.final_position)
                    .map(|zone| zone.name.as_str())
            } else {
                None
            };
            PlayerSummaryRow {
                player_id: &landing.player_id,
                landing_zone: landing.zone_name.as_deref(),
                landing_x: landing.landing.x,
                landing_y: landing.landing.y,
                landing_z: landing.landing.z,
                landing_time_step: landing.landing.time_step,
                survival_time: outcome.survival_time,
                died: outcome.died,
                death_zone,
            }
        })
        .collect()
}

fn encode_table<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: &[T],
) -> Result<Vec<u8>, ExportError> {
    let encode_err = |source: csv::Error| ExportError::EncodeTable {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(header).map_err(encode_err)?;
    for row in rows {
        writer.serialize(row).map_err(encode_err)?;
    }
    writer.into_inner().map_err(|error| ExportError::Io {
        path: path.to_path_buf(),
        source: error.into_error(),
    })
}

fn write_table(path: &Path, role: &str, bytes: &[u8]) -> Result<ManifestFile, ExportError> {
    write_output(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entry = ManifestFile {
        role: role.to_string(),
        path: file_name_of(path),
        sha256_hex: sha256_hex(bytes),
    };
    info!(
        path = %path.display(),
        sha256 = %entry.sha256_hex,
        "table_exported"
    );
    Ok(entry)
}

fn hash_input(role: &str, path: &Path) -> Result<ManifestFile, ExportError> {
    let sha256_hex = sha256_file_hex(path).map_err(|source| ExportError::HashInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ManifestFile {
        role: role.to_string(),
        path: path.display().to_string(),
        sha256_hex,
    })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::analysis::aggregate::{DeathLocationAggregate, ZoneAggregate};
    use crate::analysis::assign::{LandingPoint, PlayerLanding};
    use crate::analysis::outcome::PlayerOutcome;
    use crate::catalog::Zone;
    use crate::geometry::Point2;

    fn catalog() -> ZoneCatalog {
        ZoneCatalog::from_zones(vec![Zone::new(
            "A",
            "Alpha",
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 10.0),
                Point2::new(10.0, 10.0),
                Point2::new(10.0, 0.0),
            ],
        )])
        .expect("catalog")
    }

    fn report() -> AnalysisReport {
        AnalysisReport {
            landings: vec![
                PlayerLanding {
                    player_id: "p1".to_string(),
                    zone_name: Some("A".to_string()),
                    landing: LandingPoint {
                        time_step: 44,
                        x: 5.0,
                        y: 5.0,
                        z: 56.0,
                    },
                },
                PlayerLanding {
                    player_id: "p2".to_string(),
                    zone_name: None,
                    landing: LandingPoint {
                        time_step: 3,
                        x: 50.0,
                        y: 50.0,
                        z: 1.5,
                    },
                },
            ],
            outcomes: vec![
                PlayerOutcome {
                    player_id: "p1".to_string(),
                    survival_time: 50,
                    died: true,
                    final_position: Point2::new(5.0, 5.0),
                },
                PlayerOutcome {
                    player_id: "p2".to_string(),
                    survival_time: 12,
                    died: false,
                    final_position: Point2::new(50.0, 50.0),
                },
            ],
            zone_aggregates: vec![ZoneAggregate {
                zone_name: "A".to_string(),
                label: "Alpha".to_string(),
                landing_count: 1,
                death_count: 1,
                avg_survival_time: 50.0,
                survival_score: 100.0,
            }],
            death_locations: vec![DeathLocationAggregate {
                zone_name: "A".to_string(),
                label: "Alpha".to_string(),
                death_count: 1,
            }],
            skipped_players: Vec::new(),
            totals: RunTotals {
                players_total: 2,
                players_zoned: 1,
                players_unzoned: 1,
                deaths_total: 1,
                ..RunTotals::default()
            },
        }
    }

    fn config_in(dir: &Path) -> AnalysisConfig {
        fs::write(dir.join("zones.csv"), "zone,x,y\n").expect("write catalog");
        fs::write(dir.join("crumbs.csv"), "player_id,time_step,x,y,z,life\n")
            .expect("write crumbs");
        AnalysisConfig {
            catalog_path: dir.join("zones.csv"),
            breadcrumbs_path: dir.join("crumbs.csv"),
            output_dir: dir.join("reports"),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn writes_tables_and_manifest() {
        let temp = TempDir::new().expect("temp");
        let config = config_in(temp.path());
        let manifest = export_report(&report(), &catalog(), &config).expect("export");

        let zones = fs::read_to_string(config.output_dir.join(ZONE_AGGREGATES_FILE))
            .expect("zones");
        assert_eq!(
            zones,
            "zone_name,label,landing_count,death_count,avg_survival_time,survival_score\n\
             A,Alpha,1,1,50.0,100.0\n"
        );

        let players = fs::read_to_string(config.output_dir.join(PLAYER_SUMMARY_FILE))
            .expect("players");
        let lines = players.lines().collect::<Vec<_>>();
        assert_eq!(lines[1], "p1,A,5.0,5.0,56.0,44,50,true,A");
        assert_eq!(lines[2], "p2,,50.0,50.0,1.5,3,12,false,");

        assert_eq!(manifest.outputs.len(), 3);
        assert_eq!(manifest.inputs[0].role, "zone_catalog");
        let raw = fs::read_to_string(config.output_dir.join(RUN_MANIFEST_FILE))
            .expect("manifest");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["format_version"], 1);
        assert_eq!(value["totals"]["players_total"], 2);
        assert_eq!(
            value["outputs"][0]["sha256_hex"],
            sha256_hex(zones.as_bytes())
        );
    }

    #[test]
    fn empty_tables_still_carry_headers() {
        let temp = TempDir::new().expect("temp");
        let config = config_in(temp.path());
        export_report(&AnalysisReport::default(), &catalog(), &config).expect("export");
        let deaths = fs::read_to_string(config.output_dir.join(DEATH_LOCATIONS_FILE))
            .expect("deaths");
        assert_eq!(deaths, "zone_name,label,death_count\n");
    }

    #[test]
    fn repeated_exports_are_byte_identical() {
        let temp = TempDir::new().expect("temp");
        let config = config_in(temp.path());
        let first = export_report(&report(), &catalog(), &config).expect("first");
        let first_manifest =
            fs::read(config.output_dir.join(RUN_MANIFEST_FILE)).expect("manifest");
        let second = export_report(&report(), &catalog(), &config).expect("second");
        let second_manifest =
            fs::read(config.output_dir.join(RUN_MANIFEST_FILE)).expect("manifest");
        assert_eq!(first, second);
        assert_eq!(first_manifest, second_manifest);
    }

    #[test]
    fn missing_input_fails_hashing() {
        let temp = TempDir::new().expect("temp");
        let mut config = config_in(temp.path());
        config.breadcrumbs_path = temp.path().join("gone.csv");
        let err = export_report(&report(), &catalog(), &config).expect_err("missing");
        assert!(matches!(err, ExportError::HashInput { .. }));
    }
}
