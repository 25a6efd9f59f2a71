use std::path::Path;

use csv::Trim;
use serde::Deserialize;
use tracing::{info, warn};

use crate::MissingInputError;

use super::types::{Breadcrumb, BreadcrumbError, BreadcrumbTable};

#[derive(Debug, Deserialize)]
struct BreadcrumbRow {
    #[serde(default)]
    match_id: Option<String>,
    player_id: String,
    time_step: f64,
    #[serde(alias = "pos_x")]
    x: f64,
    #[serde(alias = "pos_y")]
    y: f64,
    #[serde(alias = "pos_z")]
    z: f64,
    #[serde(default)]
    life: Option<f64>,
}

impl BreadcrumbRow {
    fn effective_player_id(&self) -> String {
        let player_id = self.player_id.trim();
        match self.match_id.as_deref().map(str::trim) {
            Some(match_id) if !match_id.is_empty() => format!("{match_id}/{player_id}"),
            _ => player_id.to_string(),
        }
    }
}

pub fn load_breadcrumbs(path: &Path) -> Result<BreadcrumbTable, BreadcrumbError> {
    if !path.is_file() {
        return Err(MissingInputError::new("breadcrumbs", path).into());
    }

    let read_err = |source: csv::Error| BreadcrumbError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();

    let mut table = BreadcrumbTable::default();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row = record
            .deserialize::<BreadcrumbRow>(Some(&headers))
            .map_err(read_err)?;
        let player_id = row.effective_player_id();
        if row.player_id.trim().is_empty() {
            return Err(BreadcrumbError::EmptyPlayerId {
                path: path.to_path_buf(),
                line,
            });
        }
        let time_step =
            integral_time_step(row.time_step).ok_or_else(|| BreadcrumbError::InvalidTimeStep {
                path: path.to_path_buf(),
                line,
                value: row.time_step,
            })?;
        if !(row.x.is_finite() && row.y.is_finite() && row.z.is_finite()) {
            warn!(
                player_id = %player_id,
                time_step,
                line,
                "breadcrumb_row_skipped_non_finite_position"
            );
            table.record_skipped_row(&player_id);
            continue;
        }
        table.push(Breadcrumb {
            player_id,
            time_step,
            x: row.x,
            y: row.y,
            z: row.z,
            life: row.life,
        });
    }
    table.finish();

    info!(
        path = %path.display(),
        player_count = table.player_count(),
        row_count = table.row_count(),
        skipped_rows = table.skipped_rows(),
        "breadcrumbs_loaded"
    );
    Ok(table)
}

fn integral_time_step(raw: f64) -> Option<i64> {
    if !raw.is_finite() || raw.fract() != 0.0 || raw.abs() > i64::MAX as f64 {
        return None;
    }
    Some(raw as i64)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn write_csv(temp: &TempDir, content: &str) -> PathBuf {
        let path = temp.path().join("breadcrumbs.csv");
        fs::write(&path, content).expect("write breadcrumbs");
        path
    }

    #[test]
    fn loads_spec_columns_with_nullable_life() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(
            &temp,
            "player_id,time_step,x,y,z,life\np1,1,5,5,90,1\np1,0,5,5,100,\np2,0,1,1,1,0\n",
        );
        let table = load_breadcrumbs(&path).expect("load");
        assert_eq!(table.player_count(), 2);
        let p1 = table.player("p1").expect("p1");
        assert_eq!(p1[0].time_step, 0);
        assert_eq!(p1[0].life, None);
        assert_eq!(p1[1].life, Some(1.0));
    }

    #[test]
    fn pos_column_aliases_and_match_id_are_accepted() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(
            &temp,
            "match_id,player_id,time_step,pos_x,pos_y,pos_z,life\n\
             7,12,0.0,1.5,2.5,3.5,1\n\
             7,12,1.0,1.5,2.5,3.0,1\n\
             8,12,0.0,0,0,0,1\n",
        );
        let table = load_breadcrumbs(&path).expect("load");
        assert_eq!(table.player_count(), 2);
        let crumbs = table.player("7/12").expect("7/12");
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[1].time_step, 1);
        assert_eq!(crumbs[0].x, 1.5);
        assert!(table.player("8/12").is_some());
    }

    #[test]
    fn fractional_time_step_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(&temp, "player_id,time_step,x,y,z,life\np1,0.5,0,0,0,1\n");
        let err = load_breadcrumbs(&path).expect_err("fractional");
        assert!(matches!(err, BreadcrumbError::InvalidTimeStep { line: 2, .. }));
    }

    #[test]
    fn unparseable_number_fails_fast() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(&temp, "player_id,time_step,x,y,z,life\np1,0,abc,0,0,1\n");
        let err = load_breadcrumbs(&path).expect_err("schema");
        assert!(matches!(err, BreadcrumbError::Read { .. }));
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(&temp, "player_id,time_step,x,y,life\np1,0,0,0,1\n");
        let err = load_breadcrumbs(&path).expect_err("schema");
        assert!(matches!(err, BreadcrumbError::Read { .. }));
    }

    #[test]
    fn non_finite_positions_are_skipped_but_player_is_kept() {
        let temp = TempDir::new().expect("temp");
        let path = write_csv(
            &temp,
            "player_id,time_step,x,y,z,life\nghost,0,NaN,0,0,1\np1,0,1,1,1,1\n",
        );
        let table = load_breadcrumbs(&path).expect("load");
        assert_eq!(table.skipped_rows(), 1);
        assert_eq!(table.player("ghost").map(<[Breadcrumb]>::len), Some(0));
        assert_eq!(table.player_count(), 2);
    }

    #[test]
    fn missing_file_is_a_missing_input() {
        let temp = TempDir::new().expect("temp");
        let err = load_breadcrumbs(&temp.path().join("absent.csv")).expect_err("missing");
        assert!(matches!(err, BreadcrumbError::MissingInput(_)));
    }
}
