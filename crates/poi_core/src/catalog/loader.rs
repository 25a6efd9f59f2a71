use std::path::Path;

use csv::{StringRecord, Trim};
use tracing::{debug, info};

use crate::geometry::Point2;
use crate::MissingInputError;

use super::types::{CatalogError, Zone, ZoneCatalog};

const COORDINATE_COLUMN_PREFIX: &str = "coordinate";

#[derive(Debug)]
enum CatalogLayout {
    ZonePerRow {
        name: usize,
        label: Option<usize>,
        coordinates: Vec<(String, usize)>,
    },
    VertexPerRow {
        zone: usize,
        x: usize,
        y: usize,
        label: Option<usize>,
    },
}

pub fn load_zone_catalog(path: &Path) -> Result<ZoneCatalog, CatalogError> {
    if !path.is_file() {
        return Err(MissingInputError::new("zone catalog", path).into());
    }

    let read_err = |source: csv::Error| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();
    let layout = detect_layout(&headers).ok_or_else(|| CatalogError::UnrecognizedLayout {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), layout = ?layout, "zone_catalog_layout");

    let mut zones = Vec::<Zone>::new();
    match &layout {
        CatalogLayout::ZonePerRow {
            name,
            label,
            coordinates,
        } => {
            for record in reader.records() {
                let record = record.map_err(read_err)?;
                let line = record_line(&record);
                if record.iter().all(str::is_empty) {
                    continue;
                }
                let zone_name = cell(&record, *name);
                if zone_name.is_empty() {
                    return Err(CatalogError::EmptyName {
                        path: path.to_path_buf(),
                        line,
                    });
                }
                let mut polygon = Vec::with_capacity(coordinates.len());
                for (column, idx) in coordinates {
                    let raw = cell(&record, *idx);
                    if raw.is_empty() {
                        continue;
                    }
                    match extract_numbers(raw).as_slice() {
                        [x, y] => polygon.push(Point2::new(*x, *y)),
                        _ => {
                            return Err(CatalogError::MalformedCoordinate {
                                path: path.to_path_buf(),
                                line,
                                column: column.clone(),
                                value: raw.to_string(),
                            })
                        }
                    }
                }
                let zone_label = label_or_name(&record, *label, zone_name);
                zones.push(Zone::new(zone_name, zone_label, polygon));
            }
        }
        CatalogLayout::VertexPerRow { zone, x, y, label } => {
            let mut current: Option<(String, String, Vec<Point2>)> = None;
            for record in reader.records() {
                let record = record.map_err(read_err)?;
                let line = record_line(&record);
                if record.iter().all(str::is_empty) {
                    continue;
                }
                let zone_name = cell(&record, *zone);
                if zone_name.is_empty() {
                    return Err(CatalogError::EmptyName {
                        path: path.to_path_buf(),
                        line,
                    });
                }
                let vertex = Point2::new(
                    parse_number(path, line, &headers, &record, *x)?,
                    parse_number(path, line, &headers, &record, *y)?,
                );
                let continues_run = matches!(&current, Some((name, _, _)) if name == zone_name);
                if continues_run {
                    if let Some((_, _, polygon)) = current.as_mut() {
                        polygon.push(vertex);
                    }
                    continue;
                }
                if let Some((name, zone_label, polygon)) = current.take() {
                    zones.push(Zone::new(name, zone_label, polygon));
                }
                let zone_label = label_or_name(&record, *label, zone_name);
                current = Some((zone_name.to_string(), zone_label, vec![vertex]));
            }
            if let Some((name, zone_label, polygon)) = current.take() {
                zones.push(Zone::new(name, zone_label, polygon));
            }
        }
    }

    if zones.is_empty() {
        return Err(CatalogError::Empty {
            path: path.to_path_buf(),
        });
    }

    let catalog = ZoneCatalog::from_zones(zones)?;
    info!(
        path = %path.display(),
        zone_count = catalog.len(),
        "zone_catalog_loaded"
    );
    Ok(catalog)
}

fn detect_layout(headers: &StringRecord) -> Option<CatalogLayout> {
    let normalized = headers
        .iter()
        .map(|header| header.trim().to_ascii_lowercase())
        .collect::<Vec<_>>();
    let find = |wanted: &str| normalized.iter().position(|header| header == wanted);

    let mut coordinates = normalized
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let number = header
                .strip_prefix(COORDINATE_COLUMN_PREFIX)?
                .trim()
                .parse::<u32>()
                .ok()?;
            Some((number, headers.get(idx).unwrap_or_default().to_string(), idx))
        })
        .collect::<Vec<_>>();
    coordinates.sort_by_key(|(number, _, _)| *number);

    if let Some(name) = find("name") {
        if !coordinates.is_empty() {
            return Some(CatalogLayout::ZonePerRow {
                name,
                label: find("shape").or_else(|| find("label")),
                coordinates: coordinates
                    .into_iter()
                    .map(|(_, column, idx)| (column, idx))
                    .collect(),
            });
        }
    }

    match (find("zone"), find("x"), find("y")) {
        (Some(zone), Some(x), Some(y)) => Some(CatalogLayout::VertexPerRow {
            zone,
            x,
            y,
            label: find("label").or_else(|| find("shape")),
        }),
        _ => None,
    }
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn label_or_name(record: &StringRecord, label: Option<usize>, zone_name: &str) -> String {
    label
        .map(|idx| cell(record, idx))
        .filter(|value| !value.is_empty())
        .unwrap_or(zone_name)
        .to_string()
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|pos| pos.line()).unwrap_or_default()
}

fn parse_number(
    path: &Path,
    line: u64,
    headers: &StringRecord,
    record: &StringRecord,
    idx: usize,
) -> Result<f64, CatalogError> {
    let raw = cell(record, idx);
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CatalogError::InvalidNumber {
            path: path.to_path_buf(),
            line,
            column: headers.get(idx).unwrap_or_default().to_string(),
            value: raw.to_string(),
        })
}

/// Pulls every signed decimal number out of free-form text such as
/// `"(-1200.5, 3400)"`.
fn extract_numbers(raw: &str) -> Vec<f64> {
    let bytes = raw.as_bytes();
    let mut numbers = Vec::new();
    let mut idx = 0usize;
    while idx < bytes.len() {
        let negative = bytes[idx] == b'-' && bytes.get(idx + 1).is_some_and(u8::is_ascii_digit);
        if !(negative || bytes[idx].is_ascii_digit()) {
            idx += 1;
            continue;
        }

        let start = idx;
        if negative {
            idx += 1;
        }
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx < bytes.len() && bytes[idx] == b'.' {
            idx += 1;
            while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                idx += 1;
            }
        }
        if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
            let mut exp_end = idx + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                    exp_end += 1;
                }
                idx = exp_end;
            }
        }
        if let Ok(value) = raw[start..idx].parse::<f64>() {
            numbers.push(value);
        }
    }
    numbers
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn write_catalog(temp: &TempDir, content: &str) -> PathBuf {
        let path = temp.path().join("zones.csv");
        fs::write(&path, content).expect("write catalog");
        path
    }

    #[test]
    fn zone_per_row_layout_keeps_file_order_and_labels() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "Name,Shape,Coordinate 1,Coordinate 2,Coordinate 3,Coordinate 4\n\
             Peak,A,\"(0, 0)\",\"(0, 10)\",\"(10, 10)\",\"(10, 0)\"\n\
             Beach,,\"(-20.5, -20)\",\"(-20.5, -10)\",\"(-10, -15)\",\n",
        );
        let catalog = load_zone_catalog(&path).expect("catalog");
        assert_eq!(catalog.len(), 2);
        let peak = &catalog.zones()[0];
        assert_eq!(peak.name, "Peak");
        assert_eq!(peak.label, "A");
        assert_eq!(peak.polygon.len(), 4);
        let beach = &catalog.zones()[1];
        assert_eq!(beach.label, "Beach");
        assert_eq!(beach.polygon[0], Point2::new(-20.5, -20.0));
        assert_eq!(beach.polygon.len(), 3);
    }

    #[test]
    fn coordinate_columns_are_ordered_numerically() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "Name,Coordinate 10,Coordinate 2,Coordinate 1\n\
             Z,\"9, 9\",\"0, 5\",\"0, 0\"\n",
        );
        let catalog = load_zone_catalog(&path).expect("catalog");
        let polygon = &catalog.zones()[0].polygon;
        assert_eq!(polygon[0], Point2::new(0.0, 0.0));
        assert_eq!(polygon[1], Point2::new(0.0, 5.0));
        assert_eq!(polygon[2], Point2::new(9.0, 9.0));
    }

    #[test]
    fn vertex_per_row_layout_groups_contiguous_rows() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "zone,x,y\nA,0,0\nA,0,10\nA,10,10\nB,20,20\nB,20,30\nB,30,30\n",
        );
        let catalog = load_zone_catalog(&path).expect("catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.zones()[0].polygon.len(), 3);
        assert_eq!(catalog.zones()[1].name, "B");
    }

    #[test]
    fn split_vertex_runs_are_duplicates() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "zone,x,y\nA,0,0\nA,0,10\nA,10,10\nB,20,20\nB,20,30\nB,30,30\nA,5,5\n",
        );
        let err = load_zone_catalog(&path).expect_err("duplicate");
        assert!(matches!(err, CatalogError::DuplicateZone { name } if name == "A"));
    }

    #[test]
    fn malformed_coordinate_reports_line_and_column() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "Name,Coordinate 1,Coordinate 2,Coordinate 3\nZ,\"0, 0\",\"0, 5, 7\",\"5, 5\"\n",
        );
        let err = load_zone_catalog(&path).expect_err("malformed");
        match err {
            CatalogError::MalformedCoordinate {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Coordinate 2");
                assert_eq!(value, "0, 5, 7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn too_few_vertices_fail_the_load() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "Name,Coordinate 1,Coordinate 2,Coordinate 3\nZ,\"0, 0\",\"0, 5\",\n",
        );
        let err = load_zone_catalog(&path).expect_err("too few");
        assert!(matches!(err, CatalogError::TooFewVertices { count: 2, .. }));
    }

    #[test]
    fn duplicate_zone_rows_fail_the_load() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(
            &temp,
            "Name,Coordinate 1,Coordinate 2,Coordinate 3\n\
             Z,\"0, 0\",\"0, 5\",\"5, 5\"\n\
             Z,\"10, 0\",\"10, 5\",\"15, 5\"\n",
        );
        let err = load_zone_catalog(&path).expect_err("duplicate");
        assert!(matches!(err, CatalogError::DuplicateZone { .. }));
    }

    #[test]
    fn unknown_header_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let path = write_catalog(&temp, "foo,bar\n1,2\n");
        let err = load_zone_catalog(&path).expect_err("layout");
        assert!(matches!(err, CatalogError::UnrecognizedLayout { .. }));
    }

    #[test]
    fn missing_file_is_a_missing_input() {
        let temp = TempDir::new().expect("temp");
        let err = load_zone_catalog(&temp.path().join("nope.csv")).expect_err("missing");
        assert!(matches!(err, CatalogError::MissingInput(_)));
    }

    #[test]
    fn number_extraction_handles_signs_decimals_and_exponents() {
        assert_eq!(extract_numbers("(-1200.5, 3400)"), vec![-1200.5, 3400.0]);
        assert_eq!(extract_numbers("x=1e3 y=-2.5E-1"), vec![1000.0, -0.25]);
        assert_eq!(extract_numbers("5-3"), vec![5.0, -3.0]);
        assert!(extract_numbers("n/a").is_empty());
    }
}
