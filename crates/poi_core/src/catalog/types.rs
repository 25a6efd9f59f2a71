use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{point_in_polygon, polygon_centroid, BoundingBox, Point2};
use crate::MissingInputError;

pub const MIN_POLYGON_VERTICES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub label: String,
    pub polygon: Vec<Point2>,
    bounds: Option<BoundingBox>,
}

impl Zone {
    pub fn new(name: impl Into<String>, label: impl Into<String>, polygon: Vec<Point2>) -> Self {
        let bounds = BoundingBox::of(&polygon);
        Self {
            name: name.into(),
            label: label.into(),
            polygon,
            bounds,
        }
    }

    pub fn centroid(&self) -> Option<Point2> {
        polygon_centroid(&self.polygon)
    }

    pub fn contains(&self, point: Point2) -> bool {
        match self.bounds {
            Some(bounds) if bounds.contains(point) => point_in_polygon(point, &self.polygon),
            _ => false,
        }
    }
}

/// Zones in file order. Lookups by name are exact; classification scans in
/// catalog order and the first containing zone wins.
#[derive(Debug, Clone, Default)]
pub struct ZoneCatalog {
    zones: Vec<Zone>,
    index_by_name: HashMap<String, usize>,
}

impl ZoneCatalog {
    pub fn from_zones(zones: Vec<Zone>) -> Result<Self, CatalogError> {
        // Names first: a repeated run of vertex rows is usually also short.
        let mut index_by_name = HashMap::with_capacity(zones.len());
        for (idx, zone) in zones.iter().enumerate() {
            if index_by_name.insert(zone.name.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateZone {
                    name: zone.name.clone(),
                });
            }
        }
        if let Some(zone) = zones
            .iter()
            .find(|zone| zone.polygon.len() < MIN_POLYGON_VERTICES)
        {
            return Err(CatalogError::TooFewVertices {
                zone: zone.name.clone(),
                count: zone.polygon.len(),
            });
        }
        Ok(Self {
            zones,
            index_by_name,
        })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.index_by_name
            .get(name)
            .and_then(|idx| self.zones.get(*idx))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn classify(&self, point: Point2) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    MissingInput(#[from] MissingInputError),
    #[error("failed to read zone catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(
        "zone catalog {path} has an unrecognized header; expected either \
`Name` + `Coordinate 1..N` columns or `zone`, `x`, `y` columns"
    )]
    UnrecognizedLayout { path: PathBuf },
    #[error("zone catalog {path} line {line}: zone name must not be empty")]
    EmptyName { path: PathBuf, line: u64 },
    #[error(
        "zone catalog {path} line {line}: column '{column}' value '{value}' is not an x/y pair"
    )]
    MalformedCoordinate {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("zone catalog {path} line {line}: column '{column}' value '{value}' is not a number")]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("zone '{zone}' has {count} vertices; a polygon needs at least 3")]
    TooFewVertices { zone: String, count: usize },
    #[error("duplicate zone name '{name}' in catalog")]
    DuplicateZone { name: String },
    #[error("zone catalog {path} defines no zones")]
    Empty { path: PathBuf },
}
