//! Country outlines used for highlighting and containment lookups
//!
//! The built-in layer is a set of coarse hand-traced outlines, good enough
//! for a terminal globe. A proper GeoJSON country file can be loaded instead.

use crate::geo::Coordinate;
use crate::highlight::{HighlightError, RegionCode};
use crate::surface::SpatialQuery;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CODE_PROPERTY: &str = "iso_3166_1_alpha_3";

#[derive(Debug, Error)]
pub enum RegionLoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {index}: {reason}")]
    Geometry { index: usize, reason: String },
}

/// Where a layer's outlines come from
#[derive(Clone, Debug, PartialEq)]
pub enum LayerSource {
    Builtin,
    GeoJson { path: PathBuf, code_property: String },
}

impl LayerSource {
    pub fn load(&self) -> Result<RegionLayer, RegionLoadError> {
        match self {
            LayerSource::Builtin => Ok(RegionLayer::builtin()),
            LayerSource::GeoJson { path, code_property } => RegionLayer::load(path, code_property),
        }
    }
}

/// A ring of vertices, implicitly closed
pub type Ring = Vec<Coordinate>;

/// Outer ring followed by any holes
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    fn contains(&self, at: Coordinate) -> bool {
        let Some((outer, holes)) = self.rings.split_first() else {
            return false;
        };
        ring_contains(outer, at) && !holes.iter().any(|h| ring_contains(h, at))
    }

    pub fn outer(&self) -> &[Coordinate] {
        self.rings.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Even-odd ray cast in the lon/lat plane
fn ring_contains(ring: &[Coordinate], at: Coordinate) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > at.lat) != (b.lat > at.lat) {
            let cross = a.lon + (at.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
            if at.lon < cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Bounds {
    fn of(polygons: &[Polygon]) -> Self {
        let mut min = Coordinate::new(f64::INFINITY, f64::INFINITY);
        let mut max = Coordinate::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in polygons.iter().flat_map(|p| p.outer()) {
            min.lon = min.lon.min(c.lon);
            min.lat = min.lat.min(c.lat);
            max.lon = max.lon.max(c.lon);
            max.lat = max.lat.max(c.lat);
        }
        Self { min, max }
    }

    fn contains(&self, at: Coordinate) -> bool {
        at.lon >= self.min.lon && at.lon <= self.max.lon && at.lat >= self.min.lat && at.lat <= self.max.lat
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub code: RegionCode,
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bounds: Bounds,
}

impl Region {
    pub fn new(code: RegionCode, name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let bounds = Bounds::of(&polygons);
        Self {
            code,
            name: name.into(),
            polygons,
            bounds,
        }
    }

    pub fn contains(&self, at: Coordinate) -> bool {
        self.bounds.contains(at) && self.polygons.iter().any(|p| p.contains(at))
    }
}

/// A named set of regions queried by containment
#[derive(Clone, Debug, Default)]
pub struct RegionLayer {
    regions: Vec<Region>,
}

impl RegionLayer {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// First region containing `at`
    pub fn locate(&self, at: Coordinate) -> Option<&Region> {
        if !at.is_valid() {
            return None;
        }
        self.regions.iter().find(|r| r.contains(at))
    }

    pub fn find(&self, code: &RegionCode) -> Option<&Region> {
        self.regions.iter().find(|r| &r.code == code)
    }

    pub fn builtin() -> Self {
        let regions = BUILTIN
            .iter()
            .map(|(code, name, parts)| {
                let polygons = parts
                    .iter()
                    .map(|ring| Polygon {
                        rings: vec![ring.iter().map(|&(lon, lat)| Coordinate::new(lon, lat)).collect()],
                    })
                    .collect();
                Region::new(RegionCode::new(*code), *name, polygons)
            })
            .collect();
        Self { regions }
    }

    pub fn load(path: &Path, code_property: &str) -> Result<Self, RegionLoadError> {
        let text = fs::read_to_string(path).map_err(|source| RegionLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::from_geojson(&text, code_property)?;
        if layer.is_empty() {
            tracing::warn!("no features in {} carry a '{}' property", path.display(), code_property);
        }
        tracing::info!("loaded {} regions from {}", layer.len(), path.display());
        Ok(layer)
    }

    /// Parse a FeatureCollection of Polygon/MultiPolygon features.
    ///
    /// Features without a code or without area geometry are skipped.
    pub fn from_geojson(text: &str, code_property: &str) -> Result<Self, RegionLoadError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        let mut regions = Vec::new();

        for (index, feature) in collection.features.into_iter().enumerate() {
            let props = feature.properties.unwrap_or_default();
            let code = match props.get(code_property).and_then(Value::as_str) {
                Some(c) if !c.is_empty() => c.to_string(),
                _ => continue,
            };
            let name = ["name_en", "name"]
                .iter()
                .find_map(|k| props.get(*k).and_then(Value::as_str))
                .unwrap_or(&code)
                .to_string();

            let polygons = match feature.geometry {
                Some(Geometry::Polygon { coordinates }) => vec![polygon_from(index, coordinates)?],
                Some(Geometry::MultiPolygon { coordinates }) => coordinates
                    .into_iter()
                    .map(|p| polygon_from(index, p))
                    .collect::<Result<_, _>>()?,
                Some(Geometry::Other) | None => continue,
            };

            regions.push(Region::new(RegionCode::new(code), name, polygons));
        }

        Ok(Self { regions })
    }
}

impl SpatialQuery for RegionLayer {
    fn query_region(&self, at: Coordinate) -> Result<Option<RegionCode>, HighlightError> {
        Ok(self.locate(at).map(|r| r.code.clone()))
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    properties: Option<Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Other,
}

fn polygon_from(index: usize, rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon, RegionLoadError> {
    let rings = rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|pos| match pos.as_slice() {
                    [lon, lat, ..] => {
                        let c = Coordinate::new(*lon, *lat);
                        if c.is_valid() {
                            Ok(c)
                        } else {
                            Err(RegionLoadError::Geometry {
                                index,
                                reason: format!("position out of range: {:?}", pos),
                            })
                        }
                    }
                    _ => Err(RegionLoadError::Geometry {
                        index,
                        reason: "position with fewer than two values".to_string(),
                    }),
                })
                .collect::<Result<Ring, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rings.is_empty() {
        return Err(RegionLoadError::Geometry {
            index,
            reason: "polygon without rings".to_string(),
        });
    }
    Ok(Polygon { rings })
}

type Outline = &'static [(f64, f64)];

// (lon, lat) vertices
static BUILTIN: &[(&str, &str, &[Outline])] = &[
    ("USA", "United States", &[
        &[(-124.7, 48.4), (-95.0, 49.0), (-83.0, 46.0), (-67.0, 45.0), (-70.0, 41.5),
          (-75.5, 35.2), (-81.0, 31.0), (-80.0, 25.2), (-82.5, 27.8), (-84.0, 30.0),
          (-89.0, 30.2), (-94.0, 29.5), (-97.2, 26.0), (-103.0, 29.0), (-106.5, 31.8),
          (-111.0, 31.3), (-117.1, 32.5), (-120.6, 34.5), (-124.4, 40.4)],
        &[(-168.0, 65.6), (-166.0, 68.9), (-156.8, 71.3), (-141.0, 69.7), (-141.0, 60.3),
          (-150.0, 59.5), (-158.0, 56.5), (-165.0, 54.5), (-162.0, 58.5), (-165.0, 60.8)],
    ]),
    ("CAN", "Canada", &[
        &[(-141.0, 60.3), (-141.0, 69.7), (-125.0, 70.0), (-95.0, 72.0), (-80.0, 73.5),
          (-62.0, 67.0), (-64.0, 60.0), (-55.5, 52.0), (-59.0, 47.5), (-67.0, 45.0),
          (-83.0, 46.0), (-95.0, 49.0), (-124.7, 48.4), (-130.0, 54.7), (-137.5, 59.0)],
    ]),
    ("MEX", "Mexico", &[
        &[(-117.1, 32.5), (-111.0, 31.3), (-106.5, 31.8), (-103.0, 29.0), (-97.2, 26.0),
          (-97.7, 22.0), (-96.0, 19.0), (-94.5, 18.2), (-90.5, 21.0), (-87.0, 21.5),
          (-88.3, 18.5), (-92.2, 14.6), (-98.0, 16.0), (-105.7, 20.4), (-109.4, 23.2),
          (-115.0, 30.0)],
    ]),
    ("GRL", "Greenland", &[
        &[(-73.0, 78.0), (-60.0, 82.0), (-30.0, 83.5), (-20.0, 81.0), (-18.0, 76.0),
          (-22.0, 70.0), (-32.0, 68.0), (-43.0, 60.0), (-50.0, 64.0), (-54.0, 69.0),
          (-58.0, 75.5)],
    ]),
    ("ISL", "Iceland", &[
        &[(-24.0, 65.5), (-22.0, 66.4), (-16.5, 66.5), (-13.5, 65.2), (-15.0, 64.3),
          (-18.7, 63.4), (-22.7, 63.8)],
    ]),
    ("COL", "Colombia", &[
        &[(-77.3, 8.7), (-72.0, 12.0), (-72.4, 7.4), (-67.9, 6.2), (-67.0, 1.5),
          (-70.0, -4.0), (-70.0, -2.5), (-75.5, -0.2), (-78.8, 1.4)],
    ]),
    ("PER", "Peru", &[
        &[(-81.3, -4.5), (-78.5, -1.5), (-75.5, -0.2), (-70.0, -2.5), (-70.0, -4.0),
          (-73.9, -7.5), (-72.5, -10.0), (-69.5, -11.0), (-69.0, -15.5), (-70.4, -18.3),
          (-76.0, -14.5), (-79.5, -7.5)],
    ]),
    ("BRA", "Brazil", &[
        &[(-73.9, -7.5), (-70.0, -4.0), (-67.0, 1.5), (-60.0, 5.0), (-51.5, 4.2),
          (-50.0, 0.0), (-44.0, -2.5), (-35.0, -5.0), (-34.8, -7.5), (-39.0, -13.0),
          (-41.0, -22.0), (-48.5, -26.0), (-53.4, -33.7), (-57.6, -30.2), (-54.6, -25.6),
          (-58.0, -20.0), (-60.0, -16.0), (-65.3, -10.0), (-72.5, -10.0)],
    ]),
    ("ARG", "Argentina", &[
        &[(-68.6, -52.3), (-65.0, -55.0), (-69.0, -50.5), (-67.5, -46.0), (-65.0, -42.0),
          (-62.3, -38.8), (-57.5, -38.0), (-56.8, -36.4), (-58.4, -33.9), (-57.6, -30.2),
          (-54.6, -25.6), (-58.0, -20.0), (-62.6, -22.2), (-66.5, -22.0), (-68.5, -24.5),
          (-70.5, -32.0), (-70.0, -37.5), (-71.7, -43.0), (-72.5, -48.0), (-73.3, -50.5)],
    ]),
    ("GBR", "United Kingdom", &[
        &[(-5.7, 50.0), (1.4, 51.2), (1.7, 52.7), (-0.2, 54.0), (-2.0, 55.8),
          (-1.8, 57.6), (-3.0, 58.6), (-5.0, 58.6), (-6.2, 56.8), (-5.0, 55.0),
          (-3.2, 54.6), (-4.6, 53.3), (-3.2, 51.4), (-5.2, 51.7)],
    ]),
    ("IRL", "Ireland", &[
        &[(-10.4, 51.6), (-6.0, 52.2), (-6.0, 54.0), (-7.4, 55.3), (-10.0, 54.2)],
    ]),
    ("PRT", "Portugal", &[
        &[(-8.9, 41.9), (-6.9, 41.9), (-7.0, 39.0), (-7.4, 37.2), (-8.9, 37.0), (-9.5, 38.7)],
    ]),
    ("ESP", "Spain", &[
        &[(-9.3, 43.0), (-1.8, 43.4), (3.2, 42.3), (0.3, 40.0), (-0.7, 37.6),
          (-5.6, 36.0), (-7.4, 37.2), (-7.0, 39.0), (-6.9, 41.9), (-8.9, 41.9)],
    ]),
    ("FRA", "France", &[
        &[(-4.8, 48.5), (-1.5, 48.6), (1.6, 50.9), (4.2, 49.9), (8.2, 49.0),
          (7.6, 47.6), (6.8, 46.4), (7.6, 43.8), (3.2, 43.3), (-1.8, 43.4),
          (-1.2, 46.0), (-2.5, 47.3)],
    ]),
    ("DEU", "Germany", &[
        &[(6.1, 50.8), (5.9, 53.4), (8.6, 53.9), (9.4, 54.8), (14.1, 53.8),
          (14.8, 50.9), (12.1, 50.2), (13.8, 48.6), (13.0, 47.5), (7.6, 47.6),
          (8.2, 49.0), (6.4, 49.5)],
    ]),
    ("POL", "Poland", &[
        &[(14.1, 53.8), (18.0, 54.8), (23.5, 54.2), (23.6, 51.5), (24.0, 50.4),
          (22.6, 49.1), (18.8, 49.5), (14.8, 50.9)],
    ]),
    ("ITA", "Italy", &[
        &[(6.8, 45.9), (10.4, 46.9), (13.7, 46.5), (12.3, 45.2), (13.6, 43.6),
          (16.0, 41.5), (18.5, 40.1), (16.2, 38.0), (15.6, 40.0), (12.5, 41.7),
          (10.5, 42.9), (8.7, 44.4), (7.5, 43.8)],
    ]),
    ("NOR", "Norway", &[
        &[(5.0, 62.0), (5.5, 58.6), (7.0, 58.0), (10.5, 59.3), (11.8, 59.0),
          (12.5, 61.5), (12.0, 63.5), (14.5, 65.5), (16.5, 68.5), (20.0, 69.0),
          (28.5, 70.7), (30.8, 69.8), (25.0, 71.1), (16.0, 69.5), (12.4, 66.0),
          (8.0, 63.5)],
    ]),
    ("SWE", "Sweden", &[
        &[(11.8, 59.0), (12.7, 56.2), (14.5, 55.4), (16.4, 56.6), (18.7, 60.0),
          (17.5, 61.5), (21.0, 64.5), (24.0, 65.8), (20.0, 69.0), (16.5, 68.5),
          (14.5, 65.5), (12.0, 63.5), (12.5, 61.5)],
    ]),
    ("FIN", "Finland", &[
        &[(21.4, 60.2), (26.0, 60.4), (28.0, 60.5), (30.0, 62.0), (29.5, 64.0),
          (30.0, 67.5), (28.5, 68.6), (28.5, 70.0), (25.0, 68.6), (20.6, 69.1),
          (24.0, 65.8), (21.0, 64.5)],
    ]),
    ("UKR", "Ukraine", &[
        &[(22.1, 48.4), (24.0, 50.4), (23.6, 51.5), (31.5, 52.1), (35.0, 52.3),
          (40.0, 49.6), (38.0, 47.0), (35.0, 45.6), (33.5, 44.5), (30.0, 45.5),
          (28.2, 48.2)],
    ]),
    ("TUR", "Turkey", &[
        &[(26.0, 40.6), (26.6, 41.6), (29.0, 41.2), (35.0, 42.0), (41.5, 41.5),
          (44.8, 39.7), (44.2, 37.2), (42.2, 37.1), (36.7, 36.8), (36.0, 36.0),
          (32.5, 36.1), (29.7, 36.2), (27.4, 37.2)],
    ]),
    ("RUS", "Russia", &[
        &[(28.0, 60.5), (27.5, 57.5), (31.5, 52.1), (35.0, 52.3), (40.0, 49.6),
          (38.0, 47.0), (48.0, 42.0), (47.5, 45.5), (50.5, 46.5), (61.0, 51.0),
          (73.0, 54.0), (87.0, 49.0), (90.0, 50.5), (97.5, 50.0), (107.0, 50.4),
          (116.0, 49.8), (117.0, 49.5), (120.0, 53.3), (127.5, 49.5), (135.0, 48.3),
          (131.5, 43.0), (140.0, 48.0), (142.0, 54.0), (135.0, 55.0), (142.0, 59.5),
          (156.0, 61.5), (163.0, 57.0), (161.8, 60.5), (170.0, 60.0), (180.0, 65.0),
          (180.0, 71.0), (140.0, 73.0), (113.0, 73.5), (104.0, 77.7), (90.0, 75.5),
          (68.0, 73.0), (60.0, 69.5), (44.0, 68.5), (33.0, 69.3), (28.5, 70.0),
          (30.0, 67.5), (29.5, 64.0), (30.0, 62.0)],
        &[(-180.0, 65.0), (-169.7, 66.1), (-180.0, 69.0)],
    ]),
    ("KAZ", "Kazakhstan", &[
        &[(50.5, 46.5), (61.0, 51.0), (73.0, 54.0), (87.0, 49.0), (82.5, 45.5),
          (80.0, 42.2), (73.5, 43.0), (68.0, 41.0), (56.0, 41.3), (53.0, 42.0),
          (51.0, 44.5)],
    ]),
    ("MNG", "Mongolia", &[
        &[(87.0, 49.0), (90.0, 50.5), (97.5, 50.0), (107.0, 50.4), (116.0, 49.8),
          (119.5, 47.0), (111.0, 43.7), (105.0, 41.6), (96.0, 42.7), (90.5, 45.5)],
    ]),
    ("CHN", "China", &[
        &[(73.5, 39.5), (80.0, 42.2), (82.5, 45.5), (87.0, 49.0), (90.5, 45.5),
          (96.0, 42.7), (105.0, 41.6), (111.0, 43.7), (119.5, 47.0), (117.0, 49.5),
          (120.0, 53.3), (127.5, 49.5), (135.0, 48.3), (131.5, 43.0), (124.5, 40.0),
          (121.0, 40.8), (122.5, 37.5), (119.0, 35.0), (122.0, 30.0), (117.0, 23.5),
          (110.0, 20.5), (108.0, 21.6), (101.7, 21.2), (97.5, 24.0), (98.5, 27.8),
          (92.0, 27.8), (86.0, 28.0), (81.0, 30.2), (78.5, 32.5), (79.5, 35.5),
          (75.0, 37.0)],
    ]),
    ("KOR", "South Korea", &[
        &[(126.2, 34.5), (126.5, 37.7), (128.4, 38.6), (129.5, 36.0), (129.2, 35.1)],
    ]),
    ("JPN", "Japan", &[
        &[(130.0, 31.2), (131.4, 31.4), (132.0, 33.5), (135.0, 33.5), (137.0, 34.5),
          (139.9, 35.0), (140.8, 36.0), (141.0, 38.5), (141.5, 41.5), (145.5, 43.3),
          (144.5, 44.2), (141.6, 45.5), (139.8, 42.4), (140.0, 40.0), (136.8, 37.3),
          (133.0, 35.5), (130.8, 34.0)],
    ]),
    ("PAK", "Pakistan", &[
        &[(61.5, 25.1), (66.6, 25.4), (68.2, 23.7), (69.5, 27.0), (71.0, 30.0),
          (74.5, 33.0), (75.0, 37.0), (71.5, 36.6), (70.0, 34.0), (69.0, 31.5),
          (66.5, 30.0), (61.8, 29.8), (63.0, 26.5)],
    ]),
    ("IND", "India", &[
        &[(68.2, 23.7), (72.6, 21.3), (73.0, 16.0), (77.3, 8.0), (80.3, 13.5),
          (80.2, 15.9), (86.6, 20.0), (88.0, 21.6), (89.0, 26.4), (92.0, 27.8),
          (97.0, 28.0), (94.0, 24.0), (92.5, 22.0), (91.5, 24.0), (88.3, 24.9),
          (88.0, 27.3), (86.0, 28.0), (81.0, 30.2), (78.5, 32.5), (79.5, 35.5),
          (75.0, 37.0), (74.5, 33.0), (71.0, 30.0), (69.5, 27.0)],
    ]),
    ("IRN", "Iran", &[
        &[(44.8, 39.7), (48.0, 38.5), (53.9, 37.3), (61.0, 36.6), (60.5, 33.7),
          (61.8, 29.8), (63.0, 26.5), (61.5, 25.1), (57.3, 25.8), (54.0, 26.7),
          (50.1, 30.2), (48.6, 29.9), (46.0, 33.0), (45.5, 35.8)],
    ]),
    ("SAU", "Saudi Arabia", &[
        &[(34.6, 28.1), (37.0, 31.5), (42.0, 31.2), (47.5, 29.0), (48.5, 28.0),
          (50.2, 26.6), (51.6, 24.3), (55.6, 22.7), (52.0, 19.0), (48.2, 18.2),
          (43.0, 16.7), (42.5, 16.5), (39.0, 21.5), (38.0, 24.5)],
    ]),
    ("EGY", "Egypt", &[
        &[(25.0, 31.6), (34.2, 31.3), (34.9, 29.5), (32.6, 29.9), (36.9, 22.0), (25.0, 22.0)],
    ]),
    ("LBY", "Libya", &[
        &[(9.5, 30.2), (11.5, 33.1), (15.2, 32.3), (20.0, 31.0), (25.0, 31.6),
          (25.0, 20.0), (24.0, 19.5), (15.9, 23.4), (11.9, 23.5), (10.0, 24.5)],
    ]),
    ("DZA", "Algeria", &[
        &[(-8.7, 27.3), (-8.7, 29.5), (-2.0, 35.1), (8.6, 36.9), (8.4, 32.5),
          (9.5, 30.2), (10.0, 24.5), (11.9, 23.5), (5.6, 19.6), (3.1, 19.1), (-4.8, 25.0)],
    ]),
    ("NGA", "Nigeria", &[
        &[(2.7, 6.4), (2.7, 12.0), (3.6, 11.7), (4.0, 13.5), (9.0, 12.8),
          (13.6, 13.7), (14.6, 12.0), (13.5, 10.0), (11.7, 6.8), (8.5, 4.8), (6.0, 4.3)],
    ]),
    ("ETH", "Ethiopia", &[
        &[(33.0, 8.0), (35.0, 11.0), (36.5, 14.2), (42.4, 12.5), (43.3, 11.4),
          (44.0, 9.0), (48.0, 8.0), (44.0, 4.9), (41.9, 4.0), (35.8, 5.3)],
    ]),
    ("KEN", "Kenya", &[
        &[(33.9, -1.0), (34.0, 4.2), (35.8, 5.3), (41.9, 4.0), (41.0, -0.9),
          (41.6, -1.7), (39.2, -4.7), (37.7, -3.1)],
    ]),
    ("ZAF", "South Africa", &[
        &[(16.5, -28.6), (20.0, -24.8), (20.0, -22.0), (26.0, -24.7), (29.5, -22.1),
          (31.5, -22.3), (32.9, -26.8), (31.0, -29.5), (27.5, -33.3), (22.5, -34.0),
          (18.5, -34.1), (17.7, -32.5)],
    ]),
    ("IDN", "Indonesia", &[
        &[(95.3, 5.6), (98.0, 4.0), (104.0, -1.0), (106.0, -5.9), (104.5, -5.9),
          (101.0, -2.5), (98.5, 1.5), (95.2, 3.0)],
        &[(105.2, -6.8), (106.1, -6.0), (111.0, -6.4), (114.6, -7.8), (114.4, -8.7),
          (108.0, -7.8)],
    ]),
    ("AUS", "Australia", &[
        &[(113.5, -22.0), (114.0, -26.5), (115.0, -34.3), (118.0, -35.0), (123.5, -33.9),
          (129.0, -31.7), (135.0, -34.5), (138.0, -35.5), (140.6, -38.0), (146.3, -39.0),
          (150.0, -37.5), (153.6, -28.5), (153.1, -25.0), (146.3, -19.0), (145.4, -15.0),
          (142.5, -10.7), (141.6, -12.5), (141.5, -17.0), (136.5, -15.5), (135.5, -12.0),
          (132.5, -11.5), (129.5, -15.0), (125.7, -14.5), (122.2, -17.5), (121.0, -19.5),
          (116.7, -20.6)],
    ]),
    ("NZL", "New Zealand", &[
        &[(172.7, -34.4), (174.3, -36.0), (178.5, -37.7), (176.9, -39.5), (174.8, -41.3),
          (173.8, -39.1)],
        &[(172.7, -40.5), (174.3, -41.7), (173.0, -43.8), (171.2, -44.5), (169.3, -46.6),
          (166.5, -46.0), (168.3, -44.0), (171.4, -41.8)],
    ]),
    ("ATA", "Antarctica", &[
        &[(-180.0, -90.0), (180.0, -90.0), (180.0, -71.0), (90.0, -66.5), (0.0, -70.0),
          (-60.0, -63.5), (-100.0, -73.0), (-180.0, -77.0)],
    ]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn code_at(layer: &RegionLayer, lon: f64, lat: f64) -> Option<String> {
        layer.locate(Coordinate::new(lon, lat)).map(|r| r.code.to_string())
    }

    #[test]
    fn builtin_finds_well_known_cities() {
        let layer = RegionLayer::builtin();
        assert_eq!(code_at(&layer, 2.35, 48.86).as_deref(), Some("FRA"));
        assert_eq!(code_at(&layer, -0.1, 51.5).as_deref(), Some("GBR"));
        assert_eq!(code_at(&layer, 139.7, 35.7).as_deref(), Some("JPN"));
        assert_eq!(code_at(&layer, -74.0, 40.7).as_deref(), Some("USA"));
        assert_eq!(code_at(&layer, 151.2, -33.9).as_deref(), Some("AUS"));
        assert_eq!(code_at(&layer, 37.6, 55.8).as_deref(), Some("RUS"));
        assert_eq!(code_at(&layer, -150.0, 61.2).as_deref(), Some("USA"));
    }

    #[test]
    fn open_ocean_is_unresolved() {
        let layer = RegionLayer::builtin();
        assert_eq!(code_at(&layer, -30.0, 30.0), None);
        assert_eq!(code_at(&layer, -150.0, 0.0), None);
        assert_eq!(code_at(&layer, 0.0, 90.0), None);
    }

    #[test]
    fn invalid_coordinates_never_match() {
        let layer = RegionLayer::builtin();
        assert_eq!(code_at(&layer, f64::NAN, 48.0), None);
    }

    #[test]
    fn builtin_codes_are_unique() {
        let layer = RegionLayer::builtin();
        let mut codes: Vec<_> = layer.regions().iter().map(|r| r.code.clone()).collect();
        let total = codes.len();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), total);
        assert!(layer.find(&RegionCode::new("NZL")).is_some());
    }

    #[test]
    fn holes_are_excluded() {
        let square = |d: f64| -> Ring {
            vec![
                Coordinate::new(-d, -d),
                Coordinate::new(d, -d),
                Coordinate::new(d, d),
                Coordinate::new(-d, d),
            ]
        };
        let region = Region::new(
            RegionCode::new("DON"),
            "Donut",
            vec![Polygon { rings: vec![square(10.0), square(2.0)] }],
        );
        assert!(region.contains(Coordinate::new(5.0, 5.0)));
        assert!(!region.contains(Coordinate::new(0.0, 0.0)));
        assert!(!region.contains(Coordinate::new(11.0, 0.0)));
    }

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "iso_3166_1_alpha_3": "AAA", "name_en": "Alpha" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "iso_3166_1_alpha_3": "BBB" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 0, 5], [30, 0, 5], [30, 10, 5], [20, 0, 5]]],
                        [[[40, 0], [50, 0], [50, 10], [40, 10]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "No code" },
                "geometry": { "type": "Polygon", "coordinates": [[[60, 0], [70, 0], [70, 10]]] }
            },
            {
                "type": "Feature",
                "properties": { "iso_3166_1_alpha_3": "CCC" },
                "geometry": { "type": "Point", "coordinates": [1, 1] }
            }
        ]
    }"#;

    #[test]
    fn geojson_polygons_and_multipolygons() {
        let layer = RegionLayer::from_geojson(GEOJSON, DEFAULT_CODE_PROPERTY).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.regions()[0].name, "Alpha");
        assert_eq!(layer.regions()[1].name, "BBB");
        assert_eq!(code_at(&layer, 5.0, 5.0).as_deref(), Some("AAA"));
        assert_eq!(code_at(&layer, 45.0, 5.0).as_deref(), Some("BBB"));
        assert_eq!(code_at(&layer, 65.0, 1.0), None);
    }

    #[test]
    fn geojson_custom_code_property() {
        let layer = RegionLayer::from_geojson(GEOJSON, "name").unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.regions()[0].code.as_str(), "No code");
    }

    #[test]
    fn geojson_rejects_out_of_range_positions() {
        let bad = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{"iso_3166_1_alpha_3":"BAD"},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[500,0],[0,10]]]}}]}"#;
        let err = RegionLayer::from_geojson(bad, DEFAULT_CODE_PROPERTY).unwrap_err();
        assert!(matches!(err, RegionLoadError::Geometry { index: 0, .. }));
    }

    #[test]
    fn geojson_syntax_errors_surface() {
        let err = RegionLayer::from_geojson("{ not json", DEFAULT_CODE_PROPERTY).unwrap_err();
        assert!(matches!(err, RegionLoadError::Json(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LayerSource::GeoJson {
            path: PathBuf::from("/nonexistent/countries.geojson"),
            code_property: DEFAULT_CODE_PROPERTY.to_string(),
        }
        .load()
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/countries.geojson"));
    }

    #[test]
    fn layer_answers_spatial_queries() {
        let layer = RegionLayer::builtin();
        let code = layer.query_region(Coordinate::new(2.35, 48.86)).unwrap();
        assert_eq!(code, Some(RegionCode::new("FRA")));
    }
}
