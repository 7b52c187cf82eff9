//! GeoJSON tracks.
//!
//! Enable the `geojson` feature to use this module. [`GeoJsonTrack`] exposes
//! every position of a GeoJSON document as a point so that a lookup can fill
//! in the third (altitude) coordinate.
//!
//! # Example
//!
//! ```ignore
//! use srtm_lookup::geojson::GeoJsonTrack;
//! use srtm_lookup::lookup::{CancelToken, LookupOptions, NoProgress};
//!
//! let doc: geojson::GeoJson = r#"{"type": "LineString", "coordinates": [[7.5, 46.5], [7.6, 46.6]]}"#
//!     .parse()
//!     .unwrap();
//! let mut track = GeoJsonTrack::new(doc)?;
//! orchestrator.run(&mut track, LookupOptions::default(), &mut NoProgress, &CancelToken::new());
//! let doc = track.into_geojson();
//! // {"type": "LineString", "coordinates": [[7.5, 46.5, 1520.0], [7.6, 46.6, 1611.0]]}
//! ```

use geojson::{GeoJson, Value as GeoJsonValue};

use crate::error::{LookupError, Result};
use crate::point::{GeoPoint, PointProvider};

/// A GeoJSON document viewed as a flat list of points.
///
/// Positions are visited in document order. The third coordinate, when
/// present, is the point's altitude.
#[derive(Debug, Clone)]
pub struct GeoJsonTrack {
    document: GeoJson,
    points: Vec<GeoPoint>,
}

impl GeoJsonTrack {
    /// Collect the positions of a document.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidCoordinate`] if a position has fewer than
    /// two elements.
    pub fn new(mut document: GeoJson) -> Result<Self> {
        let mut points = Vec::new();
        let mut invalid = None;

        visit_positions(&mut document, &mut |position: &mut Vec<f64>| {
            if position.len() < 2 {
                invalid.get_or_insert(position.len());
                return;
            }
            points.push(GeoPoint {
                lon: position[0],
                lat: position[1],
                altitude: position.get(2).copied(),
            });
        });

        if let Some(len) = invalid {
            return Err(LookupError::InvalidCoordinate {
                message: format!("position has {} elements, expected at least 2", len),
            });
        }

        Ok(Self { document, points })
    }

    /// The collected points.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// The document with altitudes written into every position that has one.
    pub fn into_geojson(mut self) -> GeoJson {
        let mut points = self.points.iter();

        visit_positions(&mut self.document, &mut |position: &mut Vec<f64>| {
            let Some(point) = points.next() else {
                return;
            };
            if let Some(altitude) = point.altitude {
                position.truncate(2);
                position.push(altitude);
            }
        });

        self.document
    }
}

impl PointProvider for GeoJsonTrack {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> GeoPoint {
        self.points[index]
    }

    fn set_altitude(&mut self, index: usize, altitude: f64) {
        self.points[index].altitude = Some(altitude);
    }
}

fn visit_positions(document: &mut GeoJson, f: &mut dyn FnMut(&mut Vec<f64>)) {
    match document {
        GeoJson::Geometry(geometry) => visit_value(&mut geometry.value, f),
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry.as_mut() {
                visit_value(&mut geometry.value, f);
            }
        }
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features.iter_mut() {
                if let Some(geometry) = feature.geometry.as_mut() {
                    visit_value(&mut geometry.value, f);
                }
            }
        }
    }
}

fn visit_value(value: &mut GeoJsonValue, f: &mut dyn FnMut(&mut Vec<f64>)) {
    match value {
        GeoJsonValue::Point(position) => f(position),
        GeoJsonValue::MultiPoint(positions) | GeoJsonValue::LineString(positions) => {
            positions.iter_mut().for_each(|p| f(p));
        }
        GeoJsonValue::MultiLineString(lines) | GeoJsonValue::Polygon(lines) => {
            lines.iter_mut().flatten().for_each(|p| f(p));
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            polygons
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(|p| f(p));
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            for geometry in geometries.iter_mut() {
                visit_value(&mut geometry.value, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeoJson {
        json.parse().unwrap()
    }

    #[test]
    fn test_line_string_points() {
        let track = GeoJsonTrack::new(parse(
            r#"{"type": "LineString", "coordinates": [[7.5, 46.5], [7.6, 46.6, 1200.0]]}"#,
        ))
        .unwrap();

        assert_eq!(track.points().len(), 2);
        assert_eq!(track.points()[0], GeoPoint::new(46.5, 7.5));
        assert_eq!(track.points()[1], GeoPoint::with_altitude(46.6, 7.6, 1200.0));
    }

    #[test]
    fn test_write_back() {
        let mut track = GeoJsonTrack::new(parse(
            r#"{"type": "LineString", "coordinates": [[7.5, 46.5], [7.6, 46.6]]}"#,
        ))
        .unwrap();
        track.set_altitude(0, 1520.25);

        let doc = track.into_geojson();
        match doc {
            GeoJson::Geometry(g) => match g.value {
                GeoJsonValue::LineString(coords) => {
                    assert_eq!(coords[0], vec![7.5, 46.5, 1520.25]);
                    assert_eq!(coords[1], vec![7.6, 46.6]);
                }
                other => panic!("Expected LineString, got {:?}", other),
            },
            other => panic!("Expected Geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_collection_order() {
        let mut track = GeoJsonTrack::new(parse(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
                    {"type": "Feature", "properties": {}, "geometry": null},
                    {"type": "Feature", "properties": {}, "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[3.0, 4.0], [5.0, 6.0], [3.0, 4.0]]]
                    }}
                ]
            }"#,
        ))
        .unwrap();

        let lats: Vec<f64> = track.points().iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![2.0, 4.0, 6.0, 4.0]);

        for i in 0..track.len() {
            track.set_altitude(i, i as f64 * 10.0);
        }
        let json = track.into_geojson().to_string();
        assert!(json.contains("[1.0,2.0,0.0]"));
        assert!(json.contains("[5.0,6.0,20.0]"));
        assert!(json.contains("[3.0,4.0,30.0]"));
    }

    #[test]
    fn test_geometry_collection() {
        let track = GeoJsonTrack::new(parse(
            r#"{
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Point", "coordinates": [1.0, 2.0]},
                    {"type": "MultiPoint", "coordinates": [[3.0, 4.0], [5.0, 6.0]]}
                ]
            }"#,
        ))
        .unwrap();
        assert_eq!(track.len(), 3);
    }

    #[test]
    fn test_short_position() {
        let doc = GeoJson::Geometry(geojson::Geometry::new(GeoJsonValue::Point(vec![1.0])));
        let result = GeoJsonTrack::new(doc);
        assert!(matches!(result, Err(LookupError::InvalidCoordinate { .. })));
    }
}
