//! Points that need altitudes, and the collections holding them.

/// A geographic point with an optional altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude: Option<f64>,
}

impl GeoPoint {
    /// A point without altitude.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            altitude: None,
        }
    }

    /// A point with a known altitude.
    pub fn with_altitude(lat: f64, lon: f64, altitude: f64) -> Self {
        Self {
            lat,
            lon,
            altitude: Some(altitude),
        }
    }

    /// Whether latitude is within ±90° and longitude within ±180°.
    /// NaN and infinite coordinates are invalid.
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Whether a lookup should assign this point an altitude.
    ///
    /// Points without altitude always qualify. Points at exactly zero qualify
    /// only when `overwrite_zeros` is set, zero being the placeholder many
    /// devices record when they have no fix.
    pub fn needs_lookup(&self, overwrite_zeros: bool) -> bool {
        match self.altitude {
            None => true,
            Some(alt) => overwrite_zeros && alt == 0.0,
        }
    }
}

/// A collection of points whose altitudes a lookup may set.
///
/// Lookups read every point and write altitudes back by index; they never
/// add, remove or move points.
pub trait PointProvider {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The point at `index`.
    fn point(&self, index: usize) -> GeoPoint;

    /// Replace the altitude of the point at `index`.
    fn set_altitude(&mut self, index: usize, altitude: f64);
}

impl PointProvider for [GeoPoint] {
    fn len(&self) -> usize {
        <[GeoPoint]>::len(self)
    }

    fn point(&self, index: usize) -> GeoPoint {
        self[index]
    }

    fn set_altitude(&mut self, index: usize, altitude: f64) {
        self[index].altitude = Some(altitude);
    }
}

impl PointProvider for Vec<GeoPoint> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn point(&self, index: usize) -> GeoPoint {
        self[index]
    }

    fn set_altitude(&mut self, index: usize, altitude: f64) {
        self[index].altitude = Some(altitude);
    }
}

/// What kinds of altitudes a collection already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AltitudeSurvey {
    /// At least one point has an altitude of exactly zero.
    pub has_zero: bool,
    /// At least one point has a non-zero altitude.
    pub has_non_zero: bool,
}

impl AltitudeSurvey {
    /// Survey every point of the collection.
    pub fn of<P: PointProvider + ?Sized>(points: &P) -> Self {
        let mut survey = Self::default();
        for i in 0..points.len() {
            match points.point(i).altitude {
                Some(alt) if alt == 0.0 => survey.has_zero = true,
                Some(_) => survey.has_non_zero = true,
                None => {}
            }
        }
        survey
    }

    /// Zero altitudes are placeholders when no real altitude exists.
    pub fn suggested_overwrite_zeros(&self) -> bool {
        self.has_zero && !self.has_non_zero
    }

    /// Zero and non-zero altitudes are mixed, so only the user can say
    /// whether the zeros are real.
    pub fn needs_confirmation(&self) -> bool {
        self.has_zero && self.has_non_zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_lookup() {
        assert!(GeoPoint::new(46.5, 7.5).needs_lookup(false));
        assert!(GeoPoint::new(46.5, 7.5).needs_lookup(true));

        let zero = GeoPoint::with_altitude(46.5, 7.5, 0.0);
        assert!(!zero.needs_lookup(false));
        assert!(zero.needs_lookup(true));

        let real = GeoPoint::with_altitude(46.5, 7.5, 120.0);
        assert!(!real.needs_lookup(false));
        assert!(!real.needs_lookup(true));
    }

    #[test]
    fn test_valid_coordinates() {
        assert!(GeoPoint::new(46.5, 7.5).has_valid_coordinates());
        assert!(GeoPoint::new(-90.0, 180.0).has_valid_coordinates());
        assert!(!GeoPoint::new(90.1, 7.5).has_valid_coordinates());
        assert!(!GeoPoint::new(46.5, -180.5).has_valid_coordinates());
        assert!(!GeoPoint::new(-1e12, 7.5).has_valid_coordinates());
        assert!(!GeoPoint::new(f64::NAN, 7.5).has_valid_coordinates());
        assert!(!GeoPoint::new(46.5, f64::INFINITY).has_valid_coordinates());
    }

    #[test]
    fn test_provider_for_vec() {
        let mut points = vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)];
        assert_eq!(PointProvider::len(&points), 2);

        points.set_altitude(1, 55.5);
        assert_eq!(points.point(1).altitude, Some(55.5));
        assert_eq!(points.point(0).altitude, None);

        let slice: &mut [GeoPoint] = &mut points;
        slice.set_altitude(0, 1.0);
        assert_eq!(points[0].altitude, Some(1.0));
    }

    #[test]
    fn test_survey_only_zeros() {
        let points = vec![
            GeoPoint::with_altitude(0.0, 0.0, 0.0),
            GeoPoint::new(0.0, 0.0),
        ];
        let survey = AltitudeSurvey::of(&points);
        assert!(survey.suggested_overwrite_zeros());
        assert!(!survey.needs_confirmation());
    }

    #[test]
    fn test_survey_mixed() {
        let points = vec![
            GeoPoint::with_altitude(0.0, 0.0, 0.0),
            GeoPoint::with_altitude(0.0, 0.0, 300.0),
        ];
        let survey = AltitudeSurvey::of(&points);
        assert!(!survey.suggested_overwrite_zeros());
        assert!(survey.needs_confirmation());
    }

    #[test]
    fn test_survey_no_altitudes() {
        let points = vec![GeoPoint::new(0.0, 0.0)];
        let survey = AltitudeSurvey::of(&points);
        assert_eq!(survey, AltitudeSurvey::default());
    }
}
