//! Route projection - itinerary days placed on the globe.
//!
//! Every day plan that carries coordinates becomes a [`Waypoint`] on a sphere
//! of radius `globe_radius`; consecutive waypoints are joined by an arced
//! [`Segment`] that lifts off the surface in proportion to its length.

use nalgebra::Vector3;
use std::f64::consts::PI;

use crate::itinerary::{GeoPoint, Itinerary, PoiGroups, Weather};

/// Placeholder used when nothing in the itinerary has coordinates.
pub const FALLBACK_POINT: GeoPoint = GeoPoint { lat: 20.0, lng: 0.0 };
pub const FALLBACK_NAME: &str = "No Coordinates Available";

/// Latitude difference under which the route end is treated as the last stop.
const END_MERGE_DEGREES: f64 = 0.1;

/// Projects a latitude/longitude pair onto a sphere.
pub fn lat_lng_to_vector3(lat: f64, lng: f64, radius: f64) -> Vector3<f64> {
    let phi = (90.0 - lat).to_radians();
    let theta = (lng + 180.0).to_radians();

    Vector3::new(
        -(radius * phi.sin() * theta.cos()),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Samples the arc between two surface points.
///
/// Points are spread linearly, pushed back onto the sphere, then raised by
/// `sin(t·π)·0.2·chord` so longer hops arc higher.
pub fn arc_points(p1: &Vector3<f64>, p2: &Vector3<f64>, radius: f64) -> Vec<Vector3<f64>> {
    let distance = (p2 - p1).norm();
    let steps = ((distance * 10.0).ceil() as usize).max(20);

    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let mut p = p1.lerp(p2, t);
            if p.norm() > f64::EPSILON {
                p = p.normalize() * radius;
            }
            let height = (t * PI).sin() * (distance * 0.2);
            p * (1.0 + height / radius)
        })
        .collect()
}

/// Kind of marker a waypoint is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    Start,
    Stop,
    End,
}

/// Day-plan details carried by a waypoint for its info panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointDetails {
    pub stay: Option<String>,
    pub activities: Vec<String>,
    pub travels: Vec<String>,
    pub weather: Option<Weather>,
    pub approximate_cost: Option<f64>,
    pub pois: Option<PoiGroups>,
}

/// A day plan projected onto the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub position: Vector3<f64>,
    pub geo: GeoPoint,
    pub name: String,
    /// Day index for display; None for route endpoints
    pub day: Option<u32>,
    pub role: WaypointRole,
    pub details: WaypointDetails,
}

/// Path between two consecutive waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub points: Vec<Vector3<f64>>,
    /// Straight-line distance between the endpoints
    pub chord: f64,
    /// Travel descriptions of the arrival waypoint
    pub travels: Vec<String>,
}

/// A position on a segment plus the local direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSample {
    pub point: Vector3<f64>,
    pub tangent: Vector3<f64>,
}

impl Segment {
    /// True when both endpoints coincide (duplicate consecutive coordinates).
    pub fn is_degenerate(&self) -> bool {
        self.chord <= 1e-9 || self.points.len() < 2
    }

    /// True when the arrival day names at least one way of getting there.
    pub fn has_travels(&self) -> bool {
        self.travels.iter().any(|t| !t.trim().is_empty())
    }

    /// Travel descriptions joined for display.
    pub fn travel_label(&self) -> String {
        self.travels.join(", ")
    }

    /// Samples the segment at `progress` in [0, 1].
    pub fn sample(&self, progress: f64) -> SegmentSample {
        match self.points.len() {
            0 => SegmentSample {
                point: Vector3::zeros(),
                tangent: Vector3::zeros(),
            },
            1 => SegmentSample {
                point: self.points[0],
                tangent: Vector3::zeros(),
            },
            n => {
                let f = progress.clamp(0.0, 1.0) * (n - 1) as f64;
                let i = (f.floor() as usize).min(n - 2);
                let frac = f - i as f64;
                let a = self.points[i];
                let b = self.points[i + 1];
                SegmentSample {
                    point: a.lerp(&b, frac),
                    tangent: b - a,
                }
            }
        }
    }
}

/// Ordered waypoints and the segments between them. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    segments: Vec<Segment>,
    radius: f64,
}

impl Route {
    /// Builds the route for an itinerary: start endpoint, every day with
    /// coordinates, then the end endpoint unless it sits on the last stop.
    pub fn from_itinerary(itinerary: &Itinerary, radius: f64) -> Self {
        let mut stops: Vec<(GeoPoint, String, Option<u32>, WaypointDetails)> = Vec::new();
        let endpoints = itinerary.coordinates.clone().unwrap_or_default();

        if let Some(start) = endpoints.start {
            stops.push((start, itinerary.from.clone(), None, WaypointDetails::default()));
        }

        for plan in &itinerary.day_plans {
            if let Some(geo) = plan.coordinates {
                let details = WaypointDetails {
                    stay: (!plan.stay.is_empty()).then(|| plan.stay.clone()),
                    activities: plan.activities.clone(),
                    travels: plan.travels.clone(),
                    weather: plan.weather,
                    approximate_cost: plan.approximate_cost,
                    pois: plan.pois.clone(),
                };
                stops.push((geo, plan.display_name(), Some(plan.day), details));
            }
        }

        if let Some(end) = endpoints.end {
            let merges = stops
                .last()
                .is_some_and(|(last, ..)| (last.lat - end.lat).abs() <= END_MERGE_DEGREES);
            if !merges {
                stops.push((end, itinerary.to.clone(), None, WaypointDetails::default()));
            }
        }

        if stops.is_empty() {
            stops.push((
                FALLBACK_POINT,
                FALLBACK_NAME.to_string(),
                None,
                WaypointDetails::default(),
            ));
        }

        let last = stops.len() - 1;
        let waypoints = stops
            .into_iter()
            .enumerate()
            .map(|(idx, (geo, name, day, details))| Waypoint {
                position: lat_lng_to_vector3(geo.lat, geo.lng, radius),
                geo,
                name,
                day,
                role: if idx == 0 {
                    WaypointRole::Start
                } else if idx == last {
                    WaypointRole::End
                } else {
                    WaypointRole::Stop
                },
                details,
            })
            .collect();

        Self::from_waypoints(waypoints, radius)
    }

    /// Builds a route from already-projected waypoints.
    ///
    /// An empty list is replaced by the placeholder waypoint.
    pub fn from_waypoints(mut waypoints: Vec<Waypoint>, radius: f64) -> Self {
        if waypoints.is_empty() {
            waypoints.push(Waypoint {
                position: lat_lng_to_vector3(FALLBACK_POINT.lat, FALLBACK_POINT.lng, radius),
                geo: FALLBACK_POINT,
                name: FALLBACK_NAME.to_string(),
                day: None,
                role: WaypointRole::Start,
                details: WaypointDetails::default(),
            });
        }

        let segments = waypoints
            .windows(2)
            .map(|pair| Segment {
                points: arc_points(&pair[0].position, &pair[1].position, radius),
                chord: (pair[1].position - pair[0].position).norm(),
                travels: pair[1].details.travels.clone(),
            })
            .collect();

        Self {
            waypoints,
            segments,
            radius,
        }
    }

    /// Convenience constructor from bare coordinates (tests, fixtures).
    pub fn from_points(points: &[GeoPoint], radius: f64) -> Self {
        let last = points.len().saturating_sub(1);
        let waypoints = points
            .iter()
            .enumerate()
            .map(|(idx, geo)| Waypoint {
                position: lat_lng_to_vector3(geo.lat, geo.lng, radius),
                geo: *geo,
                name: format!("Stop {}", idx),
                day: Some(idx as u32),
                role: if idx == 0 {
                    WaypointRole::Start
                } else if idx == last {
                    WaypointRole::End
                } else {
                    WaypointRole::Stop
                },
                details: WaypointDetails::default(),
            })
            .collect();
        Self::from_waypoints(waypoints, radius)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment leaving waypoint `index`, if there is one.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::DayPlan;
    use approx::assert_relative_eq;

    fn day(day: u32, lat: f64, lng: f64) -> DayPlan {
        DayPlan {
            day,
            coordinates: Some(GeoPoint::new(lat, lng)),
            travels: vec![format!("Train to stop {}", day)],
            ..Default::default()
        }
    }

    #[test]
    fn test_projection_lies_on_sphere() {
        let p = lat_lng_to_vector3(48.85, 2.35, 5.0);
        assert_relative_eq!(p.norm(), 5.0, epsilon = 1e-9);

        let north = lat_lng_to_vector3(90.0, 0.0, 5.0);
        assert_relative_eq!(north.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_arc_points_endpoints_and_lift() {
        let a = lat_lng_to_vector3(0.0, 0.0, 5.0);
        let b = lat_lng_to_vector3(0.0, 90.0, 5.0);
        let points = arc_points(&a, &b, 5.0);

        let chord = (b - a).norm();
        assert_eq!(points.len(), ((chord * 10.0).ceil() as usize).max(20) + 1);
        assert_relative_eq!(points[0], a, epsilon = 1e-9);
        assert_relative_eq!(*points.last().unwrap(), b, epsilon = 1e-9);

        let mid = points[points.len() / 2];
        assert!(mid.norm() > 5.0);
    }

    #[test]
    fn test_short_arc_uses_minimum_steps() {
        let a = lat_lng_to_vector3(10.0, 10.0, 5.0);
        let b = lat_lng_to_vector3(10.1, 10.1, 5.0);
        assert_eq!(arc_points(&a, &b, 5.0).len(), 21);
    }

    #[test]
    fn test_route_from_itinerary_with_endpoints() {
        let itinerary = Itinerary {
            from: "Mumbai".into(),
            to: "Boston".into(),
            days: 2,
            coordinates: Some(crate::itinerary::RouteEndpoints {
                start: Some(GeoPoint::new(19.07, 72.87)),
                end: Some(GeoPoint::new(42.36, -71.05)),
            }),
            day_plans: vec![day(1, 40.71, -74.0), day(2, 38.9, -77.03)],
            ..Default::default()
        };

        let route = Route::from_itinerary(&itinerary, 5.0);
        assert_eq!(route.len(), 4);
        assert_eq!(route.segments().len(), 3);
        assert_eq!(route.waypoint(0).unwrap().role, WaypointRole::Start);
        assert_eq!(route.waypoint(0).unwrap().name, "Mumbai");
        assert_eq!(route.waypoint(1).unwrap().day, Some(1));
        assert_eq!(route.waypoint(3).unwrap().role, WaypointRole::End);
        // Segment 0 arrives at day 1 and carries its travels
        assert_eq!(route.segment(0).unwrap().travel_label(), "Train to stop 1");
    }

    #[test]
    fn test_route_end_merges_with_last_stop() {
        let itinerary = Itinerary {
            coordinates: Some(crate::itinerary::RouteEndpoints {
                start: None,
                end: Some(GeoPoint::new(38.95, -77.0)),
            }),
            day_plans: vec![day(1, 40.71, -74.0), day(2, 38.9, -77.03)],
            ..Default::default()
        };

        let route = Route::from_itinerary(&itinerary, 5.0);
        assert_eq!(route.len(), 2);
        assert_eq!(route.waypoint(1).unwrap().role, WaypointRole::End);
    }

    #[test]
    fn test_route_without_coordinates_has_placeholder() {
        let itinerary = Itinerary {
            day_plans: vec![DayPlan {
                day: 1,
                ..Default::default()
            }],
            ..Default::default()
        };

        let route = Route::from_itinerary(&itinerary, 5.0);
        assert_eq!(route.len(), 1);
        assert!(route.segments().is_empty());
        assert_eq!(route.waypoint(0).unwrap().name, FALLBACK_NAME);
        assert_eq!(route.waypoint(0).unwrap().role, WaypointRole::Start);
    }

    #[test]
    fn test_duplicate_coordinates_make_degenerate_segment() {
        let p = GeoPoint::new(12.0, 77.0);
        let route = Route::from_points(&[p, p, GeoPoint::new(13.0, 80.0)], 5.0);
        assert!(route.segment(0).unwrap().is_degenerate());
        assert!(!route.segment(1).unwrap().is_degenerate());
    }

    #[test]
    fn test_segment_sample_interpolates() {
        let route = Route::from_points(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 60.0)], 5.0);
        let seg = route.segment(0).unwrap();

        let start = seg.sample(0.0);
        assert_relative_eq!(start.point, seg.points[0], epsilon = 1e-9);
        assert!(start.tangent.norm() > 0.0);

        let end = seg.sample(1.0);
        assert_relative_eq!(end.point, *seg.points.last().unwrap(), epsilon = 1e-9);
    }
}
