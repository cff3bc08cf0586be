//! Island path - the scroll-driven, one-island-per-day layout.
//!
//! Days are laid out top to bottom on a zig-zag Catmull-Rom curve. A scroll
//! offset in `[0, 1]` maps to an arc-length parameter on that curve, which in
//! turn picks the current day, the vehicle pose and the camera target.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::follower::VehicleKind;
use crate::itinerary::{Biome, DayPlan, Weather};

/// Horizontal distance of each island from the centre line.
const LANE_X: f64 = 10.0;
/// Vertical spacing between consecutive islands.
const ROW_SPACING: f64 = 15.0;
/// Full width of the random x offset.
const JITTER_X: f64 = 6.0;
/// Full width of the random z offset.
const JITTER_Z: f64 = 4.0;
/// Catmull-Rom tension.
const TENSION: f64 = 0.5;
/// Samples used for the arc-length table.
const ARC_DIVISIONS: usize = 200;
/// Samples per drawn segment line.
const SEGMENT_STEPS: usize = 20;
/// Per-frame camera smoothing.
const CAMERA_SMOOTHING: f64 = 0.1;

/// One island as placed on the path.
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub day: u32,
    pub position: Vector3<f64>,
    /// Rotation about +Y so the island faces along the path
    pub heading: f64,
    pub biome: Biome,
    pub weather: Option<Weather>,
    /// Flight arrives here or departs from here
    pub has_airport: bool,
    pub label: String,
}

/// How the link between two islands is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStyle {
    pub air: bool,
    pub color: &'static str,
    pub width: f64,
    pub dashed: bool,
    pub points: Vec<Vector3<f64>>,
}

/// Vehicle pose on the island path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandVehicle {
    pub kind: VehicleKind,
    pub position: Vector3<f64>,
    /// Point the vehicle faces (position + tangent)
    pub facing: Vector3<f64>,
}

/// Camera offset from the followed point.
fn camera_offset() -> Vector3<f64> {
    Vector3::new(0.0, 10.0, 20.0)
}

fn air_text(text: &str) -> bool {
    ["flight", "plane", "air"].iter().any(|w| text.contains(w))
}

fn flight_text(text: &str) -> bool {
    text.contains("flight") || text.contains("plane")
}

/// Zig-zag path through one island per day.
#[derive(Debug, Clone)]
pub struct IslandPath {
    plans: Vec<DayPlan>,
    control: Vec<Vector3<f64>>,
    /// Cumulative chord length at each of `ARC_DIVISIONS + 1` samples
    lengths: Vec<f64>,
}

impl IslandPath {
    /// Lays out `plans` with jitter drawn from `seed`.
    pub fn new(plans: &[DayPlan], seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lane = |i: usize| if i % 2 == 0 { LANE_X } else { -LANE_X };

        let mut control: Vec<Vector3<f64>> = (0..plans.len())
            .map(|i| {
                let x = lane(i) + (rng.gen::<f64>() - 0.5) * JITTER_X;
                let z = (rng.gen::<f64>() - 0.5) * JITTER_Z;
                Vector3::new(x, -(i as f64) * ROW_SPACING, z)
            })
            .collect();
        control.push(Vector3::new(
            lane(plans.len()),
            -(plans.len() as f64) * ROW_SPACING,
            0.0,
        ));

        let mut path = Self {
            plans: plans.to_vec(),
            control,
            lengths: Vec::new(),
        };
        path.lengths = path.arc_lengths();
        path
    }

    pub fn control_points(&self) -> &[Vector3<f64>] {
        &self.control
    }

    /// Number of days (islands).
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` (not arc-length uniform).
    pub fn point(&self, t: f64) -> Vector3<f64> {
        let pts = &self.control;
        let l = pts.len();
        if l < 2 {
            return pts.first().copied().unwrap_or_else(Vector3::zeros);
        }

        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut i = p.floor() as usize;
        let mut w = p - i as f64;
        if i >= l - 1 {
            i = l - 2;
            w = 1.0;
        }

        // Open curve: phantom end points mirror the first and last links
        let p0 = if i > 0 { pts[i - 1] } else { pts[0] * 2.0 - pts[1] };
        let p1 = pts[i];
        let p2 = pts[i + 1];
        let p3 = if i + 2 < l {
            pts[i + 2]
        } else {
            pts[l - 1] * 2.0 - pts[l - 2]
        };

        let t0 = (p2 - p0) * TENSION;
        let t1 = (p3 - p1) * TENSION;
        let c2 = p1 * -3.0 + p2 * 3.0 - t0 * 2.0 - t1;
        let c3 = p1 * 2.0 - p2 * 2.0 + t0 + t1;

        p1 + t0 * w + c2 * (w * w) + c3 * (w * w * w)
    }

    fn arc_lengths(&self) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(ARC_DIVISIONS + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for d in 1..=ARC_DIVISIONS {
            let current = self.point(d as f64 / ARC_DIVISIONS as f64);
            sum += (current - last).norm();
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Maps an arc-length fraction `u` to a curve parameter.
    pub fn u_to_t(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let total = self.length();
        if total <= 0.0 {
            return u;
        }

        let n = self.lengths.len();
        let target = u * total;
        let i = self
            .lengths
            .partition_point(|&l| l <= target)
            .saturating_sub(1)
            .min(n - 2);

        let span = self.lengths[i + 1] - self.lengths[i];
        let frac = if span > 0.0 {
            (target - self.lengths[i]) / span
        } else {
            0.0
        };
        (i as f64 + frac) / (n - 1) as f64
    }

    /// Point at arc-length fraction `u`.
    pub fn point_at(&self, u: f64) -> Vector3<f64> {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at arc-length fraction `u`. Points down the path when
    /// the curve is degenerate.
    pub fn tangent_at(&self, u: f64) -> Vector3<f64> {
        let t = self.u_to_t(u);
        let delta = 0.0001;
        let a = self.point((t - delta).max(0.0));
        let b = self.point((t + delta).min(1.0));
        (b - a)
            .try_normalize(1e-12)
            .unwrap_or_else(|| -Vector3::y())
    }

    /// Converts a scroll offset to a path fraction, skipping the summary
    /// page that precedes the first island.
    pub fn scroll_to_t(offset: f64, pages: usize) -> f64 {
        if pages <= 1 {
            return offset.clamp(0.0, 1.0);
        }
        let summary = 1.0 / pages as f64;
        ((offset - summary) / (1.0 - summary)).clamp(0.0, 1.0)
    }

    /// Day shown at path fraction `u`.
    pub fn day_at(&self, u: f64) -> Option<u32> {
        let n = self.plans.len();
        if n == 0 {
            return None;
        }
        let idx = ((u.clamp(0.0, 1.0) * n as f64).round() as usize).min(n - 1);
        Some(self.plans[idx].day)
    }

    /// Islands in day order.
    pub fn islands(&self) -> Vec<Island> {
        let n = self.plans.len();
        self.plans
            .iter()
            .enumerate()
            .map(|(i, plan)| {
                let u = i as f64 / n as f64;
                let tangent = self.tangent_at(u);
                let arriving = flight_text(&plan.travel_text());
                let departing = self
                    .plans
                    .get(i + 1)
                    .is_some_and(|next| flight_text(&next.travel_text()));

                Island {
                    day: plan.day,
                    position: self.point_at(u),
                    heading: tangent.x.atan2(tangent.z),
                    biome: plan.biome.unwrap_or(Biome::City),
                    weather: plan.weather,
                    has_airport: arriving || departing,
                    label: plan
                        .location
                        .clone()
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| plan.stay.clone()),
                }
            })
            .collect()
    }

    /// Style of the link leaving island `i`; None for the last island.
    pub fn segment_style(&self, i: usize) -> Option<SegmentStyle> {
        let n = self.plans.len();
        if i + 1 >= n {
            return None;
        }

        let air = air_text(&self.plans[i].travel_text());
        let points = (0..=SEGMENT_STEPS)
            .map(|j| (i as f64 + j as f64 / SEGMENT_STEPS as f64) / n as f64)
            .filter(|&t| t <= 1.0)
            .map(|t| self.point_at(t))
            .collect();

        Some(SegmentStyle {
            air,
            color: if air { "#3b82f6" } else { "#475569" },
            width: if air { 3.0 } else { 5.0 },
            dashed: air,
            points,
        })
    }

    /// Vehicle at path fraction `u`, typed by the departing day's travels.
    pub fn vehicle_at(&self, u: f64) -> IslandVehicle {
        let n = self.plans.len();
        let kind = if n < 2 {
            VehicleKind::Car
        } else {
            let segments = n - 1;
            let idx = ((u.clamp(0.0, 1.0) * segments as f64).floor() as usize).min(segments - 1);
            VehicleKind::classify(&self.plans[idx].travels)
        };

        let position = self.point_at(u);
        IslandVehicle {
            kind,
            position,
            facing: position + self.tangent_at(u),
        }
    }

    /// Where the camera heads for path fraction `u`.
    pub fn camera_target(&self, u: f64) -> Vector3<f64> {
        self.point_at(u) + camera_offset()
    }
}

/// Smoothed camera for the island view.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandCamera {
    pub position: Vector3<f64>,
    pub look_at: Vector3<f64>,
}

impl IslandCamera {
    /// Starts at the camera target of the first island.
    pub fn new(path: &IslandPath) -> Self {
        Self {
            position: path.camera_target(0.0),
            look_at: path.point_at(0.0),
        }
    }

    /// One frame: eases toward the target for `u` and looks at the path.
    pub fn update(&mut self, path: &IslandPath, u: f64) {
        self.position = self.position.lerp(&path.camera_target(u), CAMERA_SMOOTHING);
        self.look_at = path.point_at(u);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plans(travels: &[&str]) -> Vec<DayPlan> {
        travels
            .iter()
            .enumerate()
            .map(|(i, t)| DayPlan {
                day: i as u32 + 1,
                stay: format!("Stay {}", i + 1),
                travels: vec![t.to_string()],
                biome: Some(Biome::cyclic(i as u32 + 1)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_layout_is_seeded_zigzag() {
        let days = plans(&["Flight in", "Taxi", "Bus out", "Walk"]);
        let path = IslandPath::new(&days, 7);
        let control = path.control_points();

        assert_eq!(control.len(), 5);
        for (i, p) in control.iter().take(4).enumerate() {
            let lane = if i % 2 == 0 { 10.0 } else { -10.0 };
            assert!((p.x - lane).abs() <= 3.0);
            assert!(p.z.abs() <= 2.0);
            assert_relative_eq!(p.y, -15.0 * i as f64);
        }
        assert_eq!(control[4], Vector3::new(10.0, -60.0, 0.0));

        let again = IslandPath::new(&days, 7);
        assert_eq!(again.control_points(), control);
        let other = IslandPath::new(&days, 8);
        assert_ne!(other.control_points(), control);
    }

    #[test]
    fn test_curve_passes_through_control_points() {
        let path = IslandPath::new(&plans(&["a", "b", "c"]), 1);
        let control = path.control_points().to_vec();
        let l = control.len();
        for (i, p) in control.iter().enumerate() {
            assert_relative_eq!(path.point(i as f64 / (l - 1) as f64), *p, epsilon = 1e-9);
        }
        assert_relative_eq!(path.point_at(0.0), control[0], epsilon = 1e-9);
        assert_relative_eq!(path.point_at(1.0), control[l - 1], epsilon = 1e-9);
    }

    #[test]
    fn test_arc_length_mapping_is_monotonic() {
        let path = IslandPath::new(&plans(&["a", "b", "c", "d"]), 3);
        let mut last = -1.0;
        for k in 0..=50 {
            let t = path.u_to_t(k as f64 / 50.0);
            assert!(t >= last);
            last = t;
        }
        assert_relative_eq!(path.u_to_t(1.0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(path.tangent_at(0.3).norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scroll_mapping_skips_summary_page() {
        assert_eq!(IslandPath::scroll_to_t(0.1, 4), 0.0);
        assert_relative_eq!(IslandPath::scroll_to_t(0.25, 4), 0.0);
        assert_relative_eq!(IslandPath::scroll_to_t(1.0, 4), 1.0);
        assert_relative_eq!(IslandPath::scroll_to_t(0.625, 4), 0.5);
        assert_relative_eq!(IslandPath::scroll_to_t(0.4, 1), 0.4);
    }

    #[test]
    fn test_day_at() {
        let path = IslandPath::new(&plans(&["a", "b", "c", "d"]), 0);
        assert_eq!(path.day_at(0.0), Some(1));
        assert_eq!(path.day_at(0.3), Some(2));
        assert_eq!(path.day_at(1.0), Some(4));
        assert_eq!(IslandPath::new(&[], 0).day_at(0.5), None);
    }

    #[test]
    fn test_islands_airports_and_segments() {
        let path = IslandPath::new(
            &plans(&["Flight to Goa", "Scooter ride", "Train north", "Plane home"]),
            5,
        );
        let islands = path.islands();

        assert_eq!(islands.len(), 4);
        assert!(islands[0].has_airport);
        assert!(!islands[1].has_airport);
        // Next day flies out
        assert!(islands[2].has_airport);
        assert_eq!(islands[0].label, "Stay 1");

        let first = path.segment_style(0).unwrap();
        assert!(first.air && first.dashed);
        assert_eq!(first.color, "#3b82f6");
        assert_eq!(first.points.len(), SEGMENT_STEPS + 1);

        let second = path.segment_style(1).unwrap();
        assert!(!second.dashed);
        assert!(path.segment_style(3).is_none());
    }

    #[test]
    fn test_vehicle_kind_follows_segment() {
        let path = IslandPath::new(&plans(&["Flight in", "Train out", "Bus tour"]), 2);
        assert_eq!(path.vehicle_at(0.1).kind, VehicleKind::Air);
        assert_eq!(path.vehicle_at(0.6).kind, VehicleKind::Rail);
        assert_eq!(path.vehicle_at(1.0).kind, VehicleKind::Rail);

        let single = IslandPath::new(&plans(&["Flight"]), 2);
        assert_eq!(single.vehicle_at(0.5).kind, VehicleKind::Car);
    }

    #[test]
    fn test_camera_eases_to_offset() {
        let path = IslandPath::new(&plans(&["a", "b"]), 4);
        let mut camera = IslandCamera::new(&path);
        for _ in 0..300 {
            camera.update(&path, 0.5);
        }
        assert_relative_eq!(camera.position, path.point_at(0.5) + camera_offset(), epsilon = 1e-6);
        assert_relative_eq!(camera.look_at, path.point_at(0.5), epsilon = 1e-12);
    }
}
