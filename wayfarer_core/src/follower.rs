//! Camera and vehicle follower.
//!
//! Pure per-frame update rules. The session feeds them the sequencer's
//! traveling samples; they hold no route state of their own.

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::PlaybackConfig;
use crate::route::SegmentSample;

/// Vehicle shown while traveling a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleKind {
    Air,
    Rail,
    Bus,
    #[default]
    Car,
}

impl VehicleKind {
    /// Classifies a segment by keyword, first match wins:
    /// air (`flight`, `plane`, `air`), rail (`train`, `rail`), `bus`,
    /// otherwise car. Matching is case-insensitive substring search over
    /// the travel descriptions joined with `", "`.
    pub fn classify<S: AsRef<str>>(travels: &[S]) -> Self {
        let text = travels
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
            .to_lowercase();

        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["flight", "plane", "air"]) {
            VehicleKind::Air
        } else if has(&["train", "rail"]) {
            VehicleKind::Rail
        } else if has(&["bus"]) {
            VehicleKind::Bus
        } else {
            VehicleKind::Car
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self, VehicleKind::Air)
    }

    /// Camera distance from the globe centre while following this vehicle.
    pub fn camera_height(&self) -> f64 {
        if self.is_airborne() {
            11.0
        } else {
            8.5
        }
    }

    /// Model scale.
    pub fn scale(&self) -> f64 {
        if self.is_airborne() {
            0.4
        } else {
            0.25
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Air => "air",
            VehicleKind::Rail => "rail",
            VehicleKind::Bus => "bus",
            VehicleKind::Car => "car",
        }
    }
}

impl std::fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes `v`, or returns +Y for a zero vector.
fn unit_or_up(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(1e-12).unwrap_or_else(Vector3::y)
}

/// Smoothed chase camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    position: Vector3<f64>,
    look_at: Vector3<f64>,
    smoothing: f64,
    recenter_distance: f64,
    short_segment_points: usize,
    short_segment_zoom: f64,
}

impl CameraRig {
    /// Creates a camera on the +Z axis looking at the globe centre.
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, config.recenter_distance),
            look_at: Vector3::zeros(),
            smoothing: config.camera_smoothing.clamp(0.0, 1.0),
            recenter_distance: config.recenter_distance,
            short_segment_points: config.short_segment_points,
            short_segment_zoom: config.short_segment_zoom,
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn look_at(&self) -> Vector3<f64> {
        self.look_at
    }

    /// Height the camera settles at over a segment of `segment_points`
    /// samples traveled by `kind`.
    pub fn follow_height(&self, kind: VehicleKind, segment_points: usize) -> f64 {
        let height = kind.camera_height();
        if segment_points < self.short_segment_points {
            height * self.short_segment_zoom
        } else {
            height
        }
    }

    /// One frame of following: eases toward the point above `target` and
    /// looks at it.
    pub fn follow(&mut self, target: &Vector3<f64>, kind: VehicleKind, segment_points: usize) {
        let desired = unit_or_up(target) * self.follow_height(kind, segment_points);
        self.position = self.position.lerp(&desired, self.smoothing);
        self.look_at = *target;
    }

    /// Turns toward a marker without moving.
    pub fn focus(&mut self, marker: &Vector3<f64>) {
        self.look_at = *marker;
    }

    /// Snaps back above the first waypoint.
    pub fn recenter(&mut self, start: &Vector3<f64>) {
        self.position = unit_or_up(start) * self.recenter_distance;
        self.look_at = Vector3::zeros();
    }
}

/// Vehicle pose along the active segment.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRig {
    position: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
    kind: VehicleKind,
    visible: bool,
    slerp: f64,
    globe_radius: f64,
}

impl VehicleRig {
    /// Creates a hidden vehicle at the origin.
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            kind: VehicleKind::default(),
            visible: false,
            slerp: config.vehicle_slerp.clamp(0.0, 1.0),
            globe_radius: config.globe_radius,
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn scale(&self) -> f64 {
        self.kind.scale()
    }

    /// Places the vehicle on a traveling sample.
    ///
    /// Aircraft ride the raised arc; ground vehicles are pulled down to the
    /// globe surface. Orientation eases toward "nose along the tangent, roof
    /// along the local normal" and is left alone when that frame is
    /// undefined (zero tangent, or tangent parallel to the normal).
    pub fn update(&mut self, sample: &SegmentSample, kind: VehicleKind) {
        self.kind = kind;
        self.visible = true;
        self.position = if kind.is_airborne() {
            sample.point
        } else {
            unit_or_up(&sample.point) * self.globe_radius
        };

        let up = unit_or_up(&self.position);
        let Some(dir) = sample.tangent.try_normalize(1e-12) else {
            return;
        };
        if up.cross(&dir).norm() < 1e-9 {
            return;
        }

        let target = UnitQuaternion::face_towards(&dir, &up);
        self.orientation = self
            .orientation
            .try_slerp(&target, self.slerp, 1e-9)
            .unwrap_or(target);
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
