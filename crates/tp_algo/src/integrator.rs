//! crates/tp_algo/src/integrator.rs
//! The motion integrator (C10, spec §4.10): first-order Euler integration
//! of a point on the unit sphere under a plate's angular velocity, plus
//! boundary-spreading flowlines and flowline bundles.

#[cfg(feature = "std")]
use std::string::String;
#[cfg(feature = "std")]
use std::vec::Vec;

use tp_core::geometry::{Point3, Polyline3};
use tp_core::ids::{BoundaryId, CanonicalTick, PlateId};
use tp_core::rotation::rodrigues_rotate;
use tp_core::views::{KinematicsView, TopologyView};

use crate::error::{IntegrateError, IntegrateResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrationMethod {
    Euler,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationSpec {
    pub step_ticks: i64,
    pub max_steps: u32,
    pub method: IntegrationMethod,
}

impl IntegrationSpec {
    pub fn validate(&self) -> IntegrateResult<()> {
        if self.step_ticks <= 0 {
            return Err(IntegrateError::NonPositiveStepTicks(self.step_ticks));
        }
        if self.max_steps == 0 {
            return Err(IntegrateError::NonPositiveMaxSteps(self.max_steps));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub tick: CanonicalTick,
    pub position: Point3,
    pub velocity: Point3,
    pub step_index: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionPath {
    pub plate_id: PlateId,
    pub start_tick: CanonicalTick,
    pub end_tick: CanonicalTick,
    pub direction: Direction,
    pub samples: Vec<MotionSample>,
}

/// Angular velocity vector at `tick` for `plate_id`: direction is the
/// rotation axis, magnitude is the angle (spec uses "|ω|" as a scalar rate
/// per tick; the axis/angle pair stands in for a one-tick finite rotation).
/// Absent kinematics reports zero velocity (spec §4.10, §7 "Absent").
fn angular_velocity(kinematics: &dyn KinematicsView, plate_id: PlateId, tick: CanonicalTick) -> Point3 {
    let (rotation, present) = kinematics.try_get_rotation(plate_id, tick);
    if !present || rotation.is_identity() {
        return Point3::new(0.0, 0.0, 0.0);
    }
    let angle = rotation.angle();
    let axis = Point3::new(rotation.x, rotation.y, rotation.z).renormalize();
    axis.scale(angle)
}

/// Integrate a single seed point under one plate's kinematics (spec §4.10
/// "Motion path (single seed)"). The interval is half-open: samples at
/// `start, start+step, ...` while `tick < end` (Forward) or `tick > end`
/// (Backward), stopping after `max_steps` samples. The first sample is the
/// unmodified start point; later samples are renormalized onto the unit
/// sphere after each Euler step.
pub fn integrate_motion_path(
    plate_id: PlateId,
    start_point: Point3,
    start_tick: CanonicalTick,
    end_tick: CanonicalTick,
    direction: Direction,
    kinematics: &dyn KinematicsView,
    spec: &IntegrationSpec,
) -> IntegrateResult<MotionPath> {
    spec.validate()?;

    let sign = direction.sign();
    let mut position = start_point;
    let mut tick = start_tick.get();
    let end = end_tick.get();
    let mut samples = Vec::new();

    let mut step_index = 0u32;
    while step_index < spec.max_steps {
        let in_range = match direction {
            Direction::Forward => tick < end,
            Direction::Backward => tick > end,
        };
        if !in_range {
            break;
        }

        let velocity = angular_velocity(kinematics, plate_id, CanonicalTick::from(tick));
        samples.push(MotionSample {
            tick: CanonicalTick::from(tick),
            position,
            velocity,
            step_index,
        });

        let omega_mag = velocity.norm();
        if omega_mag > f64::EPSILON {
            let axis = velocity.scale(1.0 / omega_mag);
            let angle = omega_mag * (spec.step_ticks as f64) * sign;
            position = rodrigues_rotate(&position, &axis, angle).renormalize();
        }

        tick += spec.step_ticks * (sign as i64);
        step_index += 1;
    }

    Ok(MotionPath {
        plate_id,
        start_tick,
        end_tick,
        direction,
        samples,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepPolicy {
    FixedInterval(i64),
}

impl StepPolicy {
    fn step_ticks(self) -> i64 {
        match self {
            StepPolicy::FixedInterval(dt) => dt,
        }
    }
}

/// Boundary-spreading flowline (spec §4.10 "Flowline"): resolve the plate by
/// `side` (`Left -> plate_left`, `Right -> plate_right`), then behave as a
/// motion-path integration with that plate's kinematics.
pub fn integrate_flowline(
    topology: &dyn TopologyView,
    boundary_id: BoundaryId,
    side: Side,
    seed_point: Point3,
    time_range: (CanonicalTick, CanonicalTick),
    step: StepPolicy,
    max_steps: u32,
    kinematics: &dyn KinematicsView,
) -> IntegrateResult<Option<MotionPath>> {
    let boundary = match topology.boundaries().get(&boundary_id) {
        Some(b) => b,
        None => return Ok(None),
    };
    let plate_id = match side {
        Side::Left => boundary.plate_left,
        Side::Right => boundary.plate_right,
    };
    let spec = IntegrationSpec {
        step_ticks: step.step_ticks(),
        max_steps,
        method: IntegrationMethod::Euler,
    };
    let path = integrate_motion_path(
        plate_id,
        seed_point,
        time_range.0,
        time_range.1,
        Direction::Forward,
        kinematics,
        &spec,
    )?;
    Ok(Some(path))
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowlineSeed {
    pub point: Point3,
    pub label: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowlineBundleSpec {
    pub side: Side,
    pub sample_spacing: f64,
    pub time_range: (CanonicalTick, CanonicalTick),
    pub step: StepPolicy,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowlineBundle {
    pub boundary_id: BoundaryId,
    pub flowlines: Vec<MotionPath>,
}

/// Walk `polyline`'s cumulative arc length, emitting a point every `spacing`
/// units, correctly carrying leftover length across a segment join
/// (SPEC_FULL §4.15). Errors on a non-positive spacing.
pub fn sample_points_along_polyline(polyline: &Polyline3, spacing: f64) -> IntegrateResult<Vec<Point3>> {
    if spacing <= 0.0 {
        return Err(IntegrateError::NonPositiveSampleSpacing(spacing));
    }
    if polyline.points.len() < 2 {
        return Ok(polyline.points.clone());
    }

    let mut out = Vec::new();
    let mut carry = 0.0;
    out.push(polyline.points[0]);
    let mut next_target = spacing;

    for pair in polyline.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_len = a.distance_to(&b);
        if seg_len < f64::EPSILON {
            continue;
        }
        let seg_start_len = carry;
        let seg_end_len = carry + seg_len;
        while next_target <= seg_end_len {
            let t = (next_target - seg_start_len) / seg_len;
            let point = a.add(&b.sub(&a).scale(t));
            out.push(point);
            next_target += spacing;
        }
        carry = seg_end_len;
    }

    Ok(out)
}

/// Sample seed points along `boundary`'s geometry polyline (arc length via
/// `sample_points_along_polyline`) and integrate each as a flowline,
/// preserving input seed ordering (spec §4.10 "Flowline-bundle
/// operations").
pub fn integrate_flowline_bundle(
    topology: &dyn TopologyView,
    boundary_id: BoundaryId,
    seed_polyline: &Polyline3,
    spec: &FlowlineBundleSpec,
    max_steps: u32,
    kinematics: &dyn KinematicsView,
) -> IntegrateResult<FlowlineBundle> {
    let seeds = sample_points_along_polyline(seed_polyline, spec.sample_spacing)?;
    let mut flowlines = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if let Some(path) = integrate_flowline(
            topology,
            boundary_id,
            spec.side,
            seed,
            spec.time_range,
            spec.step,
            max_steps,
            kinematics,
        )? {
            flowlines.push(path);
        }
    }
    Ok(FlowlineBundle { boundary_id, flowlines })
}
