//! crates/tp_algo/src/frame.rs
//! The frame service (C11, spec §4.11): a closed set of coordinate frames
//! with explicit transform composition, canonicalization, temporal
//! consistency checking, and mantle net-rotation.

#[cfg(feature = "std")]
use std::collections::BTreeMap;
#[cfg(feature = "std")]
use std::string::String;
#[cfg(feature = "std")]
use std::vec::Vec;

use tp_core::ids::{CanonicalTick, PlateId};
use tp_core::rotation::Quaternion;
use tp_core::views::{KinematicsView, TopologyView, TruePolarWanderModel};

use crate::error::{FrameError, FrameResult, Validity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    Mantle,
    Absolute,
    PlateAnchor(PlateId),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameChainLink {
    pub base_frame: Frame,
    pub transform: Quaternion,
    pub validity_range: Option<(CanonicalTick, CanonicalTick)>,
    pub sequence_hint: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameDefinition {
    pub links: Vec<FrameChainLink>,
    pub metadata: Option<String>,
}

pub fn validate_definition(def: &FrameDefinition) -> FrameResult<()> {
    if def.links.is_empty() {
        return Err(FrameError::ChainEmpty);
    }
    Ok(())
}

fn ranges_overlap(a: (CanonicalTick, CanonicalTick), b: (CanonicalTick, CanonicalTick)) -> bool {
    let adjacent = a.1.get() + 1 == b.0.get() || b.1.get() + 1 == a.0.get();
    if adjacent {
        return false;
    }
    !(a.1 < b.0 || b.1 < a.0)
}

/// For links sharing a base frame, validity ranges must not overlap (spec
/// §4.11). Exact-equality-of-endpoints adjacency does not count as overlap.
/// A link with no validity range (unrestricted) conflicts with any other
/// link sharing its base frame.
pub fn validate_temporal_consistency(links: &[FrameChainLink]) -> FrameResult<()> {
    for i in 0..links.len() {
        for j in (i + 1)..links.len() {
            if links[i].base_frame != links[j].base_frame {
                continue;
            }
            let conflict = match (links[i].validity_range, links[j].validity_range) {
                (Some(a), Some(b)) => ranges_overlap(a, b),
                _ => true,
            };
            if conflict {
                return Err(FrameError::TemporalOverlap);
            }
        }
    }
    Ok(())
}

fn quat_eq(a: &Quaternion, b: &Quaternion) -> bool {
    const EPS: f64 = 1e-12;
    (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS && (a.w - b.w).abs() < EPS
}

fn adjacent_or_absent(
    a: Option<(CanonicalTick, CanonicalTick)>,
    b: Option<(CanonicalTick, CanonicalTick)>,
) -> bool {
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(a), Some(b)) => a.1.get() + 1 == b.0.get() || b.1.get() + 1 == a.0.get(),
    }
}

fn merge_ranges(
    a: Option<(CanonicalTick, CanonicalTick)>,
    b: Option<(CanonicalTick, CanonicalTick)>,
) -> Option<(CanonicalTick, CanonicalTick)> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let start = if a.0 < b.0 { a.0 } else { b.0 };
            let end = if a.1 > b.1 { a.1 } else { b.1 };
            Some((start, end))
        }
        _ => None,
    }
}

/// Drop identity links and merge consecutive links sharing a base frame
/// whose validity ranges are adjacent or absent (spec §4.11). Merging
/// requires the transforms to already agree (same rotation); two adjacent
/// windows with different transforms are kept distinct. Preserves
/// definition metadata.
pub fn canonicalize(def: &FrameDefinition) -> FrameDefinition {
    let mut merged: Vec<FrameChainLink> = Vec::new();

    for link in &def.links {
        if link.transform.is_identity() {
            continue;
        }
        if let Some(last) = merged.last_mut() {
            if last.base_frame == link.base_frame
                && quat_eq(&last.transform, &link.transform)
                && adjacent_or_absent(last.validity_range, link.validity_range)
            {
                last.validity_range = merge_ranges(last.validity_range, link.validity_range);
                continue;
            }
        }
        merged.push(*link);
    }

    FrameDefinition {
        links: merged,
        metadata: def.metadata.clone(),
    }
}

fn frame_to_mantle(
    frame: Frame,
    tick: CanonicalTick,
    kinematics: &dyn KinematicsView,
    tpw_model: Option<&dyn TruePolarWanderModel>,
) -> (Quaternion, Validity) {
    match frame {
        Frame::Mantle => (Quaternion::IDENTITY, Validity::Full),
        Frame::Absolute => match tpw_model {
            Some(tpw) => (tpw.get_rotation_at(tick), Validity::Full),
            None => (Quaternion::IDENTITY, Validity::Full),
        },
        Frame::PlateAnchor(plate_id) => {
            let (rotation, present) = kinematics.try_get_rotation(plate_id, tick);
            if present {
                (rotation, Validity::Full)
            } else {
                (Quaternion::IDENTITY, Validity::PartialOrAbsent)
            }
        }
    }
}

/// `transform_between` (spec §4.11): every frame pair is expressed through
/// a common Mantle intermediate, `T(from->to) = T(to->Mantle)^-1 . T(from->Mantle)`,
/// which collapses to the documented special cases (Mantle<->Mantle = identity,
/// PlateAnchor<->Mantle = plate rotation / its inverse, composition for
/// PlateAnchor<->PlateAnchor, identity-or-TPW for Absolute<->Mantle) without
/// special-casing each pair.
pub fn transform_between(
    from: Frame,
    to: Frame,
    tick: CanonicalTick,
    kinematics: &dyn KinematicsView,
    tpw_model: Option<&dyn TruePolarWanderModel>,
) -> (Quaternion, Validity) {
    let (from_q, from_v) = frame_to_mantle(from, tick, kinematics, tpw_model);
    let (to_q, to_v) = frame_to_mantle(to, tick, kinematics, tpw_model);
    let rotation = to_q.inverse().compose(&from_q);
    let validity = if from_v == Validity::Full && to_v == Validity::Full {
        Validity::Full
    } else {
        Validity::PartialOrAbsent
    };
    (rotation, validity)
}

/// Area-weighted quaternion average over non-retired plates (spec §4.11
/// "MantleFrame net-rotation calculator"). Missing or zero-area plates are
/// skipped. Sign-aligns each rotation to the running reference (a
/// quaternion and its negation represent the same rotation) before summing,
/// then renormalizes.
pub fn net_rotation(
    topology: &dyn TopologyView,
    kinematics: &dyn KinematicsView,
    tick: CanonicalTick,
    area_weights: Option<&BTreeMap<PlateId, f64>>,
) -> Quaternion {
    let mut sum = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    let mut total_weight = 0.0;
    let mut reference: Option<Quaternion> = None;

    for (plate_id, plate) in topology.plates() {
        if plate.retired {
            continue;
        }
        let weight = area_weights.and_then(|w| w.get(plate_id).copied()).unwrap_or(1.0);
        if weight <= 0.0 {
            continue;
        }
        let (rotation, present) = kinematics.try_get_rotation(*plate_id, tick);
        if !present {
            continue;
        }

        let aligned = match reference {
            None => {
                reference = Some(rotation);
                rotation
            }
            Some(r) => {
                let dot = r.x * rotation.x + r.y * rotation.y + r.z * rotation.z + r.w * rotation.w;
                if dot < 0.0 {
                    Quaternion { x: -rotation.x, y: -rotation.y, z: -rotation.z, w: -rotation.w }
                } else {
                    rotation
                }
            }
        };

        sum.x += aligned.x * weight;
        sum.y += aligned.y * weight;
        sum.z += aligned.z * weight;
        sum.w += aligned.w * weight;
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return Quaternion::IDENTITY;
    }
    sum.normalized()
}

/// The mantle frame transform is the inverse of the net rotation, so that
/// composing the two always returns identity (spec §4.11).
pub fn get_mantle_frame_transform(
    topology: &dyn TopologyView,
    kinematics: &dyn KinematicsView,
    tick: CanonicalTick,
    area_weights: Option<&BTreeMap<PlateId, f64>>,
) -> Quaternion {
    net_rotation(topology, kinematics, tick, area_weights).inverse()
}
