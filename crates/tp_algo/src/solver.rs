//! crates/tp_algo/src/solver.rs
//! The reconstruction solver (C9, spec §4.9): given a materialized topology
//! and a kinematics view, deterministically reconstruct boundaries/features
//! at a target tick with full provenance.

#[cfg(feature = "std")]
use std::collections::BTreeMap;
#[cfg(feature = "std")]
use std::string::String;
#[cfg(feature = "std")]
use std::vec::Vec;

use digest::Digest;
use sha2::Sha256;

use tp_core::events::BoundaryType;
use tp_core::geometry::{Geometry, PolygonRegion2};
use tp_core::ids::{BoundaryId, CanonicalTick, FeatureId, PlateId};
use tp_core::views::{KinematicsView, TopologyView};

/// Per-stream "partition region" map the solver consults for feature plate
/// assignment (spec §4.9 "overlapping multiple partition regions"). The
/// topology data model itself carries no plate-area geometry, so the
/// partitions are supplied by the caller's policy; see DESIGN.md for this
/// Open Question's resolution.
#[derive(Clone, Debug, Default)]
pub struct ReconstructionPolicy {
    pub plate_regions: BTreeMap<PlateId, PolygonRegion2>,
    pub solver_version: String,
    pub reference_frame: String,
    pub interpolation_method: String,
}

/// An input feature to be reconstructed (spec §4.9 "features").
#[derive(Clone, Debug)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    /// Existing provenance on the input; never overridden by the solver.
    pub plate_provenance: Option<PlateId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedBoundary {
    pub id: BoundaryId,
    pub plate_left: PlateId,
    pub plate_right: PlateId,
    pub boundary_type: BoundaryType,
    pub geometry: Geometry,
    /// Documented policy (not inferred): `plate_provenance = plate_left`.
    pub plate_provenance: PlateId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedFeature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub assigned_plate: Option<PlateId>,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlateAssignment {
    pub method: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KinematicsProvenance {
    pub reference_frame: String,
    pub interpolation_method: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamProvenance {
    pub topology_stream_hash: String,
    pub kinematics_stream_hash: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryMetadata {
    pub query_tick: CanonicalTick,
    pub solver_version: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionProvenance {
    pub source_boundary_ids: Vec<BoundaryId>,
    pub plate_assignment: PlateAssignment,
    pub kinematics: KinematicsProvenance,
    pub stream: StreamProvenance,
    pub query_metadata: QueryMetadata,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionMetadata {
    pub cache_key: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionResult {
    pub boundaries: Vec<ReconstructedBoundary>,
    pub features: Vec<ReconstructedFeature>,
    pub provenance: ReconstructionProvenance,
    pub metadata: ReconstructionMetadata,
}

/// Reconstruct every non-retired boundary at `target_tick`. Ascending ID
/// byte order (spec §4.9 "Determinism and ordering"); retired boundaries
/// excluded. Geometry is rotated in place for 3-D point-based geometry;
/// 2-D geometry passes through unchanged (reconstruction moves points on
/// the unit sphere, and the data model's 2-D kinds are map-projected,
/// already-placed shapes, not sphere coordinates).
pub fn reconstruct_boundaries(
    topology: &dyn TopologyView,
    kinematics: &dyn KinematicsView,
    target_tick: CanonicalTick,
) -> Vec<ReconstructedBoundary> {
    let mut ids: Vec<BoundaryId> = topology
        .boundaries()
        .values()
        .filter(|b| !b.retired)
        .map(|b| b.id)
        .collect();
    ids.sort();

    ids.into_iter()
        .map(|id| {
            let boundary = &topology.boundaries()[&id];
            let rotation = kinematics.try_get_rotation_or_identity(boundary.plate_left, target_tick);
            ReconstructedBoundary {
                id: boundary.id,
                plate_left: boundary.plate_left,
                plate_right: boundary.plate_right,
                boundary_type: boundary.boundary_type,
                geometry: rotate_geometry(&boundary.geometry, &rotation),
                plate_provenance: boundary.plate_left,
            }
        })
        .collect()
}

fn rotate_geometry(geometry: &Geometry, rotation: &tp_core::rotation::Quaternion) -> Geometry {
    match geometry {
        Geometry::Point3(p) => Geometry::Point3(rotation.apply_to_point(p).renormalize()),
        Geometry::Polyline3(p) => Geometry::Polyline3(tp_core::geometry::Polyline3::new(
            p.points.iter().map(|pt| rotation.apply_to_point(pt).renormalize()).collect(),
        )),
        other => other.clone(),
    }
}

/// Candidate plate regions a 2-D feature geometry overlaps, ascending by
/// plate id so "lowest plate id wins" (spec §4.9) is just "take the first".
fn overlapping_plates(geometry: &Geometry, regions: &BTreeMap<PlateId, PolygonRegion2>) -> Vec<PlateId> {
    let points: Vec<tp_core::geometry::Point2> = match geometry {
        Geometry::Point2(p) => vec![*p],
        Geometry::Polyline2(p) => p.points.clone(),
        _ => return Vec::new(),
    };

    regions
        .iter()
        .filter(|(_, region)| points.iter().any(|p| region.contains(p)))
        .map(|(plate_id, _)| *plate_id)
        .collect()
}

fn assign_feature(feature: &Feature, policy: &ReconstructionPolicy) -> (Option<PlateId>, f64) {
    if let Some(existing) = feature.plate_provenance {
        return (Some(existing), 1.0);
    }
    let candidates = overlapping_plates(&feature.geometry, &policy.plate_regions);
    match candidates.into_iter().min() {
        Some(plate_id) => (Some(plate_id), 1.0),
        None => (None, 0.0),
    }
}

/// The full reconstruction operation (spec §4.9 "Output"). Deterministic:
/// identical `(topology, kinematics, policy, target_tick)` canonically
/// encode to identical bytes (features/boundaries are built in a fixed
/// order, floats are never summed in a data-dependent order).
pub fn reconstruct_with_provenance(
    topology: &dyn TopologyView,
    kinematics: &dyn KinematicsView,
    policy: &ReconstructionPolicy,
    features: &[Feature],
    target_tick: CanonicalTick,
) -> ReconstructionResult {
    let boundaries = reconstruct_boundaries(topology, kinematics, target_tick);

    let reconstructed_features: Vec<ReconstructedFeature> = features
        .iter()
        .map(|feature| {
            let (assigned_plate, confidence) = assign_feature(feature, policy);
            let geometry = match assigned_plate {
                Some(plate_id) => {
                    let rotation = kinematics.try_get_rotation_or_identity(plate_id, target_tick);
                    rotate_geometry(&feature.geometry, &rotation)
                }
                None => feature.geometry.clone(),
            };
            ReconstructedFeature {
                id: feature.id,
                geometry,
                assigned_plate,
                confidence,
            }
        })
        .collect();

    let topology_stream_hash = topology.identity().canonical();
    let kinematics_stream_hash = kinematics.identity().canonical();

    let provenance = ReconstructionProvenance {
        source_boundary_ids: boundaries.iter().map(|b| b.id).collect(),
        plate_assignment: PlateAssignment {
            method: "partition-region-lowest-id".to_string(),
            confidence: if reconstructed_features.is_empty() {
                1.0
            } else {
                reconstructed_features.iter().map(|f| f.confidence).sum::<f64>()
                    / reconstructed_features.len() as f64
            },
        },
        kinematics: KinematicsProvenance {
            reference_frame: policy.reference_frame.clone(),
            interpolation_method: policy.interpolation_method.clone(),
        },
        stream: StreamProvenance {
            topology_stream_hash: topology_stream_hash.clone(),
            kinematics_stream_hash: kinematics_stream_hash.clone(),
        },
        query_metadata: QueryMetadata {
            query_tick: target_tick,
            solver_version: policy.solver_version.clone(),
        },
    };

    let cache_key = cache_key(&topology_stream_hash, &kinematics_stream_hash, policy, target_tick);

    ReconstructionResult {
        boundaries,
        features: reconstructed_features,
        provenance,
        metadata: ReconstructionMetadata { cache_key },
    }
}

/// `metadata.cache_key` (spec §4.9, SPEC_FULL §4.16): a SHA-256 hex digest
/// of the canonically length-prefixed tuple, callable independently of a
/// full solve so callers can check a memoization table first.
pub fn cache_key(
    topology_stream_hash: &str,
    kinematics_stream_hash: &str,
    policy: &ReconstructionPolicy,
    target_tick: CanonicalTick,
) -> String {
    let mut hasher = Sha256::new();
    for field in [
        topology_stream_hash.as_bytes(),
        kinematics_stream_hash.as_bytes(),
        policy.solver_version.as_bytes(),
        policy.reference_frame.as_bytes(),
        policy.interpolation_method.as_bytes(),
    ] {
        hasher.update((field.len() as u32).to_le_bytes());
        hasher.update(field);
    }
    hasher.update(target_tick.get().to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::ids::StreamIdentity;
    use tp_core::rng::IdRng;
    use tp_core::rotation::Quaternion;
    use tp_core::state::TopologyState;

    fn stream(model: &str) -> StreamIdentity {
        StreamIdentity::new("science", "trunk", 2, "geo.plates", model).unwrap()
    }

    struct FakeKinematics {
        identity: StreamIdentity,
    }
    impl KinematicsView for FakeKinematics {
        fn identity(&self) -> &StreamIdentity {
            &self.identity
        }
        fn last_event_sequence(&self) -> Option<u64> {
            None
        }
        fn try_get_rotation(&self, _plate_id: PlateId, _tick: CanonicalTick) -> (Quaternion, bool) {
            (Quaternion::IDENTITY, false)
        }
    }

    /// E1: empty stream, no events, target tick 0: empty feature list, stream
    /// hash `S:science:trunk:L2:geo.plates:M0`, deterministic cache key.
    #[test]
    fn e1_empty_stream_reconstruction() {
        let topology = TopologyState::empty(stream("0"));
        let kinematics = FakeKinematics { identity: stream("0") };
        let policy = ReconstructionPolicy::default();

        let result = reconstruct_with_provenance(&topology, &kinematics, &policy, &[], CanonicalTick::from(0));
        assert!(result.features.is_empty());
        assert!(result.boundaries.is_empty());
        assert_eq!(result.provenance.stream.topology_stream_hash, "S:science:trunk:L2:geo.plates:M0");

        let again = reconstruct_with_provenance(&topology, &kinematics, &policy, &[], CanonicalTick::from(0));
        assert_eq!(result.metadata.cache_key, again.metadata.cache_key);
    }

    fn boundary_created(
        rng: &mut IdRng,
        id: BoundaryId,
        left: PlateId,
        right: PlateId,
        retired: bool,
    ) -> tp_core::state::Boundary {
        let _ = rng;
        tp_core::state::Boundary {
            id,
            plate_left: left,
            plate_right: right,
            boundary_type: BoundaryType::Divergent,
            geometry: Geometry::Point2(tp_core::geometry::Point2::new(0.0, 0.0)),
            retired,
            retired_reason: None,
        }
    }

    /// E2: two boundaries ending `...000000000001` and `...111111111111`,
    /// both Active, opposite plates -> `...001` emitted first.
    #[test]
    fn e2_deterministic_boundary_ordering() {
        let mut rng = IdRng::from_seed_u64(1);
        let p1 = PlateId::generate(&mut rng, None);
        let p2 = PlateId::generate(&mut rng, None);

        let mut low_bytes = [0u8; 16];
        low_bytes[15] = 0x01;
        let mut high_bytes = [0xFFu8; 16];
        high_bytes[15] = 0xFF;
        let low = BoundaryId::from_bytes(low_bytes);
        let high = BoundaryId::from_bytes(high_bytes);

        let mut state = TopologyState::empty(stream("0"));
        state.plates.insert(p1, tp_core::state::Plate { id: p1, retired: false, retired_reason: None });
        state.plates.insert(p2, tp_core::state::Plate { id: p2, retired: false, retired_reason: None });
        state.boundaries.insert(high, boundary_created(&mut rng, high, p1, p2, false));
        state.boundaries.insert(low, boundary_created(&mut rng, low, p2, p1, false));

        let kinematics = FakeKinematics { identity: stream("0") };
        let reconstructed = reconstruct_boundaries(&state, &kinematics, CanonicalTick::from(0));
        assert_eq!(reconstructed[0].id, low);
        assert_eq!(reconstructed[1].id, high);
    }

    /// E3: A(active), B(active), C(retired) -> exactly A and B emitted.
    #[test]
    fn e3_retired_exclusion() {
        let mut rng = IdRng::from_seed_u64(2);
        let p1 = PlateId::generate(&mut rng, None);
        let p2 = PlateId::generate(&mut rng, None);
        let a = BoundaryId::generate(&mut rng, None);
        let b = BoundaryId::generate(&mut rng, None);
        let c = BoundaryId::generate(&mut rng, None);

        let mut state = TopologyState::empty(stream("0"));
        state.plates.insert(p1, tp_core::state::Plate { id: p1, retired: false, retired_reason: None });
        state.plates.insert(p2, tp_core::state::Plate { id: p2, retired: false, retired_reason: None });
        state.boundaries.insert(a, boundary_created(&mut rng, a, p1, p2, false));
        state.boundaries.insert(b, boundary_created(&mut rng, b, p1, p2, false));
        state.boundaries.insert(c, boundary_created(&mut rng, c, p1, p2, true));

        let kinematics = FakeKinematics { identity: stream("0") };
        let reconstructed = reconstruct_boundaries(&state, &kinematics, CanonicalTick::from(0));
        let ids: Vec<BoundaryId> = reconstructed.iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
        assert!(!ids.contains(&c));
    }

    #[test]
    fn feature_assignment_lowest_plate_id_wins() {
        let mut rng = IdRng::from_seed_u64(3);
        let mut p_ids = vec![PlateId::generate(&mut rng, None), PlateId::generate(&mut rng, None)];
        p_ids.sort();
        let (lowest, highest) = (p_ids[0], p_ids[1]);

        let square = PolygonRegion2::new(vec![
            tp_core::geometry::Point2::new(-10.0, -10.0),
            tp_core::geometry::Point2::new(10.0, -10.0),
            tp_core::geometry::Point2::new(10.0, 10.0),
            tp_core::geometry::Point2::new(-10.0, 10.0),
        ]);
        let mut regions = BTreeMap::new();
        regions.insert(lowest, square.clone());
        regions.insert(highest, square);

        let policy = ReconstructionPolicy {
            plate_regions: regions,
            solver_version: "v1".into(),
            reference_frame: "mantle".into(),
            interpolation_method: "nearest".into(),
        };

        let feature = Feature {
            id: FeatureId::generate(&mut rng, None),
            geometry: Geometry::Point2(tp_core::geometry::Point2::new(0.0, 0.0)),
            plate_provenance: None,
        };

        let (assigned, confidence) = assign_feature(&feature, &policy);
        assert_eq!(assigned, Some(lowest));
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn existing_provenance_is_never_overridden() {
        let mut rng = IdRng::from_seed_u64(4);
        let existing = PlateId::generate(&mut rng, None);
        let policy = ReconstructionPolicy::default();
        let feature = Feature {
            id: FeatureId::generate(&mut rng, None),
            geometry: Geometry::Point2(tp_core::geometry::Point2::new(0.0, 0.0)),
            plate_provenance: Some(existing),
        };
        let (assigned, _) = assign_feature(&feature, &policy);
        assert_eq!(assigned, Some(existing));
    }
}
