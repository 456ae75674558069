//! crates/tp_io/src/codec.rs
//! The canonical, schema-versioned binary codec (C2, spec §4.2).
//!
//! Determinism contract: encoding the same logical value twice produces
//! byte-identical output. Map fields are encoded by fixed numeric tag order
//! (entity maps ride on `BTreeMap`'s key order instead — see
//! `tp_core::determinism`). Floats are IEEE-754 64-bit little-endian.
//! Integers are little-endian fixed width. Optionals are `tag + absent|present`.
//! Sequences are `length (u32 LE) + elements`. Sum types (events, geometry)
//! are `variant_index (u8) + payload`; variant indices are stable and come
//! from each type's own `variant_index()` (see `tp_core::events`,
//! `tp_core::geometry`).
//!
//! Forward-compat: a reader that doesn't recognize a schema version, or
//! that runs out of bytes mid-value, or finds trailing bytes after a
//! top-level value, fails with `CodecError` rather than silently truncating
//! — corruption must be detectable, not absorbed (spec §4.2, §7).

use tp_core::events::{BoundaryType, EventKind, TopologyEvent};
use tp_core::geometry::{Geometry, Point2, Point3, PolygonRegion2, Polyline2, Polyline3, Segment2};
use tp_core::ids::{BoundaryId, CanonicalTick, EventId, JunctionId, PlateId, StreamIdentity};

use thiserror::Error;

/// Current schema version stamped into every encoded event/snapshot. Bumped
/// only for breaking wire changes; additive fields do not require a bump
/// (spec §1 Non-goals: "schema evolution... beyond additive fields" is out
/// of scope, i.e. the codec need not *migrate* old schema versions, only
/// detect a mismatch).
pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input while decoding {0}")]
    UnexpectedEof(&'static str),
    #[error("unknown schema version {0}, expected {1}")]
    UnknownSchemaVersion(u8, u8),
    #[error("unknown variant index {0} for {1}")]
    UnknownVariant(u8, &'static str),
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
    #[error("trailing bytes after decoded value ({0} byte(s) left over)")]
    TrailingBytes(usize),
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("invalid identity field: {0}")]
    InvalidIdentity(&'static str),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// A forward cursor over a decode buffer. `read_*` methods advance `pos` and
/// fail with `UnexpectedEof` rather than panicking on short input.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn finish(self) -> CodecResult<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes(self.remaining()))
        }
    }

    fn take(&mut self, n: usize, ctx: &'static str) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof(ctx));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4, "u32")?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> CodecResult<u64> {
        let bytes = self.take(8, "u64")?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        let bytes = self.take(8, "i64")?;
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        let bytes = self.take(8, "f64")?;
        Ok(f64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len, "bytes")?.to_vec())
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_fixed16(&mut self) -> CodecResult<[u8; 16]> {
        let bytes = self.take(16, "fixed16")?;
        Ok(bytes.try_into().unwrap())
    }

    pub fn read_option<T>(
        &mut self,
        read_value: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Option<T>> {
        if self.read_bool()? {
            Ok(Some(read_value(self)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_vec<T>(
        &mut self,
        mut read_value: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        let len = self.read_u32()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(read_value(self)?);
        }
        Ok(out)
    }
}

/// Append-only little-endian byte writer.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { 1 } else { 0 });
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v);
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_bytes(v.as_bytes());
    }

    pub fn write_fixed16(&mut self, v: &[u8; 16]) {
        self.buf.extend_from_slice(v);
    }

    pub fn write_option<T>(&mut self, v: &Option<T>, write_value: impl FnOnce(&mut Self, &T)) {
        match v {
            Some(x) => {
                self.write_bool(true);
                write_value(self, x);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_vec<T>(&mut self, v: &[T], mut write_value: impl FnMut(&mut Self, &T)) {
        self.write_u32(v.len() as u32);
        for item in v {
            write_value(self, item);
        }
    }
}

// ---------------------------------------------------------------------
// Identity & geometry primitives
// ---------------------------------------------------------------------

fn write_stream_identity(w: &mut Writer, id: &StreamIdentity) {
    w.write_string(id.variant());
    w.write_string(id.branch());
    w.write_u32(id.level());
    w.write_string(id.domain());
    w.write_string(id.model());
}

fn read_stream_identity(r: &mut Reader) -> CodecResult<StreamIdentity> {
    let variant = r.read_string()?;
    let branch = r.read_string()?;
    let level = r.read_u32()?;
    let domain = r.read_string()?;
    let model = r.read_string()?;
    StreamIdentity::new(variant, branch, level, domain, model)
        .map_err(|_| CodecError::InvalidIdentity("decoded StreamIdentity failed validation"))
}

fn write_tick(w: &mut Writer, t: CanonicalTick) {
    w.write_i64(t.get());
}

fn read_tick(r: &mut Reader) -> CodecResult<CanonicalTick> {
    Ok(CanonicalTick::from(r.read_i64()?))
}

macro_rules! write_read_id {
    ($write_fn:ident, $read_fn:ident, $ty:ty) => {
        fn $write_fn(w: &mut Writer, id: &$ty) {
            w.write_fixed16(id.as_bytes());
        }
        fn $read_fn(r: &mut Reader) -> CodecResult<$ty> {
            Ok(<$ty>::from_bytes(r.read_fixed16()?))
        }
    };
}

write_read_id!(write_plate_id, read_plate_id, PlateId);
write_read_id!(write_boundary_id, read_boundary_id, BoundaryId);
write_read_id!(write_junction_id, read_junction_id, JunctionId);
write_read_id!(write_event_id, read_event_id, EventId);

fn write_point2(w: &mut Writer, p: &Point2) {
    w.write_f64(p.x);
    w.write_f64(p.y);
}

fn read_point2(r: &mut Reader) -> CodecResult<Point2> {
    Ok(Point2::new(r.read_f64()?, r.read_f64()?))
}

fn write_point3(w: &mut Writer, p: &Point3) {
    w.write_f64(p.x);
    w.write_f64(p.y);
    w.write_f64(p.z);
}

fn read_point3(r: &mut Reader) -> CodecResult<Point3> {
    Ok(Point3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?))
}

fn write_geometry(w: &mut Writer, g: &Geometry) {
    w.write_u8(g.variant_index());
    match g {
        Geometry::Point2(p) => write_point2(w, p),
        Geometry::Point3(p) => write_point3(w, p),
        Geometry::Segment2(s) => {
            write_point2(w, &s.a);
            write_point2(w, &s.b);
        }
        Geometry::Polyline2(p) => w.write_vec(&p.points, |w, pt| write_point2(w, pt)),
        Geometry::Polyline3(p) => w.write_vec(&p.points, |w, pt| write_point3(w, pt)),
        Geometry::PolygonRegion2(r) => w.write_vec(&r.ring, |w, pt| write_point2(w, pt)),
    }
}

fn read_geometry(r: &mut Reader) -> CodecResult<Geometry> {
    let tag = r.read_u8()?;
    Ok(match tag {
        0 => Geometry::Point2(read_point2(r)?),
        1 => Geometry::Point3(read_point3(r)?),
        2 => Geometry::Segment2(Segment2::new(read_point2(r)?, read_point2(r)?)),
        3 => Geometry::Polyline2(Polyline2::new(r.read_vec(read_point2)?)),
        4 => Geometry::Polyline3(Polyline3::new(r.read_vec(read_point3)?)),
        5 => Geometry::PolygonRegion2(PolygonRegion2::new(r.read_vec(read_point2)?)),
        other => return Err(CodecError::UnknownVariant(other, "Geometry")),
    })
}

fn write_boundary_type(w: &mut Writer, t: BoundaryType) {
    w.write_u8(match t {
        BoundaryType::Divergent => 0,
        BoundaryType::Convergent => 1,
        BoundaryType::Transform => 2,
    });
}

fn read_boundary_type(r: &mut Reader) -> CodecResult<BoundaryType> {
    Ok(match r.read_u8()? {
        0 => BoundaryType::Divergent,
        1 => BoundaryType::Convergent,
        2 => BoundaryType::Transform,
        other => return Err(CodecError::UnknownVariant(other, "BoundaryType")),
    })
}

// ---------------------------------------------------------------------
// Event kind sum type
// ---------------------------------------------------------------------

fn write_event_kind(w: &mut Writer, k: &EventKind) {
    w.write_u8(k.variant_index());
    match k {
        EventKind::PlateCreated { plate_id } => write_plate_id(w, plate_id),
        EventKind::PlateRetired { plate_id, reason } => {
            write_plate_id(w, plate_id);
            w.write_option(reason, |w, s| w.write_string(s));
        }
        EventKind::BoundaryCreated {
            boundary_id,
            plate_id_left,
            plate_id_right,
            boundary_type,
            geometry,
        } => {
            write_boundary_id(w, boundary_id);
            write_plate_id(w, plate_id_left);
            write_plate_id(w, plate_id_right);
            write_boundary_type(w, *boundary_type);
            write_geometry(w, geometry);
        }
        EventKind::BoundaryTypeChanged {
            boundary_id,
            old_type,
            new_type,
        } => {
            write_boundary_id(w, boundary_id);
            write_boundary_type(w, *old_type);
            write_boundary_type(w, *new_type);
        }
        EventKind::BoundaryGeometryUpdated {
            boundary_id,
            new_geometry,
        } => {
            write_boundary_id(w, boundary_id);
            write_geometry(w, new_geometry);
        }
        EventKind::BoundaryRetired { boundary_id, reason } => {
            write_boundary_id(w, boundary_id);
            w.write_option(reason, |w, s| w.write_string(s));
        }
        EventKind::JunctionCreated {
            junction_id,
            boundary_ids,
            location,
        } => {
            write_junction_id(w, junction_id);
            w.write_vec(boundary_ids, |w, id| write_boundary_id(w, id));
            write_point2(w, location);
        }
        EventKind::JunctionUpdated {
            junction_id,
            new_boundary_ids,
            new_location,
        } => {
            write_junction_id(w, junction_id);
            w.write_vec(new_boundary_ids, |w, id| write_boundary_id(w, id));
            w.write_option(new_location, |w, p| write_point2(w, p));
        }
        EventKind::JunctionRetired { junction_id, reason } => {
            write_junction_id(w, junction_id);
            w.write_option(reason, |w, s| w.write_string(s));
        }
    }
}

fn read_event_kind(r: &mut Reader) -> CodecResult<EventKind> {
    let tag = r.read_u8()?;
    Ok(match tag {
        0 => EventKind::PlateCreated {
            plate_id: read_plate_id(r)?,
        },
        1 => EventKind::PlateRetired {
            plate_id: read_plate_id(r)?,
            reason: r.read_option(|r| r.read_string())?,
        },
        2 => EventKind::BoundaryCreated {
            boundary_id: read_boundary_id(r)?,
            plate_id_left: read_plate_id(r)?,
            plate_id_right: read_plate_id(r)?,
            boundary_type: read_boundary_type(r)?,
            geometry: read_geometry(r)?,
        },
        3 => EventKind::BoundaryTypeChanged {
            boundary_id: read_boundary_id(r)?,
            old_type: read_boundary_type(r)?,
            new_type: read_boundary_type(r)?,
        },
        4 => EventKind::BoundaryGeometryUpdated {
            boundary_id: read_boundary_id(r)?,
            new_geometry: read_geometry(r)?,
        },
        5 => EventKind::BoundaryRetired {
            boundary_id: read_boundary_id(r)?,
            reason: r.read_option(|r| r.read_string())?,
        },
        6 => EventKind::JunctionCreated {
            junction_id: read_junction_id(r)?,
            boundary_ids: r.read_vec(read_boundary_id)?,
            location: read_point2(r)?,
        },
        7 => EventKind::JunctionUpdated {
            junction_id: read_junction_id(r)?,
            new_boundary_ids: r.read_vec(read_boundary_id)?,
            new_location: r.read_option(read_point2)?,
        },
        8 => EventKind::JunctionRetired {
            junction_id: read_junction_id(r)?,
            reason: r.read_option(|r| r.read_string())?,
        },
        other => return Err(CodecError::UnknownVariant(other, "EventKind")),
    })
}

// ---------------------------------------------------------------------
// Stamped event envelope
// ---------------------------------------------------------------------

/// Encode the full stamped envelope (including `previous_hash`/`hash`), as
/// persisted at its event key (spec §4.3, §6.5).
pub fn encode_event(event: &TopologyEvent) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(SCHEMA_VERSION);
    write_event_id(&mut w, &event.event_id);
    write_event_kind(&mut w, &event.kind);
    write_tick(&mut w, event.tick);
    w.write_u64(event.sequence);
    write_stream_identity(&mut w, &event.stream_identity);
    w.write_bytes(&event.previous_hash);
    w.write_bytes(&event.hash);
    w.into_bytes()
}

pub fn decode_event(bytes: &[u8]) -> CodecResult<TopologyEvent> {
    let mut r = Reader::new(bytes);
    let schema = r.read_u8()?;
    if schema != SCHEMA_VERSION {
        return Err(CodecError::UnknownSchemaVersion(schema, SCHEMA_VERSION));
    }
    let event_id = read_event_id(&mut r)?;
    let kind = read_event_kind(&mut r)?;
    let tick = read_tick(&mut r)?;
    let sequence = r.read_u64()?;
    let stream_identity = read_stream_identity(&mut r)?;
    let previous_hash = r.read_bytes()?;
    let hash = r.read_bytes()?;
    r.finish()?;
    Ok(TopologyEvent {
        event_id,
        kind,
        tick,
        sequence,
        stream_identity,
        previous_hash,
        hash,
    })
}

/// Encode the envelope fields the hash chain is computed over — everything
/// *except* `previous_hash` and `hash` themselves (spec §4.3: `payload` is
/// the canonical-encoded event body excluding the two hash fields).
pub fn encode_event_payload_for_hash(event: &TopologyEvent) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(SCHEMA_VERSION);
    write_event_id(&mut w, &event.event_id);
    write_event_kind(&mut w, &event.kind);
    write_tick(&mut w, event.tick);
    w.write_u64(event.sequence);
    write_stream_identity(&mut w, &event.stream_identity);
    w.into_bytes()
}

// ---------------------------------------------------------------------
// TopologyState (for the snapshot store, C4)
// ---------------------------------------------------------------------

use tp_core::state::{Boundary, Junction, Plate, TopologyState};
use std::collections::BTreeMap;

fn write_plate(w: &mut Writer, p: &Plate) {
    write_plate_id(w, &p.id);
    w.write_bool(p.retired);
    w.write_option(&p.retired_reason, |w, s| w.write_string(s));
}

fn read_plate(r: &mut Reader) -> CodecResult<Plate> {
    Ok(Plate {
        id: read_plate_id(r)?,
        retired: r.read_bool()?,
        retired_reason: r.read_option(|r| r.read_string())?,
    })
}

fn write_boundary(w: &mut Writer, b: &Boundary) {
    write_boundary_id(w, &b.id);
    write_plate_id(w, &b.plate_left);
    write_plate_id(w, &b.plate_right);
    write_boundary_type(w, b.boundary_type);
    write_geometry(w, &b.geometry);
    w.write_bool(b.retired);
    w.write_option(&b.retired_reason, |w, s| w.write_string(s));
}

fn read_boundary(r: &mut Reader) -> CodecResult<Boundary> {
    Ok(Boundary {
        id: read_boundary_id(r)?,
        plate_left: read_plate_id(r)?,
        plate_right: read_plate_id(r)?,
        boundary_type: read_boundary_type(r)?,
        geometry: read_geometry(r)?,
        retired: r.read_bool()?,
        retired_reason: r.read_option(|r| r.read_string())?,
    })
}

fn write_junction(w: &mut Writer, j: &Junction) {
    write_junction_id(w, &j.id);
    w.write_vec(&j.boundary_ids, |w, id| write_boundary_id(w, id));
    write_point2(w, &j.location);
    w.write_bool(j.retired);
    w.write_option(&j.retired_reason, |w, s| w.write_string(s));
}

fn read_junction(r: &mut Reader) -> CodecResult<Junction> {
    Ok(Junction {
        id: read_junction_id(r)?,
        boundary_ids: r.read_vec(read_boundary_id)?,
        location: read_point2(r)?,
        retired: r.read_bool()?,
        retired_reason: r.read_option(|r| r.read_string())?,
    })
}

/// Encode a `TopologyState` for the snapshot store (spec §4.4). Entity maps
/// ride `BTreeMap`'s ascending-key iteration (already deterministic; see
/// `tp_core::determinism`), encoded as a plain sequence of `(id, value)`
/// pairs since the key is redundant with the value's own `id` field.
pub fn encode_topology_state(state: &TopologyState) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(SCHEMA_VERSION);
    write_stream_identity(&mut w, &state.identity);
    w.write_option(&state.last_event_sequence, |w, v| w.write_u64(*v));
    w.write_vec(&state.plates.values().collect::<Vec<_>>(), |w, p| {
        write_plate(w, p)
    });
    w.write_vec(&state.boundaries.values().collect::<Vec<_>>(), |w, b| {
        write_boundary(w, b)
    });
    w.write_vec(&state.junctions.values().collect::<Vec<_>>(), |w, j| {
        write_junction(w, j)
    });
    w.write_vec(&state.violations, |w, s| w.write_string(s));
    w.into_bytes()
}

pub fn decode_topology_state(bytes: &[u8]) -> CodecResult<TopologyState> {
    let mut r = Reader::new(bytes);
    let schema = r.read_u8()?;
    if schema != SCHEMA_VERSION {
        return Err(CodecError::UnknownSchemaVersion(schema, SCHEMA_VERSION));
    }
    let identity = read_stream_identity(&mut r)?;
    let last_event_sequence = r.read_option(|r| r.read_u64())?;
    let plates: Vec<Plate> = r.read_vec(read_plate)?;
    let boundaries: Vec<Boundary> = r.read_vec(read_boundary)?;
    let junctions: Vec<Junction> = r.read_vec(read_junction)?;
    let violations = r.read_vec(|r| r.read_string())?;
    r.finish()?;

    let mut state = TopologyState::empty(identity);
    state.last_event_sequence = last_event_sequence;
    state.plates = BTreeMap::from_iter(plates.into_iter().map(|p| (p.id, p)));
    state.boundaries = BTreeMap::from_iter(boundaries.into_iter().map(|b| (b.id, b)));
    state.junctions = BTreeMap::from_iter(junctions.into_iter().map(|j| (j.id, j)));
    state.violations = violations;
    Ok(state)
}
