use crate::geom::V3;

/// Marks the id fields of a ray that has not hit anything.
pub const INVALID_GEOMETRY_ID: u32 = u32::MAX;

/// A single ray together with its hit record.
///
/// The query functions on [`Scene`](crate::scene::Scene) read the first
/// block of fields and write the second one. Only `[tnear, tfar]` is
/// searched, and `tfar` is shortened to the distance of the closest hit.
#[derive(Clone, Copy, PartialEq)]
#[derive(Debug)]
pub struct Ray {
    pub org: V3<f32>,
    pub dir: V3<f32>,
    pub tnear: f32,
    pub tfar: f32,
    pub time: f32,
    pub mask: u32,

    pub ng: V3<f32>,
    pub u: f32,
    pub v: f32,
    pub geom_id: u32,
    pub prim_id: u32,
    pub inst_id: u32,
}

impl Ray {
    pub const fn new(org: V3<f32>, dir: V3<f32>) -> Self {
        Self {
            org,
            dir,
            tnear: 0.,
            tfar: f32::INFINITY,
            time: 0.,
            mask: u32::MAX,
            ng: [0.; 3],
            u: 0.,
            v: 0.,
            geom_id: INVALID_GEOMETRY_ID,
            prim_id: INVALID_GEOMETRY_ID,
            inst_id: INVALID_GEOMETRY_ID,
        }
    }

    pub fn with_segment(mut self, tnear: f32, tfar: f32) -> Self {
        self.tnear = tnear;
        self.tfar = tfar;
        self
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub const fn is_hit(&self) -> bool {
        self.geom_id != INVALID_GEOMETRY_ID
    }

    pub fn hit(&self) -> Option<Hit> {
        self.is_hit().then_some(Hit {
            geom_id: self.geom_id,
            prim_id: self.prim_id,
            tfar: self.tfar,
            u: self.u,
            v: self.v,
            ng: self.ng,
        })
    }
}

// Summary of a successful intersect query
#[derive(Clone, Copy, PartialEq)]
#[derive(Debug)]
pub struct Hit {
    pub geom_id: u32,
    pub prim_id: u32,
    pub tfar: f32,
    pub u: f32,
    pub v: f32,
    pub ng: V3<f32>,
}
