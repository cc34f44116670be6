use std::ops;

use crate::geom;

// How often a geometry is expected to change after it was first committed
#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(Debug)]
pub enum GeometryFlags {
    // Buffers are frozen by the first commit
    Static,
    Deformable,
    Dynamic,
}

#[derive(Debug)]
pub struct TriangleMesh {
    pub(super) flags: GeometryFlags,
    pub(super) vertices: Vec<geom::Vertex>,
    pub(super) triangles: Vec<geom::Triangle>,
    pub(super) mask: u32,
    pub(super) enabled: bool,
    pub(super) committed: bool,
    pub(super) modified: bool,
}

impl TriangleMesh {
    pub(super) fn new(
        flags: GeometryFlags,
        num_triangles: usize,
        num_vertices: usize,
    ) -> Self {
        Self {
            flags,
            vertices: vec![geom::Vertex::default(); num_vertices],
            triangles: vec![geom::Triangle::default(); num_triangles],
            mask: u32::MAX,
            enabled: true,
            committed: false,
            modified: true,
        }
    }

    pub(super) fn is_mappable(&self) -> bool {
        !(self.committed && self.flags == GeometryFlags::Static)
    }

    // The index of the first vertex reference that is out of range
    pub(super) fn dangling(&self) -> Option<(usize, u32)> {
        let count = self.vertices.len();

        self.triangles.iter().enumerate().find_map(|(prim, tri)| {
            tri.indices()
                .into_iter()
                .find(|&idx| idx as usize >= count)
                .map(|idx| (prim, idx))
        })
    }

    pub fn flags(&self) -> GeometryFlags {
        self.flags
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// A mapped geometry buffer.
///
/// Dereferences to the buffer's contents. Dropping the mapping unmaps the
/// buffer and flags the geometry for the next commit.
pub struct Mapped<'a, T> {
    pub(super) data: &'a mut [T],
    pub(super) modified: &'a mut bool,
}

impl<'a, T> ops::Deref for Mapped<'a, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<'a, T> ops::DerefMut for Mapped<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<'a, T> Drop for Mapped<'a, T> {
    fn drop(&mut self) {
        *self.modified = true;
    }
}
