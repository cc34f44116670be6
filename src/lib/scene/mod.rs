mod geometry;

pub use geometry::{GeometryFlags, Mapped, TriangleMesh};

use crate::{bvh, device, geom, ray};
use crate::error::{self, Error};
use crate::geom::V3Ops as _;

pub type GeomId = u32;

#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(Debug)]
pub enum SceneFlags {
    // Frozen after the first successful commit
    Static,
    Dynamic,
}

/// A collection of geometries and the acceleration structure built over
/// them. Queries only see the state of the last successful [`Scene::commit`].
#[derive(Debug)]
pub struct Scene {
    device: device::Device,
    flags: SceneFlags,
    geometries: Vec<TriangleMesh>,
    bvh: Option<bvh::Bvh>,
    dirty: bool,
}

impl Drop for Scene {
    fn drop(&mut self) {
        log::debug!("releasing scene with {} geometries", self.geometries.len());
    }
}

impl Scene {
    pub(crate) fn new(device: device::Device, flags: SceneFlags) -> Self {
        Self {
            device,
            flags,
            geometries: Vec::new(),
            bvh: None,
            dirty: true,
        }
    }

    pub fn device(&self) -> &device::Device {
        &self.device
    }

    pub fn flags(&self) -> SceneFlags {
        self.flags
    }

    pub fn is_committed(&self) -> bool {
        self.bvh.is_some()
    }

    pub fn geometry(&self, id: GeomId) -> Option<&TriangleMesh> {
        self.geometries.get(id as usize)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    fn check_modifiable(&self) -> error::Result<()> {
        if self.flags == SceneFlags::Static && self.is_committed() {
            return Err(self.device.report({
                Error::invalid_operation("static scene cannot be modified after commit")
            }));
        }

        Ok(())
    }

    fn geometry_mut(&mut self, id: GeomId) -> error::Result<&mut TriangleMesh> {
        self.check_modifiable()?;

        let Self { device, geometries, .. } = self;

        geometries.get_mut(id as usize).ok_or_else(|| {
            device.report(Error::invalid_argument(format!("invalid geometry id {id}")))
        })
    }

    fn mappable_mut(&mut self, id: GeomId) -> error::Result<&mut TriangleMesh> {
        if !self.geometry_mut(id)?.is_mappable() {
            let err = Error::invalid_operation({
                format!("static geometry {id} cannot be modified after commit")
            });

            return Err(self.device.report(err));
        }

        Ok(&mut self.geometries[id as usize])
    }

    pub fn new_triangle_mesh(
        &mut self,
        flags: GeometryFlags,
        num_triangles: usize,
        num_vertices: usize,
    ) -> error::Result<GeomId> {
        self.check_modifiable()?;

        let id = self.geometries.len() as GeomId;

        self.geometries.push(TriangleMesh::new(flags, num_triangles, num_vertices));
        self.dirty = true;

        log::trace!("new triangle mesh {id}: {num_triangles} triangles, {num_vertices} vertices");

        Ok(id)
    }

    pub fn map_vertices(&mut self, id: GeomId) -> error::Result<Mapped<'_, geom::Vertex>> {
        let TriangleMesh { vertices, modified, .. } = self.mappable_mut(id)?;

        Ok(Mapped { data: vertices, modified })
    }

    pub fn map_triangles(&mut self, id: GeomId) -> error::Result<Mapped<'_, geom::Triangle>> {
        let TriangleMesh { triangles, modified, .. } = self.mappable_mut(id)?;

        Ok(Mapped { data: triangles, modified })
    }

    pub fn set_mask(&mut self, id: GeomId, mask: u32) -> error::Result<()> {
        self.geometry_mut(id)?.mask = mask;
        self.dirty = true;

        Ok(())
    }

    pub fn enable(&mut self, id: GeomId) -> error::Result<()> {
        self.geometry_mut(id)?.enabled = true;
        self.dirty = true;

        Ok(())
    }

    pub fn disable(&mut self, id: GeomId) -> error::Result<()> {
        self.geometry_mut(id)?.enabled = false;
        self.dirty = true;

        Ok(())
    }

    /// Builds the acceleration structure over all enabled geometries.
    ///
    /// Fails without touching the previous build if a triangle references
    /// a vertex that does not exist. Triangles with non-finite vertices
    /// are left out of the build.
    pub fn commit(&mut self) -> error::Result<()> {
        let modified = self.geometries.iter().any(|mesh| mesh.modified);

        if self.is_committed() && !self.dirty && !modified {
            log::trace!("scene unchanged, skipping rebuild");

            return Ok(());
        }

        for (id, mesh) in self.geometries.iter().enumerate() {
            if let Some((prim, idx)) = mesh.dangling() {
                let err = Error::invalid_argument(format!(
                    "triangle {prim} of geometry {id} references vertex {idx}, \
                     but the geometry has {} vertices", mesh.vertex_count()
                ));

                return Err(self.device.report(err));
            }
        }

        let mut prims = Vec::new();
        let mut skipped = 0;

        for (geom_id, mesh) in self.geometries.iter().enumerate() {
            if !mesh.enabled {
                continue;
            }

            for (prim_id, tri) in mesh.triangles.iter().enumerate() {
                let verts = tri.indices().map(|idx| mesh.vertices[idx as usize].pos());

                if !verts.iter().all(|v| v.is_finite()) {
                    skipped += 1;

                    continue;
                }

                prims.push(bvh::Prim {
                    verts,
                    geom_id: geom_id as u32,
                    prim_id: prim_id as u32,
                    mask: mesh.mask,
                });
            }
        }

        let config = self.device.config();
        let bvh = bvh::Bvh::new(prims, config.leaf_size, config.split_eps);

        if config.verbose > 0 {
            log::info!(
                "committed scene: {} triangles ({} skipped), {} nodes",
                bvh.prim_count(), skipped, bvh.node_count()
            );
        } else {
            log::debug!("committed scene: {} triangles", bvh.prim_count());
        }

        for mesh in self.geometries.iter_mut() {
            mesh.committed = true;
            mesh.modified = false;
        }

        self.bvh = Some(bvh);
        self.dirty = false;

        Ok(())
    }

    /// Finds the closest hit and records it in `ray`. A miss leaves the
    /// ray untouched.
    pub fn intersect(&self, ray: &mut ray::Ray) {
        match &self.bvh {
            Some(bvh) => bvh.intersect(ray),
            None => {
                self.device.report(Error::invalid_operation("scene not committed"));
            },
        }
    }

    /// Tests for any hit. On a hit `tfar` is set to negative infinity.
    pub fn occluded(&self, ray: &mut ray::Ray) -> bool {
        let occluded = match &self.bvh {
            Some(bvh) => bvh.occluded(ray),
            None => {
                self.device.report(Error::invalid_operation("scene not committed"));

                false
            },
        };

        if occluded {
            ray.tfar = f32::NEG_INFINITY;
        }

        occluded
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;

    use super::*;

    fn unit_triangle(scene: &mut Scene, z: f32) -> GeomId {
        let mesh = scene.new_triangle_mesh(GeometryFlags::Static, 1, 3).unwrap();

        scene.map_vertices(mesh).unwrap().copy_from_slice(&[
            geom::Vertex::new(0., 0., z),
            geom::Vertex::new(1., 0., z),
            geom::Vertex::new(0., 1., z),
        ]);

        scene.map_triangles(mesh).unwrap()[0] = geom::Triangle::new(0, 1, 2);

        mesh
    }

    fn scene(flags: SceneFlags) -> Scene {
        device::Device::new(None).unwrap().create_scene(flags)
    }

    #[test]
    fn closest_of_two_geometries() {
        let mut scene = scene(SceneFlags::Dynamic);

        let far = unit_triangle(&mut scene, 2.);
        let near = unit_triangle(&mut scene, 1.);

        scene.commit().unwrap();

        let mut ray = ray::Ray::new([0.2, 0.2, 0.], [0., 0., 1.]);
        scene.intersect(&mut ray);

        assert_eq!(ray.geom_id, near);
        assert_eq!(ray.prim_id, 0);
        assert_eq!(ray.tfar, 1.);
        assert_eq!(ray.ng, [0., 0., 1.]);

        // Starting past the near triangle finds the far one
        let mut ray = ray::Ray::new([0.2, 0.2, 0.], [0., 0., 1.]).with_segment(1.5, 10.);
        scene.intersect(&mut ray);

        assert_eq!(ray.geom_id, far);
        assert_eq!(ray.tfar, 2.);
    }

    #[test]
    fn miss_leaves_ray_untouched() {
        let mut scene = scene(SceneFlags::Static);

        unit_triangle(&mut scene, 0.);
        scene.commit().unwrap();

        let ray = ray::Ray::new([1., 1., -1.], [0., 0., 1.]);

        let mut traced = ray;
        scene.intersect(&mut traced);

        assert_eq!(traced, ray);
        assert!(traced.hit().is_none());
    }

    #[test]
    fn occluded_marks_tfar() {
        let mut scene = scene(SceneFlags::Static);

        unit_triangle(&mut scene, 0.);
        scene.commit().unwrap();

        let mut ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., 1.]);

        assert!(scene.occluded(&mut ray));
        assert_eq!(ray.tfar, f32::NEG_INFINITY);
        assert!(!ray.is_hit());

        let mut ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., -1.]);

        assert!(!scene.occluded(&mut ray));
        assert_eq!(ray.tfar, f32::INFINITY);
    }

    #[test]
    fn uncommitted_scene_reports() {
        let mut scene = scene(SceneFlags::Dynamic);

        unit_triangle(&mut scene, 0.);

        let mut ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., 1.]);
        scene.intersect(&mut ray);

        assert!(!ray.is_hit());
        assert_eq!(scene.device().take_error(), Some(ErrorCode::InvalidOperation));
    }

    #[test]
    fn static_scene_is_frozen() {
        let mut scene = scene(SceneFlags::Static);

        let mesh = unit_triangle(&mut scene, 0.);
        scene.commit().unwrap();

        let err = scene.new_triangle_mesh(GeometryFlags::Dynamic, 1, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperation);

        assert!(scene.map_vertices(mesh).is_err());
        assert!(scene.disable(mesh).is_err());
        assert_eq!(scene.device().take_error(), Some(ErrorCode::InvalidOperation));
    }

    #[test]
    fn dynamic_scene_accepts_updates() {
        let mut scene = scene(SceneFlags::Dynamic);

        let frozen = unit_triangle(&mut scene, 0.);
        let moving = scene.new_triangle_mesh(GeometryFlags::Deformable, 1, 3).unwrap();

        scene.map_triangles(moving).unwrap()[0] = geom::Triangle::new(0, 1, 2);
        scene.commit().unwrap();

        // Static geometry stays frozen even in a dynamic scene
        assert!(scene.map_vertices(frozen).is_err());

        scene.map_vertices(moving).unwrap().copy_from_slice(&[
            geom::Vertex::new(5., 5., 1.),
            geom::Vertex::new(6., 5., 1.),
            geom::Vertex::new(5., 6., 1.),
        ]);

        let mut ray = ray::Ray::new([5.1, 5.1, 0.], [0., 0., 1.]);

        // Not visible until the next commit
        scene.intersect(&mut ray);
        assert!(!ray.is_hit());

        scene.commit().unwrap();
        scene.intersect(&mut ray);
        assert_eq!(ray.geom_id, moving);
    }

    #[test]
    fn disabled_and_masked_geometry() {
        let mut scene = scene(SceneFlags::Dynamic);

        let mesh = unit_triangle(&mut scene, 0.);

        scene.disable(mesh).unwrap();
        scene.commit().unwrap();

        let ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., 1.]);

        assert!(!scene.occluded(&mut ray.clone()));

        scene.enable(mesh).unwrap();
        scene.set_mask(mesh, 0b100).unwrap();
        scene.commit().unwrap();

        assert!(!scene.occluded(&mut ray.with_mask(0b011)));
        assert!(scene.occluded(&mut ray.with_mask(0b100)));
    }

    #[test]
    fn dangling_index_fails_commit() {
        let mut scene = scene(SceneFlags::Dynamic);

        let mesh = scene.new_triangle_mesh(GeometryFlags::Static, 1, 3).unwrap();
        scene.map_triangles(mesh).unwrap()[0] = geom::Triangle::new(0, 1, 3);

        let err = scene.commit().unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert!(!scene.is_committed());
    }

    #[test]
    fn failed_recommit_keeps_previous_build() {
        let mut scene = scene(SceneFlags::Dynamic);

        let mesh = scene.new_triangle_mesh(GeometryFlags::Deformable, 1, 3).unwrap();

        scene.map_vertices(mesh).unwrap().copy_from_slice(&[
            geom::Vertex::new(0., 0., 1.),
            geom::Vertex::new(1., 0., 1.),
            geom::Vertex::new(0., 1., 1.),
        ]);

        scene.map_triangles(mesh).unwrap()[0] = geom::Triangle::new(0, 1, 2);
        scene.commit().unwrap();

        scene.map_triangles(mesh).unwrap()[0] = geom::Triangle::new(0, 1, 9);

        let err = scene.commit().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert!(scene.is_committed());

        let mut ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., 1.]);
        scene.intersect(&mut ray);

        assert_eq!(ray.geom_id, mesh);
        assert_eq!(ray.tfar, 2.);
    }

    #[test]
    fn unknown_geometry_id() {
        let mut scene = scene(SceneFlags::Dynamic);

        let err = scene.map_vertices(7).err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn non_finite_triangles_are_skipped() {
        let mut scene = scene(SceneFlags::Dynamic);

        let mesh = unit_triangle(&mut scene, 0.);
        scene.map_vertices(mesh).unwrap()[2].y = f32::NAN;
        scene.commit().unwrap();

        let mut ray = ray::Ray::new([0.1, 0.1, -1.], [0., 0., 1.]);
        scene.intersect(&mut ray);

        assert!(!ray.is_hit());
    }
}
