//! The call sites both programs share: one device, one scene holding a
//! single triangle, and a helper that casts one ray into it.

use crate::{device, error, geom, ray, scene};
use crate::geom::V3;

/// The single triangle, in the xy-plane.
pub const TRIANGLE: [geom::Vertex; 3] = [
    geom::Vertex::new(0., 0., 0.),
    geom::Vertex::new(1., 0., 0.),
    geom::Vertex::new(0., 1., 0.),
];

/// Creates a device that prints every error it encounters.
pub fn initialize_device(config: Option<&str>) -> error::Result<device::Device> {
    let device = device::Device::new(config)?;

    device.set_error_function(|code, message| {
        println!("error {code}: {message}");
    });

    Ok(device)
}

/// Creates a scene and initializes a single triangle in it.
pub fn initialize_scene(device: &device::Device) -> error::Result<scene::Scene> {
    let mut scene = device.create_scene(scene::SceneFlags::Dynamic);

    let mesh = scene.new_triangle_mesh(scene::GeometryFlags::Static, 1, 3)?;

    scene.map_vertices(mesh)?.copy_from_slice(&TRIANGLE);
    scene.map_triangles(mesh)?.copy_from_slice(&[
        geom::Triangle::new(0, 1, 2),
    ]);

    scene.commit()?;

    Ok(scene)
}

/// Casts a single ray with the given origin and direction.
pub fn trace(scene: &scene::Scene, org: V3<f32>, dir: V3<f32>) -> ray::Ray {
    let mut ray = ray::Ray::new(org, dir);

    scene.intersect(&mut ray);
    ray
}

pub fn cast_ray(scene: &scene::Scene, org: V3<f32>, dir: V3<f32>) -> bool {
    trace(scene, org, dir).is_hit()
}

/// One line describing the outcome of a traced ray.
pub fn describe(ray: &ray::Ray) -> String {
    let [x, y, z] = ray.org;

    match ray.hit() {
        Some(ray::Hit { geom_id, prim_id, tfar, .. }) => format!(
            "{x:.6}, {y:.6}, {z:.6}: Found intersection on geometry {geom_id}, \
             primitive {prim_id} at tfar={tfar:.6}"
        ),
        None => format!("{x:.6}, {y:.6}, {z:.6}: Did not find any intersection."),
    }
}
