use std::sync;

use rt::{geom, tutorial, ErrorCode, GeometryFlags, Ray, SceneFlags};

#[test]
fn two_hard_coded_rays() {
    let device = tutorial::initialize_device(None).unwrap();
    let scene = tutorial::initialize_scene(&device).unwrap();

    let hit = tutorial::trace(&scene, [0., 0., -1.], [0., 0., 1.]).hit().unwrap();

    assert_eq!((hit.geom_id, hit.prim_id), (0, 0));
    assert_eq!(hit.tfar, 1.);

    assert!(!tutorial::cast_ray(&scene, [1., 1., -1.], [0., 0., 1.]));
}

#[test]
fn errors_flow_through_the_error_function() {
    let device = rt::Device::new(Some("verbose=1")).unwrap();
    let codes = sync::Arc::new(sync::Mutex::new(Vec::new()));

    let sink = codes.clone();
    device.set_error_function(move |code, _| sink.lock().unwrap().push(code));

    let mut scene = device.create_scene(SceneFlags::Static);

    // Querying before the first commit
    let mut ray = Ray::new([0.; 3], [0., 0., 1.]);
    scene.intersect(&mut ray);

    let mesh = scene.new_triangle_mesh(GeometryFlags::Static, 1, 2).unwrap();
    scene.map_triangles(mesh).unwrap()[0] = geom::Triangle::new(0, 1, 2);

    assert!(scene.commit().is_err());

    assert_eq!(*codes.lock().unwrap(), vec![
        ErrorCode::InvalidOperation,
        ErrorCode::InvalidArgument,
    ]);

    assert_eq!(device.take_error(), Some(ErrorCode::InvalidOperation));
}

#[test]
fn image_of_the_triangle() {
    let device = tutorial::initialize_device(None).unwrap();
    let scene = tutorial::initialize_scene(&device).unwrap();

    let size = winit::dpi::PhysicalSize::new(64, 48);
    let mut framebuffer = rt::framebuffer::Framebuffer::new(size);

    framebuffer.trace(&scene);

    let lit = framebuffer.pixels()
        .chunks_exact(4)
        .filter(|p| p[0] != 0)
        .count();

    // The triangle covers half of the unit square, which spans
    // (1 / 1.2)^2 of the image
    let expected = 0.5 / 1.44 * (64 * 48) as f32;

    assert!((lit as f32 - expected).abs() < expected * 0.1, "{lit} vs {expected}");
    assert!(framebuffer.pixels().chunks_exact(4).all(|p| p[0] == p[1] && p[1] == p[2]));
}
