mod aabb;

pub use aabb::{Aabb, Bounds};

use crate::geom::{V3, V3Ops as _};
use crate::ray;

// Deepest tree the builder produces. Traversal holds at most one
// pending sibling per level, so its stack never outgrows this
pub const MAX_DEPTH: usize = 32;

// A triangle copied out of its mesh at commit time,
// so traversal never touches the mapped buffers
#[derive(Clone, Copy)]
#[derive(Debug)]
pub struct Prim {
    pub verts: [V3<f32>; 3],
    pub geom_id: u32,
    pub prim_id: u32,
    pub mask: u32,
}

impl Prim {
    pub fn centroid(&self) -> V3<f32> {
        let [a, b, c] = self.verts;

        a.add(b).add(c).scale(1. / 3.)
    }

    // Möller-Trumbore, both faces count.
    // Returns (t, u, v) for hits inside [tnear, tfar]
    pub fn intersect(
        &self,
        org: V3<f32>,
        dir: V3<f32>,
        tnear: f32,
        tfar: f32,
    ) -> Option<(f32, f32, f32)> {
        let [v0, v1, v2] = self.verts;

        let e1 = v1.sub(v0);
        let e2 = v2.sub(v0);

        let p = dir.cross(e2);
        let det = e1.dot(p);

        if det == 0. || !det.is_finite() {
            return None;
        }

        let inv_det = 1. / det;

        let s = org.sub(v0);
        let u = s.dot(p) * inv_det;

        if !(0. ..=1.).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;

        if v < 0. || u + v > 1. {
            return None;
        }

        let t = e2.dot(q) * inv_det;

        (t >= tnear && t <= tfar).then_some((t, u, v))
    }

    pub fn normal(&self) -> V3<f32> {
        let [v0, v1, v2] = self.verts;

        v1.sub(v0).cross(v2.sub(v0))
    }
}

// The Aabb tree flattened into an array. Children are never at index 0,
// so `fst == 0` marks a leaf
#[derive(Clone, Copy)]
#[derive(Debug)]
pub struct Node {
    pub fst: u32,
    pub snd: u32,
    pub item_idx: u32,
    pub item_count: u32,
    pub bounds: Bounds,
}

#[derive(Default)]
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<Node>,
    indices: Vec<u32>,
    prims: Vec<Prim>,
}

impl Bvh {
    pub fn new(prims: Vec<Prim>, leaf_size: usize, eps: f32) -> Self {
        let root = Aabb::build(leaf_size, eps, &prims);

        let mut bvh = Self {
            nodes: Vec::new(),
            indices: Vec::new(),
            prims,
        };

        fn flatten(bvh: &mut Bvh, aabb: &Aabb) -> u32 {
            let node = bvh.nodes.len();

            bvh.nodes.push(Node {
                fst: 0,
                snd: 0,
                item_idx: bvh.indices.len() as u32,
                item_count: aabb.items.len() as u32,
                bounds: aabb.bounds,
            });

            bvh.indices.extend(aabb.items.iter().map(|&i| i as u32));

            if let Some(fst) = aabb.fst.get() {
                bvh.nodes[node].fst = flatten(bvh, fst);
            }

            if let Some(snd) = aabb.snd.get() {
                bvh.nodes[node].snd = flatten(bvh, snd);
            }

            node as u32
        }

        if !bvh.prims.is_empty() {
            flatten(&mut bvh, &root);
        }

        bvh
    }

    pub fn prim_count(&self) -> usize {
        self.prims.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // Visits candidate primitives, nearer child first. `visit` returns
    // the new far distance, or `None` to stop the traversal
    fn traverse<F>(&self, ray: &ray::Ray, mut visit: F)
        where F: FnMut(&Prim, f32) -> Option<f32> {

        if self.nodes.is_empty() {
            return;
        }

        let inv_dir = ray.dir.recip();
        let mut tfar = ray.tfar;

        let mut stack = [0u32; MAX_DEPTH + 1];
        let mut len = 1;

        while len > 0 {
            len -= 1;

            let node = &self.nodes[stack[len] as usize];

            if node.bounds.entry(ray.org, inv_dir, ray.tnear, tfar).is_none() {
                continue;
            }

            if node.fst == 0 {
                let start = node.item_idx as usize;
                let end = start + node.item_count as usize;

                for &prim in &self.indices[start..end] {
                    let prim = &self.prims[prim as usize];

                    if prim.mask & ray.mask == 0 {
                        continue;
                    }

                    match visit(prim, tfar) {
                        Some(t) => tfar = t,
                        None => return,
                    }
                }

                continue;
            }

            let entry = |child: u32| {
                self.nodes[child as usize].bounds
                    .entry(ray.org, inv_dir, ray.tnear, tfar)
                    .unwrap_or(f32::INFINITY)
            };

            // Pushed last is popped first
            let (near, far) = if entry(node.fst) <= entry(node.snd) {
                (node.fst, node.snd)
            } else {
                (node.snd, node.fst)
            };

            stack[len] = far;
            stack[len + 1] = near;
            len += 2;
        }
    }

    /// Closest hit along the ray, written back into the ray.
    pub fn intersect(&self, ray: &mut ray::Ray) {
        let mut closest = None;

        self.traverse(ray, |prim, tfar| {
            match prim.intersect(ray.org, ray.dir, ray.tnear, tfar) {
                Some((t, u, v)) => {
                    closest = Some((*prim, t, u, v));

                    Some(t)
                },
                None => Some(tfar),
            }
        });

        if let Some((prim, t, u, v)) = closest {
            ray.tfar = t;
            ray.u = u;
            ray.v = v;
            ray.ng = prim.normal();
            ray.geom_id = prim.geom_id;
            ray.prim_id = prim.prim_id;
        }
    }

    /// Any hit along the ray.
    pub fn occluded(&self, ray: &ray::Ray) -> bool {
        let mut occluded = false;

        self.traverse(ray, |prim, tfar| {
            match prim.intersect(ray.org, ray.dir, ray.tnear, tfar) {
                Some(_) => {
                    occluded = true;

                    None
                },
                None => Some(tfar),
            }
        });

        occluded
    }
}
