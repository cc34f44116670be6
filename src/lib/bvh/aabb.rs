use std::fmt;

use once_cell::sync::OnceCell;

use crate::geom::{V3, V3Ops as _};

use super::Prim;

#[derive(Clone, Copy, PartialEq)]
#[derive(Debug)]
pub struct Bounds {
    pub min: V3<f32>,
    pub max: V3<f32>,
}

impl Bounds {
    // Inverted so that the first `extend` snaps to the point
    pub const EMPTY: Self = Self {
        min: [f32::MAX; 3],
        max: [f32::MAX * -1.; 3],
    };

    pub fn new<P>(points: P) -> Self
        where P: IntoIterator<Item = V3<f32>> {

        points.into_iter().fold(Self::EMPTY, Self::extend)
    }

    fn extend(self, point: V3<f32>) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] ||
        self.min[1] > self.max[1] ||
        self.min[2] > self.max[2]
    }

    pub fn extent(&self) -> V3<f32> {
        self.max.sub(self.min)
    }

    // Slab test, returns the entry distance when the box overlaps [tnear, tfar]
    pub fn entry(&self, org: V3<f32>, inv_dir: V3<f32>, tnear: f32, tfar: f32) -> Option<f32> {
        let mut t_min = tnear;
        let mut t_max = tfar;

        for axis in 0..3 {
            // Parallel to the slab, so only the origin decides
            if inv_dir[axis].is_infinite() {
                if org[axis] < self.min[axis] || org[axis] > self.max[axis] {
                    return None;
                }

                continue;
            }

            let t0 = (self.min[axis] - org[axis]) * inv_dir[axis];
            let t1 = (self.max[axis] - org[axis]) * inv_dir[axis];

            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
        }

        (t_min <= t_max).then_some(t_min)
    }
}

pub struct Aabb {
    pub fst: OnceCell<Box<Aabb>>,
    pub snd: OnceCell<Box<Aabb>>,
    pub bounds: Bounds,
    pub items: Vec<usize>,
}

impl fmt::Debug for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fst.get().is_none() && self.snd.get().is_none() {
            return write!(f, "{:?}", self.items);
        }

        let mut out = f.debug_list();

        if let Some(fst) = self.fst.get() {
            out.entry(fst);
        }

        if let Some(snd) = self.snd.get() {
            out.entry(snd);
        }

        out.finish()
    }
}

impl Aabb {
    fn leaf(items: Vec<usize>, prims: &[Prim]) -> Self {
        Self {
            fst: OnceCell::new(),
            snd: OnceCell::new(),
            bounds: Bounds::new({
                items.iter().flat_map(|&idx| prims[idx].verts)
            }),
            items,
        }
    }

    fn split(&mut self, depth: usize, leaf_size: usize, eps: f32, prims: &[Prim]) {
        if self.items.len() <= leaf_size || depth + 1 >= super::MAX_DEPTH {
            return;
        }

        // Split the centroids rather than the node bounds, so each child
        // always receives at least one primitive
        let centroids = Bounds::new({
            self.items.iter().map(|&idx| prims[idx].centroid())
        });

        let d = centroids.extent();
        let axis = d.major_axis();

        if d[axis] < eps {
            return;
        }

        let mid = centroids.min[axis] + d[axis] * 0.5;

        let (fst, snd): (Vec<usize>, Vec<usize>) = self.items
            .iter()
            .partition(|&&idx| prims[idx].centroid()[axis] < mid);

        if fst.is_empty() || snd.is_empty() {
            return;
        }

        let mut fst = Self::leaf(fst, prims);
        let mut snd = Self::leaf(snd, prims);

        fst.split(depth + 1, leaf_size, eps, prims);
        snd.split(depth + 1, leaf_size, eps, prims);

        self.items.clear();

        let _ = self.fst.set(Box::new(fst));
        let _ = self.snd.set(Box::new(snd));
    }

    pub fn build(leaf_size: usize, eps: f32, prims: &[Prim]) -> Self {
        let mut root = Self::leaf((0..prims.len()).collect(), prims);

        root.split(0, leaf_size.max(1), eps, prims);
        root
    }

    pub fn depth(&self) -> usize {
        let fst = self.fst.get().map_or(0, |fst| fst.depth());
        let snd = self.snd.get().map_or(0, |snd| snd.depth());

        1 + fst.max(snd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim_at(x: f32) -> Prim {
        Prim {
            verts: [[x, 0., 0.], [x + 0.5, 0., 0.], [x, 0.5, 0.]],
            geom_id: 0,
            prim_id: 0,
            mask: u32::MAX,
        }
    }

    #[test]
    fn empty_bounds() {
        assert!(Bounds::new([]).is_empty());
        assert!(!Bounds::new([[0.; 3]]).is_empty());
    }

    #[test]
    fn slab_test() {
        let bounds = Bounds::new([[0., 0., 0.], [1., 1., 1.]]);

        let entry = bounds.entry([0.5, 0.5, -1.], [0f32, 0., 1.].recip(), 0., f32::INFINITY);
        assert_eq!(entry, Some(1.));

        let entry = bounds.entry([0.5, 0.5, -1.], [0f32, 0., 1.].recip(), 0., 0.5);
        assert_eq!(entry, None);

        let entry = bounds.entry([2., 0.5, -1.], [0f32, 0., 1.].recip(), 0., f32::INFINITY);
        assert_eq!(entry, None);
    }

    #[test]
    fn split_respects_leaf_size() {
        let prims = (0..16).map(|i| prim_at(i as f32)).collect::<Vec<_>>();

        fn check(node: &Aabb, leaf_size: usize, seen: &mut Vec<usize>) {
            match (node.fst.get(), node.snd.get()) {
                (Some(fst), Some(snd)) => {
                    assert!(node.items.is_empty());

                    check(fst, leaf_size, seen);
                    check(snd, leaf_size, seen);
                },
                _ => {
                    assert!(node.items.len() <= leaf_size);

                    seen.extend(&node.items);
                },
            }
        }

        let root = Aabb::build(2, 0.0000001, &prims);

        let mut seen = Vec::new();
        check(&root, 2, &mut seen);
        seen.sort_unstable();

        assert_eq!(seen, (0..16).collect::<Vec<_>>());
        assert!(root.depth() > 1);
    }

    #[test]
    fn extent_below_eps_is_not_split() {
        let prims = vec![prim_at(0.), prim_at(0.75)];

        assert_eq!(Aabb::build(1, 1., &prims).depth(), 1);
        assert_eq!(Aabb::build(1, 0.75, &prims).depth(), 2);
    }

    #[test]
    fn depth_is_capped() {
        // Shrinking by thirds, each split peels off only the largest
        let prims = (0..48)
            .map(|i| {
                let x = 3f32.powi(-i);

                Prim {
                    verts: [[x, 0., 0.], [x * 1.25, 0., 0.], [x, x * 0.25, 0.]],
                    ..prim_at(0.)
                }
            })
            .collect::<Vec<_>>();

        let root = Aabb::build(1, f32::MIN_POSITIVE, &prims);

        assert_eq!(root.depth(), crate::bvh::MAX_DEPTH);
    }

    #[test]
    fn coincident_centroids_stay_in_one_leaf() {
        let prims = vec![prim_at(0.); 5];
        let root = Aabb::build(1, 0.0000001, &prims);

        assert_eq!(root.depth(), 1);
        assert_eq!(root.items.len(), 5);
    }
}
