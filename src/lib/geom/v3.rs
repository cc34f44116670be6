// Plain arrays rather than a new-type, so vertex data can be
// handed around without conversions. The ops live on an extension trait.
pub type V3<T> = [T; 3];

pub trait V3Ops {
    type Ty: Default + num_traits::Float;

    fn add(self, b: Self) -> Self;
    fn sub(self, b: Self) -> Self;
    fn cross(self, b: Self) -> Self;
    fn dot(self, b: Self) -> Self::Ty;
    fn scale(self, s: Self::Ty) -> Self;
    fn min(self, b: Self) -> Self;
    fn max(self, b: Self) -> Self;
    fn recip(self) -> Self;
    fn is_finite(self) -> bool;

    // Index of the largest component
    fn major_axis(self) -> usize;
}

impl<T: Default + num_traits::Float> V3Ops for V3<T> {
    type Ty = T;

    fn add(self, b: Self) -> Self {
        [self[0] + b[0], self[1] + b[1], self[2] + b[2]]
    }

    fn sub(self, b: Self) -> Self {
        [self[0] - b[0], self[1] - b[1], self[2] - b[2]]
    }

    fn cross(self, b: Self) -> Self {
        [
            self[1] * b[2] - self[2] * b[1],
            self[2] * b[0] - self[0] * b[2],
            self[0] * b[1] - self[1] * b[0],
        ]
    }

    fn dot(self, b: Self) -> Self::Ty {
        self.into_iter()
            .zip(b)
            .fold(Self::Ty::default(), |dot, (a, b)| dot + a * b)
    }

    fn scale(self, s: Self::Ty) -> Self {
        self.map(|c| c * s)
    }

    fn min(self, b: Self) -> Self {
        [self[0].min(b[0]), self[1].min(b[1]), self[2].min(b[2])]
    }

    fn max(self, b: Self) -> Self {
        [self[0].max(b[0]), self[1].max(b[1]), self[2].max(b[2])]
    }

    // Zero components become signed infinities, which the slab test relies on
    fn recip(self) -> Self {
        self.map(|c| c.recip())
    }

    fn is_finite(self) -> bool {
        self.iter().all(|c| c.is_finite())
    }

    fn major_axis(self) -> usize {
        if self[0] >= self[1] && self[0] >= self[2] {
            0
        } else if self[1] >= self[2] {
            1
        } else {
            2
        }
    }
}
