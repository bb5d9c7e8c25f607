/// The logistic function `1 / (1 + e^-z)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sigmoid;

impl Sigmoid {
    pub fn f(&self, z: f32) -> f32 {
        1. / (1. + (-z).exp())
    }

    pub fn df(&self, z: f32) -> f32 {
        let s = self.f(z);
        s * (1. - s)
    }
}

/// Sigmoid-weighted linear unit, `z * sigmoid(z)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silu;

impl Silu {
    pub fn f(&self, z: f32) -> f32 {
        z * Sigmoid.f(z)
    }

    pub fn df(&self, z: f32) -> f32 {
        let s = Sigmoid.f(z);
        s * (1. + z * (1. - s))
    }
}
