//! Per-type input encoders.
//!
//! Each node type has its own feature schema and dimension; a type encoder
//! maps raw features into the shared hidden space where message passing
//! happens.

use ndarray::Array2;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

use crate::dense::Dense;
use crate::error::Result;
use crate::model::ParamTensor;
use crate::optim::Adam;

/// `relu(x W + b)` from a type's raw feature dimension into the hidden dim.
pub struct TypeEncoder {
    lin: Dense,
    mask: Option<Array2<f32>>,
}

impl TypeEncoder {
    /// Create an encoder for one node type.
    pub fn new(in_dim: usize, hidden_dim: usize, rng: &mut StdRng) -> Self {
        Self {
            lin: Dense::new(in_dim, hidden_dim, true, rng),
            mask: None,
        }
    }

    /// Raw feature dimension this encoder accepts.
    pub fn in_dim(&self) -> usize {
        self.lin.in_dim()
    }

    /// Forward pass with ReLU.
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        let z = self.lin.forward(x);
        let mask = z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let out = &z * &mask;
        self.mask = Some(mask);
        out
    }

    /// Backward pass through ReLU and the linear map.
    pub fn backward(&mut self, dout: &Array2<f32>) -> Array2<f32> {
        let mask = self
            .mask
            .as_ref()
            .expect("TypeEncoder::backward called before forward");
        self.lin.backward(&(dout * mask))
    }

    /// Reset accumulated gradients.
    pub fn zero_grad(&mut self) {
        self.lin.zero_grad();
        self.mask = None;
    }

    /// Apply accumulated gradients.
    pub fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        self.lin.apply_grads(opt, prefix);
    }

    /// Export parameters.
    pub fn export(&self, params: &mut BTreeMap<String, ParamTensor>, prefix: &str) {
        self.lin.export(params, prefix);
    }

    /// Import parameters.
    pub fn import(&mut self, params: &BTreeMap<String, ParamTensor>, prefix: &str) -> Result<()> {
        self.lin.import(params, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_forward_is_nonnegative() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut enc = TypeEncoder::new(4, 8, &mut rng);
        let x = Array2::from_shape_fn((6, 4), |(i, j)| (i as f32 - 3.0) * (j as f32 + 1.0));
        let h = enc.forward(&x);
        assert_eq!(h.shape(), &[6, 8]);
        assert!(h.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_backward_blocks_inactive_units() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut enc = TypeEncoder::new(3, 5, &mut rng);
        let x = Array2::from_shape_fn((2, 3), |(i, j)| i as f32 + j as f32);
        let h = enc.forward(&x);

        let dout = Array2::ones((2, 5));
        let _dx = enc.backward(&dout);

        // Gradient only flows where the unit fired; spot-check via the mask.
        let mask = enc.mask.as_ref().unwrap();
        for (hv, mv) in h.iter().zip(mask.iter()) {
            assert_eq!(*mv > 0.0, *hv > 0.0);
        }
    }
}
