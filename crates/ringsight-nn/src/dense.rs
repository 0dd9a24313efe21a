//! Dense (fully-connected) layer with explicit forward/backward passes.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::ParamTensor;
use crate::optim::Adam;

/// A linear layer `y = x W + b` with gradient accumulation.
///
/// `forward` caches its input; `backward` consumes the cache, accumulates
/// `dW`/`db` and returns the gradient with respect to the input. Gradients
/// accumulate across calls until [`Dense::zero_grad`].
#[derive(Debug, Clone)]
pub struct Dense {
    w: Array2<f32>,
    b: Option<Array1<f32>>,
    dw: Array2<f32>,
    db: Option<Array1<f32>>,
    cache: Option<Array2<f32>>,
}

impl Dense {
    /// Create a layer with Xavier-uniform initialization.
    pub fn new(in_dim: usize, out_dim: usize, bias: bool, rng: &mut StdRng) -> Self {
        let bound = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let dist = Uniform::new(-bound, bound).expect("finite init bound");
        let w = Array2::from_shape_fn((in_dim, out_dim), |_| dist.sample(rng));

        Self {
            w,
            b: bias.then(|| Array1::zeros(out_dim)),
            dw: Array2::zeros((in_dim, out_dim)),
            db: bias.then(|| Array1::zeros(out_dim)),
            cache: None,
        }
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.w.nrows()
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.w.ncols()
    }

    /// Weight matrix view (tests and attention scoring).
    pub fn weight(&self) -> &Array2<f32> {
        &self.w
    }

    /// Forward pass, caching the input for backward.
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        self.cache = Some(x.clone());
        let mut y = x.dot(&self.w);
        if let Some(b) = &self.b {
            y += b;
        }
        y
    }

    /// Forward pass without caching (inference).
    pub fn infer(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut y = x.dot(&self.w);
        if let Some(b) = &self.b {
            y += b;
        }
        y
    }

    /// Backward pass: accumulate parameter gradients, return input gradient.
    pub fn backward(&mut self, dout: &Array2<f32>) -> Array2<f32> {
        let x = self
            .cache
            .as_ref()
            .expect("Dense::backward called before forward");
        self.dw += &x.t().dot(dout);
        if let Some(db) = &mut self.db {
            *db += &dout.sum_axis(Axis(0));
        }
        dout.dot(&self.w.t())
    }

    /// Reset accumulated gradients.
    pub fn zero_grad(&mut self) {
        self.dw.fill(0.0);
        if let Some(db) = &mut self.db {
            db.fill(0.0);
        }
        self.cache = None;
    }

    /// Apply accumulated gradients through the optimizer.
    pub fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        let w = self
            .w
            .as_slice_mut()
            .expect("weights are stored contiguously");
        let dw = self.dw.as_slice().expect("grads are stored contiguously");
        opt.update(&format!("{prefix}.w"), w, dw);

        if let (Some(b), Some(db)) = (&mut self.b, &self.db) {
            let b = b.as_slice_mut().expect("bias is contiguous");
            let db = db.as_slice().expect("bias grad is contiguous");
            opt.update(&format!("{prefix}.b"), b, db);
        }
    }

    /// Export parameters into a state dict.
    pub fn export(&self, params: &mut BTreeMap<String, ParamTensor>, prefix: &str) {
        params.insert(format!("{prefix}.w"), ParamTensor::from_array2(&self.w));
        if let Some(b) = &self.b {
            params.insert(format!("{prefix}.b"), ParamTensor::from_array1(b));
        }
    }

    /// Import parameters from a state dict, checking shapes.
    pub fn import(&mut self, params: &BTreeMap<String, ParamTensor>, prefix: &str) -> Result<()> {
        let name = format!("{prefix}.w");
        let tensor = params
            .get(&name)
            .ok_or_else(|| Error::MissingParam(name.clone()))?;
        self.w = tensor.to_array2(&name)?;

        if let Some(b) = &mut self.b {
            let name = format!("{prefix}.b");
            let tensor = params
                .get(&name)
                .ok_or_else(|| Error::MissingParam(name.clone()))?;
            *b = tensor.to_array1(&name)?;
        }
        Ok(())
    }
}
