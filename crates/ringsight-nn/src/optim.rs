//! Adam optimizer with per-parameter state.
//!
//! Reference: Kingma & Ba (2014), "Adam: A Method for Stochastic Optimization".

use std::collections::HashMap;

/// Adam with bias-corrected moment estimates and optional decoupled
/// weight decay (AdamW when `weight_decay > 0`).
///
/// Parameters are addressed by name; state is created lazily on first update.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    weight_decay: f32,
    state: HashMap<String, AdamState>,
}

#[derive(Debug, Clone)]
struct AdamState {
    m: Vec<f32>,
    v: Vec<f32>,
    t: u64,
}

impl Adam {
    /// Create an optimizer with standard betas (0.9, 0.999).
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            state: HashMap::new(),
        }
    }

    /// Enable decoupled weight decay.
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Current learning rate.
    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    /// Update one named parameter in place.
    ///
    /// `param` and `grad` must have the same length; the length must not
    /// change between updates of the same name.
    pub fn update(&mut self, name: &str, param: &mut [f32], grad: &[f32]) {
        debug_assert_eq!(param.len(), grad.len());

        let state = self
            .state
            .entry(name.to_string())
            .or_insert_with(|| AdamState {
                m: vec![0.0; param.len()],
                v: vec![0.0; param.len()],
                t: 0,
            });
        state.t += 1;

        let t = state.t as i32;
        let bias1 = 1.0 - self.beta1.powi(t);
        let bias2 = 1.0 - self.beta2.powi(t);
        let step = self.lr * bias2.sqrt() / bias1;

        for i in 0..param.len() {
            let g = grad[i];
            state.m[i] = self.beta1 * state.m[i] + (1.0 - self.beta1) * g;
            state.v[i] = self.beta2 * state.v[i] + (1.0 - self.beta2) * g * g;
            param[i] -= step * state.m[i] / (state.v[i].sqrt() + self.eps);
            if self.weight_decay > 0.0 {
                param[i] -= self.lr * self.weight_decay * param[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimizes_quadratic() {
        // Minimize (x - 3)^2; gradient is 2(x - 3).
        let mut opt = Adam::new(0.1);
        let mut x = vec![0.0f32];
        for _ in 0..500 {
            let grad = vec![2.0 * (x[0] - 3.0)];
            opt.update("x", &mut x, &grad);
        }
        assert!((x[0] - 3.0).abs() < 1e-2, "x = {}", x[0]);
    }

    #[test]
    fn test_independent_parameters() {
        let mut opt = Adam::new(0.1);
        let mut a = vec![0.0f32];
        let mut b = vec![10.0f32];
        for _ in 0..300 {
            let ga = [2.0 * (a[0] - 1.0)];
            opt.update("a", &mut a, &ga);
            let gb = [2.0 * (b[0] - 2.0)];
            opt.update("b", &mut b, &gb);
        }
        assert!((a[0] - 1.0).abs() < 5e-2);
        assert!((b[0] - 2.0).abs() < 5e-2);
    }

    #[test]
    fn test_weight_decay_shrinks_params() {
        let mut plain = Adam::new(0.01);
        let mut decayed = Adam::new(0.01).with_weight_decay(0.1);
        let mut x1 = vec![1.0f32];
        let mut x2 = vec![1.0f32];
        // Zero gradient: only decay moves the parameter.
        for _ in 0..10 {
            plain.update("x", &mut x1, &[0.0]);
            decayed.update("x", &mut x2, &[0.0]);
        }
        assert!((x1[0] - 1.0).abs() < 1e-6);
        assert!(x2[0] < 1.0);
    }
}
