//! Output heads: node classification and link prediction.

use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use std::collections::BTreeMap;

use crate::dense::Dense;
use crate::error::Result;
use crate::model::ParamTensor;
use crate::optim::Adam;

/// Two-layer MLP producing fraud/legitimate logits from node embeddings.
pub struct NodeClassifierHead {
    lin1: Dense,
    lin2: Dense,
    mask: Option<Array2<f32>>,
}

impl NodeClassifierHead {
    /// Create a head: `embed_dim -> hidden -> 2`.
    pub fn new(embed_dim: usize, hidden: usize, rng: &mut StdRng) -> Self {
        Self {
            lin1: Dense::new(embed_dim, hidden, true, rng),
            lin2: Dense::new(hidden, 2, true, rng),
            mask: None,
        }
    }

    /// Logits for a batch of embeddings, shape `(m, 2)`.
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        let z = self.lin1.forward(x);
        let mask = z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let a = &z * &mask;
        self.mask = Some(mask);
        self.lin2.forward(&a)
    }

    /// Backward from logit gradients to embedding gradients.
    pub fn backward(&mut self, dlogits: &Array2<f32>) -> Array2<f32> {
        let da = self.lin2.backward(dlogits);
        let mask = self
            .mask
            .as_ref()
            .expect("NodeClassifierHead::backward called before forward");
        self.lin1.backward(&(&da * mask))
    }

    /// Reset accumulated gradients.
    pub fn zero_grad(&mut self) {
        self.lin1.zero_grad();
        self.lin2.zero_grad();
        self.mask = None;
    }

    /// Apply accumulated gradients.
    pub fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        self.lin1.apply_grads(opt, &format!("{prefix}.lin1"));
        self.lin2.apply_grads(opt, &format!("{prefix}.lin2"));
    }

    /// Export parameters.
    pub fn export(&self, params: &mut BTreeMap<String, ParamTensor>, prefix: &str) {
        self.lin1.export(params, &format!("{prefix}.lin1"));
        self.lin2.export(params, &format!("{prefix}.lin2"));
    }

    /// Import parameters.
    pub fn import(&mut self, params: &BTreeMap<String, ParamTensor>, prefix: &str) -> Result<()> {
        self.lin1.import(params, &format!("{prefix}.lin1"))?;
        self.lin2.import(params, &format!("{prefix}.lin2"))
    }
}

/// MLP over concatenated endpoint embeddings, producing one edge logit.
pub struct LinkPredictorHead {
    lin1: Dense,
    lin2: Dense,
    mask: Option<Array2<f32>>,
}

impl LinkPredictorHead {
    /// Create a head: `2 * embed_dim -> hidden -> 1`.
    pub fn new(embed_dim: usize, hidden: usize, rng: &mut StdRng) -> Self {
        Self {
            lin1: Dense::new(2 * embed_dim, hidden, true, rng),
            lin2: Dense::new(hidden, 1, true, rng),
            mask: None,
        }
    }

    /// Edge logits for a batch of (src, dst) embedding rows, shape `(m,)`.
    pub fn forward_pairs(&mut self, h_src: &Array2<f32>, h_dst: &Array2<f32>) -> Array1<f32> {
        let x = ndarray::concatenate(Axis(1), &[h_src.view(), h_dst.view()])
            .expect("pair batches have equal row counts");
        let z = self.lin1.forward(&x);
        let mask = z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let a = &z * &mask;
        self.mask = Some(mask);
        self.lin2.forward(&a).index_axis_move(Axis(1), 0)
    }

    /// Backward from edge-logit gradients to (src, dst) embedding gradients.
    pub fn backward(&mut self, dlogits: &Array1<f32>) -> (Array2<f32>, Array2<f32>) {
        let m = dlogits.len();
        let dlogits2 = dlogits.view().into_shape_with_order((m, 1)).expect("column vector");
        let da = self.lin2.backward(&dlogits2.to_owned());
        let mask = self
            .mask
            .as_ref()
            .expect("LinkPredictorHead::backward called before forward");
        let dx = self.lin1.backward(&(&da * mask));

        let embed = dx.ncols() / 2;
        let dsrc = dx.slice(s![.., ..embed]).to_owned();
        let ddst = dx.slice(s![.., embed..]).to_owned();
        (dsrc, ddst)
    }

    /// Reset accumulated gradients.
    pub fn zero_grad(&mut self) {
        self.lin1.zero_grad();
        self.lin2.zero_grad();
        self.mask = None;
    }

    /// Apply accumulated gradients.
    pub fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        self.lin1.apply_grads(opt, &format!("{prefix}.lin1"));
        self.lin2.apply_grads(opt, &format!("{prefix}.lin2"));
    }

    /// Export parameters.
    pub fn export(&self, params: &mut BTreeMap<String, ParamTensor>, prefix: &str) {
        self.lin1.export(params, &format!("{prefix}.lin1"));
        self.lin2.export(params, &format!("{prefix}.lin2"));
    }

    /// Import parameters.
    pub fn import(&mut self, params: &BTreeMap<String, ParamTensor>, prefix: &str) -> Result<()> {
        self.lin1.import(params, &format!("{prefix}.lin1"))?;
        self.lin2.import(params, &format!("{prefix}.lin2"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_classifier_shapes() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut head = NodeClassifierHead::new(8, 16, &mut rng);
        let x = Array2::from_shape_fn((5, 8), |(i, j)| (i * j) as f32 * 0.01);
        let logits = head.forward(&x);
        assert_eq!(logits.shape(), &[5, 2]);

        let dx = head.backward(&Array2::ones((5, 2)));
        assert_eq!(dx.shape(), &[5, 8]);
    }

    #[test]
    fn test_link_head_shapes() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut head = LinkPredictorHead::new(8, 16, &mut rng);
        let h_src = Array2::from_shape_fn((4, 8), |(i, j)| (i + j) as f32 * 0.1);
        let h_dst = Array2::from_shape_fn((4, 8), |(i, j)| (i as f32 - j as f32) * 0.1);

        let logits = head.forward_pairs(&h_src, &h_dst);
        assert_eq!(logits.len(), 4);

        let (dsrc, ddst) = head.backward(&Array1::ones(4));
        assert_eq!(dsrc.shape(), &[4, 8]);
        assert_eq!(ddst.shape(), &[4, 8]);
    }

    #[test]
    fn test_link_head_is_asymmetric() {
        // Swapping endpoints should generally change the logit: the head
        // models directed relations.
        let mut rng = StdRng::seed_from_u64(23);
        let mut head = LinkPredictorHead::new(4, 8, &mut rng);
        let a = Array2::from_shape_vec((1, 4), vec![1.0, 0.0, 0.5, -0.5]).unwrap();
        let b = Array2::from_shape_vec((1, 4), vec![-1.0, 2.0, 0.0, 0.3]).unwrap();

        let ab = head.forward_pairs(&a, &b)[0];
        let ba = head.forward_pairs(&b, &a)[0];
        assert!((ab - ba).abs() > 1e-6);
    }
}
