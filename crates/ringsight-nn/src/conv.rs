//! Per-relation message-passing convolutions.
//!
//! Each relation of the heterogeneous graph gets its own convolution
//! projecting source features and aggregating them at destination nodes:
//!
//! - [`ConvKind::Gcn`]: symmetric degree normalization,
//!   `1/sqrt((d_in+1)(d_out+1))` per edge (Kipf & Welling, 2017)
//! - [`ConvKind::Sage`]: mean over incoming neighbors
//!   (Hamilton et al., 2017)
//! - [`ConvKind::Gat`]: additive attention with per-destination edge
//!   softmax (Velickovic et al., 2018), single head
//!
//! The self/update path lives in the layer, not here; a convolution only
//! computes the neighbor term.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::dense::Dense;
use crate::error::Result;
use crate::model::ParamTensor;
use crate::optim::Adam;

/// Which convolution variant a model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvKind {
    /// Graph Convolutional Network normalization.
    Gcn,
    /// GraphSAGE mean aggregation.
    Sage,
    /// Graph attention, single head.
    Gat,
}

impl fmt::Display for ConvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConvKind::Gcn => "gcn",
            ConvKind::Sage => "sage",
            ConvKind::Gat => "gat",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ConvKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "gcn" => Ok(ConvKind::Gcn),
            "sage" | "graphsage" => Ok(ConvKind::Sage),
            "gat" => Ok(ConvKind::Gat),
            other => Err(format!("unknown conv kind: {other:?}")),
        }
    }
}

struct ConvCache {
    src: Vec<usize>,
    dst: Vec<usize>,
    coefs: Vec<f32>,
    num_src: usize,
}

/// One relation's convolution: project source features, aggregate at
/// destinations with kind-specific edge coefficients.
pub struct RelConv {
    kind: ConvKind,
    lin: Dense,
    att_src: Array1<f32>,
    att_dst: Array1<f32>,
    negative_slope: f32,
    cache: Option<ConvCache>,
}

impl RelConv {
    /// Create a convolution. Attention vectors are allocated for every kind
    /// so construction consumes the RNG identically regardless of `kind`.
    pub fn new(
        kind: ConvKind,
        in_dim: usize,
        out_dim: usize,
        negative_slope: f32,
        rng: &mut StdRng,
    ) -> Self {
        let lin = Dense::new(in_dim, out_dim, false, rng);
        let bound = (6.0 / (out_dim + 1) as f32).sqrt();
        let dist = Uniform::new(-bound, bound).expect("finite init bound");
        let att_src = Array1::from_shape_fn(out_dim, |_| dist.sample(rng));
        let att_dst = Array1::from_shape_fn(out_dim, |_| dist.sample(rng));

        Self {
            kind,
            lin,
            att_src,
            att_dst,
            negative_slope,
            cache: None,
        }
    }

    fn leaky(&self, x: f32) -> f32 {
        if x > 0.0 {
            x
        } else {
            self.negative_slope * x
        }
    }

    /// Per-edge aggregation coefficients.
    fn edge_coefs(
        &self,
        projected: &Array2<f32>,
        x_dst: &Array2<f32>,
        src: &[usize],
        dst: &[usize],
        num_dst: usize,
    ) -> Vec<f32> {
        let num_edges = src.len();
        match self.kind {
            ConvKind::Gcn => {
                let mut deg_out = vec![0usize; projected.nrows()];
                let mut deg_in = vec![0usize; num_dst];
                for (&s, &d) in src.iter().zip(dst) {
                    deg_out[s] += 1;
                    deg_in[d] += 1;
                }
                src.iter()
                    .zip(dst)
                    .map(|(&s, &d)| {
                        1.0 / (((deg_in[d] + 1) * (deg_out[s] + 1)) as f32).sqrt()
                    })
                    .collect()
            }
            ConvKind::Sage => {
                let mut deg_in = vec![0usize; num_dst];
                for &d in dst {
                    deg_in[d] += 1;
                }
                dst.iter().map(|&d| 1.0 / deg_in[d] as f32).collect()
            }
            ConvKind::Gat => {
                // Additive attention: e = LeakyReLU(a_src . (W x_s) + a_dst . (W x_d)),
                // softmax over each destination's incoming edges.
                let q = x_dst.dot(self.lin.weight());
                let scores: Vec<f32> = src
                    .iter()
                    .zip(dst)
                    .map(|(&s, &d)| {
                        self.leaky(projected.row(s).dot(&self.att_src) + q.row(d).dot(&self.att_dst))
                    })
                    .collect();

                let mut max = vec![f32::NEG_INFINITY; num_dst];
                for (e, &d) in dst.iter().enumerate() {
                    max[d] = max[d].max(scores[e]);
                }
                let exps: Vec<f32> = scores
                    .iter()
                    .zip(dst)
                    .map(|(&e, &d)| (e - max[d]).exp())
                    .collect();
                let mut sums = vec![0.0f32; num_dst];
                for (e, &d) in dst.iter().enumerate() {
                    sums[d] += exps[e];
                }
                (0..num_edges).map(|e| exps[e] / sums[dst[e]]).collect()
            }
        }
    }

    /// Forward pass.
    ///
    /// `x_src`/`x_dst` are the current embeddings of the relation's source
    /// and destination types; `src`/`dst` are the COO edge indices. Returns
    /// the aggregated messages, shape `(num_dst, out_dim)`.
    pub fn forward(
        &mut self,
        x_src: &Array2<f32>,
        x_dst: &Array2<f32>,
        src: &[usize],
        dst: &[usize],
        num_dst: usize,
    ) -> Array2<f32> {
        let projected = self.lin.forward(x_src);
        let coefs = self.edge_coefs(&projected, x_dst, src, dst, num_dst);

        let mut out = Array2::zeros((num_dst, projected.ncols()));
        for ((&s, &d), &coef) in src.iter().zip(dst).zip(&coefs) {
            out.row_mut(d).scaled_add(coef, &projected.row(s));
        }

        self.cache = Some(ConvCache {
            src: src.to_vec(),
            dst: dst.to_vec(),
            coefs,
            num_src: x_src.nrows(),
        });
        out
    }

    /// Backward pass: returns the gradient w.r.t. `x_src`.
    ///
    /// Attention coefficients are held fixed here; only the value path
    /// carries gradient, so `att_src`/`att_dst` keep their initial values.
    pub fn backward(&mut self, dout: &Array2<f32>) -> Array2<f32> {
        let cache = self
            .cache
            .as_ref()
            .expect("RelConv::backward called before forward");

        let mut dprojected = Array2::zeros((cache.num_src, dout.ncols()));
        for ((&s, &d), &coef) in cache.src.iter().zip(&cache.dst).zip(&cache.coefs) {
            dprojected.row_mut(s).scaled_add(coef, &dout.row(d));
        }
        self.lin.backward(&dprojected)
    }

    /// Reset accumulated gradients.
    pub fn zero_grad(&mut self) {
        self.lin.zero_grad();
        self.cache = None;
    }

    /// Apply accumulated gradients.
    pub fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        self.lin.apply_grads(opt, prefix);
    }

    /// Export parameters.
    pub fn export(&self, params: &mut BTreeMap<String, ParamTensor>, prefix: &str) {
        self.lin.export(params, prefix);
        params.insert(
            format!("{prefix}.att_src"),
            ParamTensor::from_array1(&self.att_src),
        );
        params.insert(
            format!("{prefix}.att_dst"),
            ParamTensor::from_array1(&self.att_dst),
        );
    }

    /// Import parameters.
    pub fn import(&mut self, params: &BTreeMap<String, ParamTensor>, prefix: &str) -> Result<()> {
        self.lin.import(params, prefix)?;
        if let Some(t) = params.get(&format!("{prefix}.att_src")) {
            self.att_src = t.to_array1(&format!("{prefix}.att_src"))?;
        }
        if let Some(t) = params.get(&format!("{prefix}.att_dst")) {
            self.att_dst = t.to_array1(&format!("{prefix}.att_dst"))?;
        }
        Ok(())
    }
}
