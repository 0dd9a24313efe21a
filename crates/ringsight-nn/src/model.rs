//! The heterogeneous GNN: per-type encoders, stacked message-passing layers
//! and output heads.
//!
//! Architecture, per forward pass:
//!
//! ```text
//! raw features --TypeEncoder--> hidden --L x HeteroLayer--> embeddings
//!                                         |
//!   layer: z_t = SelfLin_t(h_t) + mean over relations r with dst=t of Conv_r
//!          h'_t = ReLU(z_t)            (identity on the last layer)
//! ```
//!
//! Heads consume embeddings: [`crate::heads::NodeClassifierHead`] for fraud
//! logits, [`crate::heads::LinkPredictorHead`] for edge logits. Training code
//! drives `forward`, head forward/backward, [`HeteroGnn::backward`] and
//! [`HeteroGnn::apply_grads`] explicitly.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ringsight_core::{EdgeType, HeteroGraph, NodeStore, NodeType};

use crate::conv::{ConvKind, RelConv};
use crate::dense::Dense;
use crate::encoders::TypeEncoder;
use crate::error::{Error, Result};
use crate::heads::{LinkPredictorHead, NodeClassifierHead};
use crate::optim::Adam;

/// A flattened parameter with its shape, for checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTensor {
    /// Dimensions (1 or 2 entries).
    pub shape: Vec<usize>,
    /// Row-major data.
    pub data: Vec<f32>,
}

impl ParamTensor {
    /// Capture a 2-D array.
    pub fn from_array2(a: &Array2<f32>) -> Self {
        Self {
            shape: a.shape().to_vec(),
            data: a.iter().copied().collect(),
        }
    }

    /// Capture a 1-D array.
    pub fn from_array1(a: &Array1<f32>) -> Self {
        Self {
            shape: vec![a.len()],
            data: a.to_vec(),
        }
    }

    /// Rebuild a 2-D array, checking the shape.
    pub fn to_array2(&self, name: &str) -> Result<Array2<f32>> {
        if self.shape.len() != 2 || self.shape[0] * self.shape[1] != self.data.len() {
            return Err(Error::ParamShape {
                name: name.to_string(),
                expected: vec![2],
                got: self.shape.clone(),
            });
        }
        Array2::from_shape_vec((self.shape[0], self.shape[1]), self.data.clone()).map_err(|_| {
            Error::ParamShape {
                name: name.to_string(),
                expected: self.shape.clone(),
                got: vec![self.data.len()],
            }
        })
    }

    /// Rebuild a 1-D array, checking the shape.
    pub fn to_array1(&self, name: &str) -> Result<Array1<f32>> {
        if self.shape.len() != 1 || self.shape[0] != self.data.len() {
            return Err(Error::ParamShape {
                name: name.to_string(),
                expected: vec![1],
                got: self.shape.clone(),
            });
        }
        Ok(Array1::from_vec(self.data.clone()))
    }
}

/// All model parameters, keyed by stable names.
pub type StateDict = BTreeMap<String, ParamTensor>;

/// Node embeddings per type.
pub type Embeddings = BTreeMap<NodeType, Array2<f32>>;

/// What the model needs to know about a graph: input feature dimensions per
/// node type and the set of relations to build convolutions for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Raw feature dimension per node type.
    pub node_dims: BTreeMap<NodeType, usize>,
    /// All relations (including reverses), sorted.
    pub relations: Vec<EdgeType>,
}

impl GraphSchema {
    /// Extract the schema from a graph. Every node type must carry features.
    pub fn of(graph: &HeteroGraph) -> Result<Self> {
        let mut node_dims = BTreeMap::new();
        for node_type in graph.node_types() {
            let store = graph
                .node_store(node_type)
                .ok_or_else(|| Error::MissingNodeType(node_type.clone()))?;
            if store.feature_dim() == 0 {
                return Err(Error::MissingFeatures(node_type.clone()));
            }
            node_dims.insert(node_type.clone(), store.feature_dim());
        }

        let mut relations: Vec<EdgeType> = graph.edge_types().cloned().collect();
        relations.sort();

        Ok(Self {
            node_dims,
            relations,
        })
    }
}

/// Model hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hidden dimension after encoding (default: 64).
    pub hidden_dim: usize,
    /// Embedding dimension produced by the last layer (default: 32).
    pub embed_dim: usize,
    /// Hidden width of the output heads (default: 32).
    pub head_hidden: usize,
    /// Number of message-passing layers (default: 2, minimum 1).
    pub num_layers: usize,
    /// Convolution variant (default: GraphSAGE).
    pub conv: ConvKind,
    /// L2-normalize layer outputs (GraphSAGE option; default: false).
    pub normalize: bool,
    /// LeakyReLU slope for attention scores (default: 0.2).
    pub negative_slope: f32,
    /// Parameter-initialization seed (default: 42).
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 64,
            embed_dim: 32,
            head_hidden: 32,
            num_layers: 2,
            conv: ConvKind::Sage,
            normalize: false,
            negative_slope: 0.2,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Set the hidden dimension.
    pub fn with_hidden_dim(mut self, dim: usize) -> Self {
        self.hidden_dim = dim;
        self
    }

    /// Set the embedding dimension.
    pub fn with_embed_dim(mut self, dim: usize) -> Self {
        self.embed_dim = dim;
        self
    }

    /// Set the number of layers (clamped to at least 1).
    pub fn with_num_layers(mut self, layers: usize) -> Self {
        self.num_layers = layers.max(1);
        self
    }

    /// Set the convolution variant.
    pub fn with_conv(mut self, conv: ConvKind) -> Self {
        self.conv = conv;
        self
    }

    /// Set the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One message-passing layer over all relations.
struct HeteroLayer {
    self_lin: BTreeMap<NodeType, Dense>,
    convs: BTreeMap<EdgeType, RelConv>,
    rel_count: BTreeMap<NodeType, f32>,
    relu: bool,
    normalize: bool,
    relu_masks: BTreeMap<NodeType, Array2<f32>>,
    norm_cache: BTreeMap<NodeType, (Array2<f32>, Array1<f32>)>,
}

type EdgeArrays = BTreeMap<EdgeType, (Vec<usize>, Vec<usize>)>;

impl HeteroLayer {
    fn new(
        schema: &GraphSchema,
        in_dim: usize,
        out_dim: usize,
        config: &ModelConfig,
        relu: bool,
        rng: &mut StdRng,
    ) -> Self {
        let mut self_lin = BTreeMap::new();
        for node_type in schema.node_dims.keys() {
            self_lin.insert(node_type.clone(), Dense::new(in_dim, out_dim, true, rng));
        }

        let mut convs = BTreeMap::new();
        let mut rel_count: BTreeMap<NodeType, f32> = BTreeMap::new();
        for edge_type in &schema.relations {
            convs.insert(
                edge_type.clone(),
                RelConv::new(config.conv, in_dim, out_dim, config.negative_slope, rng),
            );
            *rel_count.entry(edge_type.dst_type.clone()).or_insert(0.0) += 1.0;
        }

        Self {
            self_lin,
            convs,
            rel_count,
            relu,
            normalize: config.normalize,
            relu_masks: BTreeMap::new(),
            norm_cache: BTreeMap::new(),
        }
    }

    fn forward(&mut self, h: &Embeddings, edges: &EdgeArrays) -> Embeddings {
        let mut z: Embeddings = BTreeMap::new();
        for (node_type, lin) in &mut self.self_lin {
            let x = h.get(node_type).expect("layer input covers every type");
            z.insert(node_type.clone(), lin.forward(x));
        }

        static EMPTY: (Vec<usize>, Vec<usize>) = (Vec::new(), Vec::new());
        for (edge_type, conv) in &mut self.convs {
            let (src, dst) = edges.get(edge_type).unwrap_or(&EMPTY);
            let x_src = h.get(&edge_type.src_type).expect("schema covers src type");
            let x_dst = h.get(&edge_type.dst_type).expect("schema covers dst type");
            let message = conv.forward(x_src, x_dst, src, dst, x_dst.nrows());

            let k = self.rel_count[&edge_type.dst_type];
            z.get_mut(&edge_type.dst_type)
                .expect("z covers every type")
                .scaled_add(1.0 / k, &message);
        }

        self.relu_masks.clear();
        self.norm_cache.clear();
        for (node_type, zt) in &mut z {
            if self.relu {
                let mask = zt.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
                *zt *= &mask;
                self.relu_masks.insert(node_type.clone(), mask);
            }
            if self.normalize {
                let norms =
                    Array1::from_iter(zt.outer_iter().map(|r| r.dot(&r).sqrt() + 1e-6));
                for (mut row, &n) in zt.outer_iter_mut().zip(&norms) {
                    row.mapv_inplace(|v| v / n);
                }
                self.norm_cache
                    .insert(node_type.clone(), (zt.clone(), norms));
            }
        }
        z
    }

    fn backward(&mut self, dout: Embeddings) -> Embeddings {
        // Undo normalization, then the activation.
        let mut dz = dout;
        for (node_type, grad) in &mut dz {
            if self.normalize {
                let (y, norms) = &self.norm_cache[node_type];
                for ((mut g_row, y_row), &n) in
                    grad.outer_iter_mut().zip(y.outer_iter()).zip(norms)
                {
                    let dot = y_row.dot(&g_row);
                    for (g, &yv) in g_row.iter_mut().zip(y_row) {
                        *g = (*g - yv * dot) / n;
                    }
                }
            }
            if self.relu {
                *grad *= &self.relu_masks[node_type];
            }
        }

        let mut dh: Embeddings = BTreeMap::new();
        for (edge_type, conv) in &mut self.convs {
            let k = self.rel_count[&edge_type.dst_type];
            let dmessage = dz[&edge_type.dst_type].mapv(|v| v / k);
            let dx_src = conv.backward(&dmessage);
            match dh.get_mut(&edge_type.src_type) {
                Some(acc) => *acc += &dx_src,
                None => {
                    dh.insert(edge_type.src_type.clone(), dx_src);
                }
            }
        }

        for (node_type, lin) in &mut self.self_lin {
            let dx = lin.backward(&dz[node_type]);
            match dh.get_mut(node_type) {
                Some(acc) => *acc += &dx,
                None => {
                    dh.insert(node_type.clone(), dx);
                }
            }
        }
        dh
    }

    fn zero_grad(&mut self) {
        for lin in self.self_lin.values_mut() {
            lin.zero_grad();
        }
        for conv in self.convs.values_mut() {
            conv.zero_grad();
        }
        self.relu_masks.clear();
        self.norm_cache.clear();
    }

    fn apply_grads(&mut self, opt: &mut Adam, prefix: &str) {
        for (node_type, lin) in &mut self.self_lin {
            lin.apply_grads(opt, &format!("{prefix}.self.{node_type}"));
        }
        for (edge_type, conv) in &mut self.convs {
            conv.apply_grads(opt, &format!("{prefix}.conv.{edge_type}"));
        }
    }

    fn export(&self, params: &mut StateDict, prefix: &str) {
        for (node_type, lin) in &self.self_lin {
            lin.export(params, &format!("{prefix}.self.{node_type}"));
        }
        for (edge_type, conv) in &self.convs {
            conv.export(params, &format!("{prefix}.conv.{edge_type}"));
        }
    }

    fn import(&mut self, params: &StateDict, prefix: &str) -> Result<()> {
        for (node_type, lin) in &mut self.self_lin {
            lin.import(params, &format!("{prefix}.self.{node_type}"))?;
        }
        for (edge_type, conv) in &mut self.convs {
            conv.import(params, &format!("{prefix}.conv.{edge_type}"))?;
        }
        Ok(())
    }
}

/// The full heterogeneous GNN.
pub struct HeteroGnn {
    config: ModelConfig,
    schema: GraphSchema,
    encoders: BTreeMap<NodeType, TypeEncoder>,
    layers: Vec<HeteroLayer>,
    node_head: NodeClassifierHead,
    link_head: LinkPredictorHead,
    out_shapes: BTreeMap<NodeType, (usize, usize)>,
}

impl HeteroGnn {
    /// Build a model for a graph schema. Construction is deterministic for a
    /// given `(schema, config)`.
    pub fn new(schema: GraphSchema, config: ModelConfig) -> Self {
        let config = ModelConfig {
            num_layers: config.num_layers.max(1),
            ..config
        };
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut encoders = BTreeMap::new();
        for (node_type, &dim) in &schema.node_dims {
            encoders.insert(
                node_type.clone(),
                TypeEncoder::new(dim, config.hidden_dim, &mut rng),
            );
        }

        let mut layers = Vec::with_capacity(config.num_layers);
        for l in 0..config.num_layers {
            let last = l + 1 == config.num_layers;
            let out_dim = if last { config.embed_dim } else { config.hidden_dim };
            layers.push(HeteroLayer::new(
                &schema,
                config.hidden_dim,
                out_dim,
                &config,
                !last,
                &mut rng,
            ));
        }

        let node_head = NodeClassifierHead::new(config.embed_dim, config.head_hidden, &mut rng);
        let link_head = LinkPredictorHead::new(config.embed_dim, config.head_hidden, &mut rng);

        Self {
            config,
            schema,
            encoders,
            layers,
            node_head,
            link_head,
            out_shapes: BTreeMap::new(),
        }
    }

    /// Model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Graph schema the model was built for.
    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// The node-classification head.
    pub fn node_head_mut(&mut self) -> &mut NodeClassifierHead {
        &mut self.node_head
    }

    /// The link-prediction head.
    pub fn link_head_mut(&mut self) -> &mut LinkPredictorHead {
        &mut self.link_head
    }

    fn features_to_matrix(store: &NodeStore) -> Array2<f32> {
        let n = store.num_nodes();
        let dim = store.feature_dim();
        let mut x = Array2::zeros((n, dim));
        for i in 0..n {
            let row = store.features(i);
            if !row.is_empty() {
                for (j, &v) in row.iter().enumerate() {
                    x[[i, j]] = v;
                }
            }
        }
        x
    }

    fn edge_arrays(&self, graph: &HeteroGraph) -> EdgeArrays {
        let mut edges = BTreeMap::new();
        for edge_type in &self.schema.relations {
            if let Some(store) = graph.edge_store(edge_type) {
                edges.insert(edge_type.clone(), (store.src.clone(), store.dst.clone()));
            }
        }
        edges
    }

    /// Full-graph forward pass producing embeddings per node type.
    pub fn forward(&mut self, graph: &HeteroGraph) -> Result<Embeddings> {
        let mut h: Embeddings = BTreeMap::new();
        for (node_type, &dim) in &self.schema.node_dims {
            let store = graph
                .node_store(node_type)
                .ok_or_else(|| Error::MissingNodeType(node_type.clone()))?;
            if store.feature_dim() != dim {
                return Err(Error::DimMismatch {
                    what: format!("features of {node_type}"),
                    expected: dim,
                    got: store.feature_dim(),
                });
            }
            let x = Self::features_to_matrix(store);
            let encoder = self
                .encoders
                .get_mut(node_type)
                .expect("encoder per schema type");
            h.insert(node_type.clone(), encoder.forward(&x));
        }

        let edges = self.edge_arrays(graph);
        for layer in &mut self.layers {
            h = layer.forward(&h, &edges);
        }

        self.out_shapes = h
            .iter()
            .map(|(t, m)| (t.clone(), (m.nrows(), m.ncols())))
            .collect();
        Ok(h)
    }

    /// Backward pass from embedding gradients.
    ///
    /// Types absent from `grads` are treated as zero-gradient. Must follow a
    /// `forward` call on the same graph.
    pub fn backward(&mut self, mut grads: Embeddings) {
        for (node_type, &(rows, cols)) in &self.out_shapes {
            grads
                .entry(node_type.clone())
                .or_insert_with(|| Array2::zeros((rows, cols)));
        }

        for layer in self.layers.iter_mut().rev() {
            grads = layer.backward(grads);
        }
        for (node_type, encoder) in &mut self.encoders {
            if let Some(grad) = grads.get(node_type) {
                let _ = encoder.backward(grad);
            }
        }
    }

    /// Reset all accumulated gradients.
    pub fn zero_grads(&mut self) {
        for encoder in self.encoders.values_mut() {
            encoder.zero_grad();
        }
        for layer in &mut self.layers {
            layer.zero_grad();
        }
        self.node_head.zero_grad();
        self.link_head.zero_grad();
    }

    /// Apply all accumulated gradients through the optimizer.
    pub fn apply_grads(&mut self, opt: &mut Adam) {
        for (node_type, encoder) in &mut self.encoders {
            encoder.apply_grads(opt, &format!("encoder.{node_type}"));
        }
        for (l, layer) in self.layers.iter_mut().enumerate() {
            layer.apply_grads(opt, &format!("layer{l}"));
        }
        self.node_head.apply_grads(opt, "node_head");
        self.link_head.apply_grads(opt, "link_head");
    }

    /// Export every parameter.
    pub fn state_dict(&self) -> StateDict {
        let mut params = StateDict::new();
        for (node_type, encoder) in &self.encoders {
            encoder.export(&mut params, &format!("encoder.{node_type}"));
        }
        for (l, layer) in self.layers.iter().enumerate() {
            layer.export(&mut params, &format!("layer{l}"));
        }
        self.node_head.export(&mut params, "node_head");
        self.link_head.export(&mut params, "link_head");
        params
    }

    /// Load parameters, checking shapes.
    pub fn load_state_dict(&mut self, params: &StateDict) -> Result<()> {
        for (node_type, encoder) in &mut self.encoders {
            encoder.import(params, &format!("encoder.{node_type}"))?;
        }
        for (l, layer) in self.layers.iter_mut().enumerate() {
            layer.import(params, &format!("layer{l}"))?;
        }
        self.node_head.import(params, "node_head")?;
        self.link_head.import(params, "link_head")
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.state_dict().values().map(|p| p.data.len()).sum()
    }
}
