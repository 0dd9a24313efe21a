//! Model checkpoints.
//!
//! A checkpoint carries everything needed to rebuild the trained model:
//! hyperparameters, the graph schema it was built for, and all parameters.
//! Stored as JSON; a round trip restores a model producing identical outputs.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ringsight_nn::{GraphSchema, HeteroGnn, ModelConfig, StateDict};

use crate::error::Result;
use crate::training::TaskKind;

/// A serializable snapshot of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Task the model was trained for.
    pub task: TaskKind,
    /// Model hyperparameters.
    pub config: ModelConfig,
    /// Graph schema the model was built for.
    pub schema: GraphSchema,
    /// All model parameters.
    pub params: StateDict,
    /// Epoch the snapshot was taken at.
    pub epoch: usize,
    /// Selection metric at that epoch.
    pub metric: f32,
}

impl Checkpoint {
    /// Snapshot a model's current weights.
    pub fn capture(model: &HeteroGnn, task: TaskKind, epoch: usize, metric: f32) -> Self {
        Self {
            task,
            config: model.config().clone(),
            schema: model.schema().clone(),
            params: model.state_dict(),
            epoch,
            metric,
        }
    }

    /// Write the checkpoint as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Read a checkpoint from JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let checkpoint = serde_json::from_reader(BufReader::new(file))?;
        Ok(checkpoint)
    }

    /// Rebuild the model this checkpoint was taken from.
    pub fn build_model(&self) -> Result<HeteroGnn> {
        let mut model = HeteroGnn::new(self.schema.clone(), self.config.clone());
        model.load_state_dict(&self.params)?;
        Ok(model)
    }
}
