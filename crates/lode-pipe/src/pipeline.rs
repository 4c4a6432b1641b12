use lode_types::Metadata;

use crate::error::PipeResult;
use crate::transformer::Transformer;

/// An ordered sequence of transformer stages.
///
/// `forward` runs the stages in configured order on write; `inverse` runs
/// them in exactly reversed order on read. Two pipelines with the same
/// stages in different order are different pipelines: a content-mutating
/// stage must keep its position across all revisions of a box to remain
/// invertible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Transformer>,
}

impl Pipeline {
    /// A pipeline with the given stages, applied in order on write.
    pub fn new(stages: Vec<Transformer>) -> Self {
        Self { stages }
    }

    /// An empty pipeline (bytes pass through untouched).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard pipeline: checksum, then statistics.
    pub fn standard() -> Self {
        Self::new(vec![Transformer::checksum(), Transformer::statistics()])
    }

    /// The configured stages, in write order.
    pub fn stages(&self) -> &[Transformer] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run all stages forward over the bytes (write path).
    pub fn forward(&self, mut bytes: Vec<u8>, meta: &mut Metadata) -> PipeResult<Vec<u8>> {
        for stage in &self.stages {
            bytes = stage.forward(bytes, meta)?;
        }
        Ok(bytes)
    }

    /// Run all stages inverse over the bytes, in reversed order (read path).
    pub fn inverse(&self, mut bytes: Vec<u8>, meta: &Metadata) -> PipeResult<Vec<u8>> {
        for stage in self.stages.iter().rev() {
            bytes = stage.inverse(bytes, meta)?;
        }
        Ok(bytes)
    }
}
