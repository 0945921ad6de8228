use super::types::{NodeCategory, NodePort, Parameter};
use crate::error::ParameterError;

/// Custom node trait for audio processing nodes
///
/// All nodes must be Send so a host may move the whole graph onto its audio thread.
/// Nodes should be real-time safe: no allocations, no blocking operations.
pub trait AudioNode: Send {
    /// Node category
    fn category(&self) -> NodeCategory;

    /// Input port definitions
    fn inputs(&self) -> &[NodePort];

    /// Output port definitions
    fn outputs(&self) -> &[NodePort];

    /// User-facing parameters
    fn parameters(&self) -> &[Parameter];

    /// Set parameter by ID
    ///
    /// Smoothed parameters take the value as their new ramp target. Fails when
    /// the id is not a control of this node or the value is not finite.
    fn set_parameter(&mut self, id: u32, value: f32) -> Result<(), ParameterError>;

    /// Get parameter by ID (the ramp target for smoothed parameters)
    fn get_parameter(&self, id: u32) -> Option<f32>;

    /// Process audio buffers
    ///
    /// # Arguments
    /// * `inputs` - Interleaved stereo buffers for each input port
    /// * `outputs` - Interleaved stereo buffers for each output port
    /// * `sample_rate` - Current sample rate in Hz
    fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], sample_rate: u32);

    /// Reset internal state (clear delays, resonances, etc.) and settle every
    /// smoothed parameter on its target
    fn reset(&mut self);

    /// Get the node type name
    fn node_type(&self) -> &str;

    /// Get a unique identifier for this node instance
    fn name(&self) -> &str;
}
