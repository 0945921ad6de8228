use super::node_trait::AudioNode;
use super::types::ConnectionError;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

/// Connection information between nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from_port: usize,
    pub to_port: usize,
}

/// Wrapper for audio nodes in the graph
pub struct GraphNode {
    pub node: Box<dyn AudioNode>,
    /// Buffers for each output port (interleaved stereo)
    pub output_buffers: Vec<Vec<f32>>,
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("node", &self.node.name())
            .field("output_buffers_len", &self.output_buffers.len())
            .finish()
    }
}

impl GraphNode {
    pub fn new(node: Box<dyn AudioNode>, buffer_size: usize) -> Self {
        let output_buffers = node
            .outputs()
            .iter()
            .map(|_| vec![0.0; buffer_size * 2])
            .collect();

        Self { node, output_buffers }
    }
}

/// Pull-based audio graph
///
/// Nodes are processed in topological order once per block; every input port
/// receives the sum of all outputs connected to it.
#[derive(Debug)]
pub struct AudioGraph {
    /// The audio graph (StableGraph allows node removal without index invalidation)
    graph: StableGraph<GraphNode, Connection>,

    /// Node whose first output is mixed into the caller's buffer
    output_node: Option<NodeIndex>,

    sample_rate: u32,

    /// Frames per processing block
    buffer_size: usize,

    /// Temporary buffers for node inputs during processing
    input_buffers: Vec<Vec<f32>>,
}

impl AudioGraph {
    /// Create a new empty audio graph
    pub fn new(sample_rate: u32, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            graph: StableGraph::new(),
            output_node: None,
            sample_rate,
            buffer_size,
            input_buffers: vec![vec![0.0; buffer_size * 2]; 4],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Box<dyn AudioNode>) -> NodeIndex {
        let inputs = node.inputs().len();
        if inputs > self.input_buffers.len() {
            self.input_buffers.resize(inputs, vec![0.0; self.buffer_size * 2]);
        }
        let graph_node = GraphNode::new(node, self.buffer_size);
        self.graph.add_node(graph_node)
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of connections in the graph
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.graph.contains_node(node)
    }

    /// Connect two nodes
    pub fn connect(
        &mut self,
        from: NodeIndex,
        from_port: usize,
        to: NodeIndex,
        to_port: usize,
    ) -> Result<(), ConnectionError> {
        // Check if this exact connection already exists
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|e| e.weight().from_port == from_port && e.weight().to_port == to_port);
        if exists {
            return Ok(());
        }

        self.validate_connection(from, from_port, to, to_port)?;
        self.graph.add_edge(from, to, Connection { from_port, to_port });

        Ok(())
    }

    /// Disconnect two nodes. Returns whether a connection was removed.
    pub fn disconnect(&mut self, from: NodeIndex, from_port: usize, to: NodeIndex, to_port: usize) -> bool {
        let edge = self
            .graph
            .edges_connecting(from, to)
            .find(|e| e.weight().from_port == from_port && e.weight().to_port == to_port)
            .map(|e| e.id());

        match edge {
            Some(edge_idx) => self.graph.remove_edge(edge_idx).is_some(),
            None => false,
        }
    }

    /// Whether any connection runs from `from` to `to`
    pub fn is_connected(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.find_edge(from, to).is_some()
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, node: NodeIndex) -> Option<Box<dyn AudioNode>> {
        if self.output_node == Some(node) {
            self.output_node = None;
        }
        self.graph.remove_node(node).map(|n| n.node)
    }

    /// Validate ports exist and the connection wouldn't create a cycle
    fn validate_connection(
        &self,
        from: NodeIndex,
        from_port: usize,
        to: NodeIndex,
        to_port: usize,
    ) -> Result<(), ConnectionError> {
        let from_node = self.graph.node_weight(from).ok_or(ConnectionError::UnknownNode)?;
        let to_node = self.graph.node_weight(to).ok_or(ConnectionError::UnknownNode)?;

        if from_port >= from_node.node.outputs().len() || to_port >= to_node.node.inputs().len() {
            return Err(ConnectionError::InvalidPort);
        }

        // If there's already a path from 'to' to 'from', adding 'from' -> 'to' closes a loop
        if from == to || has_path_connecting(&self.graph, to, from, None) {
            return Err(ConnectionError::WouldCreateCycle);
        }

        Ok(())
    }

    /// Set the output node (where final audio is read from)
    pub fn set_output_node(&mut self, node: Option<NodeIndex>) {
        self.output_node = node;
    }

    pub fn output_node(&self) -> Option<NodeIndex> {
        self.output_node
    }

    /// Process one block and mix the output node into `output_buffer`
    ///
    /// `output_buffer` is interleaved stereo; anything beyond one block
    /// (`buffer_size` frames) is left untouched.
    pub fn process(&mut self, output_buffer: &mut [f32]) {
        let process_size = output_buffer.len().min(self.buffer_size * 2);

        for node in self.graph.node_weights_mut() {
            for buffer in &mut node.output_buffers {
                buffer[..process_size].fill(0.0);
            }
        }

        let topo = petgraph::algo::toposort(&self.graph, None).unwrap_or_else(|_| {
            // Unreachable through connect(), which rejects cycles
            self.graph.node_indices().collect()
        });

        for node_idx in topo {
            let num_inputs = self.graph[node_idx].node.inputs().len();

            for buffer in self.input_buffers.iter_mut().take(num_inputs) {
                buffer[..process_size].fill(0.0);
            }

            // Sum connected outputs into each input port
            for edge in self.graph.edges_directed(node_idx, Direction::Incoming) {
                let conn = edge.weight();
                let source_node = &self.graph[edge.source()];
                if conn.to_port >= num_inputs || conn.from_port >= source_node.output_buffers.len() {
                    continue;
                }
                let source_buffer = &source_node.output_buffers[conn.from_port][..process_size];
                for (dst, src) in self.input_buffers[conn.to_port].iter_mut().zip(source_buffer) {
                    *dst += src;
                }
            }

            let input_slices: Vec<&[f32]> = self
                .input_buffers
                .iter()
                .take(num_inputs)
                .map(|b| &b[..process_size])
                .collect();

            let node = &mut self.graph[node_idx];
            let mut output_slices: Vec<&mut [f32]> = node
                .output_buffers
                .iter_mut()
                .map(|b| &mut b[..process_size])
                .collect();

            node.node.process(&input_slices, &mut output_slices, self.sample_rate);
        }

        if let Some(output_node) = self.output_node.and_then(|idx| self.graph.node_weight(idx)) {
            if let Some(buffer) = output_node.output_buffers.first() {
                for (out, sample) in output_buffer[..process_size].iter_mut().zip(buffer) {
                    *out += sample;
                }
            }
        }
    }

    /// Render any number of frames block by block, overwriting `output_buffer`
    pub fn render(&mut self, output_buffer: &mut [f32]) {
        output_buffer.fill(0.0);
        let block = self.buffer_size * 2;
        for chunk in output_buffer.chunks_mut(block) {
            self.process(chunk);
        }
    }

    /// Get node by index
    pub fn get_node(&self, idx: NodeIndex) -> Option<&dyn AudioNode> {
        self.graph.node_weight(idx).map(|n| &*n.node)
    }

    /// Get node mutably by index
    pub fn get_node_mut(&mut self, idx: NodeIndex) -> Option<&mut (dyn AudioNode + 'static)> {
        self.graph.node_weight_mut(idx).map(|n| n.node.as_mut())
    }

    /// Get all node indices
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Connection)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Reset all nodes in the graph
    pub fn reset(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.node.reset();
        }
    }
}
