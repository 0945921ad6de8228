use zone_fx::audio::node_graph::{
    nodes::{gain, GainNode, MasterOutputNode, TestToneNode},
    AudioGraph, ConnectionError,
};
use zone_fx::dsp::WaveShape;

#[test]
fn test_basic_node_graph() {
    let mut graph = AudioGraph::new(48000, 512);

    let tone_idx = graph.add_node(Box::new(TestToneNode::new("Tone", 440.0, 0.5, WaveShape::Sine)));
    let gain_idx = graph.add_node(Box::new(GainNode::new("Gain")));
    let output_idx = graph.add_node(Box::new(MasterOutputNode::new("Output")));

    // Tone -> Gain -> Output
    assert!(graph.connect(tone_idx, 0, gain_idx, 0).is_ok());
    assert!(graph.connect(gain_idx, 0, output_idx, 0).is_ok());
    graph.set_output_node(Some(output_idx));

    let mut output_buffer = vec![0.0f32; 1024];
    graph.process(&mut output_buffer);

    assert!(output_buffer.iter().any(|&s| s != 0.0), "Expected audio from the test tone");
    let max_amplitude = output_buffer.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    assert!(max_amplitude <= 0.5 + 1.0e-6, "Output amplitude too high: {}", max_amplitude);
}

#[test]
fn test_cycles_are_rejected() {
    let mut graph = AudioGraph::new(48000, 64);

    let a = graph.add_node(Box::new(GainNode::new("A")));
    let b = graph.add_node(Box::new(GainNode::new("B")));
    let c = graph.add_node(Box::new(GainNode::new("C")));

    graph.connect(a, 0, b, 0).unwrap();
    graph.connect(b, 0, c, 0).unwrap();

    assert_eq!(graph.connect(c, 0, a, 0), Err(ConnectionError::WouldCreateCycle));
    assert_eq!(graph.connect(a, 0, a, 0), Err(ConnectionError::WouldCreateCycle));
    assert_eq!(graph.connection_count(), 2);
}

#[test]
fn test_invalid_ports_and_nodes() {
    let mut graph = AudioGraph::new(48000, 64);

    let tone = graph.add_node(Box::new(TestToneNode::new("Tone", 220.0, 0.5, WaveShape::Square)));
    let gain_idx = graph.add_node(Box::new(GainNode::new("Gain")));

    // The tone has no inputs, the gain has a single output
    assert_eq!(graph.connect(gain_idx, 0, tone, 0), Err(ConnectionError::InvalidPort));
    assert_eq!(graph.connect(gain_idx, 1, tone, 0), Err(ConnectionError::InvalidPort));

    let removed = graph.add_node(Box::new(GainNode::new("Removed")));
    assert!(graph.remove_node(removed).is_some());
    assert_eq!(graph.connect(tone, 0, removed, 0), Err(ConnectionError::UnknownNode));
}

#[test]
fn test_duplicate_connection_is_idempotent() {
    let mut graph = AudioGraph::new(48000, 64);
    let a = graph.add_node(Box::new(GainNode::new("A")));
    let b = graph.add_node(Box::new(GainNode::new("B")));

    graph.connect(a, 0, b, 0).unwrap();
    graph.connect(a, 0, b, 0).unwrap();
    assert_eq!(graph.connection_count(), 1);

    assert!(graph.disconnect(a, 0, b, 0));
    assert!(!graph.disconnect(a, 0, b, 0));
    assert!(!graph.is_connected(a, b));
}

#[test]
fn test_inputs_are_summed() {
    let mut graph = AudioGraph::new(48000, 256);

    let left = graph.add_node(Box::new(TestToneNode::new("L", 100.0, 0.25, WaveShape::Square)));
    let right = graph.add_node(Box::new(TestToneNode::new("R", 100.0, 0.25, WaveShape::Square)));
    let output_idx = graph.add_node(Box::new(MasterOutputNode::new("Output")));
    graph.connect(left, 0, output_idx, 0).unwrap();
    graph.connect(right, 0, output_idx, 0).unwrap();
    graph.set_output_node(Some(output_idx));

    let mut output_buffer = vec![0.0f32; 512];
    graph.process(&mut output_buffer);

    // Two identical square waves in phase add up to twice the level
    assert!((output_buffer[0].abs() - 0.5).abs() < 1.0e-6);
}

#[test]
fn test_silent_send_gain_blocks_signal() {
    let mut graph = AudioGraph::new(48000, 256);

    let tone = graph.add_node(Box::new(TestToneNode::new("Tone", 440.0, 0.5, WaveShape::Sine)));
    let send = graph.add_node(Box::new(GainNode::with_gain("Send", 0.0)));
    let output_idx = graph.add_node(Box::new(MasterOutputNode::new("Output")));
    graph.connect(tone, 0, send, 0).unwrap();
    graph.connect(send, 0, output_idx, 0).unwrap();
    graph.set_output_node(Some(output_idx));

    let mut output_buffer = vec![0.0f32; 2048];
    graph.render(&mut output_buffer);
    assert!(output_buffer.iter().all(|&s| s == 0.0));

    // Raising the send ramps in rather than stepping
    graph.get_node_mut(send).unwrap().set_parameter(gain::PARAM_GAIN, 1.0).unwrap();
    graph.render(&mut output_buffer);
    assert!(output_buffer[1].abs() < 0.01);
    assert!(output_buffer.iter().any(|s| s.abs() > 0.1));
}
