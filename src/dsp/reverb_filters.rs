/// Feedback comb with a one-pole lowpass in the loop (Freeverb style)
#[derive(Debug, Clone)]
pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    filter_store: f32,
    damp: f32,
    feedback: f32,
}

impl CombFilter {
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            write_pos: 0,
            filter_store: 0.0,
            damp: 0.0,
            feedback: 0.5,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        self.filter_store = output * (1.0 - self.damp) + self.filter_store * self.damp;
        self.buffer[self.write_pos] = input + self.filter_store * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Lowpass amount in the loop, 0 = no damping
    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 0.99);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.filter_store = 0.0;
        self.write_pos = 0;
    }
}

/// Schroeder all-pass diffuser
#[derive(Debug, Clone)]
pub struct AllPassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllPassFilter {
    pub fn new(size: usize, feedback: f32) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            write_pos: 0,
            feedback,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let v = input + delayed * self.feedback;
        let output = -v * self.feedback + delayed;

        self.buffer[self.write_pos] = v;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn mute(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Scale a delay length tuned at 44.1 kHz to another rate
pub fn scale_delay(samples_at_44k: usize, sample_rate: u32) -> usize {
    ((samples_at_44k as f64 * sample_rate as f64 / 44100.0).round() as usize).max(1)
}
