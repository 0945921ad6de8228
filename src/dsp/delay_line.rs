/// Circular buffer with fractional, linearly interpolated reads
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_position: usize,
}

impl DelayLine {
    /// `capacity` is the longest delay in samples the line can serve
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2) + 1],
            write_position: 0,
        }
    }

    /// Allocate enough room for `seconds` at `sample_rate`
    pub fn with_duration(seconds: f32, sample_rate: u32) -> Self {
        Self::new((seconds.max(0.0) * sample_rate as f32).ceil() as usize + 1)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Read the sample written `delay_samples` ago
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(0.0, (len - 2) as f32);

        let mut read_pos = self.write_position as f32 - delay_samples;
        if read_pos < 0.0 {
            read_pos += len as f32;
        }

        let index = read_pos.floor() as usize;
        let frac = read_pos - index as f32;

        let a = self.buffer[index % len];
        let b = self.buffer[(index + 1) % len];
        a * (1.0 - frac) + b * frac
    }

    /// Read an integer delay of at least one sample
    #[inline]
    pub fn read_whole(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1, len - 1);
        self.buffer[(self.write_position + len - delay) % len]
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_position] = sample;
        self.write_position = (self.write_position + 1) % self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_position = 0;
    }
}
