// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output gain control.

/// A single scalar applied to the output signal
pub trait GainControl {
    /// Current multiplier
    fn gain(&self) -> f32;
    /// Set the multiplier
    fn set_gain(&mut self, value: f32);
}

/// Gain stage with an upper bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainNode {
    value: f32,
    max: f32,
}

impl GainNode {
    /// Create a unity-gain node bounded by `max`
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            value: 1.0_f32.min(max),
            max,
        }
    }

    /// Upper bound of the multiplier
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Apply the gain to a block of samples
    pub fn process(&self, samples: &mut [f32]) {
        for sample in samples {
            *sample *= self.value;
        }
    }
}

impl Default for GainNode {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl GainControl for GainNode {
    fn gain(&self) -> f32 {
        self.value
    }

    fn set_gain(&mut self, value: f32) {
        self.value = if value.is_nan() { 0.0 } else { value.clamp(0.0, self.max) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_clamped() {
        let mut node = GainNode::new(2.0);
        assert_eq!(node.gain(), 1.0);

        node.set_gain(3.5);
        assert_eq!(node.gain(), 2.0);
        node.set_gain(-1.0);
        assert_eq!(node.gain(), 0.0);
        node.set_gain(f32::NAN);
        assert_eq!(node.gain(), 0.0);
    }

    #[test]
    fn test_process_scales_samples() {
        let mut node = GainNode::default();
        node.set_gain(0.5);
        let mut block = [1.0, -0.5, 0.25];
        node.process(&mut block);
        assert_eq!(block, [0.5, -0.25, 0.125]);
    }
}
