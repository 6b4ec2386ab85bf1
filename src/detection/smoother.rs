use std::collections::VecDeque;

/// Moving average over the most recent shoulder-tilt angles (radians).
#[derive(Debug, Clone)]
pub struct ShoulderSmoother {
    window: usize,
    angles: VecDeque<f64>,
}

impl ShoulderSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            angles: VecDeque::with_capacity(window),
        }
    }

    /// Push a new sample, evicting the oldest past the window, and return
    /// the smoothed angle in degrees.
    pub fn push(&mut self, angle_radians: f64) -> f64 {
        self.angles.push_back(angle_radians);
        while self.angles.len() > self.window {
            self.angles.pop_front();
        }
        self.mean_degrees().unwrap_or_default()
    }

    pub fn mean_degrees(&self) -> Option<f64> {
        if self.angles.is_empty() {
            return None;
        }
        let mean = self.angles.iter().sum::<f64>() / self.angles.len() as f64;
        Some(mean.to_degrees())
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn clear(&mut self) {
        self.angles.clear();
    }
}

/// Tilt of the line from the left to the right shoulder, in radians.
pub fn shoulder_angle(left: (f64, f64), right: (f64, f64)) -> f64 {
    let dx = right.0 - left.0;
    let dy = right.1 - left.1;
    dy.atan2(dx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn keeps_only_the_last_window_samples() {
        let mut smoother = ShoulderSmoother::new(10);
        for _ in 0..10 {
            smoother.push(0.0);
        }
        assert!(close(smoother.mean_degrees().unwrap(), 0.0));

        // 11th sample evicts the first zero
        let tilt = 10f64.to_radians();
        let after_eleven = smoother.push(tilt);
        assert!(close(after_eleven, 1.0));

        for _ in 0..4 {
            smoother.push(tilt);
        }
        assert_eq!(smoother.len(), 10);
        // 15 samples pushed: last 10 are 5 zeros + 5 tilts
        assert!(close(smoother.mean_degrees().unwrap(), 5.0));
    }

    #[test]
    fn window_fully_replaced_after_enough_samples() {
        let mut smoother = ShoulderSmoother::new(3);
        for angle in [1.0, 1.0, 1.0, -0.5, -0.5, -0.5] {
            smoother.push(angle);
        }
        assert!(close(smoother.mean_degrees().unwrap(), (-0.5f64).to_degrees()));
    }

    #[test]
    fn empty_smoother_has_no_mean() {
        let mut smoother = ShoulderSmoother::new(4);
        assert!(smoother.mean_degrees().is_none());
        smoother.push(0.2);
        smoother.clear();
        assert!(smoother.is_empty());
    }

    #[test]
    fn level_shoulders_have_zero_angle() {
        assert!(close(shoulder_angle((0.3, 0.5), (0.7, 0.5)), 0.0));
        let raised_right = shoulder_angle((0.3, 0.5), (0.7, 0.9));
        assert!(close(raised_right, std::f64::consts::FRAC_PI_4));
    }
}
