//! Fixed-capacity position history used to judge detection stability.

use nalgebra::Point2;

/// Circular buffer of recent 2D positions with summary statistics.
///
/// Old samples are overwritten in ring order once the buffer is full.
#[derive(Clone, Debug)]
pub struct PositionBuffer {
    positions: Vec<Point2<f32>>,
    capacity: usize,
    write_index: usize,
    last_written: Option<usize>,
}

impl PositionBuffer {
    /// A zero capacity (possible via deserialized parameters) is floored
    /// at one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PositionBuffer {
            positions: Vec::with_capacity(capacity),
            capacity,
            write_index: 0,
            last_written: None,
        }
    }

    pub fn push(&mut self, position: Point2<f32>) {
        if self.positions.len() < self.capacity {
            self.positions.push(position);
            self.last_written = Some(self.positions.len() - 1);
        } else {
            self.positions[self.write_index] = position;
            self.last_written = Some(self.write_index);
            self.write_index = (self.write_index + 1) % self.capacity;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed position.
    pub fn last(&self) -> Option<Point2<f32>> {
        self.last_written.map(|i| self.positions[i])
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.write_index = 0;
        self.last_written = None;
    }

    /// Per-axis mean of the stored positions.
    pub fn mean(&self) -> Option<Point2<f32>> {
        if self.positions.is_empty() {
            return None;
        }
        let n = self.positions.len() as f32;
        let (sx, sy) = self
            .positions
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2::new(sx / n, sy / n))
    }

    /// Per-axis population standard deviation.
    pub fn std_dev(&self) -> Option<(f32, f32)> {
        let mean = self.mean()?;
        let n = self.positions.len() as f32;
        let (vx, vy) = self.positions.iter().fold((0.0, 0.0), |(vx, vy), p| {
            let dx = p.x - mean.x;
            let dy = p.y - mean.y;
            (vx + dx * dx, vy + dy * dy)
        });
        Some(((vx / n).sqrt(), (vy / n).sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wraps_in_ring_order() {
        let mut buf = PositionBuffer::new(3);
        for i in 0..5 {
            buf.push(Point2::new(i as f32, 0.0));
        }
        assert_eq!(buf.len(), 3);
        assert_relative_eq!(buf.last().unwrap().x, 4.0);
        // Survivors are samples 2, 3, 4.
        assert_relative_eq!(buf.mean().unwrap().x, 3.0);
    }

    #[test]
    fn statistics_on_constant_stream_are_zero_spread() {
        let mut buf = PositionBuffer::new(4);
        for _ in 0..4 {
            buf.push(Point2::new(7.0, -2.0));
        }
        let (sx, sy) = buf.std_dev().unwrap();
        assert_relative_eq!(sx, 0.0);
        assert_relative_eq!(sy, 0.0);
        assert_relative_eq!(buf.mean().unwrap().y, -2.0);
    }

    #[test]
    fn zero_capacity_is_floored_at_one() {
        let mut buf = PositionBuffer::new(0);
        buf.push(Point2::new(1.0, 2.0));
        buf.push(Point2::new(3.0, 4.0));
        assert_eq!(buf.len(), 1);
        assert_relative_eq!(buf.last().unwrap().x, 3.0);
    }

    #[test]
    fn clear_empties_everything() {
        let mut buf = PositionBuffer::new(2);
        buf.push(Point2::new(1.0, 1.0));
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.last().is_none());
        assert!(buf.std_dev().is_none());
    }
}
