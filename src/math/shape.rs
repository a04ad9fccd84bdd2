use serde::{Deserialize, Serialize};
use std::fmt;

/// `(channels, height, width)` of the data entering or leaving a layer.
///
/// Dimensions are signed so that an impossible layer configuration (a filter
/// wider than its input, say) yields a non-positive size that the validity
/// check reports instead of a panic at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub channels: isize,
    pub height: isize,
    pub width: isize,
}

impl Shape {
    pub const fn new(channels: isize, height: isize, width: isize) -> Self {
        Shape { channels, height, width }
    }

    /// True when every dimension is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.channels > 0 && self.height > 0 && self.width > 0
    }

    /// Total cell count; zero for invalid shapes.
    pub fn total(&self) -> usize {
        if self.is_valid() {
            (self.channels * self.height * self.width) as usize
        } else {
            0
        }
    }

    pub fn to_array(self) -> [isize; 3] {
        [self.channels, self.height, self.width]
    }

    pub fn from_array(dims: [isize; 3]) -> Self {
        Shape::new(dims[0], dims[1], dims[2])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.channels, self.height, self.width)
    }
}

/// Number of window placements along one axis: `floor((input - window) / stride) + 1`.
///
/// A zero window or a zero stride has no placements.
pub fn window_count(window: usize, stride: usize, input: isize) -> isize {
    if window == 0 || stride == 0 {
        return 0;
    }
    (input - window as isize).div_euclid(stride as isize) + 1
}

/// Output shape of a convolution layer: one channel per filter.
pub fn conv_output_size(filters: usize, filter_size: usize, stride: usize, input: Shape) -> Shape {
    Shape::new(
        filters as isize,
        window_count(filter_size, stride, input.height),
        window_count(filter_size, stride, input.width),
    )
}

/// Output shape of a pooling layer: channels pass through unchanged.
pub fn pool_output_size(pool_size: usize, stride: usize, input: Shape) -> Shape {
    Shape::new(
        input.channels,
        window_count(pool_size, stride, input.height),
        window_count(pool_size, stride, input.width),
    )
}

/// Output shape of a flatten layer: a single row holding every input cell.
pub fn flatten_output_size(input: Shape) -> Shape {
    Shape::new(1, 1, input.channels * input.height * input.width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_placements(window: usize, stride: usize, input: usize) -> isize {
        (0..input).step_by(stride).filter(|start| start + window <= input).count() as isize
    }

    #[test]
    fn window_count_matches_brute_force() {
        for input in 1..=12usize {
            for window in 1..=input {
                for stride in 1..=4usize {
                    assert_eq!(
                        window_count(window, stride, input as isize),
                        brute_force_placements(window, stride, input),
                        "input {input}, window {window}, stride {stride}"
                    );
                }
            }
        }
    }

    #[test]
    fn oversized_window_is_not_positive() {
        assert_eq!(window_count(5, 1, 4), 0);
        // Truncating division would report one placement here.
        assert!(window_count(5, 2, 4) <= 0);
        assert_eq!(window_count(2, 0, 4), 0);
    }

    #[test]
    fn zero_window_has_no_placements() {
        assert_eq!(window_count(0, 1, 4), 0);
        assert!(!pool_output_size(0, 1, Shape::new(1, 4, 4)).is_valid());
        assert!(!conv_output_size(1, 0, 1, Shape::new(1, 4, 4)).is_valid());
    }

    #[test]
    fn conv_and_pool_shapes() {
        let input = Shape::new(3, 28, 28);
        assert_eq!(conv_output_size(8, 5, 1, input), Shape::new(8, 24, 24));
        assert_eq!(pool_output_size(2, 2, input), Shape::new(3, 14, 14));
    }

    #[test]
    fn flatten_preserves_element_count() {
        let input = Shape::new(4, 6, 5);
        let flat = flatten_output_size(input);
        assert_eq!(flat, Shape::new(1, 1, 120));
        assert_eq!(flat.total(), input.total());
    }
}
