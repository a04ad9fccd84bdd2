use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;
use crate::math::shape::Shape;

/// Checks externally supplied channel grids against the input layer's shape.
pub fn check_input(shape: Shape, grids: &[Matrix]) -> Result<()> {
    let channels = shape.channels.max(0) as usize;
    let rows = shape.height.max(0) as usize;
    let cols = shape.width.max(0) as usize;

    if grids.len() != channels {
        return Err(NetworkError::InputMismatch {
            expected: format!("{channels} channels"),
            actual: format!("{} channels", grids.len()),
        });
    }

    for (channel, grid) in grids.iter().enumerate() {
        if grid.rows != rows || grid.cols != cols {
            return Err(NetworkError::InputMismatch {
                expected: format!("{rows}x{cols} in channel {channel}"),
                actual: format!("{}x{}", grid.rows, grid.cols),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_grids() {
        let shape = Shape::new(2, 3, 4);
        assert!(check_input(shape, &[Matrix::zeros(3, 4), Matrix::zeros(3, 4)]).is_ok());
    }

    #[test]
    fn rejects_wrong_channel_count_or_size() {
        let shape = Shape::new(2, 3, 4);
        let err = check_input(shape, &[Matrix::zeros(3, 4)]).unwrap_err();
        assert!(err.is_recoverable());

        let err = check_input(shape, &[Matrix::zeros(3, 4), Matrix::zeros(4, 3)]).unwrap_err();
        assert!(err.to_string().contains("channel 1"));
    }
}
