//! Integer encoding of the input cell a pooling window selected.
//!
//! `y` and `x` are zero-padded to the digit width of the grid's row and column
//! counts and written between two sentinel `1` digits, e.g. `(3, 4)` in a
//! 5×12 grid becomes `1 3 04 1` = `13041`. The sentinels keep the padding
//! zeros alive through the integer.

fn decimal_width(n: u64) -> u32 {
    n.checked_ilog10().map_or(1, |d| d + 1)
}

/// Encodes `(y, x)` of a cell in a `rows × cols` grid.
pub fn pool_encode(y: usize, x: usize, rows: usize, cols: usize) -> u64 {
    let y_width = decimal_width(rows as u64);
    let x_width = decimal_width(cols as u64);

    let code = 10u64.pow(y_width) + y as u64;
    let code = code * 10u64.pow(x_width) + x as u64;
    code * 10 + 1
}

/// Recovers `(y, x)` from a code produced by [`pool_encode`] for a grid with `rows` rows.
pub fn pool_decode(code: u64, rows: usize) -> (usize, usize) {
    let inner = code / 10;
    let y_width = decimal_width(rows as u64);
    let x_width = decimal_width(inner) - 1 - y_width;

    let x_scale = 10u64.pow(x_width);
    let x = inner % x_scale;
    let y = (inner / x_scale) % 10u64.pow(y_width);
    (y as usize, x as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_sentinels_and_padding() {
        assert_eq!(pool_encode(3, 4, 5, 12), 13041);
        assert_eq!(pool_encode(0, 0, 10, 10), 100001);
        assert_eq!(pool_encode(2, 7, 3, 9), 1271);
    }

    #[test]
    fn round_trips_every_cell() {
        for &(rows, cols) in &[(1, 1), (3, 3), (5, 12), (12, 5), (10, 100), (128, 7)] {
            for y in 0..rows {
                for x in 0..cols {
                    let code = pool_encode(y, x, rows, cols);
                    assert_eq!(pool_decode(code, rows), (y, x), "grid {rows}x{cols}");
                }
            }
        }
    }

    #[test]
    fn keeps_leading_zeros() {
        let code = pool_encode(0, 5, 100, 100);
        assert_eq!(code, 10000051);
        assert_eq!(pool_decode(code, 100), (0, 5));
    }
}
