pub mod matrix;
pub mod pool_code;
pub mod shape;

pub use matrix::Matrix;
pub use pool_code::{pool_decode, pool_encode};
pub use shape::{conv_output_size, flatten_output_size, pool_output_size, Shape};
