pub mod types;
pub mod warp;

pub use types::{RasterReader, ReadError};
pub use warp::WarpReader;
