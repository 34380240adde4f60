//! ATM swaption volatility structures.
//!
//! - [`SwaptionVolatilityStructure`]: interface consumed by the cube calibrators
//! - [`SwaptionVolatilityMatrix`]: bilinear matrix of quoted ATM vols

mod swaption_matrix;
mod traits;

pub use swaption_matrix::SwaptionVolatilityMatrix;
pub use traits::SwaptionVolatilityStructure;
