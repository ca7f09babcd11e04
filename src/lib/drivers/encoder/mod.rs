pub mod qei;
pub mod quadrature;

pub use qei::QeiCounter;
pub use quadrature::{Channel, QuadratureDecoder, Step};
