pub mod exponential;

pub use exponential::ExponentialFilter;
