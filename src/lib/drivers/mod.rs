pub mod encoder;
pub mod motor;
