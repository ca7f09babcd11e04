//! Closed-loop wheel velocity control for a four-wheel mecanum rover.
//!
//! Nothing in here touches a specific microcontroller. Motors are reached
//! through [`drivers::motor::MotorOutput`], encoders feed
//! [`controller::inputs::DriveInputs`] either edge by edge or from a hardware
//! quadrature counter, and [`controller::rover::Rover::tick`] runs one
//! estimate -> kinematics -> PID -> output pass.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controller;
pub mod drivers;
pub mod filtering;
pub mod kinematics;
pub mod protocol;
pub mod time;
pub mod wheel;
