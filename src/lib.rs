//! This crate is for configurational-bias Monte Carlo regrowth of
//! short alkane chains.

#![cfg_attr(feature = "strict", deny(warnings))]
#![deny(missing_docs)]

#[macro_use]
extern crate serde_derive;

pub mod atomicfile;
pub mod geometry;
pub mod mc;
pub mod moves;
pub mod rng;
pub mod rotation;
pub mod system;
pub mod unit_quaternion;
pub mod validate;
