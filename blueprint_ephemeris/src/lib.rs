//! Analytic ephemeris used by the Cosmic Blueprint calculation pipeline.
//!
//! All positions are geocentric, tropical and referred to the equinox of
//! date, which is what natal astrology and the Human Design wheel expect.

mod calc;
mod orbits;
mod points;

pub use crate::calc::*;
