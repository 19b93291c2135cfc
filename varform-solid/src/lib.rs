//! Solid mechanics material models for `varform`.
//!
//! The material laws are plain pointwise functions generic over the engine
//! scalar, so the same code computes stresses from `f64` displacement
//! gradients and from the dual-valued gradients that q-functions receive.

pub mod materials;

pub use materials::{
    linear_elastic_energy, linear_elastic_stress, neo_hookean_energy, neo_hookean_first_piola,
    LameParameters,
};
