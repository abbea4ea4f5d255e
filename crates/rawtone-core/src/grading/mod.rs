//! Grading tools: slider operators and automatic white balance.

pub mod auto_balance;
pub mod sliders;
