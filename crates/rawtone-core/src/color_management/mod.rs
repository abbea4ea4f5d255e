//! Color management: white balance parameterization.

pub mod white_balance;
