//! Scope computation over the rendered preview.

pub mod histogram;

pub use histogram::HistogramTable;
