pub mod config;
pub mod cycle;
pub mod ladder;
pub mod lifecycle;
