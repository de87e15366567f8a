//! Tokio host for the Red Light, Green Light core: real timers, a simulated
//! speech engine, a synthetic camera and event output.

pub mod camera;
pub mod config;
pub mod narrator;
pub mod session;
pub mod sink;
