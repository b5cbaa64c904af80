//! # voxel_bench
//!
//! Benchmark two ways of turning an STL surface mesh into a voxel grid and
//! plot the results side by side.

pub mod config;
pub mod geo;
pub mod mesh;
pub mod plot;
pub mod timer;
pub mod volume;
pub mod voxelize;
pub mod workflow;

use thiserror::Error;

#[derive(Error, Debug)]
/// Anything that can stop a run
pub enum Error {
    #[error("Timer error")]
    Timer(#[from] timer::TimerError),
    #[error("Couldn't load mesh")]
    Stl(#[from] mesh::StlError),
    #[error("Voxelization failed")]
    Voxelize(#[from] voxelize::VoxelizeError),
    #[error("Plotting failed")]
    Plot(#[from] plot::PlotError),
    #[error("Invalid configuration")]
    Config(#[from] config::ConfigError),
    #[error("IO error")]
    IO(#[from] std::io::Error),
    #[error("Couldn't write report")]
    Json(#[from] serde_json::Error),
}
