//! # Workflow
//!
//! Times both voxelizers on one mesh, plots the results and prints the
//! shape of the grid voxelizer's output.

use crate::{
    config::Opt,
    mesh::load_mesh,
    plot::{compare, plot_named, DisplayMode},
    timer::Timer,
    voxelize::{voxelize_pitch, voxelize_stl, FillRule},
    Error,
};
use log::info;
use serde::Serialize;
use std::{convert::TryFrom, fs::File, io::BufWriter, path::PathBuf};

/// Summary of one run
#[derive(Debug, Serialize)]
pub struct Report {
    pub input: PathBuf,
    pub triangles: usize,
    pub resolution: u32,
    pub fill: FillRule,
    pub pitch: f32,
    pub native_seconds: f64,
    pub reference_seconds: f64,
    pub native_shape: (usize, usize, usize),
    pub reference_shape: (usize, usize, usize),
    pub native_count: usize,
    pub reference_count: usize,
    pub native_plot: Option<PathBuf>,
    pub comparison: PathBuf,
}

/// Shape as printed at the end of a run
///
/// # Examples
///
/// ```
/// use voxel_bench::workflow::format_shape;
/// assert_eq!(format_shape((120, 45, 30)), "(120, 45, 30)");
/// ```
pub fn format_shape(shape: (usize, usize, usize)) -> String { format!("{:?}", shape) }

pub fn run(opt: &Opt) -> Result<Report, Error> {
    let mut timer = Timer::new();
    let mode = DisplayMode::try_from(opt.mode)?;

    timer.start()?;
    let native = voxelize_stl(&opt.input, opt.resolution, &opt.exclude, opt.fill)?;
    println!("Native voxelised.");
    let native_time = timer.stop()?;
    let native_plot = plot_named(&native, &opt.backend, mode, &opt.output.join("native"))?;

    let mesh = load_mesh(&opt.input)?;
    let pitch = mesh.length() / opt.divisor;
    info!("lattice pitch {} for {} triangles", pitch, mesh.len());
    timer.start()?;
    let reference = voxelize_pitch(&mesh, pitch, opt.check_surface)?;
    println!("Reference voxelised.");
    let reference_time = timer.stop()?;

    let comparison = compare(
        [("reference", &reference), ("native", &native)],
        opt.camera,
        &opt.output.join("comparison.svg"),
    )?;

    println!("{}", format_shape(native.shape()));

    let report = Report {
        input: opt.input.clone(),
        triangles: mesh.len(),
        resolution: opt.resolution,
        fill: opt.fill,
        pitch,
        native_seconds: native_time.as_secs_f64(),
        reference_seconds: reference_time.as_secs_f64(),
        native_shape: native.shape(),
        reference_shape: reference.shape(),
        native_count: native.count(),
        reference_count: reference.count(),
        native_plot: native_plot.map(|plot| plot.path),
        comparison: comparison.path,
    };
    if let Some(path) = &opt.report {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &report)?;
        info!("report written to {}", path.display());
    }
    Ok(report)
}
