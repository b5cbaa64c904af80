use crate::{plot::Camera, voxelize::FillRule};
use std::path::PathBuf;
use structopt::StructOpt;
use thiserror::Error;

/// The grid voxelizer holds about resolution³ cells in memory
pub const MAX_RESOLUTION: u32 = 512;

#[derive(Error, Debug)]
/// Error types for command line options
pub enum ConfigError {
    #[error("resolution must be between 2 and {}", MAX_RESOLUTION)]
    Resolution,
    #[error("divisor must be a positive number")]
    Divisor,
    #[error("mode must be 0 or 1")]
    Mode,
    #[error("Not a decimal number")]
    ParseFloat(#[from] std::num::ParseFloatError),
    #[error("Not a whole number")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("Error parsing config")]
    Clap(#[from] clap::Error),
}

fn parse_resolution(src: &str) -> Result<u32, ConfigError> {
    let resolution = src.parse::<u32>()?;
    if resolution < 2 || resolution > MAX_RESOLUTION {
        Err(ConfigError::Resolution)
    } else {
        Ok(resolution)
    }
}

fn parse_divisor(src: &str) -> Result<f32, ConfigError> {
    let divisor = src.parse::<f32>()?;
    if !divisor.is_finite() || divisor <= 0. {
        Err(ConfigError::Divisor)
    } else {
        Ok(divisor)
    }
}

fn parse_mode(src: &str) -> Result<u8, ConfigError> {
    let mode = src.parse::<u8>()?;
    if mode > 1 {
        Err(ConfigError::Mode)
    } else {
        Ok(mode)
    }
}

// set up program arguments
#[derive(Debug, StructOpt)]
#[structopt(name = "voxel_bench")]
pub struct Opt {
    /// Binary STL file to voxelize
    #[structopt(short, long, parse(from_os_str), default_value = "test/ai5206_thermocouple_test_block.stl")]
    pub input: PathBuf,

    /// Cells along the longest axis for the grid voxelizer
    #[structopt(short, long, default_value = "120", parse(try_from_str = parse_resolution))]
    pub resolution: u32,

    /// Facet index to leave out of the grid voxelizer, can be repeated
    #[structopt(long, number_of_values = 1)]
    pub exclude: Vec<usize>,

    /// Inside, Surface or InsideAndSurface
    #[structopt(long, default_value = "Inside")]
    pub fill: FillRule,

    /// Pitch of the lattice voxelizer is the mesh diagonal divided by this
    #[structopt(long, default_value = "200", parse(try_from_str = parse_divisor))]
    pub divisor: f32,

    /// Require a closed surface before sampling the lattice
    #[structopt(long)]
    pub check_surface: bool,

    /// Renderer for the grid volume: threshold or voxels
    #[structopt(short, long, default_value = "threshold")]
    pub backend: String,

    /// Voxel view mode, 0 skips zero valued cells and 1 draws all of them
    #[structopt(short, long, default_value = "0", parse(try_from_str = parse_mode))]
    pub mode: u8,

    #[structopt(long, possible_values = &Camera::variants(), default_value = "xy", case_insensitive = true)]
    pub camera: Camera,

    /// Directory the plots are written to
    #[structopt(short, long, parse(from_os_str), default_value = "out")]
    pub output: PathBuf,

    /// Write a JSON summary of the run
    #[structopt(long, parse(from_os_str))]
    pub report: Option<PathBuf>,

    #[structopt(long)]
    pub debug: bool,
}

impl Default for Opt {
    fn default() -> Self {
        Opt {
            input: PathBuf::from("test/ai5206_thermocouple_test_block.stl"),
            resolution: 120,
            exclude: Vec::new(),
            fill: FillRule::Inside,
            divisor: 200.,
            check_surface: false,
            backend: "threshold".to_string(),
            mode: 0,
            camera: Camera::Xy,
            output: PathBuf::from("out"),
            report: None,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opt, ConfigError> {
        let mut full = vec!["voxel_bench"];
        full.extend_from_slice(args);
        Ok(Opt::from_iter_safe(&full)?)
    }

    #[test]
    fn defaults_match_fixed_run() {
        let opt = parse(&[]).unwrap();
        assert_eq!(opt.input, PathBuf::from("test/ai5206_thermocouple_test_block.stl"));
        assert_eq!(opt.resolution, 120);
        assert!(opt.exclude.is_empty());
        assert_eq!(opt.fill, FillRule::Inside);
        assert_eq!(opt.divisor, 200.);
        assert!(!opt.check_surface);
        assert_eq!(opt.backend, "threshold");
        assert_eq!(opt.mode, 0);
        assert_eq!(opt.camera, Camera::Xy);
        assert_eq!(opt.output, PathBuf::from("out"));
        assert!(opt.report.is_none());
    }

    #[test]
    fn reads_flags() {
        let opt = parse(&[
            "-i", "part.stl", "-r", "64", "--exclude", "3", "--exclude", "7", "--fill", "Surface",
            "--camera", "YZ", "-m", "1",
        ])
        .unwrap();
        assert_eq!(opt.input, PathBuf::from("part.stl"));
        assert_eq!(opt.resolution, 64);
        assert_eq!(opt.exclude, vec![3, 7]);
        assert_eq!(opt.fill, FillRule::Surface);
        assert_eq!(opt.camera, Camera::Yz);
        assert_eq!(opt.mode, 1);
    }

    #[test]
    fn validates_ranges() {
        assert!(parse(&["-r", "1"]).is_err());
        assert!(parse(&["--divisor", "0"]).is_err());
        assert!(parse(&["-m", "2"]).is_err());
        assert!(parse(&["--fill", "Outside"]).is_err());
        assert_eq!(parse_resolution("512").unwrap(), MAX_RESOLUTION);
        assert!(matches!(parse_resolution("513"), Err(ConfigError::Resolution)));
        assert!(parse_resolution("2048").is_err());
        assert!(matches!(parse_divisor("abc"), Err(ConfigError::ParseFloat(_))));
    }
}
