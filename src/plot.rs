//! # Plot
//!
//! Renders voxel volumes to files. `Backend::Threshold` writes the outer
//! faces of the cells above a threshold as an STL mesh, `Backend::Voxels`
//! draws every selected cell as a shaded square in an oblique SVG view.
//! `compare` puts two volumes side by side under one shared camera.

use crate::{
    geo::{Line3d, Point3d, Triangle3d},
    mesh::{self, StlError},
    volume::Volume,
};
use clap::arg_enum;
use log::info;
use simplesvg::{Attr, Color, ColorAttr, Fig, Svg};
use std::{
    collections::{BTreeMap, HashSet},
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// Printed when a backend name isn't recognised
pub const UNRECOGNISED: &str =
    "Unrecognised command, select 'pyvista' or 'matplotlib' as visualisation tool";

/// Pixel size of one cell in the voxel view
const CELL: f32 = 12.;
/// Fraction of a cell each step in depth is shifted in the oblique view
const DEPTH: f32 = 0.35;
const MARGIN: f32 = 20.;
/// Pixel size of the longest side of a comparison panel
const PANEL: f32 = 480.;
const TITLE: f32 = 24.;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("{}", UNRECOGNISED)]
    Backend(String),
    #[error("display mode must be 0 or 1, got {0}")]
    Mode(u8),
    #[error("volume has no cells to plot")]
    EmptyVolume,
    #[error("Couldn't write plot")]
    IO(#[from] std::io::Error),
    #[error("Couldn't encode mesh")]
    Stl(#[from] StlError),
}

/// Available renderers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Boundary mesh of the cells above the midpoint of the value range
    Threshold,
    /// Static oblique view of the cells, shaded with a grey colormap
    Voxels,
}

impl FromStr for Backend {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threshold" | "pyvista" => Ok(Backend::Threshold),
            "voxels" | "matplotlib" => Ok(Backend::Voxels),
            _ => Err(PlotError::Backend(s.to_string())),
        }
    }
}

/// Which cells the voxel view draws
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// Leave out zero valued cells
    SkipZero,
    /// Draw every cell, zero valued ones included
    All,
}

impl TryFrom<u8> for DisplayMode {
    type Error = PlotError;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(DisplayMode::SkipZero),
            1 => Ok(DisplayMode::All),
            other => Err(PlotError::Mode(other)),
        }
    }
}

arg_enum! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Camera {
        Xy,
        Xz,
        Yz
    }
}

impl Default for Camera {
    fn default() -> Self { Camera::Xy }
}

impl Camera {
    /// Horizontal, vertical and depth axes. The viewer sits on the positive
    /// side of the depth axis when the flag is set.
    fn axes(self) -> (usize, usize, usize, bool) {
        match self {
            Camera::Xy => (0, 1, 2, true),
            Camera::Xz => (0, 2, 1, false),
            Camera::Yz => (1, 2, 0, true),
        }
    }
}

/// Result of rendering one volume
#[derive(Debug)]
pub struct Plot {
    pub backend: Backend,
    pub path: PathBuf,
    /// Cells in the order they were drawn
    pub cells: Vec<(usize, usize, usize)>,
}

impl Plot {
    pub fn rendered_set(&self) -> HashSet<(usize, usize, usize)> { self.cells.iter().copied().collect() }
}

/// Render a volume with the given backend. `stem` gets the backend's file
/// extension.
pub fn plot_volume(
    volume: &Volume,
    backend: Backend,
    mode: DisplayMode,
    stem: &Path,
) -> Result<Plot, PlotError> {
    if volume.is_empty() {
        return Err(PlotError::EmptyVolume);
    }
    let plot = match backend {
        Backend::Threshold => {
            let path = stem.with_extension("stl");
            let cells = threshold_cells(volume);
            let faces = boundary_faces(volume, &cells);
            write_file(&path, &mesh::to_bytes(&faces)?)?;
            Plot { backend, path, cells }
        },
        Backend::Voxels => {
            let path = stem.with_extension("svg");
            let (svg, cells) = voxel_view(volume, mode);
            write_file(&path, svg.as_bytes())?;
            Plot { backend, path, cells }
        },
    };
    info!("{} cells plotted to {}", plot.cells.len(), plot.path.display());
    Ok(plot)
}

/// Render a volume with a backend picked by name. Unknown names print a
/// diagnostic and render nothing.
pub fn plot_named(
    volume: &Volume,
    name: &str,
    mode: DisplayMode,
    stem: &Path,
) -> Result<Option<Plot>, PlotError> {
    match name.parse::<Backend>() {
        Ok(backend) => plot_volume(volume, backend, mode, stem).map(Some),
        Err(_) => {
            println!("{}", UNRECOGNISED);
            Ok(None)
        },
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PlotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Position of `value` between `lo` and `hi`, 0 when the range is empty
fn normalize(value: f32, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        ((value - lo) / (hi - lo)).max(0.).min(1.)
    } else {
        0.
    }
}

/// White at 0 to black at 1
fn greys(t: f32) -> ColorAttr {
    let level = (255. * (1. - t)).round() as u8;
    Color(level, level, level)
}

fn edge() -> ColorAttr { Color(128, 128, 128) }

/// Cells kept by the threshold view: non-zero and at least the midpoint of
/// the value range
pub fn threshold_cells(volume: &Volume) -> Vec<(usize, usize, usize)> {
    let (lo, hi) = volume.range();
    let cutoff = (lo as f32 + hi as f32) / 2.;
    volume
        .data
        .indexed_iter()
        .filter(|(_, v)| **v != 0 && **v as f32 >= cutoff)
        .map(|(index, _)| index)
        .collect()
}

/// Outward facing triangles for every cell face not shared with another
/// kept cell
fn boundary_faces(volume: &Volume, cells: &[(usize, usize, usize)]) -> Vec<Triangle3d> {
    let kept: HashSet<_> = cells.iter().copied().collect();
    let half = volume.pitch / 2.;
    let mut faces = Vec::new();
    for &(i, j, k) in cells {
        let index = [i as isize, j as isize, k as isize];
        let center = volume.cell_center(i, j, k);
        let center = [center.pos.x, center.pos.y, center.pos.z];
        for axis in 0..3 {
            for sign in [-1_isize, 1].iter() {
                let mut neighbour = index;
                neighbour[axis] += sign;
                let shared = neighbour.iter().all(|n| *n >= 0)
                    && kept.contains(&(neighbour[0] as usize, neighbour[1] as usize, neighbour[2] as usize));
                if shared {
                    continue;
                }
                let u = (axis + 1) % 3;
                let v = (axis + 2) % 3;
                let corner = |du: f32, dv: f32| {
                    let mut p = center;
                    p[axis] += *sign as f32 * half;
                    p[u] += du * half;
                    p[v] += dv * half;
                    Point3d::from(p)
                };
                let mut quad = [corner(-1., -1.), corner(1., -1.), corner(1., 1.), corner(-1., 1.)];
                if *sign < 0 {
                    quad.reverse();
                }
                faces.push(Triangle3d::from_points(quad[0], quad[1], quad[2]));
                faces.push(Triangle3d::from_points(quad[0], quad[2], quad[3]));
            }
        }
    }
    faces
}

/// Oblique view with x to the right, z up and y going back into the page.
/// Cells are drawn back to front so nearer cells cover farther ones.
fn voxel_view(volume: &Volume, mode: DisplayMode) -> (String, Vec<(usize, usize, usize)>) {
    let (nx, ny, nz) = volume.shape();
    let (lo, hi) = volume.range();
    let mut figs = Vec::new();
    let mut cells = Vec::new();
    for j in (0..ny).rev() {
        for k in 0..nz {
            for i in 0..nx {
                let value = volume.data[[i, j, k]];
                if mode == DisplayMode::SkipZero && value == 0 {
                    continue;
                }
                let x = MARGIN + (i as f32 + j as f32 * DEPTH) * CELL;
                let y = MARGIN + ((nz - 1 - k) as f32 + (ny - 1 - j) as f32 * DEPTH) * CELL;
                figs.push(Fig::Rect(x, y, CELL, CELL).styled(
                    Attr::default()
                        .fill(greys(normalize(value as f32, lo as f32, hi as f32)))
                        .stroke(edge())
                        .stroke_width(0.5),
                ));
                cells.push((i, j, k));
            }
        }
    }
    let width = 2. * MARGIN + (nx as f32 + ny as f32 * DEPTH) * CELL;
    let height = 2. * MARGIN + (nz as f32 + ny as f32 * DEPTH) * CELL;
    (Svg(figs, width.ceil() as u32, height.ceil() as u32).to_string(), cells)
}

/// Camera shared by every panel of a comparison
#[derive(Clone, Copy, Debug)]
pub struct View {
    pub camera: Camera,
    pub bounds: Line3d,
    /// Pixels per world unit
    pub scale: f32,
}

impl View {
    /// Fit the given world bounds into a panel
    pub fn fit(camera: Camera, bounds: Line3d) -> View {
        let (h, v, _, _) = camera.axes();
        let extent = bounds.extent();
        let extent = [extent.x, extent.y, extent.z];
        let longest = extent[h].max(extent[v]);
        let scale = if longest > 0. { PANEL / longest } else { 1. };
        View { camera, bounds, scale }
    }

    /// Panel pixel size
    pub fn size(&self) -> (f32, f32) {
        let (h, v, _, _) = self.camera.axes();
        let extent = self.bounds.extent();
        let extent = [extent.x, extent.y, extent.z];
        (extent[h] * self.scale, extent[v] * self.scale)
    }

    /// Panel local pixel position of a world point, y pointing down
    pub fn project(&self, point: &Point3d) -> (f32, f32) {
        let (h, v, _, _) = self.camera.axes();
        let p = [point.pos.x, point.pos.y, point.pos.z];
        let min = [self.bounds.p1.pos.x, self.bounds.p1.pos.y, self.bounds.p1.pos.z];
        let max = [self.bounds.p2.pos.x, self.bounds.p2.pos.y, self.bounds.p2.pos.z];
        ((p[h] - min[h]) * self.scale, (max[v] - p[v]) * self.scale)
    }

    /// 1 for points nearest the viewer, 0 for the farthest
    fn nearness(&self, point: &Point3d) -> f32 {
        let (_, _, d, positive) = self.camera.axes();
        let p = [point.pos.x, point.pos.y, point.pos.z];
        let min = [self.bounds.p1.pos.x, self.bounds.p1.pos.y, self.bounds.p1.pos.z];
        let max = [self.bounds.p2.pos.x, self.bounds.p2.pos.y, self.bounds.p2.pos.z];
        let t = normalize(p[d], min[d], max[d]);
        if positive {
            t
        } else {
            1. - t
        }
    }
}

/// Result of a side by side comparison
#[derive(Debug)]
pub struct Comparison {
    pub path: PathBuf,
    pub view: View,
    /// Columns drawn in each panel
    pub cells: [usize; 2],
}

/// Nearest occupied cell of each column seen by the camera
fn visible_cells(volume: &Volume, camera: Camera) -> Vec<(usize, usize, usize)> {
    let (h, v, d, positive) = camera.axes();
    let mut columns: BTreeMap<(usize, usize), [usize; 3]> = BTreeMap::new();
    for (i, j, k) in volume.occupied() {
        let cell = [i, j, k];
        columns
            .entry((cell[h], cell[v]))
            .and_modify(|best| {
                let nearer = if positive { cell[d] > best[d] } else { cell[d] < best[d] };
                if nearer {
                    *best = cell;
                }
            })
            .or_insert(cell);
    }
    columns.values().map(|c| (c[0], c[1], c[2])).collect()
}

/// Draw two volumes next to each other with a shared camera, so the same
/// world point sits at the same spot in both panels
pub fn compare(
    panels: [(&str, &Volume); 2],
    camera: Camera,
    path: &Path,
) -> Result<Comparison, PlotError> {
    if panels.iter().any(|(_, volume)| volume.is_empty()) {
        return Err(PlotError::EmptyVolume);
    }
    let bounds = panels[0].1.world_bounds().union(&panels[1].1.world_bounds());
    let view = View::fit(camera, bounds);
    let (width, height) = view.size();

    let mut figs = Vec::new();
    let mut cells = [0; 2];
    for (index, (title, volume)) in panels.iter().enumerate() {
        let left = MARGIN + index as f32 * (width + MARGIN);
        let top = MARGIN + TITLE;
        figs.push(Fig::Text(left, MARGIN + TITLE / 2., title.to_string()));
        figs.push(Fig::Rect(left, top, width, height).styled(
            Attr::default().fill(Color(255, 255, 255)).stroke(Color(0, 0, 0)).stroke_width(1.),
        ));
        let size = volume.pitch * view.scale;
        let visible = visible_cells(volume, camera);
        for &(i, j, k) in &visible {
            let center = volume.cell_center(i, j, k);
            let (x, y) = view.project(&center);
            figs.push(Fig::Rect(left + x - size / 2., top + y - size / 2., size, size).styled(
                Attr::default()
                    .fill(greys(1. - view.nearness(&center)))
                    .stroke(edge())
                    .stroke_width(0.25),
            ));
        }
        cells[index] = visible.len();
    }

    let total_width = 3. * MARGIN + 2. * width;
    let total_height = 2. * MARGIN + TITLE + height;
    let svg = Svg(figs, total_width.ceil() as u32, total_height.ceil() as u32).to_string();
    write_file(path, svg.as_bytes())?;
    info!("comparison written to {}", path.display());
    Ok(Comparison {
        path: path.to_path_buf(),
        view,
        cells,
    })
}
