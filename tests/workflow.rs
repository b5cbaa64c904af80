use std::{env, fs, path::PathBuf};
use voxel_bench::{
    config::Opt,
    mesh::{to_bytes, Mesh},
    voxelize::{voxelize_stl, FillRule},
    workflow::{format_shape, run},
};

fn scratch(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("voxel_bench_{}_{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_block(dir: &PathBuf) -> PathBuf {
    let mesh = Mesh::cuboid((0., 0., 0.), (40., 20., 10.));
    let path = dir.join("block.stl");
    fs::write(&path, to_bytes(&mesh.triangles).unwrap()).unwrap();
    path
}

#[test]
fn native_voxelizer_returns_three_positive_dimensions() {
    let dir = scratch("native");
    let input = write_block(&dir);
    let volume = voxelize_stl(&input, 120, &[], FillRule::Inside).unwrap();
    let (x, y, z) = volume.shape();
    assert_eq!(x, 120);
    assert!(y > 0 && z > 0);
    assert!(volume.count() > 0);
    let line = format_shape(volume.shape());
    assert!(line.starts_with('(') && line.ends_with(')'));
    let dims: Vec<usize> = line[1..line.len() - 1]
        .split(", ")
        .map(|d| d.parse().unwrap())
        .collect();
    assert_eq!(dims, vec![x, y, z]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn full_run_writes_plots_and_report() {
    let dir = scratch("run");
    let input = write_block(&dir);
    let opt = Opt {
        input: input.clone(),
        resolution: 60,
        divisor: 40.,
        output: dir.join("out"),
        report: Some(dir.join("report.json")),
        ..Opt::default()
    };
    let report = run(&opt).unwrap();

    assert_eq!(report.triangles, 12);
    assert_eq!(report.native_shape.0, 60);
    assert!(report.native_count > 0);
    assert!(report.reference_count > 0);
    assert!(report.native_seconds >= 0.);
    assert!(report.reference_seconds >= 0.);
    let native_plot = report.native_plot.clone().unwrap();
    assert_eq!(native_plot, dir.join("out").join("native.stl"));
    assert!(native_plot.exists());
    assert!(report.comparison.exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["resolution"], 60);
    assert_eq!(json["fill"], "Inside");
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unknown_backend_still_completes() {
    let dir = scratch("unknown");
    let input = write_block(&dir);
    let opt = Opt {
        input,
        resolution: 20,
        divisor: 20.,
        backend: "vtk".to_string(),
        output: dir.join("out"),
        ..Opt::default()
    };
    let report = run(&opt).unwrap();
    assert!(report.native_plot.is_none());
    assert!(report.comparison.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_stops_the_run() {
    let dir = scratch("missing");
    let opt = Opt {
        input: dir.join("nothing.stl"),
        output: dir.join("out"),
        ..Opt::default()
    };
    assert!(run(&opt).is_err());
    fs::remove_dir_all(&dir).unwrap();
}
