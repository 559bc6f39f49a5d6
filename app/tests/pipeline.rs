use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder as _, LittleEndian};
use dem_mesh::HeightMode;
use geomesh::config::AppConfig;
use geomesh::pipeline::Pipeline;
use geomesh::summary::Summary;
use pcd_core::pointcloud::lod::LodTier;
use pcd_exporter::glb::Glb;
use serde_json::Value;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const HEADER_LEN: usize = 227;
const RECORD_LEN: usize = 26;

/// LAS 1.2 point format 2 over the unit box, scale 0.01.
fn las_bytes(declared: u32, points: &[([i32; 3], [u16; 3])]) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_LEN];
    buf[0..4].copy_from_slice(b"LASF");
    buf[24] = 1;
    buf[25] = 2;
    LittleEndian::write_u16(&mut buf[94..96], HEADER_LEN as u16);
    LittleEndian::write_u32(&mut buf[96..100], HEADER_LEN as u32);
    buf[104] = 2;
    LittleEndian::write_u16(&mut buf[105..107], RECORD_LEN as u16);
    LittleEndian::write_u32(&mut buf[107..111], declared);
    LittleEndian::write_f64_into(&[0.01; 3], &mut buf[131..155]);
    // max x, min x, max y, min y, max z, min z
    LittleEndian::write_f64_into(&[1.0, 0.0, 1.0, 0.0, 0.1, 0.0], &mut buf[179..227]);

    for (xyz, rgb) in points {
        let mut record = [0u8; RECORD_LEN];
        LittleEndian::write_i32_into(xyz, &mut record[0..12]);
        LittleEndian::write_u16_into(rgb, &mut record[20..26]);
        buf.extend_from_slice(&record);
    }
    buf
}

fn dem_bytes(width: u32, height: u32, data: &[f32]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[10.0f64, 10.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0f64, 0.0, 0.0, 1000.0, 2000.0, 0.0][..],
            )
            .unwrap();
        image.write_data(data).unwrap();
    }
    buf.into_inner()
}

fn read_glb_json(path: &Path) -> (Value, usize) {
    let bytes = std::fs::read(path).unwrap();
    let glb = Glb::from_slice(&bytes).unwrap();
    let json: Value = serde_json::from_slice(&glb.json).unwrap();
    (json, glb.bin.map(|b| b.len()).unwrap_or(0))
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn las_to_points_glb() {
    let dir = tempfile::tempdir().unwrap();
    let points: Vec<([i32; 3], [u16; 3])> = (0..10)
        .map(|i| ([i * 10, 100 - i * 10, i], [65535, 0, 0]))
        .collect();
    let input = write(dir.path(), "cloud.las", &las_bytes(10, &points));
    let out = dir.path().join("out");

    let mut config = AppConfig::default();
    config.lod.tiers = vec![LodTier::new(10.0, 100, 1), LodTier::new(f64::INFINITY, 5, 2)];
    config.viewer_distance = 50.0;
    let mut pipeline = Pipeline::new(config).unwrap();
    let summary = pipeline.run(&[input], &out).unwrap();

    assert!(summary.failures.is_empty());
    let Summary::PointCloud(cloud) = &summary.outputs[0] else {
        panic!("expected a point cloud summary");
    };
    assert_eq!(cloud.decoded_points, 10);
    assert_eq!(cloud.lod_tier, 1);
    assert_eq!(cloud.stride, 2);
    assert_eq!(cloud.displayed_points, 5);
    assert_eq!(cloud.center, [0.5, 0.5, 0.05]);
    assert!(cloud.short_read.is_none());

    let (json, _) = read_glb_json(&out.join("cloud.glb"));
    let primitive = &json["meshes"][0]["primitives"][0];
    assert_eq!(primitive["mode"], 0);
    assert!(primitive.get("indices").is_none());
    assert_eq!(json["accessors"][0]["count"], 5);
}

#[test]
fn truncated_las_still_exports() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(
        dir.path(),
        "short.las",
        &las_bytes(100, &[([0, 0, 0], [0, 0, 0]), ([100, 100, 10], [0, 65535, 0])]),
    );
    let mut pipeline = Pipeline::new(AppConfig::default()).unwrap();
    let summary = pipeline.run(&[input], dir.path()).unwrap();

    let Summary::PointCloud(cloud) = &summary.outputs[0] else {
        panic!("expected a point cloud summary");
    };
    assert_eq!(cloud.declared_points, 100);
    assert_eq!(cloud.decoded_points, 2);
    assert_eq!(cloud.short_read.as_ref().map(|s| s.decoded), Some(2));
    assert!(dir.path().join("short.glb").is_file());
}

#[test]
fn dem_to_terrain_glb() {
    let dir = tempfile::tempdir().unwrap();
    let (w, h) = (4u32, 3u32);
    let data: Vec<f32> = (0..w * h).map(|v| 100.0 + v as f32).collect();
    let input = write(dir.path(), "dem.tif", &dem_bytes(w, h, &data));

    let mut config = AppConfig::default();
    config.terrain.height_mode = HeightMode::Metric;
    let mut pipeline = Pipeline::new(config).unwrap();
    let summary = pipeline.run(&[input], dir.path()).unwrap();

    assert!(summary.failures.is_empty());
    let Summary::Terrain(terrain) = &summary.outputs[0] else {
        panic!("expected a terrain summary");
    };
    assert_eq!(terrain.raster.original_width, 4);
    assert_eq!(terrain.raster.target_width, 4);
    assert!(!terrain.raster.emergency);
    assert_eq!(terrain.elevation_range, (100.0, 111.0));
    assert_eq!(terrain.vertices, 12);
    assert_eq!(terrain.triangles, 2 * 3 * 2);

    let (json, bin_len) = read_glb_json(&dir.path().join("dem.glb"));
    let primitive = &json["meshes"][0]["primitives"][0];
    assert_eq!(primitive["mode"], 4);
    assert!(primitive["attributes"].get("NORMAL").is_some());
    assert!(bin_len > 0);
}

#[test]
fn mixed_batch_reports_failures_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "broken.las", b"LASZ not a las file");
    let notes = write(dir.path(), "notes.txt", b"");
    let good = write(
        dir.path(),
        "good.las",
        &las_bytes(1, &[([50, 50, 5], [0, 0, 65535])]),
    );

    let mut pipeline = Pipeline::new(AppConfig::default()).unwrap();
    let summary = pipeline.run(&[bad, notes, good], dir.path()).unwrap();

    assert_eq!(summary.outputs.len(), 1);
    assert_eq!(summary.failures.len(), 2);
    assert_eq!(summary.failures[0].kind, "bad file");
    assert_eq!(summary.failures[1].kind, "unsupported feature");
    assert!(dir.path().join("good.glb").is_file());
}
