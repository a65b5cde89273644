//! From a mosaic GeoTIFF and a label GeoJSON on disk to patch files.

use std::path::Path;
use std::sync::Arc;

use geomosaic::config::PatchConfig;
use geomosaic::geo::{GeoTransform, RD_NEW};
use geomosaic::labels::read_grid_cells;
use geomosaic::log::NoOpLogger;
use geomosaic::raster::{read_geotiff, write_geotiff, Raster};
use geomosaic::segment::GridPatchSegmenter;

/// 2000x2000 px at 1 m with its upper-left corner at (139000, 458000).
fn write_mosaic(path: &Path) -> Raster {
    let mut data = Vec::with_capacity(2000 * 2000 * 3);
    for y in 0..2000u32 {
        for x in 0..2000u32 {
            data.extend_from_slice(&[(x % 251) as u8, (y % 241) as u8, 42]);
        }
    }
    let transform = GeoTransform::new(139_000.0, 458_000.0, 1.0, -1.0);
    let raster = Raster::new(2000, 2000, data, transform, RD_NEW).unwrap();
    write_geotiff(&raster, path, None).unwrap();
    raster
}

/// Three cells: one clipped to a building footprint well inside the
/// mosaic, one at the mosaic edge, and one with an unusable id.
const LABELS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "id": "139900_457000", "liveability": 4.1 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[139910, 457010], [139940, 457010], [139940, 457060], [139910, 457060], [139910, 457010]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "id": "139000_457900", "liveability": 3.9 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[139000, 457900], [139100, 457900], [139100, 458000], [139000, 458000], [139000, 457900]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "id": "../escape", "liveability": 4.0 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[139500, 457500], [139600, 457500], [139600, 457600], [139500, 457600], [139500, 457500]]]
      }
    }
  ]
}"#;

#[test]
fn test_patches_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let mosaic_path = dir.path().join("utrecht_2020.tiff");
    let labels_path = dir.path().join("cells.geojson");
    let patch_dir = dir.path().join("patches");

    let original = write_mosaic(&mosaic_path);
    std::fs::write(&labels_path, LABELS).unwrap();

    let mosaic = read_geotiff(&mosaic_path).unwrap();
    let cells = read_grid_cells(&labels_path).unwrap();
    assert_eq!(cells.len(), 3);

    let config = PatchConfig::default().with_compress(false);
    let segmenter = GridPatchSegmenter::new(config, Arc::new(NoOpLogger));
    let report = segmenter.segment_all(&mosaic, &cells, &patch_dir).unwrap();

    assert_eq!(report.written, vec![patch_dir.join("139900_457000.tiff")]);
    assert_eq!(report.out_of_bounds, 1);
    assert_eq!(report.failed.len(), 1);

    // The clipped polygon still yields the full cell centred at (139950, 457050)
    let patch = read_geotiff(&report.written[0]).unwrap();
    assert_eq!((patch.width(), patch.height()), (700, 700));
    assert_eq!(patch.transform().origin_x, 139_600.0);
    assert_eq!(patch.transform().origin_y, 457_400.0);
    assert_eq!(patch.pixel(0, 0), original.pixel(600, 600));
    assert_eq!(patch.pixel(699, 699), original.pixel(1299, 1299));
}

#[test]
fn test_compressed_patches_are_not_redone() {
    let dir = tempfile::tempdir().unwrap();
    let mosaic_path = dir.path().join("mosaic.tiff");
    let labels_path = dir.path().join("cells.geojson");
    let patch_dir = dir.path().join("patches");

    write_mosaic(&mosaic_path);
    std::fs::write(&labels_path, LABELS).unwrap();
    let mosaic = read_geotiff(&mosaic_path).unwrap();
    let cells = read_grid_cells(&labels_path).unwrap();

    let segmenter = GridPatchSegmenter::new(PatchConfig::default(), Arc::new(NoOpLogger));
    let first = segmenter.segment_all(&mosaic, &cells, &patch_dir).unwrap();
    assert_eq!(first.written, vec![patch_dir.join("139900_457000.jpg")]);
    assert!(!patch_dir.join("139900_457000.tiff").exists());

    let jpeg = image::open(&first.written[0]).unwrap();
    assert_eq!((jpeg.width(), jpeg.height()), (700, 700));

    let second = segmenter.segment_all(&mosaic, &cells, &patch_dir).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.skipped_existing, 1);
}
