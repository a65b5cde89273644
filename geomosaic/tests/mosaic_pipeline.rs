//! End-to-end mosaic builds against in-memory capabilities and tiles.
//!
//! Nothing here touches the network or sleeps: geometry comes from a fake
//! capabilities source, tiles from a fake factory, and the retry schedule
//! runs on the recording timer.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use geomosaic::config::{FetchConfig, PostprocessConfig};
use geomosaic::fetch::{RecordingTimer, RetryPolicy};
use geomosaic::geo::{BoundingBox, RD_NEW};
use geomosaic::log::{LogLevel, Logger, MemoryLogger};
use geomosaic::matrix::{
    CapabilitiesSource, ImageryCatalog, MatrixError, TileMatrixDescriptor, TileMatrixGeometry,
    TileMatrixResolver, OGC_PIXEL_SIZE_M,
};
use geomosaic::mosaic::{MosaicBuilder, MosaicError, MosaicOutcome, MosaicRequest};
use geomosaic::plan::{plan, TileIndex};
use geomosaic::provider::{SourceError, TileSource, TileSourceFactory};
use geomosaic::raster::read_geotiff;

const TILE: u32 = 256;

/// RD New tile matrix with a fixed ground pixel size.
struct FakeCapabilities {
    pixel_m: f64,
    calls: AtomicUsize,
}

impl FakeCapabilities {
    fn new(pixel_m: f64) -> Self {
        Self {
            pixel_m,
            calls: AtomicUsize::new(0),
        }
    }
}

impl CapabilitiesSource for FakeCapabilities {
    async fn describe_tile_matrix(
        &self,
        _endpoint: &str,
        _tile_matrix_set: &str,
        _zoom_level: &str,
    ) -> Result<TileMatrixGeometry, MatrixError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TileMatrixGeometry {
            scale_denominator: self.pixel_m / OGC_PIXEL_SIZE_M,
            top_left: (-285_401.92, 903_401.92),
            tile_width: TILE,
            tile_height: TILE,
            matrix_width: Some(1 << 16),
            matrix_height: Some(1 << 16),
        })
    }
}

fn colour(tile: TileIndex) -> [u8; 3] {
    [
        (tile.row % 200) as u8 + 1,
        (tile.col % 200) as u8 + 1,
        ((tile.row + tile.col) % 50) as u8 + 100,
    ]
}

fn solid_png(rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(TILE, TILE, Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

struct SolidTiles {
    unavailable: bool,
    requests: Arc<AtomicUsize>,
}

impl TileSource for SolidTiles {
    async fn get_tile(&self, tile: TileIndex) -> Result<Vec<u8>, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(SourceError::Status {
                status: 503,
                url: format!("fake://{}/{}", tile.row, tile.col),
            });
        }
        Ok(solid_png(colour(tile)))
    }

    fn name(&self) -> &str {
        "solid"
    }
}

#[derive(Default)]
struct SolidTilesFactory {
    unavailable: bool,
    requests: Arc<AtomicUsize>,
}

impl TileSourceFactory for SolidTilesFactory {
    type Source = SolidTiles;

    fn create(&self, _matrix: &TileMatrixDescriptor) -> SolidTiles {
        SolidTiles {
            unavailable: self.unavailable,
            requests: Arc::clone(&self.requests),
        }
    }
}

type Builder = MosaicBuilder<FakeCapabilities, SolidTilesFactory, RecordingTimer>;

fn builder(pixel_m: f64, factory: SolidTilesFactory, logger: Arc<dyn Logger>) -> Builder {
    let resolver = TileMatrixResolver::new(
        ImageryCatalog::netherlands(),
        FakeCapabilities::new(pixel_m),
    );
    MosaicBuilder::new(resolver, factory, Arc::new(RecordingTimer::new()), logger)
}

fn utrecht() -> BoundingBox {
    BoundingBox::from_origin(139_267.0, 456_844.0, 1000.0, 1000.0)
}

fn scratch_dirs(year_dir: &Path) -> Vec<String> {
    std::fs::read_dir(year_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(".geomosaic-"))
        .collect()
}

#[tokio::test]
async fn test_rename_build_assembles_every_tile() {
    let out = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemoryLogger::new());
    let builder = builder(1.0, SolidTilesFactory::default(), sink.clone());

    let request = MosaicRequest::new("utrecht", 2015, utrecht())
        .with_padding(300.0)
        .with_output_dir(out.path());
    let outcome = builder.build(&request).await.unwrap();

    let MosaicOutcome::Built { path, report } = outcome else {
        panic!("expected a new build");
    };
    assert_eq!(path, out.path().join("2015").join("utrecht_2015.tiff"));
    assert!(report.is_complete());
    assert_eq!(report.fetched, report.planned);

    // Same geometry the builder planned with
    let matrix = builder.resolver().resolve(2015, 1.0).await.unwrap();
    let expected = plan(&utrecht(), &matrix, 300.0, 1.0).unwrap();
    assert_eq!(report.planned, expected.tile_count());

    let mosaic = read_geotiff(&path).unwrap();
    assert_eq!(mosaic.width(), expected.canvas_width);
    assert_eq!(mosaic.height(), expected.canvas_height);
    // ceil(300 / 256) = 2 padding tiles on each side
    assert!(mosaic.width() >= 1000 + 2 * 2 * TILE);
    assert_eq!(mosaic.crs(), RD_NEW);
    assert!((mosaic.transform().origin_x - expected.transform.origin_x).abs() < 1e-6);
    assert!((mosaic.transform().origin_y - expected.transform.origin_y).abs() < 1e-6);

    for tile in expected.tiles() {
        let w = expected.window(tile).unwrap();
        assert_eq!(mosaic.pixel(w.x, w.y), Some(colour(tile)));
        assert_eq!(
            mosaic.pixel(w.x + w.width - 1, w.y + w.height - 1),
            Some(colour(tile))
        );
    }

    assert!(scratch_dirs(&out.path().join("2015")).is_empty());
    assert!(sink.lines().iter().all(|l| l.starts_with("[utrecht/2015]")));
}

#[tokio::test]
async fn test_city_sized_build_is_padded_and_clean() {
    let out = tempfile::tempdir().unwrap();
    let builder = builder(1.0, SolidTilesFactory::default(), Arc::new(MemoryLogger::new()));

    let bbox = BoundingBox::from_origin(139_267.0, 456_844.0, 4000.0, 4000.0);
    let request = MosaicRequest::new("utrecht", 2015, bbox)
        .with_padding(1200.0)
        .with_output_dir(out.path());
    let path = builder.build(&request).await.unwrap().path().clone();

    let matrix = builder.resolver().resolve(2015, 1.0).await.unwrap();
    let expected = plan(&bbox, &matrix, 1200.0, 1.0).unwrap();

    let mosaic = read_geotiff(&path).unwrap();
    // ceil(1200 / 256) = 5 padding tiles on each side
    assert!(mosaic.width() >= 4000 + 2 * 5 * TILE);
    assert!(mosaic.height() >= 4000 + 2 * 5 * TILE);

    let width = mosaic.width() as usize;
    for (i, px) in mosaic.data().chunks_exact(3).enumerate() {
        let (x, y) = ((i % width) as i64, (i / width) as i64);
        let tile = TileIndex::new(
            expected.min_row + y / TILE as i64,
            expected.min_col + x / TILE as i64,
        );
        assert!(px == colour(tile) || px == [0, 0, 0], "pixel ({x}, {y}) is {px:?}");
    }
    assert!(scratch_dirs(&out.path().join("2015")).is_empty());
}

#[tokio::test]
async fn test_warp_build_resamples_to_requested_pixel_size() {
    let out = tempfile::tempdir().unwrap();
    // Service tiles at 0.5 m, mosaic at 1 m
    let builder = builder(0.5, SolidTilesFactory::default(), Arc::new(MemoryLogger::new()));

    let bbox = BoundingBox::from_origin(139_267.0, 456_844.0, 500.0, 500.0);
    let request = MosaicRequest::new("utrecht", 2020, bbox)
        .with_padding(0.0)
        .with_output_dir(out.path());
    let outcome = builder.build(&request).await.unwrap();
    let path = outcome.path().clone();

    let matrix = builder.resolver().resolve(2020, 1.0).await.unwrap();
    let source_plan = plan(&bbox, &matrix, 0.0, 1.0).unwrap();
    let source_extent = source_plan.canvas_width as f64 * 0.5;

    let mosaic = read_geotiff(&path).unwrap();
    assert!((mosaic.transform().pixel_width - 1.0).abs() < 1e-9);
    assert!((mosaic.transform().pixel_height + 1.0).abs() < 1e-9);
    assert!((mosaic.width() as f64 - source_extent).abs() <= 1.0);
    assert!(mosaic.width() >= 500);
    assert!(scratch_dirs(&out.path().join("2020")).is_empty());

    let centre = mosaic.pixel(mosaic.width() / 2, mosaic.height() / 2).unwrap();
    assert_ne!(centre, [0, 0, 0]);
}

#[tokio::test]
async fn test_warp_timeout_is_fatal_and_leaves_no_scratch() {
    let out = tempfile::tempdir().unwrap();
    let builder = builder(0.5, SolidTilesFactory::default(), Arc::new(MemoryLogger::new()))
        .with_postprocess_config(PostprocessConfig::default().with_warp_timeout(Duration::ZERO));

    let bbox = BoundingBox::from_origin(139_267.0, 456_844.0, 100.0, 100.0);
    let request = MosaicRequest::new("utrecht", 2020, bbox)
        .with_padding(0.0)
        .with_pixel_size(0.1)
        .with_output_dir(out.path());
    let err = builder.build(&request).await.unwrap_err();

    assert!(matches!(err, MosaicError::TimeoutExceeded(_)), "{err}");
    let year_dir = out.path().join("2020");
    assert!(scratch_dirs(&year_dir).is_empty());
    assert!(!request.output_path().exists());

    // A cancelled warp must not write anything once the error is returned
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(scratch_dirs(&year_dir).is_empty());
    assert_eq!(std::fs::read_dir(&year_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unsupported_year_fails_before_any_request() {
    let out = tempfile::tempdir().unwrap();
    let factory = SolidTilesFactory::default();
    let requests = Arc::clone(&factory.requests);
    let builder = builder(1.0, factory, Arc::new(MemoryLogger::new()));

    let request = MosaicRequest::new("utrecht", 2010, utrecht()).with_output_dir(out.path());
    let err = builder.build(&request).await.unwrap_err();

    assert!(matches!(
        err,
        MosaicError::Matrix(MatrixError::UnsupportedYear(2010))
    ));
    assert_eq!(requests.load(Ordering::SeqCst), 0);
    assert!(!out.path().join("2010").exists());
}

#[tokio::test]
async fn test_unavailable_tiles_still_produce_a_mosaic() {
    let out = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemoryLogger::new());
    let factory = SolidTilesFactory {
        unavailable: true,
        ..Default::default()
    };
    let requests = Arc::clone(&factory.requests);
    let retry = RetryPolicy::new()
        .with_max_retries(2)
        .with_base_delay(Duration::from_millis(10));
    let builder = builder(1.0, factory, sink.clone())
        .with_fetch_config(FetchConfig::new().with_retry(retry));

    let request = MosaicRequest::new("utrecht", 2015, utrecht())
        .with_padding(0.0)
        .with_output_dir(out.path());
    let MosaicOutcome::Built { path, report } = builder.build(&request).await.unwrap() else {
        panic!("expected a new build");
    };

    assert_eq!(report.fetched, 0);
    assert_eq!(report.failed.len(), report.planned);
    assert!(report.failed.iter().all(|f| f.attempts == 3));
    assert_eq!(requests.load(Ordering::SeqCst), 3 * report.planned);
    assert!(sink.count(LogLevel::Warn) >= report.planned);

    let mosaic = read_geotiff(&path).unwrap();
    assert!(mosaic.data().iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_existing_mosaic_is_kept_unless_forced() {
    let out = tempfile::tempdir().unwrap();
    let factory = SolidTilesFactory::default();
    let requests = Arc::clone(&factory.requests);
    let builder = builder(1.0, factory, Arc::new(MemoryLogger::new()));

    let request = MosaicRequest::new("utrecht", 2015, utrecht())
        .with_padding(0.0)
        .with_output_dir(out.path());
    builder.build(&request).await.unwrap();
    let first = requests.load(Ordering::SeqCst);

    let again = builder.build(&request).await.unwrap();
    assert!(matches!(again, MosaicOutcome::AlreadyExists(_)));
    assert_eq!(requests.load(Ordering::SeqCst), first);

    let forced = builder.build(&request.clone().with_force(true)).await.unwrap();
    assert!(matches!(forced, MosaicOutcome::Built { .. }));
    assert_eq!(requests.load(Ordering::SeqCst), 2 * first);
}
