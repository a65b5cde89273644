//! Fetch planning.
//!
//! [`plan`] converts a bounding box, already expressed in the tile matrix CRS,
//! into the rectangular tile range that covers it plus a padding margin, and
//! the pixel size and geotransform of the canvas those tiles assemble into.
//! It is pure arithmetic.
//!
//! Tile `(row, col)` lands in the canvas window starting at
//! `((col - min_col) * tile_width, (row - min_row) * tile_height)`. Windows
//! of distinct tiles never overlap, which is what lets the fetcher write them
//! concurrently.

mod types;

pub use types::{FetchPlan, PixelWindow, PlanError, TileIndex};

use crate::geo::{BoundingBox, GeoTransform};
use crate::matrix::TileMatrixDescriptor;

/// Plan the tiles covering `bbox` with `padding_m` extra on every side.
///
/// * The tile pixel ground size is `scale_denominator × 0.00028`.
/// * Corner tiles come from floor division of the corner offsets from the
///   matrix origin; rows grow southwards.
/// * The range is normalized, then made half-open by adding one to the max.
/// * Padding becomes `ceil(padding_m / (tile_width × pixel_size_m))` whole
///   tiles, removed from the min and added to the max on both axes.
/// * The canvas origin sits half a tile pixel inside the top-left corner of
///   tile `(min_row, min_col)`.
pub fn plan(
    bbox: &BoundingBox,
    matrix: &TileMatrixDescriptor,
    padding_m: f64,
    pixel_size_m: f64,
) -> Result<FetchPlan, PlanError> {
    if !(pixel_size_m.is_finite() && pixel_size_m > 0.0) {
        return Err(PlanError::InvalidParameter(format!(
            "pixel size must be positive, got {pixel_size_m}"
        )));
    }
    if !(padding_m.is_finite() && padding_m >= 0.0) {
        return Err(PlanError::InvalidParameter(format!(
            "padding must be non-negative, got {padding_m}"
        )));
    }
    let coords = [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(PlanError::InvalidParameter(format!(
            "bounding box {bbox} is not finite"
        )));
    }

    let tile_pixel = matrix.tile_pixel_size();
    let (tl_x, tl_y) = matrix.top_left();
    let tile_width = matrix.tile_width();
    let tile_height = matrix.tile_height();
    let span_x = tile_pixel * tile_width as f64;
    let span_y = -tile_pixel * tile_height as f64;

    let col_of = |x: f64| ((x - tl_x) / span_x).floor();
    let row_of = |y: f64| ((y - tl_y) / span_y).floor();

    let (c0, c1) = (col_of(bbox.min_x), col_of(bbox.max_x));
    let (r0, r1) = (row_of(bbox.min_y), row_of(bbox.max_y));

    let pad = (padding_m / (tile_width as f64 * pixel_size_m)).ceil();

    let min_col = to_index(c0.min(c1) - pad)?;
    let max_col = to_index(c0.max(c1) + 1.0 + pad)?;
    let min_row = to_index(r0.min(r1) - pad)?;
    let max_row = to_index(r0.max(r1) + 1.0 + pad)?;

    let canvas_width = canvas_extent(max_col - min_col, tile_width)?;
    let canvas_height = canvas_extent(max_row - min_row, tile_height)?;

    let transform = GeoTransform::new(
        (min_col as f64 * tile_width as f64 + 0.5) * tile_pixel + tl_x,
        (min_row as f64 * tile_height as f64 + 0.5) * -tile_pixel + tl_y,
        tile_pixel,
        -tile_pixel,
    );

    Ok(FetchPlan {
        min_row,
        max_row,
        min_col,
        max_col,
        tile_width,
        tile_height,
        canvas_width,
        canvas_height,
        transform,
        crs: matrix.crs,
    })
}

fn to_index(value: f64) -> Result<i64, PlanError> {
    const LIMIT: f64 = (1u64 << 52) as f64;
    if value.is_finite() && value.abs() < LIMIT {
        Ok(value as i64)
    } else {
        Err(PlanError::InvalidParameter(format!(
            "tile index {value} out of range"
        )))
    }
}

fn canvas_extent(tiles: i64, tile_px: u32) -> Result<u32, PlanError> {
    u32::try_from(tiles)
        .ok()
        .and_then(|t| t.checked_mul(tile_px))
        .ok_or(PlanError::CanvasTooLarge { tiles, tile_px })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::types::fixtures::one_metre_descriptor;
    use proptest::prelude::*;

    fn utrecht() -> BoundingBox {
        BoundingBox::from_origin(139_267.0, 456_844.0, 4000.0, 4000.0)
    }

    #[test]
    fn test_plan_without_padding_covers_bbox() {
        let matrix = one_metre_descriptor();
        let p = plan(&utrecht(), &matrix, 0.0, 1.0).unwrap();

        let (min_x, min_y, max_x, max_y) = p.transform.bounds(p.canvas_width, p.canvas_height);
        let bbox = utrecht();
        assert!(min_x <= bbox.min_x && max_x >= bbox.max_x);
        assert!(min_y <= bbox.min_y && max_y >= bbox.max_y);
        // 4000 m at 256 m per tile touches 16 or 17 columns
        assert!((16..=17).contains(&(p.max_col - p.min_col)));
    }

    #[test]
    fn test_plan_known_indices() {
        let matrix = one_metre_descriptor();
        let p = plan(&utrecht(), &matrix, 0.0, 1.0).unwrap();
        // (139267 + 285401.92) / 256 = 1658.86
        assert_eq!(p.min_col, 1658);
        // (903401.92 - 460844) / 256 = 1728.74
        assert_eq!(p.min_row, 1728);
        // (903401.92 - 456844) / 256 = 1744.37, plus one
        assert_eq!(p.max_row, 1745);
    }

    #[test]
    fn test_padding_adds_whole_tiles_on_both_sides() {
        let matrix = one_metre_descriptor();
        let bare = plan(&utrecht(), &matrix, 0.0, 1.0).unwrap();
        let padded = plan(&utrecht(), &matrix, 1200.0, 1.0).unwrap();
        // ceil(1200 / 256) = 5
        assert_eq!(bare.min_col - padded.min_col, 5);
        assert_eq!(padded.max_col - bare.max_col, 5);
        assert_eq!(bare.min_row - padded.min_row, 5);
        assert_eq!(padded.max_row - bare.max_row, 5);
        assert!(padded.canvas_width >= 4000 + 2 * 5 * 256);
        assert!(padded.canvas_height >= 4000 + 2 * 5 * 256);
    }

    #[test]
    fn test_transform_is_center_adjusted() {
        let matrix = one_metre_descriptor();
        let p = plan(&utrecht(), &matrix, 0.0, 1.0).unwrap();
        let corner_x = -285_401.92 + p.min_col as f64 * 256.0;
        let corner_y = 903_401.92 - p.min_row as f64 * 256.0;
        assert!((p.transform.origin_x - (corner_x + 0.5)).abs() < 1e-6);
        assert!((p.transform.origin_y - (corner_y - 0.5)).abs() < 1e-6);
        assert!((p.transform.pixel_width - 1.0).abs() < 1e-9);
        assert!((p.transform.pixel_height + 1.0).abs() < 1e-9);
        assert_eq!(p.crs, matrix.crs);
    }

    #[test]
    fn test_degenerate_bbox_yields_one_tile() {
        let matrix = one_metre_descriptor();
        let point = BoundingBox::new(139_300.0, 456_900.0, 139_300.0, 456_900.0);
        let p = plan(&point, &matrix, 0.0, 1.0).unwrap();
        assert_eq!(p.tile_count(), 1);
        assert_eq!((p.canvas_width, p.canvas_height), (256, 256));
    }

    #[test]
    fn test_invalid_parameters() {
        let matrix = one_metre_descriptor();
        assert!(plan(&utrecht(), &matrix, 0.0, 0.0).is_err());
        assert!(plan(&utrecht(), &matrix, -1.0, 1.0).is_err());
        assert!(plan(&utrecht(), &matrix, f64::NAN, 1.0).is_err());
        let huge = BoundingBox::new(-1e12, -1e12, 1e12, 1e12);
        assert!(matches!(
            plan(&huge, &matrix, 0.0, 1.0),
            Err(PlanError::CanvasTooLarge { .. })
        ));
    }

    fn arb_bbox() -> impl Strategy<Value = BoundingBox> {
        (
            -7_000.0f64..300_000.0,
            289_000.0f64..629_000.0,
            0.0f64..20_000.0,
            0.0f64..20_000.0,
        )
            .prop_map(|(x, y, w, h)| BoundingBox::from_origin(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_ranges_are_ordered_and_canvas_matches(
            bbox in arb_bbox(),
            padding in 0.0f64..5_000.0,
            pixel in 0.1f64..4.0,
        ) {
            let p = plan(&bbox, &one_metre_descriptor(), padding, pixel).unwrap();
            prop_assert!(p.min_row < p.max_row);
            prop_assert!(p.min_col < p.max_col);
            prop_assert_eq!(p.canvas_width as i64, 256 * (p.max_col - p.min_col));
            prop_assert_eq!(p.canvas_height as i64, 256 * (p.max_row - p.min_row));
        }

        #[test]
        fn prop_padding_is_monotonic(
            bbox in arb_bbox(),
            padding in 0.0f64..5_000.0,
            extra in 0.0f64..5_000.0,
            pixel in 0.1f64..4.0,
        ) {
            let matrix = one_metre_descriptor();
            let a = plan(&bbox, &matrix, padding, pixel).unwrap();
            let b = plan(&bbox, &matrix, padding + extra, pixel).unwrap();
            prop_assert!(b.max_col - b.min_col >= a.max_col - a.min_col);
            prop_assert!(b.max_row - b.min_row >= a.max_row - a.min_row);
            prop_assert!(b.min_col <= a.min_col && b.max_col >= a.max_col);
        }

        #[test]
        fn prop_tile_windows_are_disjoint_and_inside(
            x in 100_000.0f64..200_000.0,
            y in 400_000.0f64..500_000.0,
            w in 0.0f64..2_000.0,
            h in 0.0f64..2_000.0,
            padding in 0.0f64..600.0,
        ) {
            let bbox = BoundingBox::from_origin(x, y, w, h);
            let p = plan(&bbox, &one_metre_descriptor(), padding, 1.0).unwrap();
            let windows: Vec<PixelWindow> = p.tiles().map(|t| p.window(t).unwrap()).collect();
            prop_assert_eq!(windows.len(), p.tile_count());
            for (i, a) in windows.iter().enumerate() {
                prop_assert!(a.x + a.width <= p.canvas_width);
                prop_assert!(a.y + a.height <= p.canvas_height);
                for b in &windows[i + 1..] {
                    prop_assert!(!a.intersects(b));
                }
            }
        }
    }
}
