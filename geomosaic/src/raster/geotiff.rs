//! Minimal GeoTIFF support: baseline RGB8 TIFF plus the GeoKey tags needed to
//! carry a north-up transform and an EPSG code.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::ColorType;

use super::{Raster, RasterError};
use crate::geo::{Crs, GeoTransform};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_PROJECTED: u16 = 1;
const MODEL_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Write `raster` as a GeoTIFF. `citation` lands in GeoAsciiParams, usually
/// the WKT of the reference system.
pub fn write_geotiff(
    raster: &Raster,
    path: impl AsRef<Path>,
    citation: Option<&str>,
) -> Result<(), RasterError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, citation)?;
    writer.flush()?;
    Ok(())
}

pub fn encode_geotiff<W: Write + Seek>(
    raster: &Raster,
    writer: W,
    citation: Option<&str>,
) -> Result<(), RasterError> {
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<colortype::RGB8>(raster.width(), raster.height())?;

    let t = raster.transform();
    let scale = [t.pixel_width, -t.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let ascii = citation.map(|c| format!("{c}|"));
    let keys = geo_keys(raster.crs(), ascii.as_deref());

    let dir = image.encoder();
    dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])?;
    dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])?;
    dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), keys.as_slice())?;
    if let Some(ascii) = ascii.as_deref() {
        dir.write_tag(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS), ascii)?;
    }

    image.write_data(raster.data())?;
    Ok(())
}

/// GeoKeyDirectory: a 4-entry header followed by key entries sorted by id.
fn geo_keys(crs: Crs, ascii: Option<&str>) -> Vec<u16> {
    let code = u16::try_from(crs.code()).ok();
    let geographic = crs.is_geographic();

    let mut entries: Vec<[u16; 4]> = vec![
        [
            GT_MODEL_TYPE,
            0,
            1,
            if geographic { MODEL_GEOGRAPHIC } else { MODEL_PROJECTED },
        ],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
    ];
    if let Some(ascii) = ascii {
        let len = u16::try_from(ascii.len()).unwrap_or(u16::MAX);
        entries.push([GT_CITATION, GEO_ASCII_PARAMS, len, 0]);
    }
    if let Some(code) = code {
        let key = if geographic { GEOGRAPHIC_TYPE } else { PROJECTED_CS_TYPE };
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

/// Read an 8-bit RGB or RGBA GeoTIFF. Alpha is dropped.
pub fn read_geotiff(path: impl AsRef<Path>) -> Result<Raster, RasterError> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

pub fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster, RasterError> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;

    let channels = match decoder.colortype()? {
        ColorType::RGB(8) => 3,
        ColorType::RGBA(8) => 4,
        other => {
            return Err(RasterError::Unsupported(format!(
                "colour type {other:?}, expected 8-bit RGB"
            )))
        }
    };

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .map_err(|_| RasterError::Georeference("no ModelPixelScale tag".into()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .map_err(|_| RasterError::Georeference("no ModelTiepoint tag".into()))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RasterError::Georeference(
            "truncated ModelPixelScale or ModelTiepoint".into(),
        ));
    }
    let transform = GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    );

    let keys = decoder
        .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .map_err(|_| RasterError::Georeference("no GeoKeyDirectory tag".into()))?;
    let crs = crs_from_keys(&keys)
        .ok_or_else(|| RasterError::Georeference("no EPSG code in GeoKeyDirectory".into()))?;

    let data = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf,
        _ => return Err(RasterError::Unsupported("non-8-bit samples".into())),
    };
    let data = if channels == 4 {
        data.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
    } else {
        data
    };

    Raster::new(width, height, data, transform, crs)
}

fn crs_from_keys(keys: &[u16]) -> Option<Crs> {
    let count = *keys.get(3)? as usize;
    keys.get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| {
            (entry[0] == PROJECTED_CS_TYPE || entry[0] == GEOGRAPHIC_TYPE) && entry[1] == 0
        })
        .map(|entry| Crs(u32::from(entry[3])))
}
