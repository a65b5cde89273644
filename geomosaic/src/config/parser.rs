//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::geo::{Crs, RD_NEW};
use crate::matrix::{Delivery, ServiceTemplate, YearRange, ZoomSelection};

const SERVICE_PREFIX: &str = "service.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [imagery] section
    if let Some(section) = ini.section(Some("imagery")) {
        let s = "imagery";
        if let Some(v) = section.get("pixel_size") {
            config.imagery.pixel_size = positive(s, "pixel_size", v)?;
        }
        if let Some(v) = section.get("padding") {
            config.imagery.padding = parse(s, "padding", v, "must be a number of metres")?;
            if config.imagery.padding < 0.0 {
                return Err(invalid(s, "padding", v, "must not be negative"));
            }
        }
        if let Some(v) = section.get("target_crs") {
            config.imagery.target_crs = parse_crs(s, "target_crs", v)?;
        }
        if let Some(v) = section.get("resampling") {
            config.imagery.resampling =
                parse(s, "resampling", v, "must be 'bilinear' or 'nearest'")?;
        }
        if let Some(v) = section.get("output_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.imagery.output_dir = expand_tilde(v);
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        let s = "download";
        let d = &mut config.download;
        if let Some(v) = section.get("workers") {
            d.workers = parse(s, "workers", v, "must be a positive integer")?;
            if d.workers == 0 {
                return Err(invalid(s, "workers", v, "must be at least 1"));
            }
        }
        if let Some(v) = section.get("max_retries") {
            d.max_retries = parse(s, "max_retries", v, "must be a non-negative integer")?;
        }
        if let Some(v) = section.get("backoff_base_ms") {
            d.backoff_base_ms = parse(s, "backoff_base_ms", v, "must be milliseconds")?;
        }
        if let Some(v) = section.get("backoff_factor") {
            d.backoff_factor = parse(s, "backoff_factor", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("backoff_max_secs") {
            d.backoff_max_secs = parse(s, "backoff_max_secs", v, "must be seconds")?;
        }
        if let Some(v) = section.get("pacing_ms") {
            d.pacing_ms = parse(s, "pacing_ms", v, "must be milliseconds")?;
        }
        if let Some(v) = section.get("request_timeout_secs") {
            d.request_timeout_secs =
                parse(s, "request_timeout_secs", v, "must be a positive integer (seconds)")?;
        }
    }

    // [postprocess] section
    if let Some(section) = ini.section(Some("postprocess")) {
        if let Some(v) = section.get("warp_timeout_secs") {
            config.postprocess.warp_timeout_secs = parse(
                "postprocess",
                "warp_timeout_secs",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [patches] section
    if let Some(section) = ini.section(Some("patches")) {
        let s = "patches";
        if let Some(v) = section.get("width") {
            config.patches.width = positive(s, "width", v)?;
        }
        if let Some(v) = section.get("height") {
            config.patches.height = positive(s, "height", v)?;
        }
        if let Some(v) = section.get("compress") {
            config.patches.compress = parse_bool(s, "compress", v)?;
        }
        if let Some(v) = section.get("jpeg_quality") {
            let q: u8 = parse(s, "jpeg_quality", v, "must be between 1 and 100")?;
            if !(1..=100).contains(&q) {
                return Err(invalid(s, "jpeg_quality", v, "must be between 1 and 100"));
            }
            config.patches.jpeg_quality = q;
        }
        if let Some(v) = section.get("overwrite") {
            config.patches.overwrite = parse_bool(s, "overwrite", v)?;
        }
    }

    // [labels] section
    if let Some(section) = ini.section(Some("labels")) {
        if let Some(v) = section.get("wfs_url") {
            let v = v.trim();
            if !v.is_empty() {
                config.labels.wfs_url = v.to_string();
            }
        }
        if let Some(v) = section.get("page_size") {
            config.labels.page_size = parse("labels", "page_size", v, "must be a positive integer")?;
            if config.labels.page_size == 0 {
                return Err(invalid("labels", "page_size", v, "must be at least 1"));
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("stdout") {
            config.logging.stdout = parse_bool("logging", "stdout", v)?;
        }
    }

    // [service.<name>] sections
    for (name, props) in ini.iter() {
        let Some(service) = name.and_then(|n| n.strip_prefix(SERVICE_PREFIX)) else {
            continue;
        };
        let section = format!("{SERVICE_PREFIX}{service}");
        let base = config.catalog.template(service).cloned();
        let template = parse_service(&section, service, props, base)?;
        let years = template.years.to_string();
        config
            .catalog
            .upsert(template)
            .map_err(|e| invalid(&section, "years", &years, &e.to_string()))?;
    }

    Ok(config)
}

/// Overlay a `[service.<name>]` section onto the built-in service of the same
/// name, or build a new one when there is none.
fn parse_service(
    section: &str,
    name: &str,
    props: &Properties,
    base: Option<ServiceTemplate>,
) -> Result<ServiceTemplate, ConfigFileError> {
    let is_new = base.is_none();
    let required = |key: &str| -> Result<String, ConfigFileError> {
        props
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid(section, key, "", "required for a new service"))
    };

    let mut template = match base {
        Some(t) => t,
        None => ServiceTemplate {
            name: name.to_string(),
            years: parse(section, "years", &required("years")?, "expected '2016' or '2016-2023'")?,
            endpoint: required("endpoint")?,
            layer: required("layer")?,
            tile_matrix_set: required("tile_matrix_set")?,
            crs: RD_NEW,
            zoom: ZoomSelection::Fixed(String::new()),
            format: "image/jpeg".to_string(),
            delivery: Delivery::Warp,
        },
    };

    if let Some(v) = props.get("years") {
        template.years = parse::<YearRange>(section, "years", v, "expected '2016' or '2016-2023'")?;
    }
    for (key, field) in [
        ("endpoint", &mut template.endpoint),
        ("layer", &mut template.layer),
        ("tile_matrix_set", &mut template.tile_matrix_set),
        ("format", &mut template.format),
    ] {
        if let Some(v) = props.get(key).map(str::trim).filter(|v| !v.is_empty()) {
            *field = v.to_string();
        }
    }
    if let Some(v) = props.get("crs") {
        template.crs = parse_crs(section, "crs", v)?;
    }
    if let Some(v) = props.get("delivery") {
        template.delivery = parse(section, "delivery", v, "must be 'rename' or 'warp'")?;
    }

    match (props.get("zoom"), props.get("zoom_thresholds")) {
        (Some(_), Some(v)) => {
            return Err(invalid(
                section,
                "zoom_thresholds",
                v,
                "set either zoom or zoom_thresholds, not both",
            ))
        }
        (Some(v), None) => {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid(section, "zoom", v, "must not be empty"));
            }
            template.zoom = ZoomSelection::Fixed(v.to_string());
        }
        (None, Some(v)) => {
            template.zoom = ZoomSelection::parse_thresholds(v)
                .map_err(|reason| invalid(section, "zoom_thresholds", v, &reason))?;
        }
        (None, None) if is_new => {
            return Err(invalid(section, "zoom", "", "required for a new service"));
        }
        (None, None) => {}
    }

    Ok(template)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn positive(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let v: f64 = parse(section, key, value, "must be a positive number")?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(invalid(section, key, value, "must be a positive number"))
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn parse_crs(section: &str, key: &str, value: &str) -> Result<Crs, ConfigFileError> {
    let crs: Crs = parse(section, key, value, "expected an EPSG code such as 28992")?;
    if crs.proj_string().is_none() {
        return Err(invalid(section, key, value, "unknown EPSG code"));
    }
    Ok(crs)
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
