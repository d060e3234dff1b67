//! Custom validation functions for configuration.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use validator::ValidationError;

use crate::control::{AssetRoute, TlsConfig, RESERVED_ROUTES};

/// Speed multipliers must be finite; zero and negative values are allowed.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_finite"))
    }
}

pub fn validate_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error", "off"]
        .contains(&level.to_ascii_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

fn route_pattern() -> Result<&'static Regex, ValidationError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(r"^/[A-Za-z0-9._~!$&'()*+,;=:@%/-]*$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    Ok(PATTERN.get_or_init(|| re))
}

/// Segments the router would read as captures or wildcards.
fn is_capture_segment(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('*')
}

/// Asset routes must name a file and map to a literal URL path. They may not
/// shadow the built-in endpoints or repeat.
pub fn validate_assets(assets: &[AssetRoute]) -> Result<(), ValidationError> {
    let re = route_pattern()?;
    let mut seen = HashSet::new();
    for asset in assets {
        if asset.file.as_os_str().is_empty() {
            return Err(ValidationError::new("empty_asset_file"));
        }
        let route = asset.route_path();
        if !re.is_match(&route) {
            return Err(ValidationError::new("invalid_asset_path"));
        }
        if route.split('/').any(is_capture_segment) {
            return Err(ValidationError::new("capture_asset_path"));
        }
        if RESERVED_ROUTES.contains(&route.as_str()) {
            return Err(ValidationError::new("reserved_asset_path"));
        }
        if !seen.insert(route) {
            return Err(ValidationError::new("duplicate_asset_path"));
        }
    }
    Ok(())
}

pub fn validate_tls(tls: &TlsConfig) -> Result<(), ValidationError> {
    if tls.cert.as_os_str().is_empty() || tls.key.as_os_str().is_empty() {
        return Err(ValidationError::new("tls_cert_and_key_required"));
    }
    Ok(())
}
