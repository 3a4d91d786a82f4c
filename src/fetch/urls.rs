// src/fetch/urls.rs
use url::Url;

use crate::config::{ConfigError, SourceConfig};
use crate::window::FetchUnit;

/// File name of one monthly resource, e.g. `green_tripdata_2024-03.parquet`.
pub fn resource_name(source: &SourceConfig, unit: &FetchUnit) -> String {
    format!(
        "{}_{}_{:04}-{:02}.{}",
        unit.variant,
        source.dataset,
        unit.year,
        unit.month,
        source.format.extension()
    )
}

/// Parse the configured base location as a directory URL.
pub fn base_url(source: &SourceConfig) -> Result<Url, ConfigError> {
    let mut raw = source.base_url.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ConfigError::BaseUrl {
        url: source.base_url.clone(),
        source: e,
    })
}

/// Full URL of one monthly resource under `base`. The name is appended as a
/// single percent-encoded path segment, so it can never leave `base`.
pub fn resource_url(
    base: &Url,
    source: &SourceConfig,
    unit: &FetchUnit,
) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push(&resource_name(source, unit));
    Ok(url)
}
