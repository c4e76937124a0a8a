use std::time::Duration;

use super::types::{EndpointArg, PositiveUsize};
use crate::config::parse_duration_value;
use crate::error::{AppError, AppResult, ValidationError};
use crate::scan::MAX_PAGE_SIZE;

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

/// Parses a list page size in `1..=1000`.
pub(crate) fn parse_page_size(s: &str) -> Result<u32, ValidationError> {
    let value: u32 = s
        .trim()
        .parse()
        .map_err(|err| ValidationError::InvalidNumber { source: err })?;
    check_page_size(value)
}

pub(crate) fn check_page_size(value: u32) -> Result<u32, ValidationError> {
    if value == 0 {
        return Err(ValidationError::ValueTooSmall { min: 1 });
    }
    if value > MAX_PAGE_SIZE {
        return Err(ValidationError::ValueTooLarge {
            max: u64::from(MAX_PAGE_SIZE),
        });
    }
    Ok(value)
}

/// Parses `REGION=URL`. The URL itself is validated when endpoints are resolved.
pub(crate) fn parse_endpoint(s: &str) -> Result<EndpointArg, ValidationError> {
    let Some((region, url)) = s.split_once('=') else {
        return Err(ValidationError::InvalidEndpointFormat {
            value: s.to_owned(),
        });
    };
    let region = region.trim();
    let url = url.trim();
    if region.is_empty() {
        return Err(ValidationError::EndpointRegionEmpty {
            value: s.to_owned(),
        });
    }
    if url.is_empty() {
        return Err(ValidationError::InvalidEndpointFormat {
            value: s.to_owned(),
        });
    }
    Ok(EndpointArg {
        region: region.to_owned(),
        url: url.to_owned(),
    })
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::from)
}
