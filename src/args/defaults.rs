use super::types::EndpointArg;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("bucketstat/", env!("CARGO_PKG_VERSION"));

/// IONOS S3 endpoints scanned when neither CLI nor config names any.
const DEFAULT_ENDPOINTS: [(&str, &str); 2] = [
    ("eu-central-2", "https://s3-eu-central-2.ionoscloud.com"),
    ("de", "https://s3-eu-central-1.ionoscloud.com"),
];

#[must_use]
pub fn default_endpoints() -> Vec<EndpointArg> {
    DEFAULT_ENDPOINTS
        .iter()
        .map(|(region, url)| EndpointArg {
            region: (*region).to_owned(),
            url: (*url).to_owned(),
        })
        .collect()
}
