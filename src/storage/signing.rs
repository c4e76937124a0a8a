use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest, SigningSettings,
    UriPathNormalizationMode, sign,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::error::{StorageError, StorageResult};

const SERVICE_NAME: &str = "s3";

/// Signs a body-less S3 request and returns the headers to attach to it.
pub(super) fn signed_headers(
    method: &Method,
    url: &Url,
    credentials: &Credentials,
    region: &str,
) -> StorageResult<HeaderMap> {
    let identity: Identity = credentials.clone().into();
    let mut signing_settings = SigningSettings::default();
    signing_settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
    signing_settings.percent_encoding_mode = PercentEncodingMode::Single;
    signing_settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;
    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SERVICE_NAME)
        .time(std::time::SystemTime::now())
        .settings(signing_settings)
        .build()
        .map_err(|err| StorageError::SigV4Params {
            source: Box::new(err),
        })?
        .into();

    let signable = SignableRequest::new(
        method.as_str(),
        url.as_str(),
        std::iter::empty(),
        SignableBody::Bytes(&[]),
    )
    .map_err(|err| StorageError::SigV4Request {
        source: Box::new(err),
    })?;

    let (instructions, _signature) = sign(signable, &signing_params)
        .map_err(|err| StorageError::SigV4Sign {
            source: Box::new(err),
        })?
        .into_parts();

    let mut http_req = http::Request::builder()
        .method(method.as_str())
        .uri(url.as_str())
        .body(())
        .map_err(|err| StorageError::SigV4BuildSign {
            source: Box::new(err),
        })?;
    instructions.apply_to_request_http1x(&mut http_req);

    Ok(http_req.headers().clone())
}
