//! AWS Signature Version 4 request signing for S3.
//!
//! Covers exactly the subset needed to PUT an object: a single-chunk payload,
//! no query string, and the `host`, `x-amz-content-sha256`, and `x-amz-date`
//! signed headers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::macros::format_description;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Inputs required to sign one S3 request.
pub(crate) struct SigningParams<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub host: &'a str,
    pub method: &'a str,
    pub canonical_uri: &'a str,
    pub payload_hash: &'a str,
    pub timestamp: OffsetDateTime,
}

/// Header values produced by the signing step.
pub(crate) struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
}

/// Hex-encoded SHA-256 digest of a byte payload.
pub(crate) fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Percent-encode an object key for use as a canonical URI path.
///
/// Unreserved characters and `/` pass through; everything else is encoded
/// byte-wise, per the SigV4 canonical request rules.
pub(crate) fn uri_encode_path(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push('%');
                encoded.push_str(&format!("{other:02X}"));
            }
        }
    }
    encoded
}

/// Produce the `Authorization` and `x-amz-date` header values for a request.
pub(crate) fn sign_request(params: &SigningParams<'_>) -> SignedHeaders {
    let amz_date = params
        .timestamp
        .format(format_description!(
            "[year][month][day]T[hour][minute][second]Z"
        ))
        .expect("static timestamp format");
    let date_stamp = params
        .timestamp
        .format(format_description!("[year][month][day]"))
        .expect("static date format");

    let canonical_request = format!(
        "{method}\n{uri}\n\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{payload_hash}",
        method = params.method,
        uri = params.canonical_uri,
        host = params.host,
        payload_hash = params.payload_hash,
    );

    let scope = format!("{date_stamp}/{}/{SERVICE}/aws4_request", params.region);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(params.secret_key, &date_stamp, params.region);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        params.access_key
    );

    SignedHeaders {
        authorization,
        amz_date,
    }
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str) -> Vec<u8> {
    let secret = format!("AWS4{secret_key}");
    let date_key = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
    let region_key = hmac_sha256(&date_key, region.as_bytes());
    let service_key = hmac_sha256(&region_key, SERVICE.as_bytes());
    hmac_sha256(&service_key, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
