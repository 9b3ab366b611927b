use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    config::StorageConfig,
    db::new_id,
    error::{AppError, AppResult},
};

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "video/mp4"];
pub const UPLOAD_URL_TTL_SECS: u32 = 300;

const REGION: &str = "auto";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "content-type;host";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    pub upload_url: String,
    pub public_url: String,
    pub key: String,
}

/// Issues SigV4 query-signed PUT URLs against an S3-compatible bucket.
#[derive(Clone, Debug)]
pub struct Presigner {
    config: StorageConfig,
}

impl Presigner {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn host(&self) -> String {
        format!("{}.r2.cloudflarestorage.com", self.config.account_id)
    }

    pub fn upload_url(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
    ) -> AppResult<UploadTicket> {
        self.upload_url_at(user_id, filename, content_type, Utc::now())
    }

    pub fn upload_url_at(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> AppResult<UploadTicket> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(AppError::bad_request(format!(
                "Content type {content_type} is not allowed"
            )));
        }

        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin");
        let key = format!("media/{user_id}/{}.{ext}", new_id());

        let upload_url = self.presign_put(&key, content_type, now)?;
        let public_url = if self.config.public_url.is_empty() {
            upload_url
                .split_once('?')
                .map(|(base, _)| base.to_string())
                .unwrap_or_else(|| upload_url.clone())
        } else {
            format!("{}/{key}", self.config.public_url.trim_end_matches('/'))
        };

        Ok(UploadTicket {
            upload_url,
            public_url,
            key,
        })
    }

    fn presign_put(&self, key: &str, content_type: &str, now: DateTime<Utc>) -> AppResult<String> {
        let host = self.host();
        let date = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{date}/{REGION}/{SERVICE}/aws4_request");
        let credential = format!("{}/{scope}", self.config.access_key);

        let path = format!("/{}/{}", self.config.bucket, encode_path(key));

        // Already sorted by parameter name.
        let query = [
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", UPLOAD_URL_TTL_SECS.to_string()),
            ("X-Amz-SignedHeaders", SIGNED_HEADERS.to_string()),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

        // The uploader must send the same Content-Type or the signature fails.
        let canonical_request = format!(
            "PUT\n{path}\n{query}\ncontent-type:{content_type}\nhost:{host}\n\n{SIGNED_HEADERS}\nUNSIGNED-PAYLOAD"
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(&self.config.secret_key, &date, REGION, SERVICE)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{host}{path}?{query}&X-Amz-Signature={signature}"
        ))
    }
}

fn encode_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|err| AppError::Internal(format!("signing key rejected: {err}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> AppResult<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}
