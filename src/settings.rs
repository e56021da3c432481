//! Runtime settings read from the environment (after `.env` is loaded by the binary).

use crate::blob::BlobConfig;
use crate::error::ConfigError;
use crate::store::StoreConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SCHEMA: &str = "homescreen";
const DEFAULT_BUCKET: &str = "homescreen-media";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_PRESIGN_SECS: u64 = 3600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub blobs: BlobConfig,
    pub max_upload_bytes: usize,
}

fn parse<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse("PORT", get("PORT"), DEFAULT_PORT)?;
        let ip: IpAddr = parse("BIND_ADDRESS", get("BIND_ADDRESS"), DEFAULT_BIND)?;

        let database_url = get("DATABASE_URL");
        let store_kind = get("DOCUMENT_STORE")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| if database_url.is_some() { "postgres" } else { "memory" }.to_string());
        let store = match store_kind.as_str() {
            "memory" => StoreConfig::Memory,
            "postgres" => StoreConfig::Postgres {
                url: database_url.ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_CONNECTIONS,
                )?,
                schema: get("HOMESCREEN_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    key: "DOCUMENT_STORE",
                    value: store_kind,
                })
            }
        };

        let bucket = get("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string());
        let presign_expires = Duration::from_secs(parse(
            "S3_PRESIGN_EXPIRES_SECS",
            get("S3_PRESIGN_EXPIRES_SECS"),
            DEFAULT_PRESIGN_SECS,
        )?);
        let blob_kind = get("BLOB_STORE")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| "memory".to_string());
        let blobs = match blob_kind.as_str() {
            "memory" => BlobConfig::Memory {
                bucket,
                presign_expires,
            },
            "s3" => BlobConfig::S3 {
                bucket,
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint: get("S3_ENDPOINT"),
                presign_expires,
            },
            _ => {
                return Err(ConfigError::Invalid {
                    key: "BLOB_STORE",
                    value: blob_kind,
                })
            }
        };

        Ok(Settings {
            bind: SocketAddr::new(ip, port),
            store,
            blobs,
            max_upload_bytes: parse("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_use_memory_backends() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind, "0.0.0.0:3001".parse::<SocketAddr>().unwrap());
        assert_eq!(s.store, StoreConfig::Memory);
        assert_eq!(
            s.blobs,
            BlobConfig::Memory {
                bucket: "homescreen-media".into(),
                presign_expires: Duration::from_secs(3600),
            }
        );
        assert_eq!(s.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn database_url_selects_postgres() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/cms"), ("HOMESCREEN_SCHEMA", "cms")]).unwrap();
        assert_eq!(
            s.store,
            StoreConfig::Postgres {
                url: "postgres://localhost/cms".into(),
                max_connections: 5,
                schema: "cms".into(),
            }
        );
    }

    #[test]
    fn s3_settings() {
        let s = settings(&[
            ("BLOB_STORE", "S3"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("S3_PRESIGN_EXPIRES_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(
            s.blobs,
            BlobConfig::S3 {
                bucket: "homescreen-media".into(),
                region: "us-east-1".into(),
                endpoint: Some("http://localhost:9000".into()),
                presign_expires: Duration::from_secs(60),
            }
        );
    }

    #[test]
    fn invalid_values_are_reported_by_key() {
        let err = settings(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
        let err = settings(&[("DOCUMENT_STORE", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DOCUMENT_STORE", .. }));
        let err = settings(&[("DOCUMENT_STORE", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }
}
