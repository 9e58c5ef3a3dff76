//! Versioned XSD schemas: loading, integrity checks, caching and structural validation.
//!
//! A [`SchemaRegistry`] is built once per process and shared by reference. Each version is
//! compiled at most once: [`SchemaRegistry::ensure`] goes through a `moka` cache whose
//! `try_get_with` makes concurrent first-time callers wait on a single load and then share
//! the resulting [`SchemaDescriptor`].
//!
//! Schema assets live under `<directory>/<version>/`: the main `release-notification.xsd`
//! and the version's allowed-value-set file, each optionally accompanied by a `.sha256`
//! sidecar. In bootstrap mode, missing assets are downloaded once and written together with
//! their sidecars; in serving mode they are reported as unavailable.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::document::Position;
use crate::error::{SchemaError, SchemaResult, ValidationError};
use crate::finding::{Finding, Severity};
use crate::http_client::{AsyncHttpClient, HttpClientConfig};
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlIssue, XmlSchemaPtr};
use crate::version::{ErnVersion, MAIN_SCHEMA_FILE};

/// Rule id of every structural finding.
pub const XSD_RULE: &str = "XSD-Schema";

/// Name under which instance documents are reported to libxml2.
const DOCUMENT_NAME: &str = "document.xml";

static AVS_LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();
static REMOTE_LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_avs_location_regex() -> &'static Regex {
    AVS_LOCATION_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)schemaLocation="https?://ddex\.net/xml/(?:allowed-value-sets|avs)/[^"]*""#)
            .expect("Failed to compile allowed-value-set location regex")
    })
}

fn get_remote_location_regex() -> &'static Regex {
    REMOTE_LOCATION_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)schemaLocation="(https?://[^"]*)""#)
            .expect("Failed to compile remote schemaLocation regex")
    })
}

/// Whether missing schema assets may be fetched from ddex.net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    #[default]
    Serving,
    Bootstrap,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub directory: PathBuf,
    pub mode: SchemaMode,
    pub cache_capacity: u64,
    pub http: HttpClientConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./schemas/ern"),
            mode: SchemaMode::Serving,
            cache_capacity: 8,
            http: HttpClientConfig::default(),
        }
    }
}

/// A compiled schema for one version. Immutable once built.
#[derive(Debug)]
pub struct SchemaDescriptor {
    pub version: ErnVersion,
    pub namespace_uri: &'static str,
    pub schema: XmlSchemaPtr,
    /// Lowercase hex sha256 of the main XSD as read from disk.
    pub source_hash: String,
    /// Both schema files matched a sha256 sidecar.
    pub integrity_verified: bool,
    pub loaded_at: DateTime<Utc>,
}

/// Health of one version's schema assets, as reported by [`SchemaRegistry::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    pub version: ErnVersion,
    pub status: SchemaHealth,
    pub avs_file: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_schema_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avs_schema_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaHealth {
    Ok,
    Failed,
}

pub struct SchemaRegistry {
    directory: PathBuf,
    mode: SchemaMode,
    http: HttpClientConfig,
    cache: Cache<ErnVersion, Arc<SchemaDescriptor>>,
    libxml2: LibXml2Wrapper,
    loads: AtomicUsize,
}

impl SchemaRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            directory: config.directory,
            mode: config.mode,
            http: config.http,
            // Never smaller than the catalogue, so a compiled version is not evicted by another
            cache: Cache::builder()
                .max_capacity(config.cache_capacity.max(ErnVersion::ALL.len() as u64))
                .build(),
            libxml2: LibXml2Wrapper::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    /// Number of schema loads started so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Resolves a version string and returns its compiled schema, loading it on first use.
    pub async fn ensure(&self, version: &str) -> SchemaResult<Arc<SchemaDescriptor>> {
        let version: ErnVersion = version.parse()?;
        self.ensure_version(version).await
    }

    pub async fn ensure_version(&self, version: ErnVersion) -> SchemaResult<Arc<SchemaDescriptor>> {
        self.cache
            .try_get_with(version, self.load(version))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Already-loaded descriptor, without triggering a load.
    pub async fn cached(&self, version: ErnVersion) -> Option<Arc<SchemaDescriptor>> {
        self.cache.get(&version).await
    }

    fn version_dir(&self, version: ErnVersion) -> PathBuf {
        self.directory.join(version.as_str())
    }

    async fn load(&self, version: ErnVersion) -> SchemaResult<Arc<SchemaDescriptor>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let dir = self.version_dir(version);
        let main_path = dir.join(MAIN_SCHEMA_FILE);
        let avs_path = dir.join(version.avs_file());

        if !(exists(&main_path).await && exists(&avs_path).await) {
            match self.mode {
                SchemaMode::Serving => {
                    return Err(SchemaError::Unavailable {
                        version: version.to_string(),
                    });
                }
                SchemaMode::Bootstrap => self.bootstrap(version, &dir).await?,
            }
        }

        let (main, main_verified) = read_verified(&main_path).await?;
        let (_, avs_verified) = read_verified(&avs_path).await?;
        let source_hash = sha256_hex(&main);
        let rewritten = rewrite_schema_locations(&main, version);

        let display_path = main_path.display().to_string();
        let schema = tokio::task::spawn_blocking(move || {
            LibXml2Wrapper::new().parse_schema_with_base(&rewritten, &main_path)
        })
        .await
        .map_err(|e| SchemaError::Parse {
            path: display_path.clone(),
            details: e.to_string(),
        })?
        .map_err(|issues| SchemaError::Parse {
            path: display_path.clone(),
            details: join_issues(&issues),
        })?;

        info!(version = %version, hash = %source_hash, "schema compiled");
        Ok(Arc::new(SchemaDescriptor {
            version,
            namespace_uri: version.namespace_uri(),
            schema,
            source_hash,
            integrity_verified: main_verified && avs_verified,
            loaded_at: Utc::now(),
        }))
    }

    /// Downloads the main and allowed-value-set schemas into `dir`, each with a sidecar.
    async fn bootstrap(&self, version: ErnVersion, dir: &Path) -> SchemaResult<()> {
        warn!(version = %version, dir = %dir.display(), "schema assets missing, downloading");
        fs::create_dir_all(dir).await.map_err(|e| SchemaError::Fetch {
            url: dir.display().to_string(),
            details: e.to_string(),
        })?;

        let client = AsyncHttpClient::new(self.http.clone()).map_err(|e| SchemaError::Fetch {
            url: version.main_schema_url().to_string(),
            details: e.to_string(),
        })?;

        for (url, file) in [
            (version.main_schema_url(), MAIN_SCHEMA_FILE),
            (version.avs_schema_url(), version.avs_file()),
        ] {
            let bytes = client
                .fetch(url, |downloaded, total| {
                    debug!(url, downloaded, total = ?total, "downloading schema");
                })
                .await
                .map_err(|e| SchemaError::Fetch {
                    url: url.to_string(),
                    details: e.to_string(),
                })?;

            let path = dir.join(file);
            let write_failed = |e: std::io::Error| SchemaError::Fetch {
                url: url.to_string(),
                details: format!("could not write {}: {}", path.display(), e),
            };
            fs::write(&path, &bytes).await.map_err(write_failed)?;
            fs::write(sidecar_path(&path), format!("{}\n", sha256_hex(&bytes)))
                .await
                .map_err(write_failed)?;
            info!(url, path = %path.display(), bytes = bytes.len(), "schema stored");
        }
        Ok(())
    }

    /// Validates raw XML against a compiled schema. Every violation is an error finding.
    pub fn validate_structure(&self, descriptor: &SchemaDescriptor, xml: &[u8]) -> Vec<Finding> {
        match self
            .libxml2
            .validate_memory(&descriptor.schema, xml, DOCUMENT_NAME)
        {
            Ok(ValidationResult::Valid) => Vec::new(),
            Ok(ValidationResult::Invalid { issues, error_count }) if issues.is_empty() => {
                vec![Finding::error(
                    XSD_RULE,
                    format!("Document failed schema validation with {} errors", error_count),
                )]
            }
            Ok(ValidationResult::Invalid { issues, .. }) => {
                issues.into_iter().map(issue_finding).collect()
            }
            Ok(ValidationResult::InternalError { code }) => vec![Finding::error(
                XSD_RULE,
                format!("XSD validation error: libxml2 internal error {}", code),
            )],
            Err(e) => vec![Finding::error(
                XSD_RULE,
                format!("XSD validation error: {}", ValidationError::from(e)),
            )],
        }
    }

    /// Loads every version and reports asset health.
    pub async fn verify(&self) -> Vec<SchemaStatus> {
        let mut statuses = Vec::with_capacity(ErnVersion::ALL.len());
        for version in ErnVersion::ALL {
            let dir = self.version_dir(version);
            let status = match self.ensure_version(version).await {
                Ok(_) => SchemaStatus {
                    version,
                    status: SchemaHealth::Ok,
                    avs_file: version.avs_file(),
                    main_schema_size: file_size(&dir.join(MAIN_SCHEMA_FILE)).await,
                    avs_schema_size: file_size(&dir.join(version.avs_file())).await,
                    error: None,
                },
                Err(e) => SchemaStatus {
                    version,
                    status: SchemaHealth::Failed,
                    avs_file: version.avs_file(),
                    main_schema_size: None,
                    avs_schema_size: None,
                    error: Some(e.to_string()),
                },
            };
            statuses.push(status);
        }
        statuses
    }
}

fn issue_finding(issue: XmlIssue) -> Finding {
    let mut finding = Finding::new(
        XSD_RULE,
        Severity::Error,
        issue.message,
        Position {
            line: issue.line,
            column: issue.column,
        },
    );
    finding.domain = Some(issue.domain.to_string());
    finding.code = Some(issue.code.to_string());
    finding
}

fn join_issues(issues: &[XmlIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Points remote `schemaLocation` imports at the local copies in the version directory.
pub fn rewrite_schema_locations(schema: &[u8], version: ErnVersion) -> Vec<u8> {
    let text = String::from_utf8_lossy(schema);
    let avs_location = format!("schemaLocation=\"{}\"", version.avs_file());
    let text = get_avs_location_regex().replace_all(&text, avs_location.as_str());
    let text = get_remote_location_regex().replace_all(&text, |caps: &Captures<'_>| {
        let file = caps[1].rsplit('/').next().unwrap_or_default();
        format!("schemaLocation=\"{}\"", file)
    });
    text.into_owned().into_bytes()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Reads a schema file and checks it against its sidecar. Without a sidecar the bytes are
/// returned unverified and the flag is false.
async fn read_verified(path: &Path) -> SchemaResult<(Vec<u8>, bool)> {
    let bytes = fs::read(path).await.map_err(|e| SchemaError::Parse {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;

    let sidecar = sidecar_path(path);
    let contents = match fs::read_to_string(&sidecar).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no sha256 sidecar, schema integrity not verified");
            return Ok((bytes, false));
        }
        Err(e) => {
            return Err(SchemaError::Parse {
                path: sidecar.display().to_string(),
                details: e.to_string(),
            });
        }
    };

    let expected = contents
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let actual = sha256_hex(&bytes);
    if expected != actual {
        return Err(SchemaError::Integrity {
            path: path.display().to_string(),
            expected,
            actual,
        });
    }
    Ok((bytes, true))
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).await.ok().map(|m| m.len())
}
