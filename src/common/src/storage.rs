use anyhow::Result;
use object_store::{
    ObjectStore,
    azure::{AzureConfigKey, MicrosoftAzureBuilder},
    local::LocalFileSystem,
    memory::InMemory,
};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Create an object store scoped to `container`.
///
/// `connection` is either an Azure Storage connection string or a storage DSN
/// (`file:///path`, `memory://`). For `file://` DSNs the container is a
/// directory below the DSN path.
pub fn create_object_store(connection: &str, container: &str) -> Result<Arc<dyn ObjectStore>> {
    if container.trim().is_empty() {
        return Err(anyhow::anyhow!("Container name cannot be empty"));
    }

    if looks_like_dsn(connection) {
        create_object_store_from_dsn(connection, container)
    } else {
        let parsed = AzureConnectionString::parse(connection)?;
        let builder = parsed.into_builder(container)?;
        Ok(Arc::new(builder.build()?))
    }
}

fn looks_like_dsn(connection: &str) -> bool {
    // Connection strings are `key=value;...`, they never carry a scheme
    connection.contains("://") && !connection.contains(';')
}

/// Create an object store from a DSN string
fn create_object_store_from_dsn(dsn: &str, container: &str) -> Result<Arc<dyn ObjectStore>> {
    let url =
        Url::parse(dsn).map_err(|e| anyhow::anyhow!("Invalid storage DSN '{}': {}", dsn, e))?;

    match url.scheme() {
        "file" => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return Err(anyhow::anyhow!(
                    "File DSN must specify a path: file:///path/to/storage"
                ));
            }
            let root = std::path::Path::new(path).join(container);
            Ok(Arc::new(LocalFileSystem::new_with_prefix(root)?))
        }
        "memory" => Ok(Arc::new(InMemory::new())),
        scheme => Err(anyhow::anyhow!(
            "Unsupported storage scheme: {}. Supported: file, memory, or an Azure connection string",
            scheme
        )),
    }
}

/// Parsed Azure Storage connection string
///
/// Format: `DefaultEndpointsProtocol=https;AccountName=...;AccountKey=...;EndpointSuffix=core.windows.net`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AzureConnectionString {
    pub protocol: Option<String>,
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub endpoint_suffix: Option<String>,
    pub blob_endpoint: Option<String>,
    pub shared_access_signature: Option<String>,
    pub use_development_storage: bool,
}

impl AzureConnectionString {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut pairs = HashMap::new();

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // Keys are base64 and may contain '=', so only split on the first one
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Malformed connection string segment: expected key=value")
            })?;
            pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if pairs.is_empty() {
            return Err(anyhow::anyhow!("Connection string is empty"));
        }

        let parsed = Self {
            protocol: pairs.remove("defaultendpointsprotocol"),
            account_name: pairs.remove("accountname"),
            account_key: pairs.remove("accountkey"),
            endpoint_suffix: pairs.remove("endpointsuffix"),
            blob_endpoint: pairs.remove("blobendpoint"),
            shared_access_signature: pairs.remove("sharedaccesssignature"),
            use_development_storage: pairs
                .remove("usedevelopmentstorage")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        };

        if !pairs.is_empty() {
            let mut ignored: Vec<_> = pairs.keys().cloned().collect();
            ignored.sort();
            log::debug!("Ignoring connection string keys: {}", ignored.join(", "));
        }

        if !parsed.use_development_storage && parsed.account_name.is_none() {
            return Err(anyhow::anyhow!("Connection string is missing AccountName"));
        }

        Ok(parsed)
    }

    /// Blob service endpoint, if it differs from the public cloud default
    pub fn blob_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.blob_endpoint {
            return Some(endpoint.trim_end_matches('/').to_string());
        }

        match (&self.account_name, &self.endpoint_suffix) {
            (Some(account), Some(suffix)) if suffix != DEFAULT_ENDPOINT_SUFFIX => {
                let protocol = self.protocol.as_deref().unwrap_or("https");
                Some(format!("{protocol}://{account}.blob.{suffix}"))
            }
            _ => None,
        }
    }

    pub fn into_builder(self, container: &str) -> Result<MicrosoftAzureBuilder> {
        let mut builder = MicrosoftAzureBuilder::new().with_container_name(container);

        if self.use_development_storage {
            return Ok(builder.with_use_emulator(true));
        }

        if let Some(endpoint) = self.blob_endpoint() {
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
            builder = builder.with_endpoint(endpoint);
        } else if self.protocol.as_deref() == Some("http") {
            builder = builder.with_allow_http(true);
        }

        if let Some(account) = self.account_name {
            builder = builder.with_account(account);
        }

        match (self.account_key, self.shared_access_signature) {
            (Some(key), _) => builder = builder.with_access_key(key),
            (None, Some(sas)) => {
                builder = builder.with_config(AzureConfigKey::SasKey, sas.trim_start_matches('?'))
            }
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "Connection string must contain AccountKey or SharedAccessSignature"
                ));
            }
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::{PutPayload, path::Path};

    const CONNECTION: &str = "DefaultEndpointsProtocol=https;AccountName=refdata;AccountKey=c2VjcmV0a2V5PT0=;EndpointSuffix=core.windows.net";

    #[test]
    fn test_parse_connection_string() {
        let parsed = AzureConnectionString::parse(CONNECTION).unwrap();
        assert_eq!(parsed.protocol.as_deref(), Some("https"));
        assert_eq!(parsed.account_name.as_deref(), Some("refdata"));
        // The trailing '=' padding of the key must survive
        assert_eq!(parsed.account_key.as_deref(), Some("c2VjcmV0a2V5PT0="));
        assert_eq!(parsed.blob_endpoint(), None);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_tolerates_trailing_semicolon() {
        let parsed =
            AzureConnectionString::parse("accountname=refdata;ACCOUNTKEY=abc==;").unwrap();
        assert_eq!(parsed.account_name.as_deref(), Some("refdata"));
        assert_eq!(parsed.account_key.as_deref(), Some("abc=="));
    }

    #[test]
    fn test_sovereign_cloud_endpoint() {
        let parsed = AzureConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=refdata;AccountKey=abc;EndpointSuffix=core.chinacloudapi.cn",
        )
        .unwrap();
        assert_eq!(
            parsed.blob_endpoint().as_deref(),
            Some("https://refdata.blob.core.chinacloudapi.cn")
        );
    }

    #[test]
    fn test_explicit_blob_endpoint() {
        let parsed = AzureConnectionString::parse(
            "BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/;AccountName=devstoreaccount1;AccountKey=abc",
        )
        .unwrap();
        assert_eq!(
            parsed.blob_endpoint().as_deref(),
            Some("http://127.0.0.1:10000/devstoreaccount1")
        );
        assert!(parsed.into_builder("refs").is_ok());
    }

    #[test]
    fn test_development_storage() {
        let parsed = AzureConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert!(parsed.use_development_storage);
        assert!(parsed.into_builder("refs").is_ok());
    }

    #[test]
    fn test_missing_account_name() {
        let err = AzureConnectionString::parse("AccountKey=abc").unwrap_err();
        assert!(err.to_string().contains("AccountName"));
    }

    #[test]
    fn test_malformed_segment() {
        assert!(AzureConnectionString::parse("AccountName").is_err());
        assert!(AzureConnectionString::parse(";;").is_err());
    }

    #[test]
    fn test_builder_requires_credentials() {
        let parsed = AzureConnectionString::parse("AccountName=refdata").unwrap();
        let err = parsed.into_builder("refs").unwrap_err();
        assert!(err.to_string().contains("AccountKey or SharedAccessSignature"));
    }

    #[test]
    fn test_create_azure_object_store() {
        let store = create_object_store(CONNECTION, "refs").unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[test]
    fn test_create_sas_object_store() {
        let store = create_object_store(
            "AccountName=refdata;SharedAccessSignature=?sv=2022-11-02&ss=b&sig=abc%3D",
            "refs",
        )
        .unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[test]
    fn test_create_memory_object_store() {
        let store = create_object_store("memory://", "refs").unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[tokio::test]
    async fn test_filesystem_store_is_scoped_to_container() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("refs")).unwrap();
        std::fs::write(temp_dir.path().join("refs").join("data.csv"), "id,content\n").unwrap();

        let dsn = format!("file://{}", temp_dir.path().display());
        let store = create_object_store(&dsn, "refs").unwrap();

        let bytes = store
            .get(&Path::from("data.csv"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(bytes, bytes::Bytes::from_static(b"id,content\n"));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = create_object_store("memory://", "refs").unwrap();
        store
            .put(&Path::from("a.csv"), PutPayload::from_static(b"id,content\n"))
            .await
            .unwrap();
        assert!(store.head(&Path::from("a.csv")).await.is_ok());
    }

    #[test]
    fn test_invalid_dsn() {
        let result = create_object_store_from_dsn("file://", "refs");
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = create_object_store("s3://bucket/prefix", "refs");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported storage scheme")
        );
    }

    #[test]
    fn test_empty_container_rejected() {
        assert!(create_object_store("memory://", " ").is_err());
    }
}
