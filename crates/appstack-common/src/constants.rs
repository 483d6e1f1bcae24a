//! Default paths, owners, and pinned image references.

/// Directory holding the compose file and the stack's SSL material.
pub const DEFAULT_INSTALL_DIR: &str = "/opt/puppetlabs/data_entitlement";

/// File name of the rendered compose document inside the install directory.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";

/// Subdirectory of the install directory reserved for certificates.
pub const SSL_SUBDIR: &str = "ssl";

/// Compose project name used when none is given.
pub const DEFAULT_PROJECT_NAME: &str = "data_entitlement";

/// Numeric owner and group of the stack's directories (the in-container service user).
pub const SERVICE_UID: &str = "11223";

/// Owner of the rendered compose file.
pub const COMPOSE_FILE_OWNER: &str = "root";

/// Group allowed to talk to the Docker daemon; also owns the compose file.
pub const DOCKER_GROUP: &str = "docker";

/// Mode of the rendered compose file. It may carry credentials.
pub const COMPOSE_FILE_MODE: &str = "0440";

/// Mode of managed directories.
pub const DIRECTORY_MODE: &str = "0755";

/// Log driver configured on the Docker engine.
pub const DEFAULT_LOG_DRIVER: &str = "journald";

/// Registry and namespace the application images are pulled from.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "gcr.io/hdp-gcp-316600";

/// Tag used when no version parameter is set at all.
pub const DEFAULT_VERSION: &str = "latest";

/// Image name of the ingestion/query backend.
pub const DATA_ENTITLEMENT_IMAGE_NAME: &str = "data-ingestion";

/// Image name of the TLS-terminating UI proxy.
pub const UI_IMAGE_NAME: &str = "ui";

/// Image name of the browser frontend.
pub const FRONTEND_IMAGE_NAME: &str = "ui-frontend";

/// Pinned Redis image.
pub const DEFAULT_REDIS_IMAGE: &str = "redis:6.2.4-buster";

/// Pinned Elasticsearch image.
pub const DEFAULT_ELASTICSEARCH_IMAGE: &str =
    "docker.elastic.co/elasticsearch/elasticsearch-oss:7.10.1";

/// Pinned MinIO image.
pub const DEFAULT_MINIO_IMAGE: &str = "minio/minio:RELEASE.2021-04-22T15-44-28Z";

/// Access log level of the admin endpoints.
pub const DEFAULT_ACCESS_LOG_LEVEL: &str = "admin";

/// Port the backend accepts uploads on.
pub const DEFAULT_DATA_ENTITLEMENT_PORT: u16 = 9091;

/// Role granted query access when PE RBAC is used.
pub const DEFAULT_PE_RBAC_ROLE_ID: u32 = 1;

/// CA bundle used to verify the PE RBAC service.
pub const DEFAULT_PE_RBAC_CA_CERT_FILE: &str = "/etc/puppetlabs/puppet/ssl/certs/ca.pem";

/// Sentinel for `data_entitlement_query_pe_rbac_ca_cert_file` meaning "use the system trust store".
pub const SYSTEM_TRUST_SENTINEL: &str = "-";

/// SSL directory of the node's configuration-management agent.
pub const DEFAULT_AGENT_SSL_DIR: &str = "/etc/puppetlabs/puppet/ssl";

/// In-container location of the UI private key.
pub const UI_KEY_MOUNT: &str = "/etc/ssl/key.pem";

/// In-container location of the UI certificate.
pub const UI_CERT_MOUNT: &str = "/etc/ssl/cert.pem";

/// In-container location of the UI CA bundle.
pub const UI_CA_MOUNT: &str = "/etc/ssl/ca.pem";

/// Digests of watched prerequisite files, kept by the local file manager.
pub const WATCH_STATE_FILE: &str = "/var/lib/appstack/watched.json";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;


