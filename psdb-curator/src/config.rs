//! Curator runtime configuration
//!
//! Built once at startup from the TOML file and command line, then handed to
//! the components that need it. Nothing reads process-wide state afterwards.

use crate::storage::UploadDirs;
use psdb_common::config::{CuratorSection, RootFolder};
use std::path::PathBuf;
use std::time::Duration;

/// Uploads allowed in one request, used to size the request body limit
const MAX_UPLOADS_PER_REQUEST: u64 = 8;

#[derive(Debug, Clone)]
pub struct CuratorConfig {
    pub root: RootFolder,
    pub bind_address: String,
    pub max_upload_bytes: u64,
    pub admin_token: Option<String>,
    pub sweep_interval: Duration,
    pub orphan_grace: Duration,
}

impl CuratorConfig {
    pub fn new(root: RootFolder, section: &CuratorSection) -> Self {
        Self {
            root,
            bind_address: section.bind_address.clone(),
            max_upload_bytes: section.max_upload_bytes,
            admin_token: section
                .admin_token
                .clone()
                .filter(|token| !token.is_empty()),
            sweep_interval: Duration::from_secs(section.sweep_interval_secs.max(1)),
            orphan_grace: Duration::from_secs(section.orphan_grace_secs),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.database_path()
    }

    pub fn upload_dirs(&self) -> UploadDirs {
        UploadDirs::new(self.root.uploads_path())
    }

    /// Whole-request body limit for multipart routes
    pub fn request_body_limit(&self) -> usize {
        let limit = self
            .max_upload_bytes
            .saturating_mul(MAX_UPLOADS_PER_REQUEST)
            .saturating_add(1024 * 1024);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_from_section() {
        let section = CuratorSection {
            admin_token: Some(String::new()),
            sweep_interval_secs: 0,
            ..Default::default()
        };
        let config = CuratorConfig::new(RootFolder::new(PathBuf::from("/srv/psdb")), &section);

        assert!(config.admin_token.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.database_path(), PathBuf::from("/srv/psdb/psdb.db"));
        assert_eq!(
            config.upload_dirs(),
            UploadDirs::new(PathBuf::from("/srv/psdb/uploads"))
        );
        assert!(config.request_body_limit() > config.max_upload_bytes as usize);
    }
}
