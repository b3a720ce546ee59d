// INI ShardNameSource Implementation

use shardmon_core::domain::parse_server_name;
use shardmon_core::port::ShardNameSource;
use std::path::Path;
use tracing::{info, warn};

/// Reads SERVERNAME from the shard's INI file on every lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct IniShardNameSource;

impl ShardNameSource for IniShardNameSource {
    fn shard_name(&self, ini_path: &Path) -> Option<String> {
        let text = match std::fs::read(ini_path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(ini = %ini_path.display(), error = %e, "Cannot read shard INI");
                return None;
            }
        };

        let name = parse_server_name(&text);
        match &name {
            Some(name) => info!(ini = %ini_path.display(), shard = %name, "Shard name loaded from INI"),
            None => warn!(ini = %ini_path.display(), "SERVERNAME not found in INI"),
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_name_from_system_block() {
        let dir = TempDir::new().unwrap();
        let ini = dir.path().join("uox3.ini");
        std::fs::write(
            &ini,
            "[system]\n{\nSERVERNAME=Britannia\nNETRCVTIMEOUT=3\n}\n[skill & stats]\n{\n}\n",
        )
        .unwrap();

        assert_eq!(
            IniShardNameSource.shard_name(&ini),
            Some("Britannia".to_string())
        );
    }

    #[test]
    fn test_missing_ini_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(IniShardNameSource.shard_name(&dir.path().join("uox3.ini")), None);
    }

    #[test]
    fn test_ini_without_name_is_none() {
        let dir = TempDir::new().unwrap();
        let ini = dir.path().join("uox3.ini");
        std::fs::write(&ini, "[system]\n{\nSERVERNAME=\n}\n").unwrap();

        assert_eq!(IniShardNameSource.shard_name(&ini), None);
    }
}
