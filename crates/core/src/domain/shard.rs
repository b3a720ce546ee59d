// Shard Name Lookup
// Reads SERVERNAME out of the [system] block of the server INI

/// Display name used until the INI supplies one
pub const DEFAULT_SHARD_NAME: &str = "Unknown";

const SERVER_NAME_KEY: &str = "SERVERNAME";

/// Find `SERVERNAME=<value>` inside the system section
///
/// The section opens at a line starting with `[` that mentions `system`
/// and closes at the first line starting with `}`. Returns `None` when the
/// section or key is missing or the value is blank.
pub fn parse_server_name(ini_text: &str) -> Option<String> {
    let mut in_system_section = false;

    for line in ini_text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.contains("system") {
            in_system_section = true;
            continue;
        }

        if !in_system_section {
            continue;
        }

        if trimmed.starts_with('}') {
            break;
        }

        let is_key = trimmed
            .get(..SERVER_NAME_KEY.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SERVER_NAME_KEY));

        if is_key {
            if let Some((_, value)) = trimmed.split_once('=') {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_name_in_system_section() {
        let ini = "[system]\n{\nSERVERNAME=My Shard\nNETRCVTIMEOUT=3\n}\n";
        assert_eq!(parse_server_name(ini), Some("My Shard".to_string()));
    }

    #[test]
    fn test_server_name_case_insensitive_key() {
        let ini = "[system]\n{\n  ServerName = Trinsic  \n}\n";
        assert_eq!(parse_server_name(ini), Some("Trinsic".to_string()));
    }

    #[test]
    fn test_server_name_outside_section_ignored() {
        let ini = "[play server list]\n{\nSERVERNAME=Wrong\n}\n[system]\n{\nPORT=2593\n}\n";
        assert_eq!(parse_server_name(ini), None);
    }

    #[test]
    fn test_section_closes_at_brace() {
        let ini = "[system]\n{\nPORT=2593\n}\nSERVERNAME=Late\n";
        assert_eq!(parse_server_name(ini), None);
    }

    #[test]
    fn test_blank_value_is_missing() {
        let ini = "[system]\n{\nSERVERNAME=\n}\n";
        assert_eq!(parse_server_name(ini), None);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(parse_server_name(""), None);
    }
}
