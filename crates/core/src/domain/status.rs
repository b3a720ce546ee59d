// Status Artifact Model
// Label-anchored counter extraction from the server's status page

/// Sentinel for a counter that could not be read
pub const UNKNOWN_COUNT: i32 = -1;

/// Counters read from one poll of the status artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub players: i32,
    pub gms: i32,
    pub counselors: i32,
}

impl StatusSnapshot {
    /// Snapshot before anything has been read
    pub const UNKNOWN: StatusSnapshot = StatusSnapshot {
        players: UNKNOWN_COUNT,
        gms: UNKNOWN_COUNT,
        counselors: UNKNOWN_COUNT,
    };

    pub fn new(players: i32, gms: i32, counselors: i32) -> Self {
        Self {
            players,
            gms,
            counselors,
        }
    }

    /// Extract all three counters from the artifact text
    pub fn parse(text: &str, labels: &StatusLabels) -> Self {
        Self {
            players: extract_count(text, &labels.players),
            gms: extract_count(text, &labels.gms),
            counselors: extract_count(text, &labels.counselors),
        }
    }

    /// Operator-facing status update message
    pub fn to_message(&self, shard_name: &str) -> String {
        format!(
            "{} Status Update:\nPlayers: {}\nGMs: {}\nCounselors: {}",
            shard_name, self.players, self.gms, self.counselors
        )
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Labels the server writes in front of each counter
///
/// The server emits `<em>Player:</em> 12`; the bare label matches whatever
/// markup surrounds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    pub players: String,
    pub gms: String,
    pub counselors: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            players: "Player:".to_string(),
            gms: "GMs:".to_string(),
            counselors: "Counselors:".to_string(),
        }
    }
}

/// Extract the integer that follows `label` in `text`
///
/// Finds the first case-sensitive occurrence of `label`, skips any
/// non-digit characters after it, then reads the first run of ASCII
/// digits. Returns [`UNKNOWN_COUNT`] when the label is missing, no digit
/// follows it, or the run does not fit an `i32`.
///
/// # Example
/// ```
/// use shardmon_core::domain::extract_count;
///
/// assert_eq!(extract_count("<em>Player:</em> 12 online", "<em>Player:</em>"), 12);
/// assert_eq!(extract_count("<em>Player:</em> 12 online", "GMs:"), -1);
/// ```
pub fn extract_count(text: &str, label: &str) -> i32 {
    let Some(index) = text.find(label) else {
        return UNKNOWN_COUNT;
    };

    let digits: String = text[index + label.len()..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<i32>().unwrap_or(UNKNOWN_COUNT)
}
