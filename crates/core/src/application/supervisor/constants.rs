// Supervisor constants (no magic values)
use std::time::Duration;

/// Unexpected exits (or spawn failures) tolerated per session
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between an unexpected exit and the next launch (5s)
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Time a terminated child gets to exit before it is force-killed (5s)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
