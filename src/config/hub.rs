/// Hub configuration constants.
///
/// Room identifiers, display names, and the housekeeping intervals of the
/// hub actor.
pub const ROOM_ID_LENGTH: usize = 8;

/// How many fresh identifiers to try before giving up on a room creation.
pub const ROOM_ID_ATTEMPTS: usize = 16;

/// Display names longer than this are truncated (in chars).
pub const MAX_NAME_LEN: usize = 32;

/// Name shown for an unnamed player or an empty seat.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Default period (in seconds) of the directory broadcast to every connection.
pub const DIRECTORY_REFRESH_SECS: u64 = 10;

/// Default time (in seconds) an ended room is kept before eviction.
pub const ENDED_ROOM_TTL_SECS: u64 = 600;

/// How often (in seconds) the hub looks for ended rooms to evict.
pub const EVICTION_SWEEP_SECS: u64 = 30;
