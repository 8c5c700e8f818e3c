pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

pub const ROOM_CODE_LENGTH: usize = 6;

pub const DEFAULT_TTL_HOURS: u32 = 24;
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 50;
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";
