/// Application name, used as the default notification title.
pub const APP_NAME: &str = "Tidings";

/// Display name used when a sender has neither a name nor an email.
pub const FALLBACK_SENDER_NAME: &str = "Member";

/// Display name of a direct chat whose counterpart cannot be derived.
pub const UNKNOWN_CONTACT: &str = "Unknown";

/// Prefix for location message map links.
pub const MAP_LINK_BASE: &str = "https://www.google.com/maps?q=";

/// Default blob store endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://api.cloudinary.com/v1_1/demo";

/// Default upload preset token.
pub const DEFAULT_UPLOAD_PRESET: &str = "tidings";

/// Path (relative to the notification backend) that accepts dispatch requests.
pub const NOTIFY_PATH: &str = "/send-notification";

/// Default HTTP timeout for blob uploads and notification dispatch.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Maximum upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Preview text stored on a freshly created direct chat.
pub const DIRECT_CHAT_GREETING: &str = "Chat started";

/// Preview text stored on a freshly created group.
pub const GROUP_CHAT_GREETING: &str = "Group created";
