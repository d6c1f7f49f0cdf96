pub(crate) const LOG_TIMESTAMP_FORMAT: &str = "%m-%d %H:%M:%S";
pub(crate) const LOG_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const LOG_SEPARATOR: &str = " | ";

pub(crate) const LOG_RETENTION_DAYS: i64 = 7;
pub(crate) const LOG_MAX_ENTRIES: usize = 10_000;

pub(crate) const CANCELLED_MESSAGE: &str = "Execution cancelled by user.";
pub(crate) const EXIT_CANCELLED: i32 = 130;
pub(crate) const EXIT_TOOL_NOT_FOUND: i32 = 127;
pub(crate) const SECRET_PROMPT_CANCEL_HINT: &str = "Press Enter to cancel.";

/// Seconds the interrupt handler waits for children to be killed.
pub(crate) const CHILD_GRACE_SECS: u64 = 3;

pub(crate) const HIDDEN_PREVIEW_LIMIT: usize = 20;

pub(crate) const LOCAL_REMOTE_TYPE: &str = "local";

pub(crate) const MENU_VIEW: &str = "View flags";
pub(crate) const MENU_ADD_TYPE: &str = "Add remote type";
pub(crate) const MENU_DELETE_TYPE: &str = "Delete remote type";
pub(crate) const MENU_SET_FLAG: &str = "Add or edit a flag";
pub(crate) const MENU_DELETE_FLAG: &str = "Delete a flag";
pub(crate) const MENU_EXIT: &str = "Exit";
