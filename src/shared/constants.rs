/// Maximum number of file descriptors accepted by one upload request
pub const MAX_UPLOAD_BATCH: usize = 10;

/// Maximum number of ids accepted by the batch access URL endpoint
pub const MAX_ACCESS_URL_BATCH: usize = MAX_UPLOAD_BATCH * 5;

/// Page size used when a list request does not name one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on any requested page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest attachment slot on a moment; slots run from 0 to this value
pub const MAX_ATTACHMENT_POSITION: i16 = 9;
