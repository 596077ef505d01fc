mod attachment;

pub use attachment::{Attachment, AttachmentStatus, NewAttachment};
