mod moment;

pub use moment::{LinkedAttachment, Moment, MomentAttachmentLink};
