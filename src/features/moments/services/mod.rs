mod attachment_linker;
mod moment_service;

pub use attachment_linker::AttachmentLinker;
pub use moment_service::MomentService;
