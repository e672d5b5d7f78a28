mod conversions;
mod types;

pub use types::{
    AuditDiffValueDto, AuditLogEntryResponse, AuditLogListResponse, AuditLogWriteRequest,
    AuditLogWriteResponse,
};
