/// Why the last failed C API call on this thread failed, as reported by
/// `mirror_last_error`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorErrorCode {
    Ok = 0,
    TypeNotFound = 1,
    FieldNotFound = 2,
    TypeMismatch = 3,
    InstanceMismatch = 4,
    NoAccessor = 5,
    NullArgument = 6,
    InvalidJson = 7,
    IoError = 8,
    BufferTooSmall = 9,
    ObjectNotFound = 10,
    NotConnected = 11,
    NotStarted = 12,
    TransportError = 13,
    ConfigError = 14,
}
