/// Host log sink. `level`: 0=Display, 1=Warning, 2=Error.
/// `msg` is a UTF-8 byte slice (not null-terminated).
pub type MirrorLogCallback = unsafe extern "C" fn(level: u8, msg: *const u8, msg_len: u32);
