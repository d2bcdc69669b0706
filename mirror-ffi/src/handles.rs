use std::ffi::c_void;

/// Opaque pointer to a caller-owned instance of a reflected type.
/// Rust only dereferences it through the type-erased cast recorded at registration.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstanceHandle(pub *mut c_void);

/// Opaque handle to a boxed IPC server owned by the host.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ServerHandle(pub *mut c_void);

/// Opaque handle to a boxed IPC client owned by the host.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClientHandle(pub *mut c_void);

macro_rules! null_handle {
    ($($ty:ident),*) => {$(
        impl $ty {
            #[inline]
            pub const fn null() -> Self {
                $ty(std::ptr::null_mut())
            }

            #[inline]
            pub fn is_null(&self) -> bool {
                self.0.is_null()
            }
        }
    )*};
}

null_handle!(InstanceHandle, ServerHandle, ClientHandle);
