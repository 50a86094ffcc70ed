// Rust definitions for the C API exported by rembg-compatible
// background-removal libraries (rembg_native.h).

use std::os::raw::c_char;

// char8_t is specified as UTF-8. In C, this is typically 'char'.
pub type c_char8_t = c_char;

#[repr(C)]
#[derive(Debug, Clone)]
pub struct RembgLibraryInfo {
    pub name: *const c_char8_t,
    pub version: *const c_char8_t,
    pub description: *const c_char8_t,
}

#[repr(C)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum RembgErrorCode {
    Success = 0,         // REMBG_SUCCESS
    InvalidArgument = 1, // REMBG_ERROR_INVALID_ARGUMENT
    InferenceFailed = 2, // REMBG_ERROR_INFERENCE_FAILED
    OutOfMemory = 3,     // REMBG_ERROR_OUT_OF_MEMORY
    Other = 9999,        // REMBG_ERROR_OTHER
}

// The segmentation entry point operates on tightly packed RGBA8 buffers.
// The caller allocates `out_data` with the same size as `in_data`; the
// library writes the foreground-isolated image into it, leaving background
// pixels fully transparent. Width and height are unchanged by the call.
//
// Function pointer type aliases are not needed here; libloading::Symbol
// stores each symbol with its full type.
