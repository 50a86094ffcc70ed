// Loads the native background-removal library and exposes it behind the
// narrow BackgroundRemover trait that the web layer depends on.

use crate::remover_ffi;
use image::RgbaImage;
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Error produced by a background-removal capability while processing an
/// image. Carries internal detail for logging; never sent to clients as-is.
#[derive(Debug)]
pub struct RemovalError(String);

impl RemovalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for RemovalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RemovalError {}

/// The background-removal capability as seen by the request handlers.
///
/// Implementations take a decoded RGBA raster and return a raster of the same
/// dimensions with background pixels made fully transparent. Implementations
/// must be callable from blocking worker threads.
pub trait BackgroundRemover: Send + Sync {
    fn name(&self) -> &str;

    fn remove(&self, image: &RgbaImage) -> Result<RgbaImage, RemovalError>;
}

// Keeps the shared library alive and shuts it down exactly once, after the
// last user is gone.
struct RemoverLibrary {
    _lib: Library,
    id: String,
    rembg_shutdown: unsafe extern "C" fn() -> remover_ffi::RembgErrorCode,
}

impl Drop for RemoverLibrary {
    fn drop(&mut self) {
        tracing::info!("Shutting down background-removal library: {}", self.id);
        unsafe {
            (self.rembg_shutdown)();
        }
        tracing::debug!("Background-removal library released: {}", self.id);
    }
}

// Rust-native metadata reported by the library.
#[derive(Clone, Debug)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Production implementation backed by a rembg-compatible shared library.
pub struct NativeRemover {
    _lib: Arc<RemoverLibrary>,
    pub path: PathBuf,
    pub info: LibraryInfo,

    // Raw function pointer rather than a Symbol so the value is type-erased
    // and freely shareable between threads.
    rembg_remove_background: unsafe extern "C" fn(
        in_data: *const u8,
        in_size: usize,
        width: u32,
        height: u32,
        out_data: *mut u8,
        out_size: usize,
    ) -> remover_ffi::RembgErrorCode,

    // The library does not document thread-safety; inference calls are
    // serialized through this lock.
    call_guard: Mutex<()>,
}

impl NativeRemover {
    // Loads the shared library, resolves the rembg_* symbols, and runs
    // rembg_initialize. `unsafe` because it executes foreign code via FFI.
    pub unsafe fn load(path: &Path) -> Result<Self, String> {
        let lib = unsafe { Library::new(path) }
            .map_err(|e| format!("Failed to load shared library from {:?}: {}", path, e))?;

        // Macro to simplify symbol loading and error mapping.
        macro_rules! get_symbol {
            ($lib:expr, $name:expr) => {
                unsafe { $lib.get($name) }.map_err(|e| {
                    format!(
                        "Failed to load symbol '{}' from {:?}: {}",
                        String::from_utf8_lossy($name),
                        path,
                        e
                    )
                })
            };
        }

        let initialize_fn: Symbol<unsafe extern "C" fn() -> remover_ffi::RembgErrorCode> =
            get_symbol!(lib, b"rembg_initialize\0")?;
        let shutdown_fn: Symbol<unsafe extern "C" fn() -> remover_ffi::RembgErrorCode> =
            get_symbol!(lib, b"rembg_shutdown\0")?;
        let get_info_fn: Symbol<unsafe extern "C" fn() -> *const remover_ffi::RembgLibraryInfo> =
            get_symbol!(lib, b"rembg_get_info\0")?;
        let remove_fn: Symbol<
            unsafe extern "C" fn(
                *const u8,
                usize,
                u32,
                u32,
                *mut u8,
                usize,
            ) -> remover_ffi::RembgErrorCode,
        > = get_symbol!(lib, b"rembg_remove_background\0")?;

        let init_result = unsafe { initialize_fn() };
        if init_result != remover_ffi::RembgErrorCode::Success {
            return Err(format!(
                "Library at {:?} failed to initialize with error code: {:?}",
                path, init_result
            ));
        }

        let c_info_ptr = unsafe { get_info_fn() };
        if c_info_ptr.is_null() {
            return Err(format!(
                "Library at {:?} returned NULL from rembg_get_info",
                path
            ));
        }
        let c_info = unsafe { &*c_info_ptr }; // Valid if the library honors its API.

        let info = LibraryInfo {
            name: unsafe { Self::c_str_to_rust_string(c_info.name) }
                .map_err(|e| format!("Invalid library name from {:?}: {}", path, e))?,
            version: unsafe { Self::c_str_to_rust_string(c_info.version) }
                .map_err(|e| format!("Invalid library version from {:?}: {}", path, e))?,
            description: unsafe { Self::c_str_to_rust_string(c_info.description) }
                .map_err(|e| format!("Invalid library description from {:?}: {}", path, e))?,
        };

        let id = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown_library".to_string());

        tracing::debug!(
            "Library '{}' describes itself as: {}",
            info.name,
            info.description
        );

        // Extract raw function pointers before the Symbols are dropped.
        let shutdown_fn_ptr = *shutdown_fn;
        let remove_fn_ptr = *remove_fn;

        Ok(NativeRemover {
            _lib: Arc::new(RemoverLibrary {
                _lib: lib,
                id,
                rembg_shutdown: shutdown_fn_ptr,
            }),
            path: path.to_path_buf(),
            info,
            rembg_remove_background: remove_fn_ptr,
            call_guard: Mutex::new(()),
        })
    }

    // Safely converts a C string (UTF-8 encoded) reported by the library.
    unsafe fn c_str_to_rust_string(
        c_str_ptr: *const remover_ffi::c_char8_t,
    ) -> Result<String, String> {
        if c_str_ptr.is_null() {
            return Err("Encountered a null string pointer from library".to_string());
        }
        unsafe { CStr::from_ptr(c_str_ptr) }
            .to_str()
            .map(String::from)
            .map_err(|e| format!("Invalid UTF-8 sequence in string from library: {}", e))
    }
}

impl BackgroundRemover for NativeRemover {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn remove(&self, image: &RgbaImage) -> Result<RgbaImage, RemovalError> {
        let (width, height) = image.dimensions();
        let in_data = image.as_raw();
        let mut out_data = vec![0u8; in_data.len()];

        let code = {
            let _guard = self
                .call_guard
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            unsafe {
                (self.rembg_remove_background)(
                    in_data.as_ptr(),
                    in_data.len(),
                    width,
                    height,
                    out_data.as_mut_ptr(),
                    out_data.len(),
                )
            }
        };

        if code != remover_ffi::RembgErrorCode::Success {
            return Err(RemovalError::new(format!(
                "rembg_remove_background failed with error code: {:?}",
                code
            )));
        }

        RgbaImage::from_raw(width, height, out_data).ok_or_else(|| {
            RemovalError::new("Library produced an output buffer with unexpected size")
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use image::Rgba;

    // Marks the top-left pixel transparent so tests can tell the output
    // apart from the input without a real segmentation model.
    pub struct StubRemover;

    impl BackgroundRemover for StubRemover {
        fn name(&self) -> &str {
            "stub"
        }

        fn remove(&self, image: &RgbaImage) -> Result<RgbaImage, RemovalError> {
            let mut out = image.clone();
            if out.width() > 0 && out.height() > 0 {
                out.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
            }
            Ok(out)
        }
    }

    pub struct FailingRemover;

    impl BackgroundRemover for FailingRemover {
        fn name(&self) -> &str {
            "failing"
        }

        fn remove(&self, _image: &RgbaImage) -> Result<RgbaImage, RemovalError> {
            Err(RemovalError::new("inference session crashed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{FailingRemover, StubRemover};
    use super::*;

    #[test]
    fn stub_remover_keeps_dimensions() {
        let input = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let output = StubRemover.remove(&input).unwrap();
        assert_eq!(output.dimensions(), (4, 3));
        assert_eq!(output.get_pixel(0, 0).0[3], 0);
        assert_eq!(output.get_pixel(3, 2).0[3], 255);
    }

    #[test]
    fn failing_remover_reports_error() {
        let input = RgbaImage::new(1, 1);
        let err = FailingRemover.remove(&input).unwrap_err();
        assert!(err.to_string().contains("inference"));
    }

    #[test]
    fn removal_error_displays_message() {
        let err = RemovalError::new("model not found");
        assert_eq!(err.to_string(), "model not found");
    }
}
