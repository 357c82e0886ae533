//! Per-thread COM apartment and CoTaskMem ownership.

use std::cell::RefCell;
use std::ffi::c_void;

use windows::core::PWSTR;
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{CoInitializeEx, CoTaskMemFree, CoUninitialize, COINIT_MULTITHREADED};

use crate::EndpointError;

struct Apartment {
    owned: bool,
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: paired with the successful CoInitializeEx on this thread
            unsafe { CoUninitialize() };
        }
    }
}

thread_local! {
    static APARTMENT: RefCell<Option<Apartment>> = const { RefCell::new(None) };
}

/// Joins the multithreaded apartment on the current thread, once.
///
/// A thread that already lives in a single-threaded apartment keeps it; COM
/// is usable there, it just isn't ours to tear down.
pub(super) fn ensure_apartment() -> Result<(), EndpointError> {
    APARTMENT.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Ok(());
        }

        // SAFETY: no reserved pointer, plain apartment initialization
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            *slot = Some(Apartment { owned: false });
            return Ok(());
        }
        hr.ok()
            .map_err(|e| EndpointError::os("CoInitializeEx", e.code().0))?;

        *slot = Some(Apartment { owned: true });
        Ok(())
    })
}

/// Owns a wide string allocated by COM with `CoTaskMemAlloc`.
pub(super) struct CoTaskString(PWSTR);

impl CoTaskString {
    pub(super) fn new(raw: PWSTR) -> Self {
        Self(raw)
    }

    pub(super) fn to_owned_string(&self) -> Result<String, EndpointError> {
        if self.0.is_null() {
            return Err(EndpointError::backend("null endpoint id"));
        }
        // SAFETY: non-null and NUL-terminated, as returned by IMMDevice::GetId
        unsafe { self.0.to_string() }
            .map_err(|e| EndpointError::backend(format!("invalid endpoint id: {e}")))
    }
}

impl Drop for CoTaskString {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the buffer came from CoTaskMemAlloc and is freed once
            unsafe { CoTaskMemFree(Some(self.0 .0 as *const c_void)) };
        }
    }
}

/// NUL-terminated UTF-16 copy of `s` for `PCWSTR` parameters.
pub(super) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
