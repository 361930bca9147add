//! FFI bindings for Neurascreen
//!
//! This module provides C-compatible functions for calling the screening
//! engine from mobile host apps. All functions use C strings
//! (null-terminated) and return allocated memory that must be freed by the
//! caller using `neurascreen_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::CalibrationConfig;
use crate::report::ReportEncoder;
use crate::schema::RecordedSession;
use crate::session::{score_recorded, ScreeningEngine};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn serialize_or_null<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score a recorded session JSON with the default calibration and return
/// the scoring result as JSON.
///
/// # Safety
/// - `session_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_score_session(session_json: *const c_char) -> *mut c_char {
    neurascreen_score_session_with_calibration(session_json, ptr::null())
}

/// Score a recorded session JSON against a specific calibration table.
///
/// # Safety
/// - `session_json` must be a valid null-terminated C string.
/// - `calibration_json` may be NULL to use the default calibration.
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_score_session_with_calibration(
    session_json: *const c_char,
    calibration_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let session_str = match cstr_to_string(session_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid session JSON pointer");
            return ptr::null_mut();
        }
    };

    let calibration = if calibration_json.is_null() {
        CalibrationConfig::default()
    } else {
        let calibration_str = match cstr_to_string(calibration_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid calibration JSON pointer");
                return ptr::null_mut();
            }
        };
        match CalibrationConfig::from_json(&calibration_str) {
            Ok(calibration) => calibration,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let session = match RecordedSession::from_json(&session_str) {
        Ok(session) => session,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match score_recorded(&session, &calibration) {
        Ok(result) => serialize_or_null(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the built-in calibration table as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_default_calibration() -> *mut c_char {
    clear_last_error();
    match CalibrationConfig::default().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to a ScreeningEngine
pub struct ScreeningEngineHandle {
    engine: ScreeningEngine,
}

/// Create a new engine with the default calibration.
///
/// # Safety
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `neurascreen_engine_free`.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_new() -> *mut ScreeningEngineHandle {
    clear_last_error();
    let handle = Box::new(ScreeningEngineHandle {
        engine: ScreeningEngine::new(),
    });
    Box::into_raw(handle)
}

/// Create a new engine with a custom calibration table.
///
/// # Safety
/// - `calibration_json` must be a valid null-terminated C string.
/// - Returns a pointer that must be freed with `neurascreen_engine_free`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_with_calibration(
    calibration_json: *const c_char,
) -> *mut ScreeningEngineHandle {
    clear_last_error();

    let calibration_str = match cstr_to_string(calibration_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid calibration JSON pointer");
            return ptr::null_mut();
        }
    };

    let calibration = match CalibrationConfig::from_json(&calibration_str) {
        Ok(calibration) => calibration,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match ScreeningEngine::with_calibration(calibration) {
        Ok(engine) => Box::into_raw(Box::new(ScreeningEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neurascreen_engine_new`
///   or `neurascreen_engine_with_calibration`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_free(engine: *mut ScreeningEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Score a recorded session with a stateful engine, accumulating the
/// result for the composite.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neurascreen_engine_new`.
/// - `session_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_process_session(
    engine: *mut ScreeningEngineHandle,
    session_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let session_str = match cstr_to_string(session_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid session JSON pointer");
            return ptr::null_mut();
        }
    };

    let session = match RecordedSession::from_json(&session_str) {
        Ok(session) => session,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle.engine.process_session(&session) {
        Ok(result) => serialize_or_null(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the composite assessment over every session the engine has scored.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neurascreen_engine_new`.
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_composite(
    engine: *mut ScreeningEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;
    serialize_or_null(&handle.engine.composite())
}

/// Encode the engine's results as a screen.report.v1 payload.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neurascreen_engine_new`.
/// - Returns a newly allocated string that must be freed with `neurascreen_free_string`.
/// - Returns NULL on error; call `neurascreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_report(
    engine: *mut ScreeningEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let encoder = ReportEncoder::new();
    match encoder.encode_to_json(
        handle.engine.results(),
        &handle.engine.composite(),
        handle.engine.calibration(),
    ) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Drop every recorded result, keeping the engine's calibration.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `neurascreen_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_engine_clear(engine: *mut ScreeningEngineHandle) {
    clear_last_error();
    if engine.is_null() {
        set_last_error("Null engine pointer");
        return;
    }
    let handle = &mut *engine;
    handle.engine.clear();
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Neurascreen functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Neurascreen function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Neurascreen function call
///   on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Neurascreen library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn neurascreen_version() -> *const c_char {
    // Use a static byte string to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_session_json() -> CString {
        CString::new(
            r#"{
            "schema_version": "screen.session.v1",
            "recorded_at": "2026-03-02T09:15:00Z",
            "task": "continuous_performance",
            "performance": {
                "correct": 24,
                "incorrect": 3,
                "missed": 4,
                "avg_response_time_ms": 320.0,
                "response_time_std_dev_ms": 90.0,
                "duration_seconds": 60.0
            },
            "face": {
                "look_away_count": 2,
                "blink_rate_per_min": 15.0,
                "sustained_attention_score": 85.0,
                "distractibility_index": 15.0,
                "emotion_change_rate_per_min": 1.0,
                "emotion_variability": 20.0,
                "face_visible_pct": 95.0,
                "attention_lapse_count": 1,
                "avg_look_away_duration_ms": 400.0
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_score_session() {
        let json = sample_session_json();

        unsafe {
            let result = neurascreen_score_session(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("attention_score"));
            assert!(result_str.contains("continuous_performance"));

            neurascreen_free_string(result);
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = neurascreen_engine_new();
            assert!(!engine.is_null());

            let json = sample_session_json();
            let result = neurascreen_engine_process_session(engine, json.as_ptr());
            assert!(!result.is_null());
            neurascreen_free_string(result);

            let composite = neurascreen_engine_composite(engine);
            assert!(!composite.is_null());
            let composite_str = CStr::from_ptr(composite).to_str().unwrap();
            assert!(composite_str.contains("\"tasks_completed\":1"));
            neurascreen_free_string(composite);

            let report = neurascreen_engine_report(engine);
            assert!(!report.is_null());
            let report_str = CStr::from_ptr(report).to_str().unwrap();
            assert!(report_str.contains("screen.report.v1"));
            neurascreen_free_string(report);

            neurascreen_engine_clear(engine);
            let cleared = neurascreen_engine_composite(engine);
            let cleared_str = CStr::from_ptr(cleared).to_str().unwrap();
            assert!(cleared_str.contains("\"tasks_completed\":0"));
            neurascreen_free_string(cleared);

            neurascreen_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_custom_calibration_round_trip() {
        unsafe {
            let calibration = neurascreen_default_calibration();
            assert!(!calibration.is_null());

            let engine = neurascreen_engine_with_calibration(calibration);
            assert!(!engine.is_null());

            neurascreen_free_string(calibration);
            neurascreen_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = neurascreen_score_session(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = neurascreen_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let null_engine_result =
                neurascreen_engine_process_session(ptr::null_mut(), invalid_json.as_ptr());
            assert!(null_engine_result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = neurascreen_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
