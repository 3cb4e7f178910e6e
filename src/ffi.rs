//! FFI bindings for IFEEL
//!
//! This module provides C-compatible functions for calling IFEEL from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `ifeel_free_string`.
//!
//! Configurations are passed as JSON, e.g.
//! `{"alphabet_size": 7, "business_hour_start": 9, "business_hour_end": 17}`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::error::IfeelError;
use crate::pipeline::{extract_features, FeaturePipeline};
use crate::table::LoadTable;

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

/// Return `result` as a C string, or NULL with the error recorded
fn finish(result: Result<String, IfeelError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Read the CSV and config arguments shared by the stateless calls
unsafe fn read_inputs(
    csv: *const c_char,
    config_json: *const c_char,
) -> Option<(LoadTable, ExtractionConfig)> {
    let Some(csv_str) = cstr_to_string(csv) else {
        set_last_error("Invalid CSV string pointer");
        return None;
    };
    let Some(config_str) = cstr_to_string(config_json) else {
        set_last_error("Invalid config string pointer");
        return None;
    };

    let parsed = ExtractionConfig::from_json(&config_str)
        .and_then(|config| LoadTable::from_csv_str(&csv_str).map(|table| (table, config)));
    match parsed {
        Ok(inputs) => Some(inputs),
        Err(e) => {
            set_last_error(&e.to_string());
            None
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Extract both feature tables from a CSV load table; returns JSON.
///
/// # Safety
/// - `csv` and `config_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `ifeel_free_string`.
/// - Returns NULL on error; call `ifeel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ifeel_extract_csv(
    csv: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some((table, config)) = read_inputs(csv, config_json) else {
        return ptr::null_mut();
    };

    finish(
        extract_features(&table, config)
            .and_then(|features| serde_json::to_string(&features).map_err(IfeelError::from)),
    )
}

#[derive(Serialize)]
struct TransformedRow {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    codes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// SAX-transform every row of a CSV load table; returns a JSON array.
///
/// # Safety
/// - `csv` and `config_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `ifeel_free_string`.
/// - Returns NULL on error; call `ifeel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ifeel_transform_csv(
    csv: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some((table, config)) = read_inputs(csv, config_json) else {
        return ptr::null_mut();
    };

    let result = FeaturePipeline::new(config, &table.slot_labels).and_then(|pipeline| {
        let rows: Vec<TransformedRow> = table
            .rows
            .iter()
            .map(|row| match pipeline.transform_row(row) {
                Ok(profile) => TransformedRow {
                    id: row.id.clone(),
                    word: Some(profile.word()),
                    codes: Some(profile.codes),
                    error: None,
                },
                Err(e) => TransformedRow {
                    id: row.id.clone(),
                    word: None,
                    codes: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        serde_json::to_string(&rows).map_err(IfeelError::from)
    });
    finish(result)
}

// ============================================================================
// Stateful Pipeline API
// ============================================================================

/// Opaque handle to a FeaturePipeline
pub struct IfeelPipelineHandle {
    pipeline: FeaturePipeline,
}

/// Create a pipeline for a fixed set of slot labels.
///
/// `slot_labels` is a comma-separated list of `HH:MM:SS` labels.
///
/// # Safety
/// - `config_json` and `slot_labels` must be valid null-terminated C strings.
/// - Must be freed with `ifeel_pipeline_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn ifeel_pipeline_new(
    config_json: *const c_char,
    slot_labels: *const c_char,
) -> *mut IfeelPipelineHandle {
    clear_last_error();

    let Some(config_str) = cstr_to_string(config_json) else {
        set_last_error("Invalid config string pointer");
        return ptr::null_mut();
    };
    let Some(labels_str) = cstr_to_string(slot_labels) else {
        set_last_error("Invalid slot labels string pointer");
        return ptr::null_mut();
    };

    let labels: Vec<&str> = labels_str.split(',').map(str::trim).collect();
    match ExtractionConfig::from_json(&config_str)
        .and_then(|config| FeaturePipeline::new(config, &labels))
    {
        Ok(pipeline) => Box::into_raw(Box::new(IfeelPipelineHandle { pipeline })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a pipeline.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `ifeel_pipeline_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ifeel_pipeline_free(pipeline: *mut IfeelPipelineHandle) {
    if !pipeline.is_null() {
        drop(Box::from_raw(pipeline));
    }
}

/// Extract both feature vectors of one day; returns JSON.
///
/// NaN readings are treated as missing.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `ifeel_pipeline_new`.
/// - `readings` must point to `len` contiguous doubles.
/// - Returns a newly allocated string that must be freed with `ifeel_free_string`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn ifeel_pipeline_process(
    pipeline: *const IfeelPipelineHandle,
    readings: *const f64,
    len: usize,
) -> *mut c_char {
    clear_last_error();

    if pipeline.is_null() {
        set_last_error("Null pipeline pointer");
        return ptr::null_mut();
    }
    if readings.is_null() && len > 0 {
        set_last_error("Null readings pointer");
        return ptr::null_mut();
    }

    let handle = &*pipeline;
    let values: Vec<Option<f64>> = if len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(readings, len)
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
            .collect()
    };

    finish(
        handle
            .pipeline
            .process_profile(&values)
            .and_then(|features| serde_json::to_string(&features).map_err(IfeelError::from)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by IFEEL functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an IFEEL function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ifeel_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next IFEEL function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn ifeel_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the IFEEL library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn ifeel_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
