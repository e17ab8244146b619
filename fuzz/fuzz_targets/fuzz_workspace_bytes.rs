#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrd_validators::{WorkspaceValidationOptions, WorkspaceValidator};

fuzz_target!(|data: &[u8]| {
    let Ok(validator) = WorkspaceValidator::builtin() else {
        return;
    };
    // No directory: only in-memory and remote references can resolve.
    let report = validator.validate_bytes(data, None, &WorkspaceValidationOptions::default());
    if report.is_valid() {
        assert!(report.errors().next().is_none());
    }
});
