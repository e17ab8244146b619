#![no_main]

use libfuzzer_sys::fuzz_target;
use ocrd_validators::{Bag, OcrdZipValidator, ZipValidationOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(bag) = Bag::from_zip_bytes(data) {
        // Stored entries never escape the bag root.
        for path in bag.paths() {
            assert!(!path.starts_with('/') && !path.split('/').any(|p| p == ".."), "{}", path);
        }
    }
    if let Ok(validator) = OcrdZipValidator::builtin() {
        let _ = validator.validate_bytes(data, &ZipValidationOptions::default());
    }
});
