//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "0.0.0.0".into()
    }

    pub fn port() -> u16 {
        8080
    }

    /// One worker per available core, falling back to 4.
    pub fn workers() -> usize {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4)
    }
}

// ============================================================================
// [wiki] Section Defaults
// ============================================================================

pub mod wiki {
    use std::path::PathBuf;

    pub fn data() -> PathBuf {
        "data".into()
    }

    pub fn public() -> PathBuf {
        "public".into()
    }

    pub fn templates() -> PathBuf {
        "tmpl".into()
    }

    pub fn front_page() -> String {
        "Home".into()
    }
}
