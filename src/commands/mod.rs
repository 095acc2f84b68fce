//! Command implementations shared by the `roomgen` and `roomscan` binaries.

pub mod config;
pub mod design;
pub mod scan;
pub mod shop;

/// Version line including build metadata.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("ROOMGEN_GIT_SHA"),
    ", built: ",
    env!("ROOMGEN_BUILD_TS"),
    ")"
);
