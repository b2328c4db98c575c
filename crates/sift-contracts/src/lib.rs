//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable I/O: the resolved tree handed over by a front end,
//! the lint report, the CLI tool report and the config file.

pub const SIFT_TREE_SCHEMA_VERSION: &str = "sift.tree@0.1.0";
pub const SIFT_DIAG_SCHEMA_VERSION: &str = "sift.diag@0.1.0";
pub const SIFT_CONFIG_SCHEMA_VERSION: &str = "sift.config@0.1.0";

pub const SIFTC_REPORT_SCHEMA_VERSION: &str = "siftc.report@0.1.0";
pub const SIFTC_CHECKS_SCHEMA_VERSION: &str = "siftc.checks@0.1.0";

pub const SIFT_TREE_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &[SIFT_TREE_SCHEMA_VERSION];
pub const SIFT_CONFIG_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &[SIFT_CONFIG_SCHEMA_VERSION];
