pub mod import;
pub mod extraction;
pub mod analysis;
pub mod presenter;
pub mod diagnostic; // Per-run artifact dump (enabled by CODA_DUMP_DIR in the binary)
