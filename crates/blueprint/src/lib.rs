//! # ExamForge Blueprints
//!
//! Loading and memoizing blueprint definitions.
//!
//! - [`BlueprintStore`] decodes each blueprint at most once per process and
//!   serves the cached value afterwards.
//! - [`json`] is the on-disk blueprint document format.
//! - [`DirectoryBlueprintSource`] reads `<dir>/<id>.json` documents.

pub mod directory;
pub mod json;
pub mod store;

pub use directory::DirectoryBlueprintSource;
pub use store::BlueprintStore;
