//! Side-table persistence for archive files.
//!
//! Archives carry auxiliary data ("slots") in a trailer written past the
//! archive's self-declared end, where the archive's own reader never looks.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`slot`]: slot kinds and their payload codecs
//! - [`trailer`]: end-offset rule, trailer reads and atomic rewrites
//! - [`session`]: attach/save of the registry's custom names and entity names

mod codec;
pub mod error;
pub mod session;
pub mod slot;
pub mod trailer;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use session::{
    attach_custom_names, load_custom_names, load_entity_names, save_custom_names,
    save_entity_names,
};
pub use slot::{SlotContent, SlotKind};
pub use trailer::{clear_slot, end_offset, read_slot, table_exists, write_slot, TRAILER_VERSION};
