//! Binary substrate shared by every block of an archive: cursors, regions,
//! the pooled name table and the name dictionary.

pub mod dict;
pub mod format;
pub mod names;
pub mod reader;
pub mod writer;

pub use dict::{calc_dictionary_size, DictNode, Dictionary};
pub use names::NameTable;
pub use reader::{Reader, Region};
pub use writer::{SizedScope, Writer};
