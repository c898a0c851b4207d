//! Platform-neutral synchronous file and handle operations.
//!
//! Every fallible operation takes an [`ErrorCode`] out-parameter. It is reset
//! to [`ErrorCode::SUCCESS`] before the native call and set to the neutral
//! code of the failure otherwise; nothing here panics or returns an error
//! type. Paths pass through the registered [`PathRemapper`] first.
//!
//! ```no_run
//! use hostio::{ErrorCode, FileAccess, FileMode, FileOptions, FileShare};
//!
//! let mut error = ErrorCode::SUCCESS;
//! let file = hostio::open(
//!     "hello.txt",
//!     FileMode::CREATE,
//!     FileAccess::READ_WRITE,
//!     FileShare::empty(),
//!     FileOptions::empty(),
//!     &mut error,
//! );
//! if let Some(file) = file {
//!     hostio::write(&file, b"hello", 0, 5, &mut error);
//!     hostio::close(file, &mut error);
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod convert;
pub mod filetime;

mod error;
pub use error::*;

mod options;
pub use options::*;

mod metadata;
pub use metadata::*;

mod entries;
pub use entries::*;

mod file;
pub use file::*;

mod path;
pub use path::*;

mod remap;
pub use remap::*;

mod stdio;
pub use stdio::*;

mod utils;
pub use utils::*;
