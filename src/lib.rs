//! # treeport
//!
//! Import core of a genealogy application.
//!
//! Two input formats are understood:
//!
//! - **Project containers**: ZIP archives holding a JSON serialization of the
//!   tree, written and read by the self-contained codec in [`zip`] and the
//!   entry conventions in [`project`].
//! - **Legacy exports**: an undocumented binary format from older genealogy
//!   software, recovered heuristically by [`legacy`] and turned into domain
//!   entities by [`model::build`].
//!
//! [`sniff::open_bytes`] picks the right path for a byte buffer. The
//! [`io`] module loads that buffer from a local file or an HTTP URL.
//!
//! ## Example
//!
//! ```
//! use treeport::{project, sniff, zip::WriterOptions};
//!
//! let bundle = sniff::open_bytes(b"\0P1NAMEJohn /Smith/SEXM\0")?;
//! assert_eq!(bundle.individuals[0].given, "John");
//!
//! let saved = project::save(&bundle, &WriterOptions::default())?;
//! let reopened = sniff::open_bytes(&saved)?;
//! assert_eq!(reopened.individuals[0].id, bundle.individuals[0].id);
//! # Ok::<(), treeport::Error>(())
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod legacy;
pub mod logging;
pub mod model;
pub mod project;
pub mod sniff;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{HttpReader, LocalFileReader, ReadAt};
pub use model::ProjectBundle;
pub use zip::{ContainerEntries, ZipFileEntry};
