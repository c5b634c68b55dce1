//! Input format detection.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::ProjectBundle;
use crate::zip::{EndOfCentralDirectory, LFH_SIGNATURE};
use crate::{legacy, model, project};

/// What a byte buffer looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A ZIP project container.
    Container,
    /// Anything else; handed to the legacy decoder.
    Legacy,
}

/// Classify a buffer by its leading bytes.
///
/// An empty archive is nothing but an EOCD record, so that signature counts
/// as a container too.
pub fn detect(bytes: &[u8]) -> Format {
    if bytes.starts_with(LFH_SIGNATURE) || bytes.starts_with(EndOfCentralDirectory::SIGNATURE) {
        Format::Container
    } else {
        Format::Legacy
    }
}

/// Open a project container or a legacy export.
///
/// # Errors
///
/// - container errors from [`project::load`]
/// - [`Error::UnrecognizedFormat`] when a legacy decode finds no record
pub fn open_bytes(bytes: &[u8]) -> Result<ProjectBundle> {
    let format = detect(bytes);
    debug!("event=sniff format={:?} bytes={}", format, bytes.len());

    match format {
        Format::Container => project::load(bytes),
        Format::Legacy => {
            let decoded = legacy::decode(bytes);
            if decoded.is_empty() {
                warn!("event=sniff status=unrecognized bytes={}", bytes.len());
                return Err(Error::UnrecognizedFormat);
            }
            Ok(model::build(&decoded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::{WriterOptions, write_entries};

    #[test]
    fn detects_containers() {
        let bytes = write_entries(
            &[("data.json".to_string(), b"{}".to_vec())],
            &WriterOptions::deterministic(),
        )
        .unwrap();
        assert_eq!(detect(&bytes), Format::Container);

        let empty = write_entries(&[], &WriterOptions::deterministic()).unwrap();
        assert_eq!(detect(&empty), Format::Container);
    }

    #[test]
    fn everything_else_is_legacy() {
        assert_eq!(detect(b"P1NAMEJohn"), Format::Legacy);
        assert_eq!(detect(b""), Format::Legacy);
        assert_eq!(detect(b"PK"), Format::Legacy);
    }

    #[test]
    fn legacy_bytes_become_a_bundle() {
        let bundle = open_bytes(b"\0P1NAMEJohn /Smith/SEXM\0").unwrap();
        assert_eq!(bundle.individuals.len(), 1);
        assert_eq!(bundle.individuals[0].surname, "Smith");
    }

    #[test]
    fn unrecognized_input() {
        assert!(matches!(
            open_bytes(b"plain text"),
            Err(Error::UnrecognizedFormat)
        ));
    }

    #[test]
    fn empty_archive_lacks_data_entry() {
        let empty = write_entries(&[], &WriterOptions::deterministic()).unwrap();
        assert!(matches!(open_bytes(&empty), Err(Error::MissingEntry(_))));
    }
}
