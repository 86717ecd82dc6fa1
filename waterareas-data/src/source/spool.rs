//! Buffering of standard input so it can be read more than once.

use std::io::{self, Write};

use camino::Utf8PathBuf;
use tempfile::{Builder, TempPath};

use super::ReadError;

pub(super) fn spool_stdin() -> Result<(Utf8PathBuf, TempPath), ReadError> {
    let stdin = io::stdin();
    spool_reader(&mut stdin.lock())
}

pub(super) fn spool_reader<R: io::Read>(
    reader: &mut R,
) -> Result<(Utf8PathBuf, TempPath), ReadError> {
    let spool_error = |source| ReadError::Spool { source };
    let mut file = Builder::new()
        .prefix("waterareas-stdin-")
        .tempfile()
        .map_err(spool_error)?;
    let copied = io::copy(reader, &mut file).map_err(spool_error)?;
    file.flush().map_err(spool_error)?;
    log::debug!("buffered {copied} bytes of standard input");

    let temp_path = file.into_temp_path();
    let path = Utf8PathBuf::from_path_buf(temp_path.to_path_buf()).map_err(|path| {
        spool_error(io::Error::other(format!(
            "temporary path {} is not UTF-8",
            path.display()
        )))
    })?;
    Ok((path, temp_path))
}
