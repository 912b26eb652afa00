use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each location key to `<directory>/<file_stem>_<location_key>.json`.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_stem: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_stem: String) -> Self {
        Self {
            directory_path,
            file_stem,
        }
    }

    pub fn path_for_location_key(&self, location_key: &str) -> PathBuf {
        self.directory_path
            .join(format!("{}_{location_key}.json", self.file_stem))
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        Ok(BufWriter::new(File::create(
            self.path_for_location_key(location_key),
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

impl Output for &SinkOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <SinkOutput as Output>::writer_for_location_key(self, location_key)
    }

    fn is_noop(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_name_files_after_stem_and_location_key() {
        let output = FileOutput::new(PathBuf::from("results"), "base_case".to_string());

        assert_eq!(
            output.path_for_location_key("intermediaries"),
            PathBuf::from("results/base_case_intermediaries.json")
        );
        assert!(!output.is_noop());
    }

    #[rstest]
    fn should_treat_sink_as_noop() {
        let mut writer = SinkOutput.writer_for_location_key("intermediaries").unwrap();

        assert!(SinkOutput.is_noop());
        assert!(writer.write_all(b"{}").is_ok());
    }
}
