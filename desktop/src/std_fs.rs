use std::{fs, io::Seek};

use embedded_io::{ErrorType, SeekFrom};
use log::info;
use planedelta_core::fs::Mode;

pub struct StdFilesystem {
    base_path: std::path::PathBuf,
}

impl StdFilesystem {
    pub fn new_with_base_path(base_path: std::path::PathBuf) -> Self {
        info!("Using StdFilesystem with base path: {:?}", base_path);
        StdFilesystem { base_path }
    }
}

impl ErrorType for StdFilesystem {
    type Error = embedded_io::ErrorKind;
}

type Result<T> = core::result::Result<T, embedded_io::ErrorKind>;

fn kind_of(error: &std::io::Error) -> embedded_io::ErrorKind {
    match error.kind() {
        std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
        std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
        std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
        _ => embedded_io::ErrorKind::Other,
    }
}

impl planedelta_core::fs::Filesystem for StdFilesystem {
    type File = StdFile;

    fn open_file(&self, path: &str, mode: Mode) -> Result<StdFile> {
        let path = self.base_path.join(path);
        let options = match mode {
            Mode::Read => fs::OpenOptions::new().read(true).clone(),
            Mode::Write => fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .clone(),
        };
        let file = options.open(&path).map_err(|e| kind_of(&e))?;
        StdFile::new(file).map_err(|e| kind_of(&e))
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        let path = self.base_path.join(path);
        std::fs::create_dir_all(path).map_err(|e| kind_of(&e))
    }
}

pub struct StdFile {
    file: std::io::BufReader<std::fs::File>,
    size: usize,
}

impl StdFile {
    pub fn new(mut file: std::fs::File) -> std::io::Result<Self> {
        let size = file.seek(std::io::SeekFrom::End(0))? as usize;
        file.seek(std::io::SeekFrom::Start(0))?;
        Ok(StdFile {
            file: std::io::BufReader::new(file),
            size,
        })
    }
}

impl planedelta_core::fs::File for StdFile {
    fn size(&self) -> usize {
        self.size
    }
}

impl ErrorType for StdFile {
    type Error = std::io::Error;
}

impl embedded_io::Seek for StdFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos.into())
    }
}

impl embedded_io::Read for StdFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::Read;
        self.file.read(buf)
    }
}

impl embedded_io::Write for StdFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use std::io::Write;
        let written = self.file.get_mut().write(buf)?;
        self.size = self.size.max(self.file.get_mut().stream_position()? as usize);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        use std::io::Write;
        self.file.get_mut().flush()
    }
}

#[cfg(test)]
mod tests {
    use planedelta_core::{container, encoder, error::AnimError, quantize::GrayscaleFrame};

    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("planedelta-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_store_and_load_on_disk() {
        let base = scratch("roundtrip");
        let fs = StdFilesystem::new_with_base_path(base.clone());
        let frames = [GrayscaleFrame::filled(0), GrayscaleFrame::filled(200)];
        let sequence = encoder::encode_sequence(frames.iter().map(|f| (f, 80))).unwrap();

        container::store(&fs, "out", &sequence).unwrap();
        assert!(base.join("out/frame001.d4").exists());
        assert_eq!(std::fs::read_to_string(base.join("out/frames.txt")).unwrap(), "80\n80\n");

        let loaded = container::load(&fs, "out").unwrap();
        assert!(loaded == sequence);
        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let base = scratch("missing");
        let fs = StdFilesystem::new_with_base_path(base.clone());
        match container::load(&fs, "nothing-here") {
            Err(AnimError::Io { kind, .. }) => assert_eq!(kind, embedded_io::ErrorKind::NotFound),
            other => panic!("unexpected {other:?}"),
        }
        std::fs::remove_dir_all(base).unwrap();
    }
}
