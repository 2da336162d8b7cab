//! The latest reply, persisted as files.

use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{Error, Stage};

/// One of the two files a reply is persisted as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The reply text.
    Text,
    /// The reply read aloud.
    Audio,
}

impl ArtifactKind {
    /// Fixed file name inside the output directory.
    #[inline]
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Text => "response.txt",
            ArtifactKind::Audio => "response.mp3",
        }
    }

    /// MIME type offered with a download.
    #[inline]
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactKind::Text => "text/plain",
            ArtifactKind::Audio => "audio/mpeg",
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

fn storage_error(path: &Path, err: io::Error) -> Error {
    Error::service(Stage::Storage)
        .with_reason(format!("{}: {err}", path.display()))
}

// Copying a file onto itself truncates it.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A directory holding at most one artifact of each kind.
///
/// Every save replaces the previous artifact. Writes go through a
/// temporary file in the same directory followed by a rename, so the
/// artifact at the fixed path is always a complete one.
#[derive(Clone, Debug)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Opens `dir`, creating it if absent.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| storage_error(&dir, err))?;
        debug!("output directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// The output directory.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the artifact of `kind` lives.
    #[inline]
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Whether an artifact of `kind` has been saved.
    #[inline]
    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.path(kind).is_file()
    }

    /// Overwrites the text artifact.
    pub async fn save_text(&self, text: &str) -> Result<PathBuf, Error> {
        self.write(ArtifactKind::Text, text.as_bytes()).await
    }

    /// Overwrites the audio artifact.
    pub async fn save_audio(&self, audio: &[u8]) -> Result<PathBuf, Error> {
        self.write(ArtifactKind::Audio, audio).await
    }

    /// Reads the text artifact.
    pub async fn read_text(&self) -> Result<String, Error> {
        let path = self.path(ArtifactKind::Text);
        fs::read_to_string(&path)
            .await
            .map_err(|err| storage_error(&path, err))
    }

    /// Reads the artifact of `kind` as raw bytes.
    pub async fn read_bytes(
        &self,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, Error> {
        let path = self.path(kind);
        fs::read(&path).await.map_err(|err| storage_error(&path, err))
    }

    /// Copies the artifact of `kind` to `destination` and returns the
    /// written path. A directory destination keeps the artifact's name.
    pub async fn copy_to(
        &self,
        kind: ArtifactKind,
        destination: &Path,
    ) -> Result<PathBuf, Error> {
        let source = self.path(kind);
        if !source.is_file() {
            return Err(Error::service(Stage::Storage)
                .with_reason(format!("there is no {kind} yet")));
        }
        let target = if destination.is_dir() {
            destination.join(kind.file_name())
        } else {
            destination.to_path_buf()
        };
        if same_file(&source, &target).await {
            debug!("{kind} is already at {}", target.display());
            return Ok(target);
        }
        fs::copy(&source, &target)
            .await
            .map_err(|err| storage_error(&target, err))?;
        info!("copied {kind} to {}", target.display());
        Ok(target)
    }

    async fn write(
        &self,
        kind: ArtifactKind,
        data: &[u8],
    ) -> Result<PathBuf, Error> {
        let path = self.path(kind);
        let tmp_path = self.dir.join(format!(".{}.tmp", kind.file_name()));
        fs::write(&tmp_path, data)
            .await
            .map_err(|err| storage_error(&tmp_path, err))?;
        if let Err(err) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(storage_error(&path, err));
        }
        trace!("wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::open(dir.path().join("output")).unwrap();
        assert!(!store.exists(ArtifactKind::Text));

        let path = store.save_text("first reply").await.unwrap();
        assert_eq!(path, store.dir().join("response.txt"));
        store.save_text("second reply").await.unwrap();
        assert_eq!(store.read_text().await.unwrap(), "second reply");

        store.save_audio(b"ID3").await.unwrap();
        assert!(store.exists(ArtifactKind::Audio));
        assert_eq!(
            store.read_bytes(ArtifactKind::Audio).await.unwrap(),
            b"ID3"
        );

        // No temporary files are left behind.
        let mut names = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, ["response.mp3", "response.txt"]);
    }

    #[tokio::test]
    async fn test_copy_to() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::open(dir.path().join("output")).unwrap();
        let downloads = dir.path().join("downloads");
        std::fs::create_dir(&downloads).unwrap();

        let err = store
            .copy_to(ArtifactKind::Audio, &downloads)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.stage(), Some(Stage::Storage));

        store.save_text("Hanoi").await.unwrap();
        let target = store
            .copy_to(ArtifactKind::Text, &downloads)
            .await
            .unwrap();
        assert_eq!(target, downloads.join("response.txt"));

        let renamed = downloads.join("answer.txt");
        store.copy_to(ArtifactKind::Text, &renamed).await.unwrap();
        assert_eq!(std::fs::read_to_string(renamed).unwrap(), "Hanoi");
    }

    #[tokio::test]
    async fn test_copy_onto_itself_keeps_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::open(dir.path().join("output")).unwrap();
        store.save_text("Hanoi").await.unwrap();

        let target = store
            .copy_to(ArtifactKind::Text, store.dir())
            .await
            .unwrap();
        assert_eq!(target, store.path(ArtifactKind::Text));
        assert_eq!(store.read_text().await.unwrap(), "Hanoi");

        // The same file reached through a different spelling.
        let detour = dir.path().join("output/../output/response.txt");
        store.copy_to(ArtifactKind::Text, &detour).await.unwrap();
        assert_eq!(store.read_text().await.unwrap(), "Hanoi");
    }
}
