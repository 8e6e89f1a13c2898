//! References from submission documents to stored files

use super::document::SubmissionDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Storage class of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Audio,
}

impl FileKind {
    pub const ALL: [FileKind; 2] = [FileKind::Image, FileKind::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Audio => "audio",
        }
    }

    /// Directory under the uploads root holding this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            FileKind::Image => "images",
            FileKind::Audio => "audio",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(FileKind::Image),
            "audio" => Ok(FileKind::Audio),
            other => Err(format!("unknown file kind: {}", other)),
        }
    }
}

/// A stored file name together with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRef {
    pub kind: FileKind,
    pub name: String,
}

impl FileRef {
    pub fn new(kind: FileKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn image(name: impl Into<String>) -> Self {
        Self::new(FileKind::Image, name)
    }

    pub fn audio(name: impl Into<String>) -> Self {
        Self::new(FileKind::Audio, name)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Files referenced by a document, split by storage area
///
/// A reference belongs to approved storage when a filled entity holds it;
/// otherwise it is still pending. The song image follows the album's status
/// when it was inherited from the album. Preset audio is specific to the song
/// and stays pending until approval regardless of the preset's flag.
///
/// The album is counted even for singles: its upload still has to be
/// resolved when the submission is approved or denied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFiles {
    pub pending: BTreeSet<FileRef>,
    pub approved: BTreeSet<FileRef>,
}

impl DocumentFiles {
    pub fn of(doc: &SubmissionDocument) -> Self {
        let mut files = Self::default();

        let album_filled = doc.album.as_ref().is_some_and(|a| a.album_filled);
        if let Some(album) = &doc.album {
            files.insert(FileKind::Image, &album.img, album.album_filled);
        }

        let song_approved =
            doc.song.song_filled || (doc.song.song_img_from_album && album_filled);
        files.insert(FileKind::Image, &doc.song.img, song_approved);

        for artist in &doc.artists {
            files.insert(FileKind::Image, &artist.img, artist.filled);
        }

        for synth in &doc.synths {
            files.insert(FileKind::Image, &synth.img, synth.filled);
            for preset in &synth.presets {
                files.insert(FileKind::Audio, &preset.audio, false);
            }
        }

        // A file held by any filled entity is never pending
        let approved = &files.approved;
        files.pending.retain(|file| !approved.contains(file));
        files
    }

    fn insert(&mut self, kind: FileKind, name: &Option<String>, approved: bool) {
        let Some(name) = name.as_deref().filter(|n| !n.is_empty()) else {
            return;
        };
        let file = FileRef::new(kind, name);
        if approved {
            self.approved.insert(file);
        } else {
            self.pending.insert(file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{AlbumEntry, ArtistEntry, PresetEntry, SynthEntry};

    #[test]
    fn test_unfilled_entities_reference_pending_files() {
        let mut doc = SubmissionDocument::default();
        doc.synths.push(SynthEntry {
            name: "Juno-60".to_string(),
            img: Some("juno.png".to_string()),
            presets: vec![
                PresetEntry {
                    audio: Some("a.mp3".to_string()),
                    ..Default::default()
                },
                PresetEntry {
                    audio: Some("b.mp3".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let files = DocumentFiles::of(&doc);
        assert_eq!(files.pending.len(), 3);
        assert!(files.pending.contains(&FileRef::image("juno.png")));
        assert!(files.pending.contains(&FileRef::audio("b.mp3")));
        assert!(files.approved.is_empty());
    }

    #[test]
    fn test_filled_entities_reference_approved_files() {
        let mut doc = SubmissionDocument::default();
        doc.artists.push(ArtistEntry {
            img: Some("boc.jpg".to_string()),
            filled: true,
            ..Default::default()
        });
        doc.synths.push(SynthEntry {
            img: Some("juno.png".to_string()),
            filled: true,
            presets: vec![PresetEntry {
                audio: Some("a.mp3".to_string()),
                filled: true,
                ..Default::default()
            }],
            ..Default::default()
        });

        let files = DocumentFiles::of(&doc);
        assert_eq!(
            files.approved,
            BTreeSet::from([FileRef::image("boc.jpg"), FileRef::image("juno.png")])
        );
        assert_eq!(files.pending, BTreeSet::from([FileRef::audio("a.mp3")]));
    }

    #[test]
    fn test_song_image_follows_album_status() {
        let mut doc = SubmissionDocument::default();
        doc.song.img = Some("cover.jpg".to_string());
        doc.song.song_img_from_album = true;
        doc.album = Some(AlbumEntry {
            img: Some("cover.jpg".to_string()),
            album_filled: true,
            ..Default::default()
        });

        let files = DocumentFiles::of(&doc);
        assert!(files.pending.is_empty());
        assert_eq!(files.approved, BTreeSet::from([FileRef::image("cover.jpg")]));

        doc.album.as_mut().unwrap().album_filled = false;
        let files = DocumentFiles::of(&doc);
        assert_eq!(files.pending, BTreeSet::from([FileRef::image("cover.jpg")]));
        assert!(files.approved.is_empty());
    }

    #[test]
    fn test_file_kind_parse() {
        assert_eq!("audio".parse::<FileKind>(), Ok(FileKind::Audio));
        assert!("video".parse::<FileKind>().is_err());
        assert_eq!(FileKind::Image.dir_name(), "images");
    }
}
