//! Submission document
//!
//! One song submission: the song, its album (absent for singles), credited
//! artists and the synths used, each synth with the presets heard in the song.
//! The document is built from form fields, passed through every pipeline
//! stage and stored verbatim (as JSON) while it waits for admin review.
//!
//! `*_filled` / `filled` flags record that an entity was matched against an
//! existing canonical row and its fields were overwritten with canonical
//! values. A filled entity's image already lives in approved storage.

use psdb_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Current document layout version, stored with every pending submission
pub const DOCUMENT_VERSION: u32 = 1;

/// Artist role that must appear exactly once per submission
pub const MAIN_ROLE: &str = "Main";

fn current_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDocument {
    #[serde(default = "current_version")]
    pub version: u32,

    #[serde(default)]
    pub song: SongEntry,

    /// Album the song appears on; ignored when the song is a single
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<AlbumEntry>,

    #[serde(default)]
    pub artists: Vec<ArtistEntry>,

    #[serde(default)]
    pub synths: Vec<SynthEntry>,

    /// Submitting user, when authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl Default for SubmissionDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            song: SongEntry::default(),
            album: None,
            artists: Vec::new(),
            synths: Vec::new(),
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "songImg")]
    pub img: Option<String>,
    /// Image was inherited from the album rather than uploaded for the song
    #[serde(default)]
    pub song_img_from_album: bool,
    #[serde(default)]
    pub song_filled: bool,
    /// Song has no album
    #[serde(default)]
    pub single: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "albumImg")]
    pub img: Option<String>,
    #[serde(default)]
    pub album_filled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub filled: bool,
}

impl ArtistEntry {
    pub fn is_main(&self) -> bool {
        self.role.eq_ignore_ascii_case(MAIN_ROLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default, rename = "type")]
    pub synth_type: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub filled: bool,
    #[serde(default)]
    pub presets: Vec<PresetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pack_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub usage_type: String,
    /// Audio clip of the preset as used in this song
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub filled: bool,
}

impl SubmissionDocument {
    /// Album that will be linked to the song, if any
    pub fn linked_album(&self) -> Option<&AlbumEntry> {
        if self.song.single {
            None
        } else {
            self.album.as_ref()
        }
    }

    /// Structural validation run before any side effect
    ///
    /// Rejects documents without a song title, without exactly one "Main"
    /// artist, with a non-single song lacking an album title, or with
    /// unnamed artists, synths or presets.
    pub fn validate(&self) -> Result<()> {
        if self.version != DOCUMENT_VERSION {
            return Err(Error::InvalidInput(format!(
                "Unsupported submission version {}",
                self.version
            )));
        }

        if self.song.title.is_empty() {
            return Err(Error::InvalidInput("Song title is required".to_string()));
        }

        if !self.song.single {
            match &self.album {
                Some(album) if !album.title.is_empty() => {}
                _ => {
                    return Err(Error::InvalidInput(
                        "Album title is required unless the song is a single".to_string(),
                    ))
                }
            }
        }

        let main_artists = self.artists.iter().filter(|a| a.is_main()).count();
        if main_artists != 1 {
            return Err(Error::InvalidInput(format!(
                "Exactly one artist must have role \"{}\" (found {})",
                MAIN_ROLE, main_artists
            )));
        }

        if let Some(index) = self.artists.iter().position(|a| a.name.is_empty()) {
            return Err(Error::InvalidInput(format!("Artist {} has no name", index)));
        }

        for (i, synth) in self.synths.iter().enumerate() {
            if synth.name.is_empty() {
                return Err(Error::InvalidInput(format!("Synth {} has no name", i)));
            }
            if let Some(j) = synth.presets.iter().position(|p| p.name.is_empty()) {
                return Err(Error::InvalidInput(format!(
                    "Preset {} of synth {} has no name",
                    j, i
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_document() -> SubmissionDocument {
        SubmissionDocument {
            song: SongEntry {
                title: "Roygbiv".to_string(),
                single: true,
                ..Default::default()
            },
            artists: vec![ArtistEntry {
                name: "Boards of Canada".to_string(),
                country: "UK".to_string(),
                role: "Main".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_document_passes() {
        assert!(valid_document().validate().is_ok());
    }

    #[test]
    fn test_missing_main_artist_rejected() {
        let mut doc = valid_document();
        doc.artists[0].role = "Featured".to_string();

        let err = doc.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("found 0")));
    }

    #[test]
    fn test_two_main_artists_rejected() {
        let mut doc = valid_document();
        let mut second = doc.artists[0].clone();
        second.name = "Tycho".to_string();
        doc.artists.push(second);

        let err = doc.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("found 2")));
    }

    #[test]
    fn test_album_required_unless_single() {
        let mut doc = valid_document();
        doc.song.single = false;
        assert!(doc.validate().is_err());

        doc.album = Some(AlbumEntry {
            title: "Music Has the Right to Children".to_string(),
            ..Default::default()
        });
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_linked_album_ignored_for_single() {
        let mut doc = valid_document();
        doc.album = Some(AlbumEntry::default());

        assert!(doc.linked_album().is_none());
        doc.song.single = false;
        assert!(doc.linked_album().is_some());
    }

    #[test]
    fn test_json_layout_uses_camel_case_names() {
        let mut doc = valid_document();
        doc.song.img = Some("a.png".to_string());
        doc.synths.push(SynthEntry {
            name: "Juno-60".to_string(),
            synth_type: "Analog".to_string(),
            presets: vec![PresetEntry {
                pack_name: "Factory".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["song"]["songImg"], "a.png");
        assert_eq!(json["song"]["songFilled"], false);
        assert_eq!(json["synths"][0]["type"], "Analog");
        assert_eq!(json["synths"][0]["presets"][0]["packName"], "Factory");
        assert!(json.get("album").is_none());
    }
}
