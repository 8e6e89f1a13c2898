//! Typed document builder for form fields
//!
//! Parsed field paths resolve against the closed set of positions a
//! submission document has. Text slots take form values; file slots only take
//! stored upload names; the `filled` bookkeeping is not addressable at all.

use crate::models::{
    ArtistEntry, FieldPath, FileKind, PresetEntry, Segment, SubmissionDocument, SynthEntry,
};
use psdb_common::{Error, Result};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SongField {
    Title,
    Genre,
    Year,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlbumField {
    Title,
    Genre,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArtistField {
    Name,
    Country,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SynthField {
    Name,
    Manufacturer,
    Type,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PresetField {
    Name,
    PackName,
    Author,
    UsageType,
}

/// Position of a text value in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextSlot {
    Song(SongField),
    Single,
    Album(AlbumField),
    Artist(usize, ArtistField),
    Synth(usize, SynthField),
    Preset(usize, usize, PresetField),
}

/// Position of a stored file name in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileSlot {
    SongImg,
    AlbumImg,
    ArtistImg(usize),
    SynthImg(usize),
    PresetAudio(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Text(TextSlot),
    File(FileSlot),
}

/// Resolve a parsed path to a document slot, `None` if the document has no such position
pub(crate) fn resolve(path: &FieldPath) -> Option<Slot> {
    use Segment::{Index, Key};

    let slot = match path.segments() {
        [Key(root)] => match root.as_str() {
            "songImg" => Slot::File(FileSlot::SongImg),
            "albumImg" => Slot::File(FileSlot::AlbumImg),
            "single" => Slot::Text(TextSlot::Single),
            _ => return None,
        },
        [Key(root), Key(field)] if root == "song" => match field.as_str() {
            "title" => Slot::Text(TextSlot::Song(SongField::Title)),
            "genre" => Slot::Text(TextSlot::Song(SongField::Genre)),
            "year" => Slot::Text(TextSlot::Song(SongField::Year)),
            "url" => Slot::Text(TextSlot::Song(SongField::Url)),
            "single" => Slot::Text(TextSlot::Single),
            "songImg" | "img" => Slot::File(FileSlot::SongImg),
            _ => return None,
        },
        [Key(root), Key(field)] if root == "album" => match field.as_str() {
            "title" => Slot::Text(TextSlot::Album(AlbumField::Title)),
            "genre" => Slot::Text(TextSlot::Album(AlbumField::Genre)),
            "year" => Slot::Text(TextSlot::Album(AlbumField::Year)),
            "albumImg" | "img" => Slot::File(FileSlot::AlbumImg),
            _ => return None,
        },
        [Key(root), Index(i), Key(field)] if root == "artists" => match field.as_str() {
            "name" => Slot::Text(TextSlot::Artist(*i, ArtistField::Name)),
            "country" => Slot::Text(TextSlot::Artist(*i, ArtistField::Country)),
            "role" => Slot::Text(TextSlot::Artist(*i, ArtistField::Role)),
            "img" => Slot::File(FileSlot::ArtistImg(*i)),
            _ => return None,
        },
        [Key(root), Index(i), Key(field)] if root == "synths" => match field.as_str() {
            "name" => Slot::Text(TextSlot::Synth(*i, SynthField::Name)),
            "manufacturer" => Slot::Text(TextSlot::Synth(*i, SynthField::Manufacturer)),
            "type" => Slot::Text(TextSlot::Synth(*i, SynthField::Type)),
            "year" => Slot::Text(TextSlot::Synth(*i, SynthField::Year)),
            "img" => Slot::File(FileSlot::SynthImg(*i)),
            _ => return None,
        },
        [Key(root), Index(i), Key(list), Index(j), Key(field)]
            if root == "synths" && list == "presets" =>
        {
            match field.as_str() {
                "name" => Slot::Text(TextSlot::Preset(*i, *j, PresetField::Name)),
                "packName" => Slot::Text(TextSlot::Preset(*i, *j, PresetField::PackName)),
                "author" => Slot::Text(TextSlot::Preset(*i, *j, PresetField::Author)),
                "usageType" => Slot::Text(TextSlot::Preset(*i, *j, PresetField::UsageType)),
                "audio" => Slot::File(FileSlot::PresetAudio(*i, *j)),
                _ => return None,
            }
        }
        _ => return None,
    };

    Some(slot)
}

/// Element `index` of `list`, growing the list with defaults as needed
fn entry_at<T: Default>(list: &mut Vec<T>, index: usize) -> &mut T {
    if list.len() <= index {
        list.resize_with(index + 1, T::default);
    }
    &mut list[index]
}

fn artist_at(doc: &mut SubmissionDocument, index: usize) -> &mut ArtistEntry {
    entry_at(&mut doc.artists, index)
}

fn synth_at(doc: &mut SubmissionDocument, index: usize) -> &mut SynthEntry {
    entry_at(&mut doc.synths, index)
}

fn preset_at(doc: &mut SubmissionDocument, synth: usize, preset: usize) -> &mut PresetEntry {
    entry_at(&mut synth_at(doc, synth).presets, preset)
}

fn parse_year(field: &str, value: &str) -> Result<Option<i32>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i32>()
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("{}: \"{}\" is not a year", field, value)))
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Ok(true),
        "no" | "false" | "off" | "0" | "" => Ok(false),
        other => Err(Error::InvalidInput(format!(
            "{}: expected yes or no, got \"{}\"",
            field, other
        ))),
    }
}

impl TextSlot {
    fn apply(self, doc: &mut SubmissionDocument, field: &str, value: &str) -> Result<()> {
        let text = value.to_string();
        match self {
            TextSlot::Song(f) => match f {
                SongField::Title => doc.song.title = text,
                SongField::Genre => doc.song.genre = text,
                SongField::Year => doc.song.year = parse_year(field, value)?,
                SongField::Url => doc.song.url = text,
            },
            TextSlot::Single => doc.song.single = parse_flag(field, value)?,
            TextSlot::Album(f) => {
                let album = doc.album.get_or_insert_with(Default::default);
                match f {
                    AlbumField::Title => album.title = text,
                    AlbumField::Genre => album.genre = text,
                    AlbumField::Year => album.year = parse_year(field, value)?,
                }
            }
            TextSlot::Artist(i, f) => {
                let artist = artist_at(doc, i);
                match f {
                    ArtistField::Name => artist.name = text,
                    ArtistField::Country => artist.country = text,
                    ArtistField::Role => artist.role = text,
                }
            }
            TextSlot::Synth(i, f) => {
                let synth = synth_at(doc, i);
                match f {
                    SynthField::Name => synth.name = text,
                    SynthField::Manufacturer => synth.manufacturer = text,
                    SynthField::Type => synth.synth_type = text,
                    SynthField::Year => synth.year = parse_year(field, value)?,
                }
            }
            TextSlot::Preset(i, j, f) => {
                let preset = preset_at(doc, i, j);
                match f {
                    PresetField::Name => preset.name = text,
                    PresetField::PackName => preset.pack_name = text,
                    PresetField::Author => preset.author = text,
                    PresetField::UsageType => preset.usage_type = text,
                }
            }
        }
        Ok(())
    }
}

impl FileSlot {
    pub(crate) fn kind(self) -> FileKind {
        match self {
            FileSlot::PresetAudio(..) => FileKind::Audio,
            _ => FileKind::Image,
        }
    }

    pub(crate) fn assign(self, doc: &mut SubmissionDocument, stored_name: &str) {
        let name = Some(stored_name.to_string());
        match self {
            FileSlot::SongImg => {
                doc.song.img = name;
                doc.song.song_img_from_album = false;
            }
            FileSlot::AlbumImg => doc.album.get_or_insert_with(Default::default).img = name,
            FileSlot::ArtistImg(i) => artist_at(doc, i).img = name,
            FileSlot::SynthImg(i) => synth_at(doc, i).img = name,
            FileSlot::PresetAudio(i, j) => preset_at(doc, i, j).audio = name,
        }
    }
}

/// Overlay text form fields onto `doc`
///
/// Malformed or unknown field names and fields addressing file slots are
/// skipped with a warning. A value that cannot be stored in its slot (a year
/// that is not a number) rejects the whole form.
pub fn apply_text_fields(doc: &mut SubmissionDocument, fields: &[(String, String)]) -> Result<()> {
    for (name, value) in fields {
        let path = match FieldPath::parse(name) {
            Ok(path) => path,
            Err(e) => {
                warn!(field = %name, error = %e, "Skipping malformed form field");
                continue;
            }
        };

        match resolve(&path) {
            Some(Slot::Text(slot)) => slot.apply(doc, name, value)?,
            Some(Slot::File(_)) => {
                warn!(field = %name, "Skipping text value for a file field");
            }
            None => {
                warn!(field = %name, "Skipping unknown form field");
            }
        }
    }
    Ok(())
}
