//! Whitespace sanitizer
//!
//! Trims leading and trailing whitespace from every string in a document.
//! This is not an HTML or injection filter.

use crate::models::{
    AlbumEntry, ArtistEntry, PresetEntry, SongEntry, SubmissionDocument, SynthEntry,
};

/// Values whose strings can be trimmed in place
pub trait Trim {
    fn trim_in_place(&mut self);
}

impl Trim for String {
    fn trim_in_place(&mut self) {
        let trimmed = self.trim();
        if trimmed.len() != self.len() {
            *self = trimmed.to_string();
        }
    }
}

impl<T: Trim> Trim for Option<T> {
    fn trim_in_place(&mut self) {
        if let Some(value) = self {
            value.trim_in_place();
        }
    }
}

impl<T: Trim> Trim for Vec<T> {
    fn trim_in_place(&mut self) {
        for value in self {
            value.trim_in_place();
        }
    }
}

impl Trim for SongEntry {
    fn trim_in_place(&mut self) {
        self.title.trim_in_place();
        self.genre.trim_in_place();
        self.url.trim_in_place();
        self.img.trim_in_place();
    }
}

impl Trim for AlbumEntry {
    fn trim_in_place(&mut self) {
        self.title.trim_in_place();
        self.genre.trim_in_place();
        self.img.trim_in_place();
    }
}

impl Trim for ArtistEntry {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.country.trim_in_place();
        self.role.trim_in_place();
        self.img.trim_in_place();
    }
}

impl Trim for PresetEntry {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.pack_name.trim_in_place();
        self.author.trim_in_place();
        self.usage_type.trim_in_place();
        self.audio.trim_in_place();
    }
}

impl Trim for SynthEntry {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.manufacturer.trim_in_place();
        self.synth_type.trim_in_place();
        self.img.trim_in_place();
        self.presets.trim_in_place();
    }
}

impl Trim for SubmissionDocument {
    fn trim_in_place(&mut self) {
        self.song.trim_in_place();
        self.album.trim_in_place();
        self.artists.trim_in_place();
        self.synths.trim_in_place();
    }
}

/// Trimmed copy of `doc`
pub fn sanitize(doc: &SubmissionDocument) -> SubmissionDocument {
    let mut clean = doc.clone();
    clean.trim_in_place();
    clean
}
