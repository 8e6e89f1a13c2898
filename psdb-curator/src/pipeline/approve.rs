//! Merging admin edits into a pending submission
//!
//! The admin's approval form carries only the fields and files they changed.
//! Edits are overlaid on the original document; an entity keeps its filled
//! flag only while its natural key and file reference are untouched.

use crate::models::SubmissionDocument;

/// Overlay result keeps the original's flags; clear the ones the edits invalidated
pub fn carry_forward_flags(original: &SubmissionDocument, merged: &mut SubmissionDocument) {
    let song = &original.song;
    let edited = &mut merged.song;
    let song_image_unchanged = edited.img == song.img;
    edited.song_filled = song.song_filled
        && song_image_unchanged
        && edited.title == song.title
        && edited.year == song.year;

    if let Some(edited) = merged.album.as_mut() {
        edited.album_filled = original.album.as_ref().is_some_and(|album| {
            album.album_filled
                && edited.img == album.img
                && edited.title == album.title
                && edited.year == album.year
        });
    }

    // An inherited song image follows the album image, even a replaced one
    let edited = &mut merged.song;
    if song.song_img_from_album && song_image_unchanged {
        edited.img = merged.album.as_ref().and_then(|album| album.img.clone());
        edited.song_img_from_album = edited.img.is_some();
    } else {
        edited.song_img_from_album = false;
    }

    for (i, edited) in merged.artists.iter_mut().enumerate() {
        edited.filled = original.artists.get(i).is_some_and(|artist| {
            artist.filled
                && edited.img == artist.img
                && edited.name == artist.name
                && edited.country == artist.country
        });
    }

    for (i, edited) in merged.synths.iter_mut().enumerate() {
        let synth = original.synths.get(i);
        let key_unchanged = synth.is_some_and(|synth| {
            edited.name == synth.name && edited.manufacturer == synth.manufacturer
        });
        edited.filled = key_unchanged
            && synth.is_some_and(|synth| synth.filled && edited.img == synth.img);

        for (j, edited_preset) in edited.presets.iter_mut().enumerate() {
            edited_preset.filled = key_unchanged
                && synth
                    .and_then(|synth| synth.presets.get(j))
                    .is_some_and(|preset| {
                        preset.filled
                            && edited_preset.name == preset.name
                            && edited_preset.pack_name == preset.pack_name
                            && edited_preset.author == preset.author
                    });
        }
    }
}
