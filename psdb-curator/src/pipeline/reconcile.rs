//! Reconciliation against canonical data
//!
//! Every entity of a submission is looked up by natural key. A match replaces
//! the submitted fields with the canonical ones and marks the entity filled;
//! an upload made redundant by the canonical file is deleted from pending
//! storage on the spot.

use crate::db::{albums, artists, presets, songs, synths};
use crate::models::{FileKind, FileRef, SubmissionDocument};
use crate::storage::FileStore;
use psdb_common::Result;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

pub struct Reconciler<'a> {
    db: &'a SqlitePool,
    files: &'a FileStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a SqlitePool, files: &'a FileStore) -> Self {
        Self { db, files }
    }

    /// Reconcile a document, returning the updated copy
    ///
    /// Any lookup or file deletion failure aborts with an error; nothing is
    /// persisted by this step.
    pub async fn reconcile(&self, doc: &SubmissionDocument) -> Result<SubmissionDocument> {
        let mut doc = doc.clone();
        let mut conn = self.db.acquire().await?;

        self.reconcile_document(&mut conn, &mut doc)
            .await
            .map_err(|e| e.context("Error reconciling submission"))?;

        Ok(doc)
    }

    async fn reconcile_document(
        &self,
        conn: &mut SqliteConnection,
        doc: &mut SubmissionDocument,
    ) -> Result<()> {
        let song = &mut doc.song;
        if let Some(row) = songs::find_song(conn, &song.title, song.year).await? {
            debug!(song_id = row.song_id, "Song already exists");
            self.adopt_file(FileKind::Image, &mut song.img, row.img).await?;
            song.title = row.title;
            song.genre = row.genre;
            song.year = row.year;
            song.url = row.url;
            song.song_img_from_album = false;
            song.song_filled = true;
        }

        if !doc.song.single {
            if let Some(album) = doc.album.as_mut() {
                if let Some(row) = albums::find_album(conn, &album.title, album.year).await? {
                    debug!(album_id = row.album_id, "Album already exists");
                    self.adopt_file(FileKind::Image, &mut album.img, row.img).await?;
                    album.title = row.title;
                    album.genre = row.genre;
                    album.year = row.year;
                    album.album_filled = true;
                }
            }
        }

        for artist in &mut doc.artists {
            if let Some(row) = artists::find_artist(conn, &artist.name, &artist.country).await? {
                debug!(artist_id = row.artist_id, "Artist already exists");
                self.adopt_file(FileKind::Image, &mut artist.img, row.img).await?;
                artist.name = row.name;
                artist.country = row.country;
                artist.filled = true;
            }
        }

        for synth in &mut doc.synths {
            let existing = synths::find_synth(conn, &synth.name, &synth.manufacturer).await?;
            if let Some(row) = &existing {
                debug!(synth_id = row.synth_id, "Synth already exists");
                self.adopt_file(FileKind::Image, &mut synth.img, row.img.clone())
                    .await?;
                synth.name = row.name.clone();
                synth.manufacturer = row.manufacturer.clone();
                synth.synth_type = row.synth_type.clone();
                synth.year = row.year;
                synth.filled = true;
            }

            for preset in &mut synth.presets {
                presets::apply_preset_defaults(preset, &synth.manufacturer);

                let Some(synth_row) = &existing else {
                    continue;
                };
                let found = presets::find_preset(
                    conn,
                    synth_row.synth_id,
                    &preset.name,
                    &preset.pack_name,
                    &preset.author,
                )
                .await?;
                if let Some(row) = found {
                    debug!(preset_id = row.preset_id, "Preset already exists");
                    preset.name = row.name;
                    preset.pack_name = row.pack_name;
                    preset.author = row.author;
                    preset.filled = true;
                }
            }
        }

        // A new song without its own image shares the album cover
        let song = &mut doc.song;
        if !song.song_filled && !song.single && song.img.is_none() {
            if let Some(cover) = doc.album.as_ref().and_then(|a| a.img.clone()) {
                song.img = Some(cover);
                song.song_img_from_album = true;
            }
        }

        Ok(())
    }

    /// Replace a submitted file reference with the canonical one
    ///
    /// A differing upload is deleted from pending storage first.
    async fn adopt_file(
        &self,
        kind: FileKind,
        submitted: &mut Option<String>,
        canonical: Option<String>,
    ) -> Result<()> {
        if let Some(upload) = submitted.as_deref() {
            if canonical.as_deref() != Some(upload) {
                let file = FileRef::new(kind, upload);
                self.files.discard_pending(&file).await?;
                info!(file = %file, "Discarded upload superseded by canonical file");
            }
        }
        *submitted = canonical;
        Ok(())
    }
}
