//! Shared fixtures for psdb-curator integration tests
//!
//! Each test gets its own temp root with an initialized database and upload
//! directories, so tests never share state.

#![allow(dead_code)]

use psdb_common::config::{CuratorSection, RootFolder};
use psdb_common::db::init_database;
use psdb_curator::models::{FileKind, FileRef, SubmissionForm, UploadedFile};
use psdb_curator::pipeline::SubmissionPipeline;
use psdb_curator::storage::FileStore;
use psdb_curator::{build_router, AppState, CuratorConfig};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

/// Minimal PNG header, enough for content sniffing
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

/// ID3-tagged MP3 header
pub const MP3_BYTES: &[u8] = b"ID3\x03\0\0\0\0\0\0fake_mp3_data";

pub struct TestEnv {
    pub root: TempDir,
    pub config: CuratorConfig,
    pub db: SqlitePool,
    pub files: FileStore,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_section(CuratorSection::default()).await
    }

    pub async fn with_section(section: CuratorSection) -> Self {
        let root = TempDir::new().expect("Should create temp root");
        let config = CuratorConfig::new(RootFolder::new(root.path().to_path_buf()), &section);

        let db = init_database(&config.database_path())
            .await
            .expect("Should initialize database");
        let dirs = config.upload_dirs();
        dirs.ensure_exist().await.expect("Should create upload dirs");

        Self {
            root,
            files: FileStore::new(dirs),
            config,
            db,
        }
    }

    pub fn pipeline(&self) -> SubmissionPipeline {
        SubmissionPipeline::new(self.db.clone(), self.files.clone())
    }

    pub fn app(&self) -> axum::Router {
        build_router(AppState::new(self.db.clone(), self.config.clone()))
    }

    /// Write an upload to pending storage as intake would
    pub async fn upload(&self, field_name: &str, kind: FileKind, original: &str) -> UploadedFile {
        let bytes = match kind {
            FileKind::Image => PNG_BYTES,
            FileKind::Audio => MP3_BYTES,
        };
        let stored_name = self
            .files
            .store_upload(kind, Some(original), "bin", bytes)
            .await
            .expect("Should store upload");

        UploadedFile {
            field_name: field_name.to_string(),
            stored_name,
            kind,
        }
    }

    /// Place a file directly in approved storage
    pub fn approved_file(&self, kind: FileKind, name: &str) -> FileRef {
        let file = FileRef::new(kind, name);
        let path = self.files.approved_path(&file).expect("Valid name");
        std::fs::write(&path, b"approved").expect("Should write approved file");
        file
    }

    pub fn pending_path(&self, file: &FileRef) -> PathBuf {
        self.files.pending_path(file).expect("Valid name")
    }

    pub fn approved_path(&self, file: &FileRef) -> PathBuf {
        self.files.approved_path(file).expect("Valid name")
    }

    pub fn is_pending(&self, file: &FileRef) -> bool {
        self.pending_path(file).exists()
    }

    pub fn is_approved(&self, file: &FileRef) -> bool {
        self.approved_path(file).exists()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.db)
            .await
            .expect("Count query should succeed")
    }

    pub async fn seed_album(&self, title: &str, year: i32, img: Option<&str>) -> i64 {
        sqlx::query("INSERT INTO albums (album_title, album_genre, release_year, album_img) VALUES (?, 'Ambient', ?, ?)")
            .bind(title)
            .bind(year)
            .bind(img)
            .execute(&self.db)
            .await
            .expect("Should seed album")
            .last_insert_rowid()
    }

    pub async fn seed_artist(&self, name: &str, country: &str, img: Option<&str>) -> i64 {
        sqlx::query("INSERT INTO artists (artist_name, country, artist_img) VALUES (?, ?, ?)")
            .bind(name)
            .bind(country)
            .bind(img)
            .execute(&self.db)
            .await
            .expect("Should seed artist")
            .last_insert_rowid()
    }

    pub async fn seed_synth(&self, name: &str, manufacturer: &str, img: Option<&str>) -> i64 {
        sqlx::query(
            "INSERT INTO synths (synth_name, manufacturer, synth_type, synth_img) VALUES (?, ?, 'Analog', ?)",
        )
        .bind(name)
        .bind(manufacturer)
        .bind(img)
        .execute(&self.db)
        .await
        .expect("Should seed synth")
        .last_insert_rowid()
    }
}

pub fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Song on an album with a single main artist
pub fn album_song_fields(title: &str) -> Vec<(String, String)> {
    fields(&[
        ("song[title]", title),
        ("song[genre]", "IDM"),
        ("song[year]", "1998"),
        ("album[title]", "Music Has the Right to Children"),
        ("album[year]", "1998"),
        ("artists[0][name]", "Boards of Canada"),
        ("artists[0][country]", "UK"),
        ("artists[0][role]", "Main"),
    ])
}

/// Single (no album) with a single main artist
pub fn single_song_fields(title: &str) -> Vec<(String, String)> {
    fields(&[
        ("song[title]", title),
        ("song[year]", "2001"),
        ("single", "yes"),
        ("artists[0][name]", "Aphex Twin"),
        ("artists[0][country]", "UK"),
        ("artists[0][role]", "Main"),
    ])
}

pub fn form(fields: Vec<(String, String)>, files: Vec<UploadedFile>) -> SubmissionForm {
    SubmissionForm { fields, files }
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "psdb-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn fields(self, pairs: &[(String, String)]) -> Self {
        pairs
            .iter()
            .fold(self, |body, (name, value)| body.text(name, value))
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (self.content_type(), self.body)
    }
}

/// Read every file name in a storage directory
pub fn list_dir(path: PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
