// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use bedtrack_query::{ConnectionPool, ReadonlyPragmas};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE genomes (id INTEGER PRIMARY KEY, public_id TEXT NOT NULL, name TEXT NOT NULL);
    CREATE TABLE assemblies (
      id INTEGER PRIMARY KEY, public_id TEXT NOT NULL, genome_id INTEGER NOT NULL, name TEXT NOT NULL
    );
    CREATE TABLE technologies (id INTEGER PRIMARY KEY, public_id TEXT NOT NULL, name TEXT NOT NULL);
    CREATE TABLE sample_types (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
    CREATE TABLE datasets (
      id INTEGER PRIMARY KEY, public_id TEXT NOT NULL UNIQUE, assembly_id INTEGER NOT NULL,
      name TEXT NOT NULL
    );
    CREATE TABLE samples (
      id INTEGER PRIMARY KEY, public_id TEXT NOT NULL UNIQUE, dataset_id INTEGER NOT NULL,
      technology_id INTEGER NOT NULL, type_id INTEGER NOT NULL, name TEXT NOT NULL,
      regions INTEGER NOT NULL DEFAULT -1, url TEXT NOT NULL DEFAULT '', tags TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE chromosomes (id INTEGER PRIMARY KEY, genome_id INTEGER NOT NULL, name TEXT NOT NULL);
    CREATE TABLE regions (
      id INTEGER PRIMARY KEY, sample_id INTEGER NOT NULL, chr_id INTEGER NOT NULL,
      start INTEGER NOT NULL, end INTEGER NOT NULL, name TEXT NOT NULL DEFAULT '',
      score REAL NOT NULL DEFAULT 0, tags TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE permissions (id INTEGER PRIMARY KEY, public_id TEXT NOT NULL, name TEXT NOT NULL UNIQUE);
    CREATE TABLE dataset_permissions (dataset_id INTEGER NOT NULL, permission_id INTEGER NOT NULL);

    INSERT INTO genomes VALUES (1, 'g1', 'Human');
    INSERT INTO assemblies VALUES (1, 'a1', 1, 'hg19');
    INSERT INTO technologies VALUES (1, 't1', 'ChIP-seq');
    INSERT INTO sample_types VALUES (1, 'BED');
";

/// Human chromosomes in rank order; `chromosomes.id` is the position here plus one.
pub const CHROMOSOMES: [&str; 5] = ["chr1", "chr2", "chr3", "chr10", "chrX"];

/// Writes a primary store under a temporary directory, one call per entity.
pub struct StoreBuilder {
    dir: TempDir,
    conn: Connection,
}

impl StoreBuilder {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = Connection::open(dir.path().join("beds.db")).expect("create store");
        conn.execute_batch(SCHEMA).expect("schema");
        for (i, name) in CHROMOSOMES.iter().enumerate() {
            conn.execute(
                "INSERT INTO chromosomes (id, genome_id, name) VALUES (?1, 1, ?2)",
                params![i as i64 + 1, name],
            )
            .expect("chromosome");
        }
        Self { dir, conn }
    }

    pub fn dataset(self, public_id: &str, permissions: &[&str]) -> Self {
        self.conn
            .execute(
                "INSERT INTO datasets (public_id, assembly_id, name) VALUES (?1, 1, ?1)",
                params![public_id],
            )
            .expect("dataset");
        let dataset = self.conn.last_insert_rowid();
        for perm in permissions {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO permissions (public_id, name) VALUES (?1, ?1)",
                    params![perm],
                )
                .expect("permission");
            self.conn
                .execute(
                    "INSERT INTO dataset_permissions (dataset_id, permission_id) \
                     SELECT ?1, id FROM permissions WHERE name = ?2",
                    params![dataset, perm],
                )
                .expect("dataset permission");
        }
        self
    }

    /// Adds a sample whose region file lives at `<dir>/files/<public_id>.db`.
    pub fn sample(self, public_id: &str, dataset: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO samples (public_id, dataset_id, technology_id, type_id, name, url) \
                 SELECT ?1, id, 1, 1, ?1, 'files/' || ?1 || '.db' FROM datasets WHERE public_id = ?2",
                params![public_id, dataset],
            )
            .expect("sample");
        self
    }

    pub fn region(self, sample: &str, chr: &str, start: u64, end: u64, name: &str) -> Self {
        self.conn
            .execute(
                "INSERT INTO regions (sample_id, chr_id, start, end, name) \
                 SELECT s.id, c.id, ?3, ?4, ?5 FROM samples s, chromosomes c \
                 WHERE s.public_id = ?1 AND c.name = ?2",
                params![sample, chr, start as i64, end as i64, name],
            )
            .expect("region");
        self
    }

    /// Copies every sample's regions into its own single-table file.
    pub fn with_region_files(self) -> Self {
        std::fs::create_dir_all(self.dir.path().join("files")).expect("files dir");
        let samples: Vec<(i64, String)> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, url FROM samples ORDER BY id")
                .expect("samples");
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .expect("rows")
                .collect::<Result<Vec<_>, _>>()
                .expect("collect");
            rows
        };
        for (id, url) in samples {
            let path = self.dir.path().join(url);
            self.conn
                .execute(
                    "ATTACH DATABASE ?1 AS sample_file",
                    params![path.to_string_lossy().into_owned()],
                )
                .expect("attach");
            self.conn
                .execute_batch(
                    "CREATE TABLE sample_file.regions (
                       id INTEGER PRIMARY KEY, chr TEXT NOT NULL, start INTEGER NOT NULL,
                       end INTEGER NOT NULL, score REAL NOT NULL DEFAULT 0,
                       name TEXT NOT NULL DEFAULT '', tags TEXT NOT NULL DEFAULT ''
                     );",
                )
                .expect("file schema");
            self.conn
                .execute(
                    "INSERT INTO sample_file.regions (chr, start, end, score, name, tags) \
                     SELECT c.name, r.start, r.end, r.score, r.name, r.tags \
                     FROM regions r JOIN chromosomes c ON c.id = r.chr_id \
                     WHERE r.sample_id = ?1 ORDER BY r.id",
                    params![id],
                )
                .expect("copy regions");
            self.conn
                .execute_batch("DETACH DATABASE sample_file;")
                .expect("detach");
        }
        self
    }

    pub fn execute(self, sql: &str) -> Self {
        self.conn.execute_batch(sql).expect("statement");
        self
    }

    pub fn finish(self) -> Fixture {
        let Self { dir, conn } = self;
        conn.close().map_err(|(_, e)| e).expect("close");
        let pool = ConnectionPool::open(dir.path().join("beds.db"), 2, ReadonlyPragmas::default())
            .expect("pool");
        Fixture {
            dir,
            pool: Arc::new(pool),
        }
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub pool: Arc<ConnectionPool>,
}

impl Fixture {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn region_file(&self, sample: &str) -> PathBuf {
        self.dir.path().join("files").join(format!("{sample}.db"))
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
