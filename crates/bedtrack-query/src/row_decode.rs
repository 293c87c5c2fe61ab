// SPDX-License-Identifier: Apache-2.0

use bedtrack_model::{parse_tags, GenomicInterval, Region, Sample};

/// Column list matching [`decode_sample`]; aliases as in `SAMPLE_FROM`.
pub(crate) const SAMPLE_COLUMNS: &str = "s.id, s.public_id, g.name, a.name, t.name, d.public_id, \
     d.name, s.name, st.name, s.url, s.tags, s.regions";

pub(crate) const SAMPLE_FROM: &str = "FROM samples s \
     JOIN datasets d ON d.id = s.dataset_id \
     JOIN assemblies a ON a.id = d.assembly_id \
     JOIN genomes g ON g.id = a.genome_id \
     JOIN technologies t ON t.id = s.technology_id \
     JOIN sample_types st ON st.id = s.type_id";

pub(crate) fn decode_sample(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sample> {
    Ok(Sample {
        internal_id: row.get(0)?,
        public_id: row.get(1)?,
        genome: row.get(2)?,
        assembly: row.get(3)?,
        technology: row.get(4)?,
        dataset_id: row.get(5)?,
        dataset: row.get(6)?,
        name: row.get(7)?,
        sample_type: row.get(8)?,
        url: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        tags: parse_tags(&row.get::<_, Option<String>>(10)?.unwrap_or_default()),
        regions: row.get::<_, Option<i64>>(11)?.unwrap_or(-1),
    })
}

/// Decodes `chr, start, end, name, score, tags` starting at column `offset`.
pub(crate) fn decode_region(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Region> {
    let chr: String = row.get(offset)?;
    let start = get_u64(row, offset + 1)?;
    let end = get_u64(row, offset + 2)?;
    Ok(Region {
        loc: GenomicInterval { chr, start, end },
        name: row
            .get::<_, Option<String>>(offset + 3)?
            .filter(|name| !name.is_empty()),
        score: row.get::<_, Option<f64>>(offset + 4)?,
        tags: parse_tags(&row.get::<_, Option<String>>(offset + 5)?.unwrap_or_default()),
    })
}

fn get_u64(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}
