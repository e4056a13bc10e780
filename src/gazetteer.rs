//! The gazetteer store: canonical address records read from a reference table,
//! plus the hierarchical index built over them.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::index::HierarchicalIndex;
use crate::normalize::normalize;
use crate::types::*;

///Accepted header names per column, the first one is canonical
pub const PROVINCE_COLUMNS: &[&str] = &["province", "provinsi"];
pub const REGENCY_CITY_COLUMNS: &[&str] = &["regency_city", "kabupaten_kota"];
pub const DISTRICT_COLUMNS: &[&str] = &["district", "kecamatan"];
pub const VILLAGE_COLUMNS: &[&str] = &["village", "kelurahan_desa"];
pub const POSTAL_CODE_COLUMNS: &[&str] = &["postal_code", "kode_pos"];

pub struct TableParams {
    ///Field separator
    pub delimiter: char,
}

impl Default for TableParams {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

///Positions of the known columns in a header row
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct ColumnMap {
    province: Option<usize>,
    regency_city: Option<usize>,
    district: Option<usize>,
    village: Option<usize>,
    postal_code: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[&str]) -> Self {
        let find = |aliases: &[&str]| {
            header
                .iter()
                .position(|name| aliases.iter().any(|alias| name.eq_ignore_ascii_case(alias)))
        };
        Self {
            province: find(PROVINCE_COLUMNS),
            regency_city: find(REGENCY_CITY_COLUMNS),
            district: find(DISTRICT_COLUMNS),
            village: find(VILLAGE_COLUMNS),
            postal_code: find(POSTAL_CODE_COLUMNS),
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn record(&self, fields: &[&str]) -> AddressRecord {
        let get = |column: Option<usize>| {
            column
                .and_then(|i| fields.get(i))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        AddressRecord {
            province: get(self.province),
            regency_city: get(self.regency_city),
            district: get(self.district),
            village: get(self.village),
            postal_code: get(self.postal_code),
        }
    }
}

/// Owns the address records and the index over them. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct Gazetteer {
    records: Vec<AddressRecord>,
    index: HierarchicalIndex,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AddressRecord>) -> Self {
        let index = HierarchicalIndex::build(&records);
        Self { records, index }
    }

    ///Parse a reference table from a string
    pub fn from_table(table: &str, params: &TableParams) -> Result<Self> {
        Self::from_reader(table.as_bytes(), params)
    }

    pub fn from_file(path: impl AsRef<Path>, params: &TableParams) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading reference table from {}...", path.display());
        let f = File::open(path)?;
        Self::from_reader(f, params)
    }

    ///Read a reference table: a header row followed by one record per row.
    ///Rows are matched positionally against the header; missing fields are empty.
    pub fn from_reader(reader: impl Read, params: &TableParams) -> Result<Self> {
        let f_buffer = BufReader::new(reader);
        let mut columns: Option<ColumnMap> = None;
        let mut records = Vec::new();
        for line in f_buffer.lines() {
            let line = line?;
            let line = line.trim_start_matches('\u{feff}');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(params.delimiter).map(|s| s.trim()).collect();
            match columns {
                None => {
                    let map = ColumnMap::from_header(&fields);
                    if map.is_empty() {
                        return Err(Error::NoKnownColumns {
                            header: line.to_string(),
                        });
                    }
                    columns = Some(map);
                }
                Some(map) => records.push(map.record(&fields)),
            }
        }
        if columns.is_none() {
            return Err(Error::EmptyTable);
        }
        let gazetteer = Self::from_records(records);
        info!(
            "Loaded gazetteer with {} records ({} provinces, {} regencies/cities, {} districts, {} villages)",
            gazetteer.len(),
            gazetteer.index.len(Level::Province),
            gazetteer.index.len(Level::RegencyCity),
            gazetteer.index.len(Level::District),
            gazetteer.index.len(Level::Village),
        );
        Ok(gazetteer)
    }

    ///Resolves a record ID
    pub fn get(&self, id: RecordId) -> Option<&AddressRecord> {
        self.records.get(id as usize)
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    pub fn index(&self) -> &HierarchicalIndex {
        &self.index
    }

    ///The first record filed under a name at the given level; the name is normalised first
    pub fn first(&self, level: Level, name: &str) -> Option<&AddressRecord> {
        self.index
            .get(level, &normalize(name))
            .and_then(|ids| ids.first())
            .and_then(|id| self.get(*id))
    }

    ///All records filed under a name at the given level; the name is normalised first
    pub fn lookup(&self, level: Level, name: &str) -> Vec<&AddressRecord> {
        self.index
            .get(level, &normalize(name))
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
