//! Sector listing: which category each ticker belongs to.
//!
//! Stored as a CSV whose header row holds category names and whose body holds
//! one ragged column of symbols per category, blank-padded to the longest
//! column:
//!
//! ```text
//! Commercial_Banks,Hydro_Power
//! ADBL,AHPC
//! NABIL,
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("symbol '{symbol}' not found in any sector")]
    NotFound { symbol: String },

    #[error("listing has no header row")]
    MissingHeader,

    #[error("listing CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("listing I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A category with its member symbols, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub name: String,
    pub symbols: Vec<String>,
}

/// The complete symbol-by-category listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorListing {
    pub sectors: Vec<Sector>,
}

impl SectorListing {
    /// Parse the listing CSV. Columns with a blank header are ignored and
    /// blank cells are padding.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ListingError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = rdr.records();

        let header = records.next().ok_or(ListingError::MissingHeader)??;
        let mut columns: Vec<Option<Sector>> = header
            .iter()
            .map(|name| {
                let name = name.trim();
                (!name.is_empty()).then(|| Sector {
                    name: name.to_string(),
                    symbols: Vec::new(),
                })
            })
            .collect();

        for record in records {
            let record = record?;
            for (cell, column) in record.iter().zip(columns.iter_mut()) {
                let symbol = cell.trim();
                if let (false, Some(sector)) = (symbol.is_empty(), column.as_mut()) {
                    sector.symbols.push(symbol.to_string());
                }
            }
        }

        Ok(Self {
            sectors: columns.into_iter().flatten().collect(),
        })
    }

    pub fn from_csv(content: &str) -> Result<Self, ListingError> {
        Self::from_reader(content.as_bytes())
    }

    /// Write the listing CSV: header row, then blank-padded symbol rows.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ListingError> {
        let mut wtr = csv::WriterBuilder::new().flexible(false).from_writer(writer);
        wtr.write_record(self.sectors.iter().map(|s| s.name.as_str()))?;
        for row in 0..self.max_column_len() {
            wtr.write_record(
                self.sectors
                    .iter()
                    .map(|s| s.symbols.get(row).map(String::as_str).unwrap_or("")),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, ListingError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Category of `symbol`, matched case-insensitively. The first column
    /// that contains the symbol wins.
    pub fn category_of(&self, symbol: &str) -> Result<&str, ListingError> {
        let wanted = symbol.trim();
        self.sectors
            .iter()
            .find(|s| s.symbols.iter().any(|sym| sym.eq_ignore_ascii_case(wanted)))
            .map(|s| s.name.as_str())
            .ok_or_else(|| ListingError::NotFound {
                symbol: wanted.to_string(),
            })
    }

    pub fn sector(&self, name: &str) -> Option<&Sector> {
        self.sectors.iter().find(|s| s.name == name)
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.sectors.iter().map(|s| s.symbols.len()).sum()
    }

    fn max_column_len(&self) -> usize {
        self.sectors.iter().map(|s| s.symbols.len()).max().unwrap_or(0)
    }

    /// Assemble a listing from freshly scraped sectors.
    ///
    /// Symbols are sorted and deduplicated. Sectors with no symbols are
    /// dropped. Columns follow `preferred_order`, then any remaining sectors
    /// alphabetically.
    pub fn from_scraped(scraped: BTreeMap<String, Vec<String>>, preferred_order: &[&str]) -> Self {
        let mut scraped: BTreeMap<String, Vec<String>> = scraped
            .into_iter()
            .filter(|(_, symbols)| !symbols.is_empty())
            .collect();

        let mut sectors = Vec::with_capacity(scraped.len());
        for name in preferred_order {
            if let Some(symbols) = scraped.remove(*name) {
                sectors.push(Sector {
                    name: name.to_string(),
                    symbols,
                });
            }
        }
        // BTreeMap iteration is already alphabetical
        sectors.extend(
            scraped
                .into_iter()
                .map(|(name, symbols)| Sector { name, symbols }),
        );
        for sector in &mut sectors {
            sector.symbols.sort();
            sector.symbols.dedup();
        }
        Self { sectors }
    }
}

/// Folder name for a site sector with no configured mapping.
pub fn default_folder_name(site_name: &str) -> String {
    site_name.trim().replace(' ', "_").replace('&', "And")
}

/// File-system safe form of a symbol (`/` is not allowed in file names).
pub fn file_safe_symbol(symbol: &str) -> String {
    symbol.replace('/', "_")
}
