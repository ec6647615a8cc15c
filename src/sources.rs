//! # Sources
//!
//! The fixed set of feeds merged into the dashboard, in their committed
//! concatenation order. Adding a feed means adding a variant here; there is
//! no runtime discovery.

use crate::ingest::mapping::{FieldRule, PUBLIC_WORKS_FIELDS, TERRACES_FIELDS};

pub const SYNC_LOG_FILE: &str = "sync_log.json";
pub const LAST_UPDATE_FILE: &str = "last_update.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    PrefectureOrders,
    CityOrders,
    PublicWorks,
    Terraces,
}

impl SourceKind {
    /// Merge order of the fused feed.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::PrefectureOrders,
        SourceKind::CityOrders,
        SourceKind::PublicWorks,
        SourceKind::Terraces,
    ];

    /// Canonical artifact read by the merger.
    pub const fn canonical_file(self) -> &'static str {
        match self {
            Self::PrefectureOrders => "bovp_prefecture.json",
            Self::CityOrders => "bovp_ville.json",
            Self::PublicWorks => "paris_travaux_clean.json",
            Self::Terraces => "paris_terrasses_clean.json",
        }
    }

    /// Raw open-data dump the Normalizer turns into the canonical file, and
    /// the field table it applies. Order feeds are written already shaped by
    /// their fetchers.
    pub const fn raw_input(self) -> Option<(&'static str, &'static [FieldRule])> {
        match self {
            Self::PublicWorks => Some(("paris_travaux_raw.json", PUBLIC_WORKS_FIELDS)),
            Self::Terraces => Some(("paris_terrasses_raw.json", TERRACES_FIELDS)),
            Self::PrefectureOrders | Self::CityOrders => None,
        }
    }

    /// Label stamped on each fused record.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PrefectureOrders => "BOVP - Préfecture de Police",
            Self::CityOrders => "BOVP - Ville de Paris",
            Self::PublicWorks => "ParisData - Travaux",
            Self::Terraces => "ParisData - Terrasses",
        }
    }

}

/// Listing label for a stored file, guessed from its name.
pub fn listing_label(file: &str) -> &'static str {
    if file.contains("bovp") {
        "BOVP"
    } else if file.contains("paris") {
        "Paris Data"
    } else {
        "Other"
    }
}
