// src/ingest/mapping.rs
//! Field dictionaries: which raw keys feed which canonical field.
//!
//! Each table is plain data. A rule names its target field, where the value
//! comes from, and the placeholder used when the raw record has nothing
//! usable (`None` means the field is simply left out).

#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    /// First raw key holding a non-empty value wins.
    Keys(&'static [&'static str]),
    /// Same value for every record of the kind.
    Constant(&'static str),
    /// `"<left> x <right>"`, each side falling back to `missing`.
    Pair {
        left: &'static [&'static str],
        right: &'static [&'static str],
        missing: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub target: &'static str,
    pub from: FieldSource,
    pub fallback: Option<&'static str>,
}

const fn keys(
    target: &'static str,
    from: &'static [&'static str],
    fallback: Option<&'static str>,
) -> FieldRule {
    FieldRule {
        target,
        from: FieldSource::Keys(from),
        fallback,
    }
}

const fn constant(target: &'static str, value: &'static str) -> FieldRule {
    FieldRule {
        target,
        from: FieldSource::Constant(value),
        fallback: None,
    }
}

pub const ADDRESS_PLACEHOLDER: &str = "Adresse non précisée";

/// "chantiers-perturbants" dataset.
pub const PUBLIC_WORKS_FIELDS: &[FieldRule] = &[
    constant("type", "Travaux perturbants"),
    keys("titre", &["objet", "Objet"], Some("Travaux")),
    keys(
        "description",
        &["description", "Description"],
        Some("Aucune description disponible."),
    ),
    keys("adresse", &["Voie(s)", "voie", "voies"], Some(ADDRESS_PLACEHOLDER)),
    keys(
        "impact",
        &["Impact sur la circulation", "impact_circulation"],
        Some("Non précisé"),
    ),
    keys(
        "perturbation",
        &["Niveau de perturbation", "niveau_perturbation"],
        Some("N/A"),
    ),
    keys("statut", &["Statut", "statut"], Some("En cours")),
    keys(
        "maitre_ouvrage",
        &["Maître d’ouvrage", "Maître d'ouvrage", "maitre_ouvrage"],
        Some("Non indiqué"),
    ),
];

/// "terrasses-autorisations" dataset.
pub const TERRACES_FIELDS: &[FieldRule] = &[
    constant("type", "Terrasse ou étalage"),
    keys("titre", &["Nom de l'enseigne", "nom_enseigne"], Some("Terrasse ou étalage")),
    keys("enseigne", &["Nom de l'enseigne", "nom_enseigne"], Some("Non précisée")),
    keys("typologie", &["Typologie", "typologie"], Some("Non précisée")),
    keys("adresse", &["Numéro et voie", "adresse"], Some(ADDRESS_PLACEHOLDER)),
    keys("arrondissement", &["Arrondissement", "arrondissement"], Some("Non précisé")),
    keys("siret", &["SIRET", "siret"], Some("Non communiqué")),
    keys(
        "periode",
        &["Période d'installation", "periode_installation"],
        Some("N/A"),
    ),
    FieldRule {
        target: "surface",
        from: FieldSource::Pair {
            left: &["Longueur", "longueur"],
            right: &["Largeur", "largeur"],
            missing: "?",
        },
        fallback: None,
    },
    keys("lien", &["Lien affichette", "lien_affichette"], Some("Aucun lien disponible")),
    constant("statut", "Autorisé"),
];
