// tests/ingest_normalize.rs
use lexpar_aggregator::ingest::mapping::{
    ADDRESS_PLACEHOLDER, PUBLIC_WORKS_FIELDS, TERRACES_FIELDS,
};
use lexpar_aggregator::ingest::{normalize, normalize_artifact, normalize_paris_data};
use lexpar_aggregator::store::{read_json, ArtifactStore, MemoryStore};
use lexpar_aggregator::CanonicalRecord;
use serde_json::{json, Value};

fn travaux_raw() -> Value {
    json!({
        "total_count": 3,
        "results": [
            {
                "objet": "Renouvellement&nbsp;de canalisations",
                "Voie(s)": "Rue de Rivoli",
                "Impact sur la circulation": "Circulation réduite",
                "Niveau de perturbation": "Fort",
                "Statut": "Programmé",
                "Maître d’ouvrage": "Eau de Paris"
            },
            { "Voie(s)": "Quai Branly" },
            { "objet": "" }
        ]
    })
}

#[test]
fn output_length_matches_input_length() {
    let raw = travaux_raw();
    let out = normalize(PUBLIC_WORKS_FIELDS, Some(&raw));
    assert_eq!(out.len(), 3);

    let terr = json!([{}, {}, {}, {}]);
    assert_eq!(normalize(TERRACES_FIELDS, Some(&terr)).len(), 4);
}

#[test]
fn title_is_real_only_when_a_title_field_was_supplied() {
    let out = normalize(PUBLIC_WORKS_FIELDS, Some(&travaux_raw()));
    assert_eq!(out[0].titre, "Renouvellement de canalisations");
    // No `objet` at all, and an empty one: both fall back.
    assert_eq!(out[1].titre, "Travaux");
    assert_eq!(out[2].titre, "Travaux");
}

#[test]
fn public_works_mapping() {
    let out = normalize(PUBLIC_WORKS_FIELDS, Some(&travaux_raw()));
    let first = &out[0];
    assert_eq!(first.kind.as_deref(), Some("Travaux perturbants"));
    assert_eq!(first.adresse.as_deref(), Some("Rue de Rivoli"));
    assert_eq!(first.extra_str("impact"), Some("Circulation réduite"));
    assert_eq!(first.extra_str("perturbation"), Some("Fort"));
    assert_eq!(first.extra_str("statut"), Some("Programmé"));
    assert_eq!(first.extra_str("maitre_ouvrage"), Some("Eau de Paris"));

    let second = &out[1];
    assert_eq!(
        second.extra_str("description"),
        Some("Aucune description disponible.")
    );
    assert_eq!(second.extra_str("maitre_ouvrage"), Some("Non indiqué"));
    assert_eq!(out[2].adresse.as_deref(), Some(ADDRESS_PLACEHOLDER));
}

#[test]
fn terraces_share_the_canonical_shape() {
    let raw = json!({ "results": [{
        "Nom de l'enseigne": "Café des Arts",
        "Typologie": "Terrasse ouverte",
        "Numéro et voie": "12 rue de Lappe",
        "Arrondissement": "75011",
        "SIRET": "12345678900011",
        "Période d'installation": "Du 01/04 au 31/10",
        "Longueur": "6",
        "Largeur": "2",
        "Lien affichette": "https://opendata.paris.fr/affichette/1"
    }]});
    let out = normalize(TERRACES_FIELDS, Some(&raw));
    let r = &out[0];
    assert_eq!(r.titre, "Café des Arts");
    assert_eq!(r.kind.as_deref(), Some("Terrasse ou étalage"));
    assert_eq!(r.adresse.as_deref(), Some("12 rue de Lappe"));
    assert_eq!(r.periode.as_deref(), Some("Du 01/04 au 31/10"));
    assert_eq!(r.extra_str("enseigne"), Some("Café des Arts"));
    assert_eq!(r.extra_str("surface"), Some("6 x 2"));
    assert_eq!(r.extra_str("statut"), Some("Autorisé"));

    // Serialized output of both dictionaries exposes the same core keys.
    let travaux = normalize(PUBLIC_WORKS_FIELDS, Some(&travaux_raw()));
    for v in [
        serde_json::to_value(r).unwrap(),
        serde_json::to_value(&travaux[0]).unwrap(),
    ] {
        for key in ["source", "titre", "adresse", "type"] {
            assert!(v.get(key).is_some(), "missing {key} in {v}");
        }
    }
}

#[test]
fn normalizing_twice_gives_identical_output() {
    let raw = travaux_raw();
    let a: Vec<CanonicalRecord> = normalize(PUBLIC_WORKS_FIELDS, Some(&raw));
    let b: Vec<CanonicalRecord> = normalize(PUBLIC_WORKS_FIELDS, Some(&raw));
    assert_eq!(a, b);
}

#[tokio::test]
async fn missing_or_broken_raw_artifacts_yield_nothing() {
    let store = MemoryStore::new();
    assert!(normalize_artifact(&store, "paris_travaux_raw.json", PUBLIC_WORKS_FIELDS)
        .await
        .is_empty());

    store
        .write("paris_travaux_raw.json", b"<html>503</html>")
        .await
        .unwrap();
    assert!(normalize_artifact(&store, "paris_travaux_raw.json", PUBLIC_WORKS_FIELDS)
        .await
        .is_empty());
}

#[tokio::test]
async fn paris_data_clean_files_are_written() {
    let store = MemoryStore::new();
    store
        .write(
            "paris_travaux_raw.json",
            serde_json::to_vec(&travaux_raw()).unwrap().as_slice(),
        )
        .await
        .unwrap();
    // No terraces dump: the clean file is still written, empty.

    let written = normalize_paris_data(&store).await.unwrap();
    let counts: Vec<_> = written.iter().map(|f| (f.file, f.count)).collect();
    assert_eq!(
        counts,
        vec![
            ("paris_travaux_clean.json", 3),
            ("paris_terrasses_clean.json", 0)
        ]
    );

    let travaux: Vec<CanonicalRecord> = read_json(&store, "paris_travaux_clean.json").await.unwrap();
    assert_eq!(travaux.len(), 3);
    let terrasses: Vec<CanonicalRecord> = read_json(&store, "paris_terrasses_clean.json")
        .await
        .unwrap();
    assert!(terrasses.is_empty());
}
