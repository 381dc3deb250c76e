//! Unit-Tests fuer die Bannliste

use crate::bans::{BanList, BanPredicate};
use crate::error::ModerationError;

fn temp_pfad() -> (std::path::PathBuf, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Temp-Verzeichnis konnte nicht erstellt werden");
    let pfad = dir.path().join("daten").join("bans.json");
    (pfad, dir)
}

#[tokio::test]
async fn test_in_memory_bannen_und_entbannen() {
    let bans = BanList::in_memory();
    assert!(!bans.ist_gebannt("carol"));

    assert!(bans.bannen("carol").await.expect("Bannen fehlgeschlagen"));
    assert!(bans.ist_gebannt("carol"));
    assert!(!bans.ist_gebannt("alice"));

    // Doppelter Bann ist kein Fehler, aber auch keine Aenderung
    assert!(!bans.bannen("carol").await.unwrap());
    assert_eq!(bans.anzahl(), 1);

    assert!(bans.entbannen("carol").await.unwrap());
    assert!(!bans.ist_gebannt("carol"));
    assert!(!bans.entbannen("carol").await.unwrap());
}

#[tokio::test]
async fn test_leerer_benutzername_abgelehnt() {
    let bans = BanList::in_memory();
    let err = bans.bannen("   ").await.unwrap_err();
    assert!(matches!(err, ModerationError::UngueltigerBenutzername(_)));
}

#[tokio::test]
async fn test_fehlende_datei_startet_leer() {
    let (pfad, _dir) = temp_pfad();
    let bans = BanList::laden(&pfad).await.expect("Laden fehlgeschlagen");
    assert_eq!(bans.anzahl(), 0);
    assert!(!pfad.exists(), "Datei wird erst beim ersten Bann angelegt");
}

#[tokio::test]
async fn test_bann_wird_persistiert() {
    let (pfad, _dir) = temp_pfad();

    {
        let bans = BanList::laden(&pfad).await.unwrap();
        bans.bannen("troll").await.unwrap();
        bans.bannen("carol").await.unwrap();
        bans.entbannen("troll").await.unwrap();
    }

    let inhalt = tokio::fs::read_to_string(&pfad).await.unwrap();
    let gespeichert: Vec<String> = serde_json::from_str(&inhalt).unwrap();
    assert_eq!(gespeichert, vec!["carol".to_string()]);

    let neu_geladen = BanList::laden(&pfad).await.unwrap();
    assert!(neu_geladen.ist_gebannt("carol"));
    assert!(!neu_geladen.ist_gebannt("troll"));
}

#[tokio::test]
async fn test_kaputte_datei_ist_fehler() {
    let (pfad, _dir) = temp_pfad();
    tokio::fs::create_dir_all(pfad.parent().unwrap()).await.unwrap();
    tokio::fs::write(&pfad, b"{kein array").await.unwrap();

    let err = BanList::laden(&pfad).await.err().expect("Fehler erwartet");
    assert!(matches!(err, ModerationError::BannlisteBeschaedigt(_)));
}

#[test]
fn test_closure_als_praedikat() {
    let praedikat = |name: &str| name == "carol";
    assert!(praedikat.ist_gebannt("carol"));
    assert!(!praedikat.ist_gebannt("bob"));
}

#[tokio::test]
async fn test_schreibfehler_laesst_liste_unveraendert() {
    let (pfad, _dir) = temp_pfad();
    let bans = BanList::laden(&pfad).await.unwrap();
    bans.bannen("troll").await.unwrap();

    // Zieldatei durch ein Verzeichnis ersetzen, damit das Schreiben scheitert
    tokio::fs::remove_file(&pfad).await.unwrap();
    tokio::fs::create_dir(&pfad).await.unwrap();

    let err = bans.bannen("carol").await.unwrap_err();
    assert!(matches!(err, ModerationError::Io(_)));
    assert!(!bans.ist_gebannt("carol"));

    let err = bans.entbannen("troll").await.unwrap_err();
    assert!(matches!(err, ModerationError::Io(_)));
    assert!(bans.ist_gebannt("troll"));
    assert_eq!(bans.alle(), vec!["troll".to_string()]);
}
