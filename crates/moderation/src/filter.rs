//! Wortfilter – Ersetzt anstoessige Woerter durch Sternchen
//!
//! Verglichen wird wortweise und ohne Beachtung der Gross-/Kleinschreibung.
//! Ein Treffer wird Zeichen fuer Zeichen durch `*` ersetzt, die Laenge der
//! Nachricht bleibt also erhalten.

use std::collections::HashSet;

/// Ersatzzeichen fuer gefilterte Woerter
const PLATZHALTER: char = '*';

/// Eingebaute Wortliste
const STANDARD_WOERTER: &[&str] = &[
    "arse", "ass", "asshole", "bastard", "bitch", "bollocks", "crap", "cunt", "damn", "dick",
    "fuck", "fucker", "fucking", "motherfucker", "piss", "prick", "shit", "slut", "twat",
    "wanker", "whore",
];

/// Reine Text-Transformation, die vor dem Broadcast angewendet wird
pub trait TextFilter: Send + Sync + 'static {
    fn bereinigen(&self, text: &str) -> String;
}

impl<F> TextFilter for F
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    fn bereinigen(&self, text: &str) -> String {
        self(text)
    }
}

/// Wortlisten-basierter Filter
#[derive(Debug, Clone)]
pub struct WortFilter {
    /// Woerter in Kleinschreibung
    woerter: HashSet<String>,
}

impl WortFilter {
    /// Filter mit der eingebauten Wortliste
    pub fn standard() -> Self {
        Self::mit_woertern(STANDARD_WOERTER.iter().copied())
    }

    /// Filter mit einer eigenen Wortliste
    pub fn mit_woertern<I, S>(woerter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let woerter = woerter
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { woerter }
    }

    /// Ergaenzt die Wortliste
    pub fn hinzufuegen<I, S>(mut self, woerter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.woerter.extend(
            woerter
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    /// Anzahl der Woerter in der Liste
    pub fn anzahl(&self) -> usize {
        self.woerter.len()
    }

    fn ist_anstoessig(&self, wort: &str) -> bool {
        self.woerter.contains(&wort.to_lowercase())
    }
}

impl Default for WortFilter {
    fn default() -> Self {
        Self::standard()
    }
}

impl TextFilter for WortFilter {
    fn bereinigen(&self, text: &str) -> String {
        let mut ergebnis = String::with_capacity(text.len());
        let mut wort = String::new();

        for zeichen in text.chars() {
            if zeichen.is_alphanumeric() || zeichen == '\'' {
                wort.push(zeichen);
                continue;
            }
            self.wort_anhaengen(&mut ergebnis, &wort);
            wort.clear();
            ergebnis.push(zeichen);
        }
        self.wort_anhaengen(&mut ergebnis, &wort);

        ergebnis
    }
}

impl WortFilter {
    fn wort_anhaengen(&self, ziel: &mut String, wort: &str) {
        if wort.is_empty() {
            return;
        }
        if self.ist_anstoessig(wort) {
            ziel.extend(std::iter::repeat(PLATZHALTER).take(wort.chars().count()));
        } else {
            ziel.push_str(wort);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sauberer_text_bleibt_unveraendert() {
        let filter = WortFilter::standard();
        assert_eq!(filter.bereinigen("hello world"), "hello world");
        assert_eq!(filter.bereinigen(""), "");
    }

    #[test]
    fn treffer_wird_durch_sterne_ersetzt() {
        let filter = WortFilter::standard();
        assert_eq!(filter.bereinigen("oh shit!"), "oh ****!");
    }

    #[test]
    fn gross_kleinschreibung_egal() {
        let filter = WortFilter::standard();
        assert_eq!(filter.bereinigen("DAMN it"), "**** it");
    }

    #[test]
    fn nur_ganze_woerter() {
        let filter = WortFilter::standard();
        // "class" enthaelt "ass", ist aber kein Treffer
        assert_eq!(filter.bereinigen("first class"), "first class");
    }

    #[test]
    fn eigene_woerter_ergaenzen() {
        let filter = WortFilter::mit_woertern(["mist"]).hinzufuegen(["Quatsch", "  "]);
        assert_eq!(filter.anzahl(), 2);
        assert_eq!(filter.bereinigen("So ein Mist, Quatsch."), "So ein ****, *******.");
    }

    #[test]
    fn closure_als_filter() {
        let filter = |text: &str| text.to_uppercase();
        assert_eq!(TextFilter::bereinigen(&filter, "abc"), "ABC");
    }
}
