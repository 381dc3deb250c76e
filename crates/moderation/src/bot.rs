//! Chatbot – Einfache vorgefertigte Antworten fuer den `#chatbot`-Channel

/// Nachrichten ab dieser Laenge (in Zeichen) bekommen eine Rueckfrage
const LANGE_NACHRICHT: usize = 100;

const BEGRUESSUNG: &str = "Hello! I'm Chatbot. How can I help you today?";
const ZUSAMMENFASSEN: &str = "That's a long message! Can you summarize?";

/// Regelbasierter Antwortgeber
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatBot;

impl ChatBot {
    pub fn neu() -> Self {
        Self
    }

    /// Erzeugt die Antwort auf eine Eingabe
    ///
    /// Reihenfolge der Regeln: Gruss, lange Nachricht, Echo. Ohne Eingabe
    /// antwortet der Bot mit der Begruessung.
    pub fn antworten(&self, prompt: Option<&str>, username: &str) -> String {
        match prompt {
            Some(p) if p.to_lowercase().contains("hello") => format!("Hi {username}! 👋"),
            Some(p) if p.chars().count() > LANGE_NACHRICHT => ZUSAMMENFASSEN.to_string(),
            Some(p) if !p.is_empty() => format!("You said: \"{p}\""),
            _ => BEGRUESSUNG.to_string(),
        }
    }
}
