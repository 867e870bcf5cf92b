//! Simulated caller with a fixed script

/// Scripted client: yields one utterance per turn until the script runs out
pub struct ScriptedClient {
    scripts: Vec<String>,
    cursor: usize,
}

impl ScriptedClient {
    /// Default cancellation-call script
    pub fn new() -> Self {
        Self::with_script(vec![
            "אני רוצה לבטל את המנוי לטלוויזיה שלי. אני לא משתמש בזה יותר.".to_string(),
            "הבנתי, מה עליי לעשות כדי לוודא שבוטל ותשלחו לי אישור?".to_string(),
        ])
    }

    pub fn with_script(scripts: Vec<String>) -> Self {
        Self { scripts, cursor: 0 }
    }

    /// Next scripted utterance, None once the script is exhausted
    pub fn next_utterance(&mut self) -> Option<String> {
        let utterance = self.scripts.get(self.cursor).cloned();
        if utterance.is_some() {
            self.cursor += 1;
        }
        utterance
    }

    pub fn remaining(&self) -> usize {
        self.scripts.len().saturating_sub(self.cursor)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_exhausts_in_order() {
        let mut client = ScriptedClient::with_script(vec!["אחת".into(), "שתיים".into()]);
        assert_eq!(client.remaining(), 2);
        assert_eq!(client.next_utterance().as_deref(), Some("אחת"));
        assert_eq!(client.next_utterance().as_deref(), Some("שתיים"));
        assert_eq!(client.next_utterance(), None);
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut client = ScriptedClient::with_script(vec!["אחת".into()]);
        client.next_utterance();
        client.reset();
        assert_eq!(client.next_utterance().as_deref(), Some("אחת"));
    }

    #[test]
    fn test_default_script_is_nonempty() {
        let mut client = ScriptedClient::new();
        assert!(client.next_utterance().is_some());
    }
}
