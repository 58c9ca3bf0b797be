// Locale catalogs for user-facing messages.
//
// Catalogs are flat JSON maps loaded from `locales/<tag>.json` at startup.
// Lookups fall back from the exact tag to the primary subtag to the
// configured fallback locale, and finally to the key itself so a missing
// translation never turns into an empty reply.

use std::collections::HashMap;
use std::path::Path;

pub struct Localizer {
    catalogs: HashMap<String, HashMap<String, String>>,
    fallback: String,
}

impl Localizer {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            catalogs: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Load every `*.json` catalog in `dir`; the file stem is the locale tag.
    pub fn from_dir(dir: impl AsRef<Path>, fallback: &str) -> anyhow::Result<Self> {
        let mut localizer = Self::new(fallback);

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let locale = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow::anyhow!("unreadable locale file name: {:?}", path))?
                .to_string();

            let raw = std::fs::read_to_string(&path)?;
            let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
            tracing::debug!(locale, entries = entries.len(), "loaded locale catalog");
            localizer.insert_catalog(locale, entries);
        }

        if !localizer.catalogs.contains_key(&localizer.fallback) {
            anyhow::bail!("fallback locale '{}' has no catalog", localizer.fallback);
        }

        Ok(localizer)
    }

    pub fn insert_catalog(&mut self, locale: impl Into<String>, entries: HashMap<String, String>) {
        self.catalogs.insert(locale.into(), entries);
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        if let Some(message) = self.catalogs.get(locale).and_then(|c| c.get(key)) {
            return Some(message.as_str());
        }

        // "de-DE" falls back to "de" before the configured fallback.
        if let Some((primary, _)) = locale.split_once('-') {
            if let Some(message) = self.catalogs.get(primary).and_then(|c| c.get(key)) {
                return Some(message.as_str());
            }
        }

        self.catalogs
            .get(&self.fallback)
            .and_then(|c| c.get(key))
            .map(String::as_str)
    }

    /// Resolve `key` in `locale`, substituting `{name}` placeholders.
    pub fn translate(&self, locale: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.lookup(locale, key).unwrap_or(key);

        let mut message = template.to_string();
        for (name, value) in params {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localizer() -> Localizer {
        let mut localizer = Localizer::new("en-US");
        localizer.insert_catalog(
            "en-US",
            HashMap::from([
                (
                    "errors.module_disabled".to_string(),
                    "The {module} module is disabled.".to_string(),
                ),
                ("greeting".to_string(), "Hello!".to_string()),
            ]),
        );
        localizer.insert_catalog(
            "de",
            HashMap::from([(
                "errors.module_disabled".to_string(),
                "Das Modul {module} ist deaktiviert.".to_string(),
            )]),
        );
        localizer
    }

    #[test]
    fn substitutes_parameters() {
        let message = localizer().translate(
            "en-US",
            "errors.module_disabled",
            &[("module", "Leveling")],
        );
        assert_eq!(message, "The Leveling module is disabled.");
    }

    #[test]
    fn regional_tag_falls_back_to_primary_subtag() {
        let message =
            localizer().translate("de-DE", "errors.module_disabled", &[("module", "Leveling")]);
        assert_eq!(message, "Das Modul Leveling ist deaktiviert.");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let message = localizer().translate("fr", "greeting", &[]);
        assert_eq!(message, "Hello!");
    }

    #[test]
    fn unknown_key_returns_the_key() {
        let message = localizer().translate("en-US", "errors.nope", &[]);
        assert_eq!(message, "errors.nope");
    }
}
