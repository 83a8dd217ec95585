// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário: não dependemos de arquivos em runtime
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas, indexadas por idioma e chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de idioma '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }
        tracing::info!("🌐 {} catálogos de idioma carregados", catalogs.len());
        Ok(Self { catalogs })
    }

    /// Idioma pedido -> inglês -> a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut message = self.translate(lang, key);
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_to_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pt", "auth.invalid_token"), "Token de autenticação inválido ou ausente.");
        assert_eq!(store.translate("de", "auth.invalid_token"), "Invalid or missing authentication token.");
        assert_eq!(store.translate("pt", "does.not.exist"), "does.not.exist");
    }

    #[test]
    fn interpolates_arguments() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("en", "error.duplicate", &[("detail", "role sales/leads/web")]);
        assert_eq!(msg, "Duplicate record: role sales/leads/web");
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "chave '{}' faltando em pt", key);
        }
        assert_eq!(en.len(), pt.len());
    }
}
