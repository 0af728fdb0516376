use serde_json::Value;

use crate::registry::{ModuleRecord, PATH_SEPARATOR};
use crate::storage::{KeyValueStore, LANGUAGE_KEY};

const EN_TABLE: &str = include_str!("../assets/i18n/en.json");
const ZH_TABLE: &str = include_str!("../assets/i18n/zh.json");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Strict parse of a persisted tag.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }

    /// Lenient parse for URL parameters (`zh-CN`, `ZH`, `en_US`).
    pub fn from_param(v: &str) -> Option<Language> {
        let v = v.trim().to_lowercase();
        if v.starts_with("zh") {
            Some(Language::Zh)
        } else if v.starts_with("en") {
            Some(Language::En)
        } else {
            None
        }
    }

    pub fn toggled(self) -> Language {
        match self {
            Language::En => Language::Zh,
            Language::Zh => Language::En,
        }
    }

    /// Read the persisted preference; anything but `"en"`/`"zh"` yields the default.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Language {
        match store.get(LANGUAGE_KEY) {
            Some(tag) => Language::from_tag(&tag).unwrap_or_else(|| {
                log::warn!("discarding unknown language tag {tag:?}");
                Language::default()
            }),
            None => Language::default(),
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(self, store: &mut S) {
        if let Err(e) = store.set(LANGUAGE_KEY, self.tag()) {
            log::warn!("persisting language failed: {e}");
        }
    }
}

/// Bilingual string tables keyed by dotted paths (`modules.MES`).
#[derive(Clone, Debug)]
pub struct Translations {
    en: Value,
    zh: Value,
}

impl Default for Translations {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Translations {
    pub fn builtin() -> Self {
        let parse = |name: &str, text: &str| {
            serde_json::from_str(text).unwrap_or_else(|e| {
                log::warn!("{name} translation table rejected: {e}");
                Value::Null
            })
        };
        Translations {
            en: parse("en", EN_TABLE),
            zh: parse("zh", ZH_TABLE),
        }
    }

    pub fn from_values(en: Value, zh: Value) -> Self {
        Translations { en, zh }
    }

    fn table(&self, lang: Language) -> &Value {
        match lang {
            Language::En => &self.en,
            Language::Zh => &self.zh,
        }
    }

    /// Look a dotted key up; only string leaves count as hits.
    pub fn lookup(&self, lang: Language, key: &str) -> Option<&str> {
        let mut cur = self.table(lang);
        for part in key.split('.') {
            cur = cur.get(part)?;
        }
        cur.as_str()
    }

    /// Translate `key`, substituting `{name}` placeholders from `params`.
    /// A missing key translates to itself.
    pub fn translate(&self, lang: Language, key: &str, params: &[(&str, &str)]) -> String {
        match self.lookup(lang, key) {
            Some(s) => substitute(s, params),
            None => key.to_string(),
        }
    }

    /// Translate each segment of a namespace path via `unsPaths`.
    pub fn translate_path(&self, lang: Language, path: &str) -> String {
        if lang == Language::En {
            return path.to_string();
        }
        path.split(PATH_SEPARATOR)
            .map(|seg| self.segment_label(lang, seg))
            .collect::<Vec<_>>()
            .join(&PATH_SEPARATOR.to_string())
    }

    pub fn segment_label(&self, lang: Language, segment: &str) -> String {
        self.table(lang)
            .get("unsPaths")
            .and_then(|t| t.get(segment))
            .and_then(Value::as_str)
            .unwrap_or(segment)
            .to_string()
    }

    pub fn module_name(&self, lang: Language, record: &ModuleRecord) -> String {
        self.lookup(lang, &format!("modules.{}", record.name_key()))
            .map(str::to_string)
            .unwrap_or_else(|| record.name.clone())
    }
}

fn substitute(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        let name = close.map(|c| &after[..c]);
        match name {
            Some(n) if !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                match params.iter().find(|(k, _)| *k == n) {
                    Some((_, v)) if !v.is_empty() => out.push_str(v),
                    _ => {
                        out.push('{');
                        out.push_str(n);
                        out.push('}');
                    }
                }
                rest = &after[n.len() + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleRegistry;
    use crate::storage::MemoryStore;

    #[test]
    fn nested_lookup_and_fallback_to_key() {
        let t = Translations::builtin();
        assert_eq!(t.translate(Language::Zh, "modules.WMS", &[]), "仓储管理系统");
        assert_eq!(t.translate(Language::En, "openSystem", &[]), "Open System");
        assert_eq!(t.translate(Language::En, "no.such.key", &[]), "no.such.key");
        // a non-leaf is not a translation
        assert_eq!(t.translate(Language::En, "modules", &[]), "modules");
    }

    #[test]
    fn placeholders_are_substituted() {
        let t = Translations::builtin();
        assert_eq!(
            t.translate(Language::En, "moduleDescription", &[("name", "MES")]),
            "MES module"
        );
        assert_eq!(t.translate(Language::En, "moduleDescription", &[]), "{name} module");
        assert_eq!(substitute("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
        assert_eq!(substitute("{not valid}", &[]), "{not valid}");
    }

    #[test]
    fn path_translation() {
        let t = Translations::builtin();
        let path = "Site/Area/Warehouse/WMS";
        assert_eq!(t.translate_path(Language::En, path), path);
        assert_eq!(t.translate_path(Language::Zh, path), "站点/区域/仓库/仓储管理系统");
        assert_eq!(t.translate_path(Language::Zh, "Site/Unknown"), "站点/Unknown");
    }

    #[test]
    fn module_names_use_whitespace_free_key() {
        let t = Translations::builtin();
        let r = ModuleRegistry::builtin();
        let sct = r.get("sct_04").unwrap();
        assert_eq!(t.module_name(Language::Zh, sct), "供应链控制塔");
        assert_eq!(t.module_name(Language::En, sct), "Supply Chain Control Tower");
    }

    #[test]
    fn persisted_language_is_validated() {
        assert_eq!(Language::load(&MemoryStore::new()), Language::En);
        let zh = MemoryStore::new().with_entry(LANGUAGE_KEY, "zh");
        assert_eq!(Language::load(&zh), Language::Zh);
        let bogus = MemoryStore::new().with_entry(LANGUAGE_KEY, "\"zh\"");
        assert_eq!(Language::load(&bogus), Language::En);
    }

    #[test]
    fn language_param_is_lenient() {
        assert_eq!(Language::from_param("zh-CN"), Some(Language::Zh));
        assert_eq!(Language::from_param("EN_us"), Some(Language::En));
        assert_eq!(Language::from_param("fr"), None);
        assert_eq!(Language::En.toggled(), Language::Zh);
    }
}
