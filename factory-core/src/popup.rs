use crate::i18n::{Language, Translations};
use crate::registry::{LinkMode, Metrics, ModuleRecord, ModuleRegistry, Tag};
use crate::storage::ModuleLinks;

/// Localized detail view of the selected module.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupView {
    pub id: String,
    pub name: String,
    pub path: String,
    pub description: String,
    /// `(label, value)` rows, in build time / value creation / features order.
    pub metrics: Vec<(String, String)>,
    pub tags: Vec<Tag>,
    pub linked: Vec<LinkedEntry>,
    pub features: Vec<FeatureLine>,
    pub image_ref: Option<String>,
    /// Configured external system URL.
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkedEntry {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureLine {
    pub icon: String,
    pub text: String,
}

const METRIC_FIELDS: [&str; 3] = ["buildTime", "valueCreation", "features"];

fn own_metric<'m>(metrics: &'m Metrics, field: &str) -> Option<&'m String> {
    match field {
        "buildTime" => metrics.build_time.as_ref(),
        "valueCreation" => metrics.value_creation.as_ref(),
        "features" => metrics.features.as_ref(),
        _ => None,
    }
}

impl PopupView {
    pub fn build(
        record: &ModuleRecord,
        registry: &ModuleRegistry,
        translations: &Translations,
        lang: Language,
        links: &ModuleLinks,
        link_mode: LinkMode,
    ) -> Self {
        let name = translations.module_name(lang, record);
        let key = record.name_key();

        let description = translations
            .lookup(lang, &format!("moduleDescriptions.{key}"))
            .map(str::to_string)
            .unwrap_or_else(|| translations.translate(lang, "moduleDescription", &[("name", &name)]));

        let mut metrics = Vec::new();
        for field in METRIC_FIELDS {
            let value = translations
                .lookup(lang, &format!("moduleMetrics.{key}.{field}"))
                .map(str::to_string)
                .or_else(|| {
                    record
                        .metrics
                        .as_ref()
                        .and_then(|m| own_metric(m, field))
                        .cloned()
                });
            if let Some(v) = value {
                metrics.push((translations.translate(lang, field, &[]), v));
            }
        }

        let linked = registry
            .linked(record, link_mode)
            .into_iter()
            .map(|m| LinkedEntry {
                id: m.id.clone(),
                name: translations.module_name(lang, m),
            })
            .collect();

        let features = record
            .special_features
            .iter()
            .map(|f| FeatureLine {
                icon: f.icon.clone(),
                text: match lang {
                    Language::En => f.en.clone(),
                    Language::Zh => f.zh.clone(),
                },
            })
            .collect();

        PopupView {
            id: record.id.clone(),
            path: translations.translate_path(lang, &record.joined_path()),
            name,
            description,
            metrics,
            tags: record.tags.clone(),
            linked,
            features,
            image_ref: record.image_ref.clone(),
            link: links.get(&record.id).map(str::to_string),
        }
    }

    /// Target of the "open system" action; nothing when no link is configured.
    pub fn open_target(&self) -> Option<&str> {
        self.link.as_deref()
    }
}
