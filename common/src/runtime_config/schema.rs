use serde::Serialize;

/// Value type a setting is parsed as by the typed accessors.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Text,
    Integer,
    Float,
    Boolean,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: SettingKind,
    pub default: &'static str,
    /// Changing a critical setting invalidates the cached model-service
    /// clients so the next caller rebuilds them from current values.
    pub critical: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingCategory {
    pub name: &'static str,
    pub label: &'static str,
    pub settings: &'static [SettingDef],
}

pub const CATEGORIES: &[SettingCategory] = &[
    SettingCategory {
        name: "model_services",
        label: "Model services",
        settings: &[
            SettingDef {
                key: "OCR_SERVICE_URL",
                label: "OCR service URL",
                kind: SettingKind::Text,
                default: "http://127.0.0.1:8601",
                critical: true,
                description: "Base URL of the OCR inference service",
            },
            SettingDef {
                key: "EMBEDDING_SERVICE_URL",
                label: "Embedding service URL",
                kind: SettingKind::Text,
                default: "http://127.0.0.1:8602",
                critical: true,
                description: "Base URL of the embedding inference service",
            },
            SettingDef {
                key: "MODEL_REQUEST_TIMEOUT_SECS",
                label: "Model request timeout",
                kind: SettingKind::Integer,
                default: "120",
                critical: true,
                description: "Per-request timeout baked into the model-service HTTP clients",
            },
            SettingDef {
                key: "EMBEDDING_BATCH_SIZE",
                label: "Embedding batch size",
                kind: SettingKind::Integer,
                default: "32",
                critical: false,
                description: "Chunks sent to the embedding service per request",
            },
        ],
    },
    SettingCategory {
        name: "pipeline",
        label: "Pipeline",
        settings: &[
            SettingDef {
                key: "PROGRESS_IDLE_TIMEOUT_SECS",
                label: "Progress idle timeout",
                kind: SettingKind::Integer,
                default: "300",
                critical: false,
                description: "Seconds a progress stream waits for the next event before closing",
            },
            SettingDef {
                key: "MAX_PARALLEL_STAGES",
                label: "Max parallel stages",
                kind: SettingKind::Integer,
                default: "4",
                critical: false,
                description: "Upper bound on pipeline stages running concurrently per job",
            },
            SettingDef {
                key: "OCR_CONFIDENCE_THRESHOLD",
                label: "OCR confidence threshold",
                kind: SettingKind::Float,
                default: "0.5",
                critical: false,
                description: "Pages below this OCR confidence are flagged for review",
            },
        ],
    },
    SettingCategory {
        name: "storage",
        label: "Storage",
        settings: &[
            SettingDef {
                key: "ANALYTICS_RETENTION_DAYS",
                label: "Analytics retention",
                kind: SettingKind::Integer,
                default: "90",
                critical: false,
                description: "Days job metrics are kept before expiry",
            },
            SettingDef {
                key: "VECTOR_DISTANCE_METRIC",
                label: "Vector distance metric",
                kind: SettingKind::Text,
                default: "cosine",
                critical: false,
                description: "Distance function used by the vector index",
            },
        ],
    },
];

pub fn all_settings() -> impl Iterator<Item = &'static SettingDef> {
    CATEGORIES.iter().flat_map(|category| category.settings)
}

pub fn find(key: &str) -> Option<&'static SettingDef> {
    all_settings().find(|def| def.key == key)
}

pub fn is_critical(key: &str) -> bool {
    find(key).is_some_and(|def| def.critical)
}
