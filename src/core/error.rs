use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TemplateNotFound,
    TemplateFetchFailed,
    TemplateInvalidStep,

    ManifestDetectionFailed,
    ManifestIdentifierNotFound,
    ManifestVersionNotMatched,

    VersionMismatch,

    PipelineWorkdirMissing,
    PipelineProcessFailed,

    ReferenceNoneLinked,
    ReferenceNotFound,

    ValidationInvalidArgument,
    ValidationInvalidJson,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TemplateNotFound => "template.not_found",
            ErrorCode::TemplateFetchFailed => "template.fetch_failed",
            ErrorCode::TemplateInvalidStep => "template.invalid_step",

            ErrorCode::ManifestDetectionFailed => "manifest.detection_failed",
            ErrorCode::ManifestIdentifierNotFound => "manifest.identifier_not_found",
            ErrorCode::ManifestVersionNotMatched => "manifest.version_not_matched",

            ErrorCode::VersionMismatch => "version.mismatch",

            ErrorCode::PipelineWorkdirMissing => "pipeline.workdir_missing",
            ErrorCode::PipelineProcessFailed => "pipeline.process_failed",

            ErrorCode::ReferenceNoneLinked => "reference.none_linked",
            ErrorCode::ReferenceNotFound => "reference.not_found",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidStepDetails {
    pub step_index: usize,
    pub missing: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionFailedDetails {
    pub manifest: String,
    pub search_pattern: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMissDetails {
    pub path: String,
    pub needle: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMismatchDetails {
    pub found: Vec<String>,
    pub context: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFailedDetails {
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    fn details_of<T: Serialize>(details: T) -> Value {
        serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }

    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TemplateNotFound,
            "Template not found",
            Self::details_of(NotFoundDetails { id: name.into() }),
        )
        .with_hint("Run 'relink templates' to see available templates")
    }

    pub fn template_fetch_failed(name: impl Into<String>, cause: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::TemplateFetchFailed,
            format!("Failed to fetch template '{}': {}", name, cause.into()),
            Self::details_of(NotFoundDetails { id: name }),
        )
    }

    pub fn invalid_step(step_index: usize, missing: Vec<String>) -> Self {
        Self::new(
            ErrorCode::TemplateInvalidStep,
            format!("Invalid step at index {}", step_index),
            Self::details_of(InvalidStepDetails {
                step_index,
                missing,
            }),
        )
    }

    pub fn manifest_detection_failed(
        manifest: impl Into<String>,
        search_pattern: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ManifestDetectionFailed,
            "Search pattern not found in manifest",
            Self::details_of(DetectionFailedDetails {
                manifest: manifest.into(),
                search_pattern: search_pattern.into(),
            }),
        )
    }

    pub fn identifier_not_found(path: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ManifestIdentifierNotFound,
            "Identifier not found in manifest",
            Self::details_of(ManifestMissDetails {
                path: path.into(),
                needle: identifier.into(),
            }),
        )
    }

    pub fn version_not_matched(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ManifestVersionNotMatched,
            "No version matched after identifier",
            Self::details_of(ManifestMissDetails {
                path: path.into(),
                needle: pattern.into(),
            }),
        )
    }

    pub fn version_mismatch(found: Vec<String>, context: impl Into<String>) -> Self {
        let context = context.into();
        Self::new(
            ErrorCode::VersionMismatch,
            format!(
                "Multiple different versions found in {}: {}",
                context,
                found.join(", ")
            ),
            Self::details_of(VersionMismatchDetails { found, context }),
        )
        .with_hint("Pass --version to pick one explicitly")
    }

    pub fn workdir_missing(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PipelineWorkdirMissing,
            format!("Working directory does not exist: {}", path.into()),
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn process_failed(
        task: impl Into<String>,
        exit_code: Option<i32>,
        log_file: Option<String>,
    ) -> Self {
        let task = task.into();
        Self::new(
            ErrorCode::PipelineProcessFailed,
            format!("Task failed: {}", task),
            Self::details_of(ProcessFailedDetails {
                task,
                exit_code,
                log_file,
            }),
        )
    }

    pub fn no_references() -> Self {
        Self::new(
            ErrorCode::ReferenceNoneLinked,
            "No references linked",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("Run 'relink link <identifier> <path>' to add one")
    }

    pub fn reference_not_found(identifier: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ReferenceNotFound,
            "Reference not found",
            Self::details_of(NotFoundDetails {
                id: identifier.into(),
            }),
        )
        .with_hint("Run 'relink link <identifier> <path>' to add it")
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            Self::details_of(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
            }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });
        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn internal_io(message: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": message.into(),
            "context": context,
        });
        Self::new(ErrorCode::InternalIoError, "I/O error", details)
    }

    pub fn internal_json(message: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": message.into(),
            "context": context,
        });
        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }
}
