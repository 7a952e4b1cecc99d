//! Project context files.
//!
//! The CLI reads the active project from a TOML or JSON file shaped like
//! [`ProjectContext`]. The format is picked by extension; anything that is
//! not `.json` is parsed as TOML.

use std::path::{Path, PathBuf};

use devquest_types::project::ProjectContext;

/// Errors from loading a project file.
#[derive(Debug, thiserror::Error)]
pub enum ProjectFileError {
    #[error("failed to read project file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Load a [`ProjectContext`] from `path`.
pub async fn load_project(path: &Path) -> Result<ProjectContext, ProjectFileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProjectFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let parsed = if is_json(path) {
        serde_json::from_str::<ProjectContext>(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str::<ProjectContext>(&content).map_err(|e| e.to_string())
    };

    let context = parsed
        .and_then(|context| {
            if let Some(report) = &context.scope_report {
                report.check().map_err(|e| format!("scopeReport: {e}"))?;
            }
            Ok(context)
        })
        .map_err(|message| ProjectFileError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

    tracing::debug!(
        path = %path.display(),
        has_scope_report = context.scope_report.is_some(),
        "Loaded project context"
    );
    Ok(context)
}

/// Project id derived from the file stem (`starfall.toml` -> `starfall`).
pub fn project_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devquest_types::project::{GddField, RiskLevel};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_toml_project() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("starfall.toml");
        tokio::fs::write(
            &path,
            r#"
[gdd]
name = "Starfall"
genre = "roguelite"
"#,
        )
        .await
        .unwrap();

        let ctx = load_project(&path).await.unwrap();
        assert_eq!(ctx.gdd.get(GddField::Genre), Some("roguelite"));
        assert!(ctx.scope_report.is_none());
        assert_eq!(project_id(&path), "starfall");
    }

    #[tokio::test]
    async fn test_load_json_project() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tiny.JSON");
        tokio::fs::write(
            &path,
            r#"{"gdd": {"artStyle": "pixel"}, "scopeReport": {"score": 40, "riskLevel": "red"}}"#,
        )
        .await
        .unwrap();

        let ctx = load_project(&path).await.unwrap();
        assert_eq!(ctx.gdd.get(GddField::ArtStyle), Some("pixel"));
        assert_eq!(ctx.scope_report.unwrap().risk_level, RiskLevel::Red);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_project(&tmp.path().join("nope.toml")).await.unwrap_err();
        assert!(matches!(err, ProjectFileError::Io { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("overscoped.toml");
        tokio::fs::write(
            &path,
            r#"
[scopeReport]
score = 150
riskLevel = "green"
"#,
        )
        .await
        .unwrap();

        let err = load_project(&path).await.unwrap_err();
        assert!(matches!(err, ProjectFileError::Parse { .. }));
        assert!(err.to_string().contains("score 150 is outside 0-100"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let err = load_project(&path).await.unwrap_err();
        assert!(matches!(err, ProjectFileError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
