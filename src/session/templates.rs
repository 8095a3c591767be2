//! Named session templates.
//!
//! Templates are deep-copied on every `get` with all file versions reset
//! to 1. The `inject!(…)` placeholders in the markup are resolved by the
//! session backend when it assembles the runnable page; the playground
//! treats them as opaque text.

use super::{FileKind, Session, SourceFile};
use serde_json::Map;

/// Name of the template used for fresh sessions.
pub const DEFAULT_TEMPLATE: &str = "default";

const DEFAULT_JS: &str = "// JavaScript\n";

const DEFAULT_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <link rel="stylesheet" href="inject!(editors.css.raw)" />

    inject!(console)
  </head>

  <body>
    <div id="root">

    </div>

    <!-- Note: Remove ".raw" to enable JSX support -->
    <script src="inject!(editors.js.raw)"></script>
  </body>
</html>
"#;

const DEFAULT_CSS: &str = "html {
  font-family: Arial, sans;
  background: #23262e;
  color: #d5ced9;
}";

/// Fresh copy of a named template, every file at version 1. `None` for
/// unknown names; callers must handle absence.
#[must_use]
pub fn get(name: &str) -> Option<Session> {
    let files: [(FileKind, &str); 3] = match name {
        DEFAULT_TEMPLATE => [
            (FileKind::Html, DEFAULT_HTML),
            (FileKind::JavaScript, DEFAULT_JS),
            (FileKind::Css, DEFAULT_CSS),
        ],
        _ => return None,
    };

    Some(Session {
        files: files
            .into_iter()
            .map(|(kind, contents)| SourceFile {
                kind,
                version: 1,
                contents: contents.to_string(),
            })
            .collect(),
        extra: Map::new(),
    })
}

/// A fresh session from the default template.
#[must_use]
pub fn create() -> Session {
    get(DEFAULT_TEMPLATE).expect("default template must exist")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_has_one_file_per_required_kind_at_version_1() {
        let session = create();
        assert_eq!(session.files.len(), 3);
        for kind in FileKind::REQUIRED {
            let file = session.file(kind).expect("required kind");
            assert_eq!(file.version, 1);
        }
    }

    #[test]
    fn test_unknown_template_is_none() {
        assert!(get("react-native-vision-os").is_none());
    }

    #[test]
    fn test_copies_are_independent() {
        let mut a = create();
        let b = create();
        a.files[0].contents.push_str("<!-- edited -->");
        assert_ne!(a.files[0].contents, b.files[0].contents);
    }
}
