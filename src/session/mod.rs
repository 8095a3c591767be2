//! In-memory session model.
//!
//! A session is the unit exchanged with the external session API: exactly
//! one source file per required kind (markup, script, style) plus whatever
//! extension fields the API attaches. The page controller is the sole owner;
//! edits replace the whole file vector (copy-on-write), they never mutate in
//! place.

pub mod templates;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three source kinds a playground session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Html,
    JavaScript,
    Css,
}

impl FileKind {
    /// Every session contains exactly one file of each of these.
    pub const REQUIRED: [FileKind; 3] = [FileKind::Html, FileKind::JavaScript, FileKind::Css];

    /// Editor language identifier for this kind.
    #[must_use]
    pub fn language(self) -> &'static str {
        match self {
            FileKind::Html => "html",
            FileKind::JavaScript => "typescript",
            FileKind::Css => "css",
        }
    }
}

/// One editable source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub kind: FileKind,
    /// Monotonic counter. Bumped only by [`Session::merge`], never by
    /// routine edits; editors re-seed their buffers when it grows past the
    /// version they last saw.
    pub version: u32,
    pub contents: String,
}

/// The set of source files exchanged with the session API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub files: Vec<SourceFile>,
    /// Extension fields the session API may attach; carried through
    /// untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    /// The file of the given kind, if present.
    #[must_use]
    pub fn file(&self, kind: FileKind) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.kind == kind)
    }

    /// Largest version across all files (0 for an empty session).
    #[must_use]
    pub fn max_version(&self) -> u32 {
        self.files.iter().map(|file| file.version).max().unwrap_or(0)
    }

    /// Returns a copy with the contents of the `kind` file replaced.
    ///
    /// This is the editor-change path: a whole-vector map-and-replace that
    /// leaves versions untouched.
    #[must_use]
    pub fn with_contents(&self, kind: FileKind, contents: &str) -> Session {
        Session {
            files: self
                .files
                .iter()
                .map(|file| {
                    if file.kind == kind {
                        SourceFile {
                            kind: file.kind,
                            version: file.version,
                            contents: contents.to_string(),
                        }
                    } else {
                        file.clone()
                    }
                })
                .collect(),
            extra: self.extra.clone(),
        }
    }

    /// Merges a previously saved session over the local draft.
    ///
    /// Every resulting file gets version `max(all existing versions) + 1`,
    /// which tells editor reconciliation that this content supersedes the
    /// draft it was seeded with. File order follows the draft; contents come
    /// from `loaded` where it has the kind, from the draft otherwise.
    #[must_use]
    pub fn merge(loaded: &Session, draft: &Session) -> Session {
        let next_version = loaded.max_version().max(draft.max_version()) + 1;

        let files = draft
            .files
            .iter()
            .map(|draft_file| {
                let contents = loaded
                    .file(draft_file.kind)
                    .map_or(draft_file.contents.as_str(), |file| file.contents.as_str());
                SourceFile {
                    kind: draft_file.kind,
                    version: next_version,
                    contents: contents.to_string(),
                }
            })
            .collect();

        let mut extra = draft.extra.clone();
        extra.extend(loaded.extra.clone());

        Session { files, extra }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(versions: [u32; 3]) -> Session {
        Session {
            files: FileKind::REQUIRED
                .iter()
                .zip(versions)
                .map(|(kind, version)| SourceFile {
                    kind: *kind,
                    version,
                    contents: format!("{kind:?} v{version}"),
                })
                .collect(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_merge_bumps_every_version_past_the_max() {
        let merged = Session::merge(&session([1, 1, 1]), &session([1, 1, 1]));
        let versions: Vec<u32> = merged.files.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![2, 2, 2]);
    }

    #[test]
    fn test_merge_takes_loaded_contents_over_draft() {
        let mut loaded = session([3, 1, 1]);
        loaded.files[0].contents = "saved markup".to_string();
        let draft = session([1, 1, 1]);

        let merged = Session::merge(&loaded, &draft);
        assert_eq!(merged.file(FileKind::Html).expect("html").contents, "saved markup");
        assert!(merged.files.iter().all(|f| f.version == 4));
    }

    #[test]
    fn test_with_contents_replaces_only_the_given_kind() {
        let original = session([1, 1, 1]);
        let updated = original.with_contents(FileKind::Css, "body {}");

        assert_eq!(updated.file(FileKind::Css).expect("css").contents, "body {}");
        assert_eq!(updated.file(FileKind::Css).expect("css").version, 1);
        assert_eq!(
            updated.file(FileKind::Html).expect("html"),
            original.file(FileKind::Html).expect("html")
        );
        // The original is untouched.
        assert_ne!(original.file(FileKind::Css).expect("css").contents, "body {}");
    }

    #[test]
    fn test_extension_fields_round_trip() {
        let json = serde_json::json!({
            "files": [{"kind": "Html", "version": 1, "contents": "<p>"}],
            "owner": "someone"
        });
        let session: Session = serde_json::from_value(json).expect("deserialize");
        assert_eq!(session.extra.get("owner"), Some(&serde_json::json!("someone")));

        let back = serde_json::to_value(&session).expect("serialize");
        assert_eq!(back.get("owner"), Some(&serde_json::json!("someone")));
    }
}
