use crate::{config::Workspace, errors::AppError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Resolve an untrusted relative path against a root directory.
///
/// Returns the canonical absolute path of `root`/`relative` if and only if it
/// stays inside the canonical root; any traversal, absolute-path injection, or
/// symlink pointing outside the root is rejected. Containment is decided by
/// path-segment comparison, so `/data/proj-evil` is never mistaken for a child
/// of `/data/proj`. Read-only: nothing is created here.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, AppError> {
    let rel = Path::new(relative);
    if rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(AppError::PathOutsideRoot);
    }

    let canon_root = dunce::canonicalize(root).map_err(|e| {
        tracing::warn!(root = %root.display(), error = %e, "root canonicalization failed");
        AppError::Internal("workspace root unavailable".into())
    })?;

    // Lexical walk: `..` pops, and popping above the root is an escape even if
    // later segments would re-enter it.
    let mut joined = canon_root.clone();
    for comp in rel.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !joined.pop() || !joined.starts_with(&canon_root) {
                    return Err(AppError::PathOutsideRoot);
                }
            }
            Component::Normal(seg) => joined.push(seg),
            Component::Prefix(_) | Component::RootDir => return Err(AppError::PathOutsideRoot),
        }
    }

    // Resolve symlinks in whatever part of the path exists. Write targets may
    // not exist yet, so missing trailing components are carried over as-is.
    let candidate = canonicalize_allow_missing(&joined).map_err(|e| {
        tracing::warn!(path = %joined.display(), error = %e, "canonicalization failed");
        AppError::Internal("path resolution failed".into())
    })?;

    if candidate.starts_with(&canon_root) {
        Ok(candidate)
    } else {
        Err(AppError::PathOutsideRoot)
    }
}

/// Canonicalize `path`, tolerating a non-existent tail: the deepest existing
/// ancestor is fully resolved and the remaining components appended verbatim.
/// Expects a path without `.`/`..` components.
fn canonicalize_allow_missing(path: &Path) -> std::io::Result<PathBuf> {
    canonicalize_with_links(path, 0)
}

const MAX_LINK_DEPTH: u32 = 32;

fn canonicalize_with_links(path: &Path, depth: u32) -> std::io::Result<PathBuf> {
    match dunce::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // NotFound also covers a dangling symlink at this component. A
            // later write would still follow the link, so it must resolve to
            // its target, never get appended under its own name.
            if path.symlink_metadata().is_ok() {
                if depth >= MAX_LINK_DEPTH {
                    return Err(std::io::Error::new(
                        ErrorKind::Other,
                        "too many levels of symbolic links",
                    ));
                }
                let target = fs::read_link(path)?;
                let parent = path.parent().ok_or(e)?;
                let base = canonicalize_with_links(parent, depth)?;
                let followed = if target.is_absolute() { target } else { base.join(target) };
                return canonicalize_with_links(&followed, depth + 1);
            }
            let parent = path.parent().ok_or(e)?;
            let base = canonicalize_with_links(parent, depth)?;
            match path.file_name() {
                Some(name) => Ok(base.join(name)),
                None => Ok(base),
            }
        }
        Err(e) => Err(e),
    }
}

/// The root-scope half of the sandbox: turns workspace config plus an optional
/// per-call project name into a concrete, existing root directory.
#[derive(Clone)]
pub struct Sandbox {
    workspace: Workspace,
}

impl Sandbox {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Establish the root for one call, creating it on demand. In `Fixed` mode
    /// the `project` param is ignored; in `Parent` mode it is required, and the
    /// folder name is untrusted input that goes through `resolve` like any
    /// other relative path.
    pub fn root_for(&self, project: Option<&str>) -> Result<PathBuf, AppError> {
        match &self.workspace {
            Workspace::Fixed { root_dir } => {
                ensure_dir(root_dir)?;
                dunce::canonicalize(root_dir).map_err(|e| {
                    tracing::warn!(root = %root_dir.display(), error = %e, "root canonicalization failed");
                    AppError::Internal("workspace root unavailable".into())
                })
            }
            Workspace::Parent { parent_dir } => {
                let name = project
                    .ok_or_else(|| AppError::ToolError("missing project".into()))?;
                if name.is_empty() {
                    return Err(AppError::ToolError("empty project".into()));
                }
                ensure_dir(parent_dir)?;
                let root = resolve(parent_dir, name)?;
                ensure_dir(&root)?;
                Ok(root)
            }
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    // mkdir -p semantics: idempotent and safe to race.
    fs::create_dir_all(dir).map_err(|e| {
        tracing::warn!(dir = %dir.display(), error = %e, "directory creation failed");
        AppError::Internal("workspace directory unavailable".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_relative_path_resolves_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        let got = resolve(&root, "a/b.txt").unwrap();
        assert_eq!(got, root.join("a").join("b.txt"));
    }

    #[test]
    fn empty_path_resolves_to_root_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        assert_eq!(resolve(&root, "").unwrap(), root);
        assert_eq!(resolve(&root, ".").unwrap(), root);
    }

    #[test]
    fn dotdot_within_root_is_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        assert_eq!(resolve(&root, "a/../b.txt").unwrap(), root.join("b.txt"));
    }

    #[test]
    fn escaping_dotdot_is_denied() {
        let tmp = tempfile::tempdir().unwrap();
        for p in ["..", "../x", "../../etc/passwd", "a/../../x", "a/b/../../../x"] {
            let err = resolve(tmp.path(), p).unwrap_err();
            assert!(matches!(err, AppError::PathOutsideRoot), "expected denial for {p:?}");
        }
    }

    #[test]
    fn momentary_escape_is_denied_even_if_reentering() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let name = root.file_name().unwrap().to_str().unwrap();
        let err = resolve(root, &format!("../{name}/inner.txt")).unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
    }

    #[test]
    fn absolute_path_is_denied_not_reinterpreted() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve(tmp.path(), "/etc/passwd").unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
    }

    #[test]
    fn sibling_directory_prefix_is_not_containment() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("proj");
        let evil = parent.path().join("proj-evil");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&evil).unwrap();
        fs::write(evil.join("loot.txt"), b"no").unwrap();
        let err = resolve(&root, "../proj-evil/loot.txt").unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_denied() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"s").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("link")).unwrap();
        let err = resolve(tmp.path(), "link/secret.txt").unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_to_outside_file_is_denied() {
        let outside = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        // target does not exist yet; a write through the link would create it
        std::os::unix::fs::symlink(outside.path().join("loot.txt"), tmp.path().join("evil"))
            .unwrap();
        let err = resolve(tmp.path(), "evil").unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
        assert!(!outside.path().join("loot.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_to_outside_dir_is_denied() {
        let outside = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("newdir"), tmp.path().join("sub"))
            .unwrap();
        let err = resolve(tmp.path(), "sub/file.txt").unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_within_root_resolves_to_target() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("alias.txt")).unwrap();
        let got = resolve(&root, "alias.txt").unwrap();
        assert_eq!(got, root.join("real.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_an_error_not_an_escape() {
        let tmp = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(tmp.path().join("b"), tmp.path().join("a")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a"), tmp.path().join("b")).unwrap();
        let err = resolve(tmp.path(), "a").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_within_root_is_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("real/f.txt"), b"ok").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();
        let got = resolve(&root, "alias/f.txt").unwrap();
        assert_eq!(got, root.join("real").join("f.txt"));
    }

    #[test]
    fn missing_tail_is_resolved_lexically() {
        let tmp = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        let got = resolve(&root, "deep/nested/new.txt").unwrap();
        assert_eq!(got, root.join("deep").join("nested").join("new.txt"));
    }

    #[test]
    fn fixed_workspace_ignores_project_param() {
        let tmp = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(Workspace::Fixed { root_dir: tmp.path().to_path_buf() });
        let a = sandbox.root_for(None).unwrap();
        let b = sandbox.root_for(Some("anything")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, dunce::canonicalize(tmp.path()).unwrap());
    }

    #[test]
    fn parent_workspace_creates_project_root_on_demand() {
        let tmp = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(Workspace::Parent { parent_dir: tmp.path().to_path_buf() });
        let root = sandbox.root_for(Some("demo")).unwrap();
        assert!(root.is_dir());
        assert_eq!(root, dunce::canonicalize(tmp.path()).unwrap().join("demo"));
    }

    #[test]
    fn parent_workspace_rejects_traversal_in_project_name() {
        let tmp = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(Workspace::Parent { parent_dir: tmp.path().to_path_buf() });
        let err = sandbox.root_for(Some("../escaped")).unwrap_err();
        assert!(matches!(err, AppError::PathOutsideRoot));
        assert!(matches!(sandbox.root_for(None).unwrap_err(), AppError::ToolError(_)));
    }
}
