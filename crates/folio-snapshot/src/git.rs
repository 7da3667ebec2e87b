//! Source-control state capture.
//!
//! Snapshots record which commit the project was on when they were taken.
//! The capture is descriptive only; resolution never looks at it.

use git2::{ErrorCode, Oid, Repository, StatusOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Git state at snapshot creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    /// Abbreviated commit hash (7 characters).
    pub commit: String,
    /// Full commit hash.
    pub commit_full: String,
    /// Branch name, `None` when HEAD is detached.
    #[serde(default)]
    pub branch: Option<String>,
    /// Whether the working tree had uncommitted changes.
    #[serde(default)]
    pub dirty: bool,
    /// A tag pointing at HEAD, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Capture the git state of the repository containing `dir`.
///
/// Returns `Ok(None)` when `dir` is not inside a repository or the
/// repository has no commits yet.
pub fn capture(dir: &Path) -> Result<Option<GitInfo>, git2::Error> {
    let repo = match Repository::discover(dir) {
        Ok(repo) => repo,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(None)
        }
        Err(e) => return Err(e),
    };

    let commit = head.peel_to_commit()?;
    let commit_full = commit.id().to_string();
    let branch = if head.is_branch() {
        head.shorthand().map(|s| s.to_string())
    } else {
        None
    };

    Ok(Some(GitInfo {
        commit: commit_full.chars().take(7).collect(),
        commit_full,
        branch,
        dirty: is_dirty(&repo)?,
        tag: tag_at(&repo, commit.id())?,
    }))
}

fn is_dirty(repo: &Repository) -> Result<bool, git2::Error> {
    if repo.is_bare() {
        return Ok(false);
    }

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(false)
        .include_ignored(false)
        .include_unmodified(false);

    Ok(!repo.statuses(Some(&mut opts))?.is_empty())
}

fn tag_at(repo: &Repository, target: Oid) -> Result<Option<String>, git2::Error> {
    let names = repo.tag_names(None)?;
    for name in names.iter().flatten() {
        let points_here = repo
            .revparse_single(&format!("refs/tags/{name}"))
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id() == target)
            .unwrap_or(false);
        if points_here {
            return Ok(Some(name.to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, name: &str, content: &str) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        std::fs::write(workdir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_outside_repository() {
        let dir = TempDir::new().unwrap();
        // A temp dir could live inside a checkout; only assert when it does not.
        if Repository::discover(dir.path()).is_err() {
            assert_eq!(capture(dir.path()).unwrap(), None);
        }
    }

    #[test]
    fn test_unborn_head() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        assert_eq!(capture(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_clean_commit() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = commit_file(&repo, "readme.md", "hello\n");

        let info = capture(dir.path()).unwrap().unwrap();
        assert_eq!(info.commit_full, oid.to_string());
        assert_eq!(info.commit.len(), 7);
        assert!(info.commit_full.starts_with(&info.commit));
        assert!(info.branch.is_some());
        assert!(!info.dirty);
        assert_eq!(info.tag, None);
    }

    #[test]
    fn test_dirty_and_tagged() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = commit_file(&repo, "readme.md", "hello\n");
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight("v1.0.0", &object, false).unwrap();

        std::fs::write(dir.path().join("readme.md"), "changed\n").unwrap();

        let info = capture(dir.path()).unwrap().unwrap();
        assert!(info.dirty);
        assert_eq!(info.tag.as_deref(), Some("v1.0.0"));
    }

    #[test]
    fn test_git_info_serializes_camel_case() {
        let info = GitInfo {
            commit: "abc1234".to_string(),
            commit_full: "abc1234def".to_string(),
            branch: Some("main".to_string()),
            dirty: false,
            tag: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["commitFull"], "abc1234def");
        assert!(json.get("tag").is_none());
    }
}
