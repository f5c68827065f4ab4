//! libgit2-backed history queries

use chrono::{FixedOffset, Offset, TimeZone, Utc};
use git2::{
    build::CheckoutBuilder, BranchType, Cred, CredentialType, Diff, DiffFormat, FetchOptions,
    RemoteCallbacks, Repository, Sort,
};
use log::{debug, warn};
use std::path::Path;

use super::Backend;
use crate::error::{AnnounceError, Result};

/// Hash of the empty tree, used only for logging root-commit diffs
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

const MAX_AUTH_ATTEMPTS: u8 = 3;

/// A git repository opened through libgit2
pub struct GitRepository {
    repo: Repository,
    remote: String,
}

impl GitRepository {
    /// Open the repository containing `path`; `remote` is used by `refresh`
    pub fn open(path: &Path, remote: &str) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            AnnounceError::BackendUnavailable(format!(
                "Failed to find git repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Self {
            repo,
            remote: remote.to_string(),
        })
    }

    fn find_commit(&self, rev: &str) -> Result<git2::Commit<'_>> {
        self.repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| AnnounceError::UnresolvableRevision(rev.to_string()))
    }

    /// Move every local branch that is strictly behind its upstream
    fn fast_forward_branches(&self) -> Result<()> {
        let head = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.name().map(str::to_string));

        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (mut branch, _) = entry?;
            let upstream = match branch.upstream() {
                Ok(upstream) => upstream,
                Err(_) => continue,
            };

            let (Some(local), Some(target)) = (branch.get().target(), upstream.get().target())
            else {
                continue;
            };
            let refname = branch.get().name().unwrap_or_default().to_string();
            if local == target {
                continue;
            }
            if !self.repo.graph_descendant_of(target, local)? {
                if !self.repo.graph_descendant_of(local, target)? {
                    warn!(
                        "{} has diverged from its upstream; not fast-forwarding",
                        refname
                    );
                }
                continue;
            }

            debug!("fast-forward {} {}..{}", refname, local, target);
            // The HEAD branch gets its working tree and index moved first, so a
            // failed checkout leaves the ref where it was
            if head.as_deref() == Some(refname.as_str()) {
                let commit = self.repo.find_commit(target)?;
                self.repo
                    .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
            }
            branch
                .get_mut()
                .set_target(target, "announcer: fast-forward")?;
        }

        Ok(())
    }
}

impl Backend for GitRepository {
    fn resolve(&self, rev: &str) -> Result<String> {
        debug!("git rev-list -n 1 {}", rev);
        Ok(self.find_commit(rev)?.id().to_string())
    }

    fn commits_between(&self, since: &str, until: &str) -> Result<Vec<String>> {
        debug!("git rev-list {}..{}", since, until);
        let hidden = self.find_commit(since)?.id();
        let tip = self.find_commit(until)?.id();

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip)?;
        revwalk.hide(hidden)?;

        revwalk
            .map(|oid| oid.map(|o| o.to_string()).map_err(AnnounceError::from))
            .collect()
    }

    fn parent(&self, commit: &str) -> Result<Option<String>> {
        debug!("git rev-list -n 1 {}^", commit);
        let commit = self.find_commit(commit)?;
        Ok(commit.parent_ids().next().map(|oid| oid.to_string()))
    }

    fn what_changed(&self, rev: &str) -> Result<String> {
        debug!("git whatchanged -n 1 {}", rev);
        let commit = self.find_commit(rev)?;

        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit.tree()?), None)?;

        let author = commit.author();
        let mut out = format!(
            "commit {}\nAuthor: {} <{}>\nDate:   {}\n\n",
            commit.id(),
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or(""),
            format_time(&author.when())
        );
        for line in commit.message().unwrap_or("").lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&render_diff(&diff, DiffFormat::Raw)?);

        Ok(trim_newline(out))
    }

    fn diff(&self, from: Option<&str>, to: &str) -> Result<String> {
        debug!("git diff {} {}", from.unwrap_or(EMPTY_TREE), to);
        let old_tree = match from {
            Some(rev) => Some(self.find_commit(rev)?.tree()?),
            None => None,
        };
        let new_tree = self.find_commit(to)?.tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;

        Ok(trim_newline(render_diff(&diff, DiffFormat::Patch)?))
    }

    fn has_local_branch(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        debug!("git checkout {}", branch);
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| AnnounceError::UnresolvableRevision(branch.to_string()))?;

        let reference = local.get();
        let refname = reference
            .name()
            .ok_or_else(|| AnnounceError::UnresolvableRevision(branch.to_string()))?;
        let commit = reference.peel_to_commit()?;

        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(refname)?;
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        debug!("git pull {}", self.remote);
        let unavailable = |e: git2::Error| {
            AnnounceError::BackendUnavailable(format!(
                "refresh from '{}' failed: {}",
                self.remote,
                e.message()
            ))
        };

        let mut remote = self.repo.find_remote(&self.remote).map_err(unavailable)?;
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(credential_callbacks(&self.repo));
        remote
            .fetch(&[] as &[&str], Some(&mut fetch_options), None)
            .map_err(unavailable)?;

        self.fast_forward_branches()
    }
}

/// Credentials tried in order: ssh-agent, git credential helper, default
fn credential_callbacks(repo: &Repository) -> RemoteCallbacks<'static> {
    let config = repo.config().ok();
    let mut attempts = 0u8;
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::from_str("Authentication failed"));
        }

        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(ref config) = config {
                if let Ok(cred) = Cred::credential_helper(config, url, username_from_url) {
                    return Ok(cred);
                }
            }
        }

        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        Err(git2::Error::from_str("No authentication methods available"))
    });

    callbacks
}

fn render_diff(diff: &Diff<'_>, format: DiffFormat) -> Result<String> {
    let mut out = String::new();
    diff.print(format, |_delta, _hunk, line| {
        if let origin @ ('+' | '-' | ' ') = line.origin() {
            out.push(origin);
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

/// Format a commit time the way `git log` prints it by default
fn format_time(time: &git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    match offset.timestamp_opt(time.seconds(), 0).single() {
        Some(dt) => dt.format("%a %b %-d %H:%M:%S %Y %z").to_string(),
        None => time.seconds().to_string(),
    }
}

fn trim_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
    }
    text
}
