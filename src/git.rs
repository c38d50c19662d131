/*
 * Copyright 2023 Trevor Bentley
 *
 * Author: Trevor Bentley
 * Contact: gitsy@@trevorbentley.com
 *
 * This file is part of gitchart.
 *
 * gitchart is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * gitchart is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with gitchart.  If not, see <http://www.gnu.org/licenses/>.
 */
use crate::util::{GitChartError, GitChartErrorKind};
use crate::{loud, loudest, normal};
use dialoguer::Input;
use git2::{Error, ObjectType, Odb, Oid, Repository};
use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::Path;

/// Commit count offered when the history is too long to chart whole.
pub const SUGGESTED_COMMIT_LIMIT: usize = 750;

#[derive(Clone, Debug)]
pub struct CommitInfo {
    pub id: Oid,
    pub author: String,
    pub ts_utc: i64,
    pub ts_offset: i64,
    pub tree_id: Oid,
}

impl CommitInfo {
    pub fn from_commit(commit: &git2::Commit) -> Self {
        let author = commit.author();
        let name = author
            .name()
            .filter(|x| !x.trim().is_empty())
            .or(author.email())
            .filter(|x| !x.trim().is_empty())
            .unwrap_or("[unknown]")
            .to_string();
        CommitInfo {
            id: commit.id(),
            author: name,
            ts_utc: commit.time().seconds(),
            ts_offset: (commit.time().offset_minutes() as i64) * 60,
            tree_id: commit.tree_id(),
        }
    }
}

pub fn open_repo(path: &Path) -> Result<Repository, GitChartError> {
    Repository::open(path).map_err(|e| {
        GitChartError::sourced_kind(
            GitChartErrorKind::Git,
            Some(&format!("Could not open git repository at {}", path.display())),
            e,
        )
    })
}

/// Decides how many commits to sample once the history is over the limit.
pub trait CommitLimitPrompt {
    fn commit_limit(&self, limit_history: usize) -> Result<usize, GitChartError>;
}

pub struct TerminalPrompt;

impl CommitLimitPrompt for TerminalPrompt {
    fn commit_limit(&self, limit_history: usize) -> Result<usize, GitChartError> {
        if !std::io::stdin().is_terminal() {
            return Err(GitChartError::kind(
                GitChartErrorKind::History,
                Some(&format!(
                    "history is longer than {} commits; pass --commits N to chart the N most recent",
                    limit_history
                )),
            ));
        }
        let amount: usize = Input::new()
            .with_prompt(format!(
                "How many commits should be graphed? ({} is probably as far as you want to go)",
                SUGGESTED_COMMIT_LIMIT
            ))
            .default(SUGGESTED_COMMIT_LIMIT)
            .validate_with(|n: &usize| match *n > 0 {
                true => Ok(()),
                false => Err("at least one commit is needed"),
            })
            .interact_text()?;
        Ok(amount)
    }
}

fn walk_history(repo: &Repository, tip: Oid, max: usize) -> Result<Vec<CommitInfo>, Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(git2::Sort::TIME)?;
    revwalk.push(tip)?;
    let mut history: Vec<CommitInfo> = vec![];
    for (idx, oid) in revwalk.take(max).enumerate() {
        let commit = repo.find_commit(oid?)?;
        let info = CommitInfo::from_commit(&commit);
        loudest!("   + [{}] {} {}", idx, info.id, info.author);
        history.push(info);
    }
    Ok(history)
}

/// Sample the history of `branch`, newest commit first.
///
/// With `forced_limit` set, exactly that many of the most recent commits are
/// taken.  Otherwise the whole history is walked, unless it holds more than
/// `limit_history` commits, in which case `prompt` picks a smaller sample.
pub fn collect_commits(
    repo: &Repository,
    branch: &str,
    limit_history: usize,
    forced_limit: Option<usize>,
    prompt: &dyn CommitLimitPrompt,
) -> Result<Vec<CommitInfo>, GitChartError> {
    let tip = repo
        .revparse_single(branch)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| {
            GitChartError::sourced_kind(
                GitChartErrorKind::Git,
                Some(&format!("Branch '{}' not found", branch)),
                e,
            )
        })?;

    let history = match forced_limit {
        Some(limit) => walk_history(repo, tip.id(), limit)?,
        None => {
            let history = walk_history(repo, tip.id(), limit_history.saturating_add(1))?;
            match history.len() > limit_history {
                false => history,
                true => {
                    normal!("Uh oh, your repository is humongous.  Only the most recent commits can be charted.");
                    let limit = prompt.commit_limit(limit_history)?;
                    walk_history(repo, tip.id(), limit)?
                }
            }
        }
    };

    if history.is_empty() {
        return Err(GitChartError::kind(
            GitChartErrorKind::History,
            Some(&format!("no commits to chart on branch '{}'", branch)),
        ));
    }
    loud!(" - sampled {} commits", history.len());
    Ok(history)
}

/// Visit every blob reachable from `tree_id`, depth first.  Submodules are
/// skipped.
pub fn for_each_blob<F>(repo: &Repository, tree_id: Oid, f: &mut F) -> Result<(), Error>
where
    F: FnMut(&str, Oid),
{
    let tree = repo.find_tree(tree_id)?;
    for entry in tree.iter() {
        match entry.kind() {
            Some(ObjectType::Blob) => {
                let name = String::from_utf8_lossy(entry.name_bytes());
                f(&name, entry.id());
            }
            Some(ObjectType::Tree) => for_each_blob(repo, entry.id(), f)?,
            _ => {}
        }
    }
    Ok(())
}

/// Sums blob sizes of whole trees.  Subtrees shared between commits are only
/// measured once.
#[derive(Default)]
pub struct TreeSizer {
    cache: HashMap<Oid, u64>,
}

impl TreeSizer {
    pub fn tree_size(&mut self, repo: &Repository, tree_id: Oid) -> Result<u64, Error> {
        let odb = repo.odb()?;
        self.measure(repo, &odb, tree_id)
    }

    fn measure(&mut self, repo: &Repository, odb: &Odb, tree_id: Oid) -> Result<u64, Error> {
        if let Some(size) = self.cache.get(&tree_id) {
            return Ok(*size);
        }
        let tree = repo.find_tree(tree_id)?;
        let mut total: u64 = 0;
        for entry in tree.iter() {
            match entry.kind() {
                Some(ObjectType::Blob) => {
                    let (size, _kind) = odb.read_header(entry.id())?;
                    total += size as u64;
                }
                Some(ObjectType::Tree) => total += self.measure(repo, odb, entry.id())?,
                _ => {}
            }
        }
        self.cache.insert(tree_id, total);
        Ok(total)
    }
}
