use crate::git::{for_each_blob, CommitInfo, TreeSizer};
use crate::loud;
use crate::util::GitChartError;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use git2::{Error, Oid, Repository};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

pub const WEEK_BINS: usize = 53;
pub const OTHER_EXTENSION: &str = "Other";
pub const REFERENCE_EXTENSION: &str = ".rb";

/// Commit time in the committer's own timezone.
fn local_time(commit: &CommitInfo) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(commit.ts_offset as i32).unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(commit.ts_utc, 0).map(|dt| dt.with_timezone(&offset))
}

pub fn author_counts(commits: &[CommitInfo]) -> BTreeMap<String, usize> {
    let mut authors: BTreeMap<String, usize> = BTreeMap::new();
    for commit in commits {
        *authors.entry(commit.author.clone()).or_default() += 1;
    }
    authors
}

/// Commits per ISO week of the year, week 1 in bin 0.
pub fn week_counts(commits: &[CommitInfo]) -> [usize; WEEK_BINS] {
    let mut weeks = [0; WEEK_BINS];
    for dt in commits.iter().filter_map(local_time) {
        let bin = (dt.iso_week().week() as usize).saturating_sub(1).min(WEEK_BINS - 1);
        weeks[bin] += 1;
    }
    weeks
}

pub fn trim_trailing_zeros(bins: &[usize]) -> Vec<usize> {
    let end = bins.iter().rposition(|x| *x != 0).map(|x| x + 1).unwrap_or(0);
    bins[..end].to_vec()
}

pub fn hour_counts(commits: &[CommitInfo]) -> BTreeMap<u32, usize> {
    let mut hours: BTreeMap<u32, usize> = BTreeMap::new();
    for dt in commits.iter().filter_map(local_time) {
        *hours.entry(dt.hour()).or_default() += 1;
    }
    hours
}

pub fn hour_label(hour: u32) -> String {
    format!("{}:00 - {}:59", hour, hour)
}

/// Extension of a file name, leading dot included.  Dotfiles and names
/// ending in a dot have none.
pub fn extension_of(name: &str) -> Option<&str> {
    let idx = name.rfind('.')?;
    let (stem, ext) = name.split_at(idx);
    match stem.trim_start_matches('.').is_empty() || ext.len() == 1 {
        true => None,
        false => Some(ext),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtensionCounts {
    pub counts: BTreeMap<String, usize>,
    pub files: usize,
}

impl ExtensionCounts {
    pub fn from_tree(repo: &Repository, tree_id: Oid) -> Result<Self, Error> {
        let mut extensions = ExtensionCounts::default();
        for_each_blob(repo, tree_id, &mut |name: &str, _id| extensions.add(name))?;
        loud!(" - counted {} files in {} buckets", extensions.files, extensions.counts.len());
        Ok(extensions)
    }

    pub fn add(&mut self, name: &str) {
        let bucket = extension_of(name).unwrap_or(OTHER_EXTENSION);
        *self.counts.entry(bucket.to_string()).or_default() += 1;
        self.files += 1;
    }

    pub fn count(&self, extension: &str) -> usize {
        self.counts.get(extension).cloned().unwrap_or(0)
    }
}

/// Total blob bytes of every sampled commit's tree, oldest commit first.
///
/// `commits` is expected newest first, as collected.  Each rayon worker
/// opens its own handle on the repository at `repo_path`.
pub fn size_over_time(repo_path: &Path, commits: &[CommitInfo]) -> Result<Vec<u64>, GitChartError> {
    let start = Instant::now();
    let mut sizes = commits
        .par_iter()
        .map_init(
            || (Repository::open(repo_path), TreeSizer::default()),
            |(repo, sizer), commit| -> Result<u64, Error> {
                let repo = repo.as_ref().map_err(|e| Error::from_str(e.message()))?;
                sizer.tree_size(repo, commit.tree_id)
            },
        )
        .collect::<Result<Vec<u64>, Error>>()?;
    sizes.reverse();
    loud!(
        " - measured {} trees in {:.2}s",
        sizes.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(sizes)
}

/// Files per `.rb` file, to two decimals.  Without any `.rb` file the
/// denominator would be substituted by 0.1, and the result is pinned to 0.1.
pub fn awesomeness(files: usize, reference: usize) -> f64 {
    if reference == 0 {
        return 0.1;
    }
    let ratio = files as f64 / reference as f64;
    (ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;
    use pretty_assertions::assert_eq;

    fn commit(author: &str, ts_utc: i64, ts_offset: i64) -> CommitInfo {
        CommitInfo {
            id: Oid::zero(),
            author: author.to_string(),
            ts_utc,
            ts_offset,
            tree_id: Oid::zero(),
        }
    }

    // 2021-01-04 00:00:00 UTC, a Monday starting ISO week 1.
    const WEEK_ONE: i64 = 1_609_718_400;
    const WEEK: i64 = 7 * 24 * 3600;

    #[test]
    fn authors_are_counted_per_commit() {
        let commits = vec![commit("A", 1, 0), commit("B", 2, 0), commit("A", 3, 0)];
        let authors = author_counts(&commits);
        assert_eq!(authors, BTreeMap::from([("A".to_string(), 2), ("B".to_string(), 1)]));
        assert_eq!(authors.values().sum::<usize>(), commits.len());
    }

    #[test]
    fn weeks_fill_fixed_bins() {
        let commits = vec![
            commit("A", WEEK_ONE, 0),
            commit("A", WEEK_ONE + 3600, 0),
            commit("A", WEEK_ONE + 2 * WEEK, 0),
            // 2020-12-31 is in ISO week 53 of 2020
            commit("A", WEEK_ONE - 4 * 24 * 3600, 0),
        ];
        let weeks = week_counts(&commits);
        assert_eq!(weeks.len(), WEEK_BINS);
        assert_eq!(weeks[0], 2);
        assert_eq!(weeks[2], 1);
        assert_eq!(weeks[52], 1);
        assert_eq!(weeks.iter().sum::<usize>(), 4);
    }

    #[test]
    fn weeks_use_the_committer_timezone() {
        // Sunday 23:30 UTC is already Monday in UTC+2
        let commits = vec![commit("A", WEEK_ONE - 1800, 2 * 3600)];
        assert_eq!(week_counts(&commits)[0], 1);
        let commits = vec![commit("A", WEEK_ONE - 1800, 0)];
        assert_eq!(week_counts(&commits)[52], 1);
    }

    #[test]
    fn trims_only_trailing_zeros() {
        assert_eq!(trim_trailing_zeros(&[0, 1, 0, 2, 0, 0]), vec![0, 1, 0, 2]);
        assert_eq!(trim_trailing_zeros(&[3, 0]), vec![3]);
        assert_eq!(trim_trailing_zeros(&[0, 0]), Vec::<usize>::new());
        assert_eq!(trim_trailing_zeros(&[1, 2]), vec![1, 2]);
    }

    #[test]
    fn hours_only_hold_active_hours() {
        let commits = vec![
            commit("A", WEEK_ONE + 9 * 3600, 0),
            commit("A", WEEK_ONE + 9 * 3600 + 59 * 60, 0),
            commit("A", WEEK_ONE + 23 * 3600, -5 * 3600),
        ];
        let hours = hour_counts(&commits);
        assert_eq!(hours, BTreeMap::from([(9, 2), (18, 1)]));
        assert_eq!(hour_label(9), "9:00 - 9:59");
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_of("main.rs"), Some(".rs"));
        assert_eq!(extension_of("archive.tar.gz"), Some(".gz"));
        assert_eq!(extension_of(".gitignore"), None);
        assert_eq!(extension_of(".config.toml"), Some(".toml"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("weird."), None);
    }

    #[test]
    fn extension_buckets_partition_files() {
        let mut extensions = ExtensionCounts::default();
        for name in ["a.rb", "b.rb", "c.rs", "README", ".gitignore", "d.RB"] {
            extensions.add(name);
        }
        assert_eq!(extensions.files, 6);
        assert_eq!(extensions.count(".rb"), 2);
        assert_eq!(extensions.count(".RB"), 1);
        assert_eq!(extensions.count(OTHER_EXTENSION), 2);
        assert_eq!(extensions.count(".py"), 0);
        assert_eq!(extensions.counts.values().sum::<usize>(), extensions.files);
    }

    #[test]
    fn extension_counts_walk_the_tree() {
        let repo = TestRepo::new();
        let id = repo.commit(
            "A",
            1,
            &[
                ("lib/a.rb", "1"),
                ("lib/nested/b.rb", "2"),
                ("bin/tool", "3"),
                ("Rakefile", "4"),
                ("doc/x.md", "5"),
            ],
        );
        let tree_id = repo.repo.find_commit(id).unwrap().tree_id();
        let extensions = ExtensionCounts::from_tree(&repo.repo, tree_id).unwrap();
        assert_eq!(extensions.files, 5);
        assert_eq!(
            extensions.counts,
            BTreeMap::from([
                (".md".to_string(), 1),
                (".rb".to_string(), 2),
                (OTHER_EXTENSION.to_string(), 2)
            ])
        );
    }

    #[test]
    fn sizes_follow_history_oldest_first() {
        let repo = TestRepo::new();
        repo.commit("A", 100, &[("a.txt", "aaaa")]);
        repo.commit("A", 200, &[("dir/b.txt", "bb")]);
        repo.commit("A", 300, &[("a.txt", "a")]);
        let commits = crate::git::collect_commits(&repo.repo, "master", 100, None, &crate::git::TerminalPrompt).unwrap();

        let sizes = size_over_time(repo.repo.path(), &commits).unwrap();
        assert_eq!(sizes.len(), commits.len());
        assert_eq!(sizes, vec![4, 6, 3]);
    }

    #[test]
    fn awesomeness_ratio() {
        assert_eq!(awesomeness(100, 10), 10.0);
        assert_eq!(awesomeness(10, 3), 3.33);
        assert_eq!(awesomeness(2, 3), 0.67);
        assert_eq!(awesomeness(100, 0), 0.1);
        assert_eq!(awesomeness(0, 0), 0.1);
    }
}
