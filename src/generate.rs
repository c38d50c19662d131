use crate::{
    always,
    chart::{meter_url, ChartKind, ChartSize, ChartSpec},
    error,
    git::{collect_commits, open_repo, CommitInfo, TerminalPrompt},
    louder, normal,
    opener::select_opener,
    settings::{GitChartCli, GitChartSettings},
    stats::{
        author_counts, awesomeness, hour_counts, hour_label, size_over_time, trim_trailing_zeros, week_counts,
        ExtensionCounts, REFERENCE_EXTENSION,
    },
    template::TsDateFn,
    util::{GitChartError, GitChartErrorKind},
};
use git2::Repository;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::read_to_string;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tera::{Context, Tera};

const REPORT_TEMPLATE: &str = "report.html";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/report.html");

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ReportChart {
    pub title: String,
    pub url: String,
}

pub fn authors_chart(commits: &[CommitInfo], size: ChartSize, threed: bool) -> ChartSpec {
    author_counts(commits)
        .iter()
        .fold(ChartSpec::new(ChartKind::Pie, "Repository Authors", size, threed), |pc, (author, num)| {
            pc.data(author, vec![*num as f64])
        })
}

pub fn commits_chart(commits: &[CommitInfo], kind: ChartKind, size: ChartSize, threed: bool) -> ChartSpec {
    let weeks = week_counts(commits);
    let weeks = match kind {
        ChartKind::Line => trim_trailing_zeros(&weeks),
        _ => weeks.to_vec(),
    };
    let max = weeks.iter().max().cloned().unwrap_or(0) as f64;
    ChartSpec::new(kind, "Commit Frequency", size, threed)
        .data("Commits", weeks.iter().map(|x| *x as f64).collect())
        .axis_range(0.0, max)
}

pub fn hours_chart(commits: &[CommitInfo], size: ChartSize, threed: bool) -> ChartSpec {
    hour_counts(commits)
        .iter()
        .fold(ChartSpec::new(ChartKind::Pie, "Commit Hours", size, threed), |pc, (hour, num)| {
            pc.data(&hour_label(*hour), vec![*num as f64])
        })
}

pub fn extensions_chart(extensions: &ExtensionCounts, size: ChartSize, threed: bool) -> ChartSpec {
    extensions
        .counts
        .iter()
        .fold(ChartSpec::new(ChartKind::Pie, "Popular Extensions", size, threed), |pc, (ext, num)| {
            pc.data(ext, vec![*num as f64])
        })
}

pub fn bytes_chart(sizes: &[u64], size: ChartSize, threed: bool) -> ChartSpec {
    let max = sizes.iter().max().cloned().unwrap_or(0) as f64;
    ChartSpec::new(ChartKind::Line, "Total Filesize", size, threed)
        .data("Bytes", sizes.iter().map(|x| *x as f64).collect())
        .axis_range(0.0, max)
}

/// Write the report next to its final location, then rename it into place
/// so nothing ever sees a partial file.  Without `output`, the report gets a
/// unique name in the system temporary directory.
pub fn write_report(html: &str, output: Option<&Path>) -> Result<PathBuf, GitChartError> {
    let prefix = format!("gitchart-{}-", chrono::Utc::now().timestamp());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);
    let mut file = match output.and_then(|x| x.parent()) {
        Some(dir) if !dir.as_os_str().is_empty() => builder.tempfile_in(dir)?,
        Some(_) => builder.tempfile_in(".")?,
        None => builder.tempfile()?,
    };
    file.write_all(html.as_bytes())?;
    file.flush()?;
    file.as_file().sync_all()?;

    let target = match output {
        Some(path) => {
            file.persist(path).map_err(|e| GitChartError::from(e.error))?;
            path.to_path_buf()
        }
        None => {
            let mut name: OsString = file.path().as_os_str().to_owned();
            name.push(".html");
            let path = PathBuf::from(name);
            file.persist_noclobber(&path).map_err(|e| GitChartError::from(e.error))?;
            path
        }
    };
    louder!(" - wrote file: {} ({} bytes)", target.display(), html.len());
    Ok(target)
}

pub struct GitChartGenerator {
    cli: GitChartCli,
    settings: GitChartSettings,
}

impl GitChartGenerator {
    pub fn new(cli: GitChartCli, settings: GitChartSettings) -> GitChartGenerator {
        GitChartGenerator { cli, settings }
    }

    fn tera_init(&self) -> Result<Tera, GitChartError> {
        let template = match &self.settings.template {
            Some(path) => read_to_string(path).map_err(|e| {
                GitChartError::sourced_kind(
                    GitChartErrorKind::Template,
                    Some(&format!("Unable to read template: {}", path.display())),
                    e,
                )
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let mut tera = Tera::default();
        tera.add_raw_template(REPORT_TEMPLATE, &template)?;
        tera.register_function("ts_to_date", TsDateFn {});
        Ok(tera)
    }

    fn generating_chart(title: &str) {
        normal!("Generating chart '{}' . . .", title);
    }

    /// Resolve a chart to its URL.  A chart without data is reported and
    /// left out of the page rather than failing the whole report.
    fn push_chart(
        charts: &mut Vec<ReportChart>,
        title: &str,
        url: Result<String, GitChartError>,
    ) -> Result<(), GitChartError> {
        match url {
            Ok(url) => {
                louder!(" - {}", url);
                charts.push(ReportChart {
                    title: title.to_string(),
                    url,
                });
            }
            Err(e) if e.error_kind() == GitChartErrorKind::Chart => {
                error!("WARNING: skipping chart '{}': {}", title, e);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn charts(&self, repo: &Repository, commits: &[CommitInfo]) -> Result<Vec<ReportChart>, GitChartError> {
        let size = self.settings.size()?;
        let threed = self.settings.threed();
        let api = self.settings.chart_api();
        let mut charts: Vec<ReportChart> = vec![];

        Self::generating_chart("Repository Authors");
        let url = authors_chart(commits, size, threed).to_url(api);
        Self::push_chart(&mut charts, "Repository Authors", url)?;

        for kind in [ChartKind::Bar, ChartKind::Line] {
            Self::generating_chart("Commit Frequency");
            let url = commits_chart(commits, kind, size, threed).to_url(api);
            Self::push_chart(&mut charts, "Commit Frequency", url)?;
        }

        Self::generating_chart("Commit Hours");
        let url = hours_chart(commits, size, threed).to_url(api);
        Self::push_chart(&mut charts, "Commit Hours", url)?;

        Self::generating_chart("Popular Extensions");
        let extensions = match commits.first() {
            Some(latest) => ExtensionCounts::from_tree(repo, latest.tree_id)?,
            None => ExtensionCounts::default(),
        };
        let url = extensions_chart(&extensions, size, threed).to_url(api);
        Self::push_chart(&mut charts, "Popular Extensions", url)?;

        Self::generating_chart("Total Filesize");
        let sizes = size_over_time(repo.path(), commits)?;
        let url = bytes_chart(&sizes, size, threed).to_url(api);
        Self::push_chart(&mut charts, "Total Filesize", url)?;

        Self::generating_chart("Repository Awesomeness");
        let value = awesomeness(extensions.files, extensions.count(REFERENCE_EXTENSION));
        let url = meter_url(api, "Repository Awesomeness", size, value);
        Self::push_chart(&mut charts, "Repository Awesomeness", url)?;

        Ok(charts)
    }

    fn render(&self, charts: &[ReportChart], commit_count: usize) -> Result<String, GitChartError> {
        let tera = self.tera_init()?;
        let generated_dt = chrono::offset::Local::now();
        let repo_path = self.cli.repo.canonicalize().unwrap_or_else(|_| self.cli.repo.clone());

        let mut ctx = Context::new();
        ctx.insert("repo_path", &repo_path.display().to_string());
        ctx.insert("branch", self.settings.branch());
        ctx.insert("commit_count", &commit_count);
        ctx.insert("charts", charts);
        ctx.insert("generated_ts", &generated_dt.timestamp());
        ctx.insert("generated_offset", &generated_dt.offset().local_minus_utc());
        Ok(tera.render(REPORT_TEMPLATE, &ctx)?)
    }

    fn sample(&self, repo: &Repository) -> Result<Vec<CommitInfo>, GitChartError> {
        collect_commits(
            repo,
            self.settings.branch(),
            self.settings.limit_history(),
            self.settings.commits,
            &TerminalPrompt,
        )
    }

    /// Print only the authors chart URL.
    pub fn generate_minimal(&self) -> Result<(), GitChartError> {
        let repo = open_repo(&self.cli.repo)?;
        let commits = self.sample(&repo)?;
        let size = self.settings.size()?;
        let url = authors_chart(&commits, size, self.settings.threed()).to_url(self.settings.chart_api())?;
        always!("{}", url);
        Ok(())
    }

    pub fn generate(&self) -> Result<(), GitChartError> {
        if self.cli.minimal {
            return self.generate_minimal();
        }
        let start = Instant::now();
        let repo = open_repo(&self.cli.repo)?;

        normal!("Generating chart data . . .");
        normal!("This may take a while, depending on the size of your repository.");
        let commits = self.sample(&repo)?;
        let charts = self.charts(&repo, &commits)?;
        let html = self.render(&charts, commits.len())?;
        let path = write_report(&html, self.cli.output.as_deref())?;
        normal!(
            "Wrote {} charts in {:.2}s",
            charts.len(),
            start.elapsed().as_secs_f32()
        );

        select_opener(self.cli.should_open, self.settings.open_command.as_deref()).open(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;
    use pretty_assertions::assert_eq;

    fn size() -> ChartSize {
        ChartSize { width: 300, height: 200 }
    }

    fn commits(repo: &TestRepo) -> Vec<CommitInfo> {
        collect_commits(&repo.repo, "master", 100, None, &TerminalPrompt).unwrap()
    }

    #[test]
    fn authors_chart_has_one_slice_per_author() {
        let repo = TestRepo::new();
        repo.commit("Alice", 1_000, &[("a.rb", "a")]);
        repo.commit("Bob", 2_000, &[("b.rb", "b")]);
        repo.commit("Alice", 3_000, &[("c.txt", "c")]);
        let spec = authors_chart(&commits(&repo), size(), true);
        assert_eq!(spec.kind, ChartKind::Pie);
        let slices: Vec<(String, Vec<f64>)> = spec.data.into_iter().map(|s| (s.label, s.values)).collect();
        assert_eq!(
            slices,
            vec![("Alice".to_string(), vec![2.0]), ("Bob".to_string(), vec![1.0])]
        );
    }

    #[test]
    fn commit_frequency_series_shapes() {
        let repo = TestRepo::new();
        // ISO weeks 1 and 3 of 2021
        repo.commit("Alice", 1_609_718_400, &[]);
        repo.commit("Alice", 1_609_718_400 + 14 * 24 * 3600, &[]);
        let commits = commits(&repo);

        let bar = commits_chart(&commits, ChartKind::Bar, size(), true);
        assert_eq!(bar.data[0].values.len(), 53);
        assert_eq!(bar.y_range, Some((0.0, 1.0)));

        let line = commits_chart(&commits, ChartKind::Line, size(), true);
        assert_eq!(line.data[0].values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn bytes_chart_is_ranged_to_the_largest_tree() {
        let spec = bytes_chart(&[10, 30, 20], size(), false);
        assert_eq!(spec.kind, ChartKind::Line);
        assert_eq!(spec.y_range, Some((0.0, 30.0)));
        assert_eq!(spec.data[0].values, vec![10.0, 30.0, 20.0]);
    }

    #[test]
    fn empty_extensions_have_no_chart() {
        let spec = extensions_chart(&ExtensionCounts::default(), size(), true);
        assert!(spec.to_url("https://chart.example.com/chart").is_err());
    }

    #[test]
    fn report_is_renamed_to_html() {
        let path = write_report("<html></html>", None).unwrap();
        assert_eq!(path.extension().and_then(|x| x.to_str()), Some("html"));
        assert!(path
            .file_name()
            .and_then(|x| x.to_str())
            .unwrap()
            .starts_with("gitchart-"));
        assert_eq!(read_to_string(&path).unwrap(), "<html></html>");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn report_can_go_to_a_chosen_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("stats.html");
        std::fs::write(&target, "old").unwrap();
        let path = write_report("new", Some(target.as_path())).unwrap();
        assert_eq!(path, target);
        assert_eq!(read_to_string(&target).unwrap(), "new");
        // only the report is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn default_template_lists_charts_in_order() {
        let mut tera = Tera::default();
        tera.add_raw_template(REPORT_TEMPLATE, DEFAULT_TEMPLATE).unwrap();
        tera.register_function("ts_to_date", TsDateFn {});
        let charts = vec![
            ReportChart {
                title: "Repository Authors".into(),
                url: "https://chart.example.com/chart?cht=p3&chs=1x1".into(),
            },
            ReportChart {
                title: "Commit Hours".into(),
                url: "https://chart.example.com/chart?cht=p".into(),
            },
        ];
        let mut ctx = Context::new();
        ctx.insert("repo_path", "/src/project");
        ctx.insert("branch", "master");
        ctx.insert("commit_count", &3);
        ctx.insert("charts", &charts);
        ctx.insert("generated_ts", &0);
        ctx.insert("generated_offset", &0);
        let html = tera.render(REPORT_TEMPLATE, &ctx).unwrap();

        // tera escapes slashes in autoescaped output
        assert!(html.contains("<td>&#x2F;src&#x2F;project</td>"));
        assert!(html.contains("1970-01-01 00:00:00 +0000"));
        assert!(html.contains("master (3 commits)"));
        let authors = html.find("alt=\"Repository Authors\"").unwrap();
        let hours = html.find("alt=\"Commit Hours\"").unwrap();
        assert!(authors < hours);
        assert!(html.contains("cht=p3&amp;chs=1x1"));
    }
}
