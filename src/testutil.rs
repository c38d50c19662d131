use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::TempDir;

/// Scratch repository on `master` with fully controlled commit times.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        TestRepo { dir, repo }
    }

    pub fn commit(&self, author: &str, ts: i64, files: &[(&str, &str)]) -> Oid {
        self.commit_at(author, ts, 0, files)
    }

    pub fn commit_at(&self, author: &str, ts: i64, offset_minutes: i32, files: &[(&str, &str)]) -> Oid {
        let mut index = self.repo.index().unwrap();
        for (name, contents) in files {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                create_dir_all(parent).unwrap();
            }
            write(&path, contents).unwrap();
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(ts, offset_minutes)).unwrap();
        let parents: Vec<Commit> = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parents: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, &format!("commit at {}", ts), &tree, &parents)
            .unwrap()
    }
}
