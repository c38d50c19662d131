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
use std::error::Error as StdError;
use std::sync::atomic::AtomicUsize;

pub static VERBOSITY: AtomicUsize = AtomicUsize::new(0);

#[macro_export]
#[allow(unused_macros)]
macro_rules! always {
    () => { println!() };
    ($($arg:tt)*) => {{ println!($($arg)*); }};
}

#[macro_export]
#[allow(unused_macros)]
macro_rules! error {
    () => { eprintln!() };
    ($($arg:tt)*) => {{ eprintln!($($arg)*); }};
}

#[macro_export]
#[allow(unused_macros)]
macro_rules! normal {
    () => { if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 0 { println!() } };
    ($($arg:tt)*) => {{ if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 0 { println!($($arg)*); } }};
}

#[macro_export]
#[allow(unused_macros)]
macro_rules! loud {
    () => { if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 1 { println!() } };
    ($($arg:tt)*) => {{ if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 1 { println!($($arg)*); } }};
}

#[macro_export]
#[allow(unused_macros)]
macro_rules! louder {
    () => { if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 2 { println!() } };
    ($($arg:tt)*) => {{ if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 2 { println!($($arg)*); } }};
}

#[macro_export]
#[allow(unused_macros)]
macro_rules! loudest {
    () => { if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 3 { println!() } };
    ($($arg:tt)*) => {{ if crate::util::VERBOSITY.load(std::sync::atomic::Ordering::Relaxed) > 3 { println!($($arg)*); } }};
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GitChartErrorKind {
    #[default]
    Unknown,
    Settings,
    Git,
    History,
    Chart,
    Template,
    Filesystem,
    Prompt,
}

#[derive(Default)]
pub struct GitChartError {
    msg: Option<String>,
    kind: GitChartErrorKind,
    source: Option<Box<dyn std::error::Error>>,
}

impl GitChartError {
    pub fn kind(kind: GitChartErrorKind, msg: Option<&str>) -> Self {
        GitChartError {
            kind,
            msg: msg.map(|x| x.to_owned()),
            source: None,
        }
    }
    pub fn sourced_kind(kind: GitChartErrorKind, msg: Option<&str>, source: impl std::error::Error + 'static) -> Self {
        GitChartError {
            kind,
            msg: msg.map(|x| x.to_owned()),
            source: Some(Box::new(source)),
        }
    }
    pub fn error_kind(&self) -> GitChartErrorKind {
        self.kind
    }
}
impl std::fmt::Display for GitChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            GitChartErrorKind::Settings => write!(f, "gitchart error (settings)")?,
            GitChartErrorKind::Git => write!(f, "gitchart error (git)")?,
            GitChartErrorKind::History => write!(f, "gitchart error (history)")?,
            GitChartErrorKind::Chart => write!(f, "gitchart error (chart)")?,
            GitChartErrorKind::Template => write!(f, "gitchart error (template)")?,
            GitChartErrorKind::Filesystem => write!(f, "gitchart error (filesystem)")?,
            GitChartErrorKind::Prompt => write!(f, "gitchart error (prompt)")?,
            GitChartErrorKind::Unknown => write!(f, "gitchart error (unknown)")?,
        }
        write!(f, ": {}", self.msg.as_deref().unwrap_or_default())?;
        if let Some(src) = &self.source {
            write!(f, " ({})", src)?;
        }
        Ok(())
    }
}
impl std::fmt::Debug for GitChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
impl std::error::Error for GitChartError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|c| &**c as &(dyn StdError + 'static))
    }
}
impl From<git2::Error> for GitChartError {
    fn from(source: git2::Error) -> Self {
        GitChartError::sourced_kind(GitChartErrorKind::Git, Some(&source.message().to_owned()), source)
    }
}
impl From<tera::Error> for GitChartError {
    fn from(source: tera::Error) -> Self {
        GitChartError::sourced_kind(GitChartErrorKind::Template, Some(&source.to_string()), source)
    }
}
impl From<std::io::Error> for GitChartError {
    fn from(source: std::io::Error) -> Self {
        GitChartError::sourced_kind(GitChartErrorKind::Filesystem, Some(&source.to_string()), source)
    }
}
impl From<toml::de::Error> for GitChartError {
    fn from(source: toml::de::Error) -> Self {
        GitChartError::sourced_kind(GitChartErrorKind::Settings, Some("configuration file is invalid"), source)
    }
}
impl From<dialoguer::Error> for GitChartError {
    fn from(source: dialoguer::Error) -> Self {
        GitChartError::sourced_kind(GitChartErrorKind::Prompt, Some("failed to read commit count"), source)
    }
}
