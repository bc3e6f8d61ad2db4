use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// A host port published to a container port (`-p host:container`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub const fn new(host: u16, container: u16) -> Self {
        Self { host, container }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

/// Everything needed to produce a local image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub tag: String,
    pub dockerfile: String,
    /// Supporting files, keyed by path relative to the context root.
    pub files: BTreeMap<PathBuf, String>,
}

/// How to start a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Local tag or remote image reference.
    pub image: String,
    pub ports: BTreeSet<PortMapping>,
    pub privileged: bool,
    pub detached: bool,
    /// Keep stdin open and allocate a TTY (`-it`).
    pub interactive: bool,
    pub name: Option<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ports: BTreeSet::new(),
            privileged: false,
            detached: true,
            interactive: false,
            name: None,
        }
    }

    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.insert(PortMapping::new(host, container));
        self
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A named, preconfigured deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: &'static str,
    /// Menu label.
    pub title: &'static str,
    pub build: Option<BuildSpec>,
    pub run: RunSpec,
}
