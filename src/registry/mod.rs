// Fixed catalogue of workloads the menu can launch.

mod templates;
mod types;

use std::collections::BTreeMap;
use std::path::PathBuf;

pub use types::{BuildSpec, PortMapping, RunSpec, WorkloadSpec};

use crate::error::{OperationResult, OrchestrationError};

/// Read-only lookup table of workloads, in menu order.
#[derive(Debug, Clone)]
pub struct Registry {
    workloads: Vec<WorkloadSpec>,
}

impl Registry {
    /// The five workloads shipped with the tool.
    pub fn builtin() -> Self {
        let workloads = vec![
            WorkloadSpec {
                name: "flask-api",
                title: "Flask prediction API",
                build: Some(BuildSpec {
                    tag: "flask-api".into(),
                    dockerfile: templates::FLASK_DOCKERFILE.into(),
                    files: BTreeMap::from([(
                        PathBuf::from("app.py"),
                        templates::FLASK_APP.to_string(),
                    )]),
                }),
                run: RunSpec::new("flask-api").port(5000, 5000),
            },
            WorkloadSpec {
                name: "dind",
                title: "Docker-in-Docker",
                build: Some(BuildSpec {
                    tag: "docker-dind".into(),
                    dockerfile: templates::DIND_DOCKERFILE.into(),
                    files: BTreeMap::new(),
                }),
                run: RunSpec::new("docker-dind").privileged(),
            },
            WorkloadSpec {
                name: "firefox",
                title: "Firefox (browser VNC)",
                build: None,
                run: RunSpec::new("jlesage/firefox").port(5800, 5800),
            },
            WorkloadSpec {
                name: "vlc",
                title: "VLC (browser VNC)",
                build: None,
                run: RunSpec::new("jlesage/vlc").port(5801, 5800),
            },
            WorkloadSpec {
                name: "apache",
                title: "Apache web server",
                build: Some(BuildSpec {
                    tag: "my-apache".into(),
                    dockerfile: templates::APACHE_DOCKERFILE.into(),
                    files: BTreeMap::from([(
                        PathBuf::from("apache_html/index.html"),
                        templates::APACHE_INDEX.to_string(),
                    )]),
                }),
                run: RunSpec::new("my-apache")
                    .port(8080, 80)
                    .interactive()
                    .named("apache-server"),
            },
        ];
        Self { workloads }
    }

    pub fn lookup(&self, name: &str) -> OperationResult<&WorkloadSpec> {
        self.workloads
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| OrchestrationError::UnknownWorkload {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkloadSpec> {
        self.workloads.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.workloads.iter().map(|w| w.name).collect()
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
