//! Per-server reference configuration
//!
//! Configuration arrives as directives, either applied one at a time by a
//! host's own configuration system or read from a directive file:
//!
//! ```text
//! # main server
//! ReferencesDirectory ns.example:9999
//! ReferencesObject    fred.Registry registry
//!
//! <Server api.example>
//!     ReferencesEnable on
//!     ReferencesObject billing.Invoice invoice
//! </Server>
//! ```
//!
//! Virtual servers inherit the directory location, default context and
//! mode from the main server when they do not set their own, and their
//! managed objects are merged on top of the main server's. The enable
//! flag is never inherited.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::error;
use crate::error::{ConfigError, Result as RefResult};

/// Directory host used when a server configures none
pub const DEFAULT_DIRECTORY_HOST: &str = "localhost";

/// Naming context for logical names without a context part
pub const DEFAULT_NAMING_CONTEXT: &str = "default";

/// Name given to the configuration outside any `<Server>` block
pub const MAIN_SERVER: &str = "main";

/// Directive names
pub mod directive {
    pub const ENABLE: &str = "ReferencesEnable";
    pub const DIRECTORY: &str = "ReferencesDirectory";
    pub const OBJECT: &str = "ReferencesObject";
    pub const DEFAULT_CONTEXT: &str = "ReferencesDefaultContext";
    pub const MODE: &str = "ReferencesMode";
}

/// Naming directory location (`host[:port]`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryLocation {
    pub host: String,
    pub port: u16,
}

impl DirectoryLocation {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for DirectoryLocation {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY_HOST, naming::DEFAULT_PORT)
    }
}

impl FromStr for DirectoryLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Bracketed IPv6 literal: [::1]:2809
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| ConfigError::InvalidValue(format!("unterminated '[' in '{}'", s)))?;
            match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if after.is_empty() => (host, None),
                None => return Err(ConfigError::InvalidValue(format!("bad location '{}'", s))),
            }
        } else {
            match s.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(ConfigError::InvalidValue(format!(
                        "IPv6 address in '{}' must be bracketed",
                        s
                    )))
                }
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(ConfigError::InvalidValue(format!("empty host in '{}'", s)));
        }
        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| ConfigError::InvalidValue(format!("bad port in '{}'", s)))?,
            None => naming::DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for DirectoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How handles are produced for each connection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Resolve once at configuration load, materialize from the cache
    #[default]
    Cached,
    /// Resolve against the directory on every connection
    Direct,
}

impl FromStr for ResolutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cached" => Ok(Self::Cached),
            "direct" => Ok(Self::Direct),
            _ => Err(ConfigError::InvalidValue(format!(
                "mode must be 'cached' or 'direct', got '{}'",
                s
            ))),
        }
    }
}

/// One managed object: its directory name and the alias it is published under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedObject {
    pub logical_name: String,
    pub alias: String,
}

/// Ordered set of managed objects with unique logical names and aliases
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagedObjects {
    entries: Vec<ManagedObject>,
}

impl ManagedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object; the newest entry wins over any entry sharing its
    /// logical name or its alias
    pub fn insert(&mut self, logical_name: impl Into<String>, alias: impl Into<String>) {
        let logical_name = logical_name.into();
        let alias = alias.into();
        self.entries
            .retain(|e| e.logical_name != logical_name && e.alias != alias);
        self.entries.push(ManagedObject {
            logical_name,
            alias,
        });
    }

    /// Merge `other` on top of this set
    pub fn overlay(&mut self, other: &ManagedObjects) {
        for entry in &other.entries {
            self.insert(entry.logical_name.clone(), entry.alias.clone());
        }
    }

    pub fn by_alias(&self, alias: &str) -> Option<&ManagedObject> {
        self.entries.iter().find(|e| e.alias == alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedObject> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single configuration directive
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Enable(bool),
    Directory(DirectoryLocation),
    Object { logical_name: String, alias: String },
    DefaultContext(String),
    Mode(ResolutionMode),
}

impl Directive {
    /// Parse a directive name and its arguments
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, String> {
        let expect = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(format!(
                    "{} takes {} argument{}, got {}",
                    name,
                    n,
                    if n == 1 { "" } else { "s" },
                    args.len()
                ))
            }
        };

        if name.eq_ignore_ascii_case(directive::ENABLE) {
            expect(1)?;
            match args[0].to_ascii_lowercase().as_str() {
                "on" => Ok(Self::Enable(true)),
                "off" => Ok(Self::Enable(false)),
                other => Err(format!("{} must be On or Off, got '{}'", name, other)),
            }
        } else if name.eq_ignore_ascii_case(directive::DIRECTORY) {
            expect(1)?;
            args[0]
                .parse()
                .map(Self::Directory)
                .map_err(|e: ConfigError| e.to_string())
        } else if name.eq_ignore_ascii_case(directive::OBJECT) {
            expect(2)?;
            Ok(Self::Object {
                logical_name: args[0].to_string(),
                alias: args[1].to_string(),
            })
        } else if name.eq_ignore_ascii_case(directive::DEFAULT_CONTEXT) {
            expect(1)?;
            if args[0].contains(crate::descriptor::NAME_SEPARATOR) {
                return Err(format!("naming context '{}' must not contain '.'", args[0]));
            }
            Ok(Self::DefaultContext(args[0].to_string()))
        } else if name.eq_ignore_ascii_case(directive::MODE) {
            expect(1)?;
            args[0]
                .parse()
                .map(Self::Mode)
                .map_err(|e: ConfigError| e.to_string())
        } else {
            Err(format!("unknown directive '{}'", name))
        }
    }
}

/// Reference configuration of one server
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerReferenceConfig {
    /// Server name
    pub name: String,
    /// Whether the manager runs for connections on this server
    pub enabled: bool,
    /// Naming directory; `None` means inherit, then the default
    pub directory_location: Option<DirectoryLocation>,
    /// Objects to manage
    pub managed_objects: ManagedObjects,
    /// Context for names without one; `None` means inherit, then the default
    pub default_context: Option<String>,
    /// Resolution mode; `None` means inherit, then cached
    pub mode: Option<ResolutionMode>,
}

impl ServerReferenceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Apply one directive to this server
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Enable(flag) => self.enabled = flag,
            Directive::Directory(location) => {
                // A second location is a harmless authoring slip: keep the first
                if let Some(existing) = &self.directory_location {
                    error!(
                        "server {}: more than one naming directory location ({} and {}); \
                         all but the first one are ignored",
                        self.name, existing, location
                    );
                } else {
                    self.directory_location = Some(location);
                }
            }
            Directive::Object {
                logical_name,
                alias,
            } => self.managed_objects.insert(logical_name, alias),
            Directive::DefaultContext(context) => self.default_context = Some(context),
            Directive::Mode(mode) => self.mode = Some(mode),
        }
    }

    /// Derive a child server's effective configuration from its parent
    pub fn merge(parent: &ServerReferenceConfig, child: &ServerReferenceConfig) -> Self {
        let mut managed_objects = parent.managed_objects.clone();
        managed_objects.overlay(&child.managed_objects);

        Self {
            name: child.name.clone(),
            enabled: child.enabled,
            directory_location: child
                .directory_location
                .clone()
                .or_else(|| parent.directory_location.clone()),
            managed_objects,
            default_context: child
                .default_context
                .clone()
                .or_else(|| parent.default_context.clone()),
            mode: child.mode.or(parent.mode),
        }
    }

    /// Effective directory location
    pub fn directory(&self) -> DirectoryLocation {
        self.directory_location.clone().unwrap_or_default()
    }

    /// Effective default naming context
    pub fn naming_context(&self) -> &str {
        self.default_context
            .as_deref()
            .unwrap_or(DEFAULT_NAMING_CONTEXT)
    }

    /// Effective resolution mode
    pub fn resolution_mode(&self) -> ResolutionMode {
        self.mode.unwrap_or_default()
    }
}

/// A parsed directive file: the main server plus its virtual servers
#[derive(Clone, Debug)]
pub struct ConfigFile {
    main: ServerReferenceConfig,
    virtual_servers: Vec<ServerReferenceConfig>,
}

impl ConfigFile {
    /// Read and parse a directive file
    pub fn load(path: impl AsRef<Path>) -> RefResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Ok(Self::parse(&text)?)
    }

    /// Parse directive text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut main = ServerReferenceConfig::new(MAIN_SERVER);
        let mut virtual_servers: Vec<ServerReferenceConfig> = Vec::new();
        let mut current: Option<(usize, ServerReferenceConfig)> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = match raw.split_once('#') {
                Some((before, _)) => before.trim(),
                None => raw.trim(),
            };
            if line.is_empty() {
                continue;
            }

            if let Some(tag) = line.strip_prefix('<') {
                let tag = tag
                    .strip_suffix('>')
                    .ok_or_else(|| ConfigError::syntax(line_no, "unterminated block tag"))?
                    .trim();

                if tag.eq_ignore_ascii_case("/Server") {
                    let (_, server) = current
                        .take()
                        .ok_or_else(|| ConfigError::syntax(line_no, "</Server> without <Server>"))?;
                    virtual_servers.push(server);
                    continue;
                }

                let mut words = tag.split_whitespace();
                match (words.next(), words.next(), words.next()) {
                    (Some(kind), Some(name), None) if kind.eq_ignore_ascii_case("Server") => {
                        if current.is_some() {
                            return Err(ConfigError::syntax(line_no, "nested <Server> block"));
                        }
                        if name == MAIN_SERVER
                            || virtual_servers.iter().any(|s| s.name == name)
                        {
                            return Err(ConfigError::syntax(
                                line_no,
                                format!("server '{}' defined twice", name),
                            ));
                        }
                        current = Some((line_no, ServerReferenceConfig::new(name)));
                    }
                    _ => {
                        return Err(ConfigError::syntax(
                            line_no,
                            format!("unknown block <{}>", tag),
                        ))
                    }
                }
                continue;
            }

            let mut words = line.split_whitespace();
            let name = words.next().unwrap_or_default();
            let args: Vec<&str> = words.collect();
            let directive =
                Directive::parse(name, &args).map_err(|msg| ConfigError::syntax(line_no, msg))?;

            match current.as_mut() {
                Some((_, server)) => server.apply(directive),
                None => main.apply(directive),
            }
        }

        if let Some((opened_at, server)) = current {
            return Err(ConfigError::syntax(
                opened_at,
                format!("<Server {}> is never closed", server.name),
            ));
        }

        Ok(Self {
            main,
            virtual_servers,
        })
    }

    /// The main server's own configuration
    pub fn main(&self) -> &ServerReferenceConfig {
        &self.main
    }

    /// Effective configuration of every server, main server first
    pub fn servers(&self) -> Vec<ServerReferenceConfig> {
        std::iter::once(self.main.clone())
            .chain(
                self.virtual_servers
                    .iter()
                    .map(|vs| ServerReferenceConfig::merge(&self.main, vs)),
            )
            .collect()
    }
}
