//! YAML role files.
//!
//! ```yaml
//! name: caddy
//! packages: [ca-certificates, caddy]
//! files:
//!   - { path: /etc/caddy, dir: true }
//!   - path: /etc/caddy/Caddyfile
//!     source: ./Caddyfile
//!     mode: "0640"
//! post_run: [[systemctl, reload, caddy]]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::application::role::{CommandHook, Role};
use crate::domain::FileEntry;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleFile {
    name: Option<String>,
    #[serde(default)]
    packages: Vec<String>,
    #[serde(default)]
    files: Vec<FileSpec>,
    #[serde(default)]
    pre_run: Vec<Vec<String>>,
    #[serde(default)]
    post_run: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSpec {
    path: String,
    #[serde(default)]
    dir: bool,
    content: Option<String>,
    source: Option<PathBuf>,
    owner: Option<String>,
    group: Option<String>,
    mode: Option<Mode>,
}

/// `"0644"`/`"0o644"` is read as octal; a bare integer is taken as the mode
/// bits themselves. A bare integer above `0o777` is rejected: that is almost
/// always decimal-looking octal such as `644`, which would deploy `0o1204`.
/// Special bits need the string form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Mode {
    Bits(u32),
    Octal(String),
}

impl Mode {
    fn bits(&self) -> Result<u32> {
        let bits = match self {
            Self::Bits(bits) if *bits > 0o777 => {
                bail!("mode {bits} is {bits:#o} in octal; quote it, e.g. \"0644\"");
            }
            Self::Bits(bits) => *bits,
            Self::Octal(text) => {
                let digits = text.trim();
                let digits = digits.strip_prefix("0o").unwrap_or(digits);
                u32::from_str_radix(digits, 8)
                    .with_context(|| format!("mode {text:?} is not an octal number"))?
            }
        };
        if bits > 0o7777 {
            bail!("mode {bits:#o} is out of range");
        }
        Ok(bits)
    }
}

/// Load one role file. Relative `source` paths resolve against the file's
/// directory; the role name defaults to the file stem.
///
/// # Errors
///
/// Returns an error if the file or a `source` cannot be read, or the YAML
/// does not describe a valid role.
pub fn load_role(path: &Path) -> Result<Role> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let default_name = path
        .file_stem()
        .map_or_else(|| "role".to_string(), |s| s.to_string_lossy().into_owned());
    parse_role(&text, base, &default_name).with_context(|| format!("in {}", path.display()))
}

/// Load several role files, keeping their order.
///
/// # Errors
///
/// Returns the first file's error.
pub fn load_roles<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Role>> {
    paths.iter().map(|p| load_role(p.as_ref())).collect()
}

/// Build a role from YAML `text`.
///
/// # Errors
///
/// Returns an error for malformed YAML, an unreadable `source`, a file with
/// both `content` and `source`, a directory with either, a bad mode, or an
/// empty hook command.
pub fn parse_role(text: &str, base: &Path, default_name: &str) -> Result<Role> {
    let spec: RoleFile = serde_yaml::from_str(text).context("cannot parse role")?;
    let name = spec.name.unwrap_or_else(|| default_name.to_string());

    let files = spec
        .files
        .into_iter()
        .map(|file| file_entry(file, base))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = Role::builder(&name).packages(spec.packages).files(files);
    if !spec.pre_run.is_empty() {
        builder = builder.pre_run(command_hook(spec.pre_run, "pre_run")?);
    }
    if !spec.post_run.is_empty() {
        builder = builder.post_run(command_hook(spec.post_run, "post_run")?);
    }
    Ok(builder.build())
}

fn file_entry(spec: FileSpec, base: &Path) -> Result<FileEntry> {
    let FileSpec {
        path,
        dir,
        content,
        source,
        owner,
        group,
        mode,
    } = spec;

    let mut entry = match (dir, content, source) {
        (true, None, None) => FileEntry::dir(path.clone()),
        (true, _, _) => bail!("{path}: a directory takes no content or source"),
        (false, Some(_), Some(_)) => bail!("{path}: give either content or source, not both"),
        (false, Some(text), None) => FileEntry::file(path.clone(), text),
        (false, None, Some(source)) => {
            let source = base.join(source);
            let bytes = std::fs::read(&source)
                .with_context(|| format!("{path}: cannot read source {}", source.display()))?;
            FileEntry::file(path.clone(), bytes)
        }
        (false, None, None) => FileEntry::file(path.clone(), Vec::new()),
    };

    if let Some(owner) = owner {
        entry = entry.owner(owner);
    }
    if let Some(group) = group {
        entry = entry.group(group);
    }
    if let Some(mode) = mode {
        entry = entry.mode(mode.bits().with_context(|| format!("{path}: invalid mode"))?);
    }
    Ok(entry)
}

fn command_hook(commands: Vec<Vec<String>>, field: &str) -> Result<CommandHook> {
    if let Some(i) = commands.iter().position(Vec::is_empty) {
        bail!("{field}: command {} is empty", i + 1);
    }
    Ok(CommandHook::new(commands))
}
