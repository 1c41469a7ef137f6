//! `quay init` command

use anyhow::{Context, Result};

use crate::cli::InitArgs;
use quay::ops::quay_init::{init_project, InitOptions};
use quay::util::GlobalContext;

pub fn execute(args: InitArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let path = match args.path {
        Some(path) if path.is_absolute() => path,
        Some(path) => ctx.cwd().join(path),
        None => ctx.cwd().to_path_buf(),
    };

    let name = match args.name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot infer a project name; pass --name")?,
    };

    init_project(&path, &InitOptions { name: name.clone() })?;
    eprintln!("     Created project `{}`", name);
    Ok(())
}
