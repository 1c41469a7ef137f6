//! `quay tree` command

use anyhow::Result;

use crate::cli::TreeArgs;
use quay::core::{SourceModule, SourcePackage};
use quay::util::GlobalContext;

pub fn execute(args: TreeArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let ws = super::load_workspace(&ctx)?;
    let project = ws.project();

    let names: Vec<&str> = if args.dependency_order {
        project.dependency_order()?
    } else {
        project.packages().iter().map(SourcePackage::name).collect()
    };

    println!("{}", project.name());
    for (i, name) in names.iter().enumerate() {
        let Some(package) = project.find_package(name) else {
            continue;
        };
        let last = i + 1 == names.len();
        println!("{}{}", if last { "└── " } else { "├── " }, describe(package));
        if args.snippets {
            let indent = if last { "    " } else { "│   " };
            match package.digest_substitute() {
                Some(digest) => println!("{}└── {} (digest)", indent, digest.snippet.path()),
                None => print_module(package.root_module(), indent),
            }
        }
    }

    Ok(())
}

fn describe(package: &SourcePackage) -> String {
    let settings = package.settings();
    let mut line = format!("{} ({}, {})", package.name(), settings.verse_path, settings.role);
    if !package.dependency_packages().is_empty() {
        line.push_str(&format!(" -> {}", package.dependency_packages().join(", ")));
    }
    line
}

fn print_module(module: &SourceModule, prefix: &str) {
    let count = module.snippets().len() + module.submodules().len();
    let mut index = 0;
    for snippet in module.snippets() {
        index += 1;
        let branch = if index == count { "└── " } else { "├── " };
        println!("{}{}{}", prefix, branch, snippet.path());
    }
    for submodule in module.submodules() {
        index += 1;
        let last = index == count;
        println!("{}{}{}/", prefix, if last { "└── " } else { "├── " }, submodule.name());
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        print_module(submodule, &child_prefix);
    }
}
