//! Listing assembler and linker.
//!
//! Assembly renders every IR unit as a text listing, one `<package>.qasm`
//! per package. Linking checks for an entry point and writes
//! `program.qlink`. Files are written only when an emit directory is set.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::context::{BuildContext, LinkType};
use crate::compiler::diagnostics::{DiagnosticCode, Glitch, Locus};
use crate::compiler::pass::{AssemblerPass, PassLifecycle};
use crate::program::ir::{IrProgram, IrUnit};
use crate::program::semantic::{DefinitionKind, SemanticProgram};

/// Name of the function a complete program starts from.
pub const ENTRY_POINT: &str = "main";

pub const LISTING_EXTENSION: &str = "qasm";
pub const LINK_MAP_NAME: &str = "program.qlink";

#[derive(Debug, Default)]
pub struct ListingAssembler {
    emit_dir: Option<PathBuf>,
}

impl ListingAssembler {
    pub fn new() -> Self {
        ListingAssembler::default()
    }

    /// Write listings and the link map under `dir`.
    pub fn with_emit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.emit_dir = Some(dir.into());
        self
    }

    pub fn emit_dir(&self) -> Option<&Path> {
        self.emit_dir.as_deref()
    }

    fn write(&self, name: &str, contents: &str) -> std::io::Result<Option<PathBuf>> {
        let Some(dir) = &self.emit_dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(name);
        fs::write(&path, contents)?;
        Ok(Some(path))
    }
}

/// Render the listing of one package's units.
pub fn render_listing(ir: &IrProgram, package: &str) -> String {
    let mut listing = format!("; package {} ({})\n", package, ir.target);
    for unit in ir.units.iter().filter(|unit| unit.package == package) {
        listing.push_str(&format!("{}:\n", unit.qualified_name()));
        for instruction in &unit.body {
            listing.push_str(&format!("    {}\n", instruction));
        }
    }
    listing
}

fn find_entry_point(ir: &IrProgram) -> Option<&IrUnit> {
    ir.units
        .iter()
        .find(|unit| unit.kind == DefinitionKind::Function && unit.name == ENTRY_POINT)
}

fn packages_in_order(ir: &IrProgram) -> Vec<&str> {
    let mut packages: Vec<&str> = Vec::new();
    for unit in &ir.units {
        if !packages.contains(&unit.package.as_str()) {
            packages.push(&unit.package);
        }
    }
    packages
}

impl PassLifecycle for ListingAssembler {}

impl AssemblerPass for ListingAssembler {
    fn process_program(&mut self, program: &SemanticProgram, build_ctx: &mut BuildContext) {
        let Some(ir) = program.ir() else {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::CodeGenError,
                "no IR to assemble",
                Locus::build(),
            ));
            return;
        };

        for package in packages_in_order(ir) {
            let listing = render_listing(ir, package);
            let name = format!("{}.{}", package, LISTING_EXTENSION);
            match self.write(&name, &listing) {
                Ok(Some(path)) => tracing::debug!("Wrote {}", path.display()),
                Ok(None) => {}
                Err(e) => build_ctx.diagnostics.append_glitch(Glitch::with_message(
                    DiagnosticCode::CodeGenError,
                    format!("failed to write listing for `{}`: {}", package, e),
                    Locus::build(),
                )),
            }
        }
    }

    fn link(&mut self, program: &SemanticProgram, build_ctx: &mut BuildContext) {
        let Some(ir) = program.ir() else {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::LinkError,
                "nothing was assembled",
                Locus::build(),
            ));
            return;
        };

        let entry = find_entry_point(ir);
        if entry.is_none() && build_ctx.params.link_type == LinkType::RequireComplete {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::LinkError,
                format!("no `{}` function in any source package", ENTRY_POINT),
                Locus::build(),
            ));
            return;
        }

        let mut map = String::new();
        if let Some(entry) = entry {
            map.push_str(&format!("entry {}\n", entry.qualified_name()));
        }
        for package in packages_in_order(ir) {
            map.push_str(&format!("object {}.{}\n", package, LISTING_EXTENSION));
        }
        if let Err(e) = self.write(LINK_MAP_NAME, &map) {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::LinkError,
                format!("failed to write {}: {}", LINK_MAP_NAME, e),
                Locus::build(),
            ));
        }
    }
}
