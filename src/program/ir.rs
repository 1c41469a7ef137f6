//! Intermediate representation handed from IR generation to the assembler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compiler::diagnostics::Locus;
use crate::program::semantic::DefinitionKind;

/// Backend the IR is lowered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetBackend {
    #[default]
    Bytecode,
    Native,
}

impl FromStr for TargetBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bytecode" => Ok(TargetBackend::Bytecode),
            "native" => Ok(TargetBackend::Native),
            _ => Err(format!(
                "invalid target '{}'; expected 'bytecode' or 'native'",
                s
            )),
        }
    }
}

impl fmt::Display for TargetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetBackend::Bytecode => f.write_str("bytecode"),
            TargetBackend::Native => f.write_str("native"),
        }
    }
}

/// One lowered definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrUnit {
    pub package: String,
    pub name: String,
    pub kind: DefinitionKind,
    pub locus: Locus,
    /// Lowered instructions, one per entry.
    pub body: Vec<String>,
}

impl IrUnit {
    /// Fully qualified name, `package.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IrProgram {
    pub target: TargetBackend,
    pub units: Vec<IrUnit>,
}

impl IrProgram {
    pub fn new(target: TargetBackend) -> Self {
        IrProgram {
            target,
            units: Vec::new(),
        }
    }

    pub fn find_unit(&self, package: &str, name: &str) -> Option<&IrUnit> {
        self.units
            .iter()
            .find(|unit| unit.package == package && unit.name == name)
    }
}
