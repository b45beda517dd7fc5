// SPDX-License-Identifier: Apache-2.0

//! In-memory design tree produced by the netlist parser.
//!
//! Names are interned once in the `Design`'s `StringInterner`; every entity
//! refers to them by `NameId`. Modules live in an arena in source order and
//! are looked up by name through `Design::module_index`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::OnceCell;
use string_interner::symbol::SymbolU32;
use string_interner::{StringInterner, backend::StringBackend};

use crate::netlist::count::InstanceCounts;
use crate::netlist::error::NetlistError;
use crate::netlist::scan::Pos;

pub type NameId = SymbolU32;
pub type NameInterner = StringInterner<StringBackend<SymbolU32>>;

/// Index into `Design::modules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetKind {
    Input,
    Output,
    Wire,
}

impl NetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetKind::Input => "input",
            NetKind::Output => "output",
            NetKind::Wire => "wire",
        }
    }
}

/// Declared net. `msb == lsb == 0` when no range was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Net {
    pub kind: NetKind,
    pub name: NameId,
    pub msb: u32,
    pub lsb: u32,
}

/// Named port connection `.param(arg[msb:lsb])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub param: NameId,
    pub arg: NameId,
    pub msb: u32,
    pub lsb: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub type_name: NameId,
    pub instance_name: NameId,
    pub args: Vec<Argument>,
    /// Start of the instance name in the source.
    pub pos: Pos,
}

/// Parsed module.
///
/// `counts` is filled at most once, the first time the module's flattened
/// instance counts are requested, and never changes afterwards.
#[derive(Debug)]
pub struct Module {
    pub name: NameId,
    pub params: Vec<NameId>,
    pub nets: Vec<Net>,
    pub instances: Vec<Instance>,
    /// Start of the module name in the source.
    pub pos: Pos,
    pub(crate) counts: OnceCell<InstanceCounts>,
}

impl Module {
    pub fn new(
        name: NameId,
        params: Vec<NameId>,
        nets: Vec<Net>,
        instances: Vec<Instance>,
        pos: Pos,
    ) -> Self {
        Self {
            name,
            params,
            nets,
            instances,
            pos,
            counts: OnceCell::new(),
        }
    }
}

/// All modules parsed from one source text.
#[derive(Debug)]
pub struct Design {
    interner: NameInterner,
    modules: Vec<Module>,
    index_by_name: HashMap<NameId, ModuleIndex>,
}

impl Design {
    /// Builds a design, rejecting a second definition of any module name.
    pub fn new(interner: NameInterner, modules: Vec<Module>) -> Result<Self, NetlistError> {
        let mut index_by_name = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter().enumerate() {
            if index_by_name.insert(module.name, ModuleIndex(i)).is_some() {
                return Err(NetlistError::DuplicateModule {
                    name: resolve_name(&interner, module.name).to_string(),
                    pos: module.pos,
                });
            }
        }
        Ok(Self {
            interner,
            modules,
            index_by_name,
        })
    }

    pub fn interner(&self) -> &NameInterner {
        &self.interner
    }

    /// Resolves an interned name; ids from another interner resolve to
    /// `"<unknown>"`.
    pub fn resolve(&self, id: NameId) -> &str {
        resolve_name(&self.interner, id)
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_index(&self, name: &str) -> Option<ModuleIndex> {
        let id = self.interner.get(name)?;
        self.index_by_name.get(&id).copied()
    }

    pub(crate) fn module_index_by_id(&self, id: NameId) -> Option<ModuleIndex> {
        self.index_by_name.get(&id).copied()
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.module_index(name).map(|idx| &self.modules[idx.0])
    }

    pub fn module_at(&self, idx: ModuleIndex) -> &Module {
        &self.modules[idx.0]
    }

    /// Modules that no other module of the design instantiates, in source
    /// order.
    pub fn root_modules(&self) -> Vec<ModuleIndex> {
        let instantiated: HashSet<NameId> = self
            .modules
            .iter()
            .flat_map(|m| m.instances.iter())
            .filter(|inst| self.index_by_name.contains_key(&inst.type_name))
            .map(|inst| inst.type_name)
            .collect();
        (0..self.modules.len())
            .map(ModuleIndex)
            .filter(|idx| !instantiated.contains(&self.modules[idx.0].name))
            .collect()
    }

    fn fmt_module(&self, module: &Module, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = module.params.iter().map(|p| self.resolve(*p)).collect();
        writeln!(f, "Module(")?;
        writeln!(f, "  name={},", self.resolve(module.name))?;
        writeln!(f, "  params=[{}],", params.join(", "))?;
        writeln!(f, "  nets=[")?;
        for net in &module.nets {
            writeln!(
                f,
                "    Net(kind={}, name={}, msb={}, lsb={}),",
                net.kind.as_str(),
                self.resolve(net.name),
                net.msb,
                net.lsb
            )?;
        }
        writeln!(f, "  ],")?;
        writeln!(f, "  instances=[")?;
        for inst in &module.instances {
            writeln!(f, "    Instance(")?;
            writeln!(f, "      type={},", self.resolve(inst.type_name))?;
            writeln!(f, "      name={},", self.resolve(inst.instance_name))?;
            writeln!(f, "      args=[")?;
            for arg in &inst.args {
                writeln!(
                    f,
                    "        Argument(param={}, arg={}, msb={}, lsb={}),",
                    self.resolve(arg.param),
                    self.resolve(arg.arg),
                    arg.msb,
                    arg.lsb
                )?;
            }
            writeln!(f, "      ]),")?;
        }
        writeln!(f, "  ]")?;
        write!(f, ")")
    }
}

fn resolve_name(interner: &NameInterner, id: NameId) -> &str {
    interner.resolve(id).unwrap_or("<unknown>")
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, module) in self.modules.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            self.fmt_module(module, f)?;
        }
        Ok(())
    }
}
