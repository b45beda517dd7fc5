// SPDX-License-Identifier: Apache-2.0

//! Hierarchical instance counting.
//!
//! Counting a module flattens its hierarchy: every instance contributes one
//! to the count of its type, and instances of modules defined in the design
//! additionally contribute that module's own flattened counts. Types with no
//! module definition are primitives and do not expand.

use std::collections::HashMap;

use crate::netlist::design::{Design, ModuleIndex, NameId};
use crate::netlist::error::NetlistError;

/// Multiset of instance type names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCounts {
    counts: HashMap<NameId, u64>,
}

impl InstanceCounts {
    /// Adds `n` instances of `type_name`; `None` if the count would overflow.
    pub fn add(&mut self, type_name: NameId, n: u64) -> Option<()> {
        let slot = self.counts.entry(type_name).or_insert(0);
        *slot = slot.checked_add(n)?;
        Some(())
    }

    pub fn merge(&mut self, other: &InstanceCounts) -> Option<()> {
        for (&type_name, &n) in &other.counts {
            self.add(type_name, n)?;
        }
        Some(())
    }

    /// Count for `type_name`; zero when absent.
    pub fn get(&self, type_name: NameId) -> u64 {
        self.counts.get(&type_name).copied().unwrap_or(0)
    }

    /// Number of distinct types.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum over all types; `None` if it does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.counts
            .values()
            .try_fold(0u64, |acc, &n| acc.checked_add(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NameId, u64)> + '_ {
        self.counts.iter().map(|(&k, &v)| (k, v))
    }
}

impl Design {
    /// Returns the flattened instance counts of the module named
    /// `module_name`.
    ///
    /// Results are cached per module, so repeated calls (and calls that reach
    /// an already-counted module through another parent) return the same
    /// value without recomputation.
    pub fn count_instances(&self, module_name: &str) -> Result<&InstanceCounts, NetlistError> {
        let idx = self
            .module_index(module_name)
            .ok_or_else(|| NetlistError::UnknownModule {
                name: module_name.to_string(),
            })?;
        self.count_instances_at(idx)
    }

    pub fn count_instances_at(&self, idx: ModuleIndex) -> Result<&InstanceCounts, NetlistError> {
        let mut expanding: Vec<ModuleIndex> = Vec::new();
        self.counts_for(idx, &mut expanding)
    }

    /// `expanding` holds the modules currently being counted on this call
    /// path; meeting one of them again means the hierarchy is cyclic.
    fn counts_for(
        &self,
        idx: ModuleIndex,
        expanding: &mut Vec<ModuleIndex>,
    ) -> Result<&InstanceCounts, NetlistError> {
        let module = self.module_at(idx);
        if let Some(counts) = module.counts.get() {
            return Ok(counts);
        }
        if let Some(at) = expanding.iter().position(|&i| i == idx) {
            let mut path: Vec<String> = expanding[at..]
                .iter()
                .map(|&i| self.resolve(self.module_at(i).name).to_string())
                .collect();
            path.push(self.resolve(module.name).to_string());
            log::debug!("counts_for: cycle detected: {:?}", path);
            return Err(NetlistError::CyclicHierarchy { path });
        }

        expanding.push(idx);
        let mut counts = InstanceCounts::default();
        let overflow = || NetlistError::CountOverflow {
            module: self.resolve(module.name).to_string(),
        };
        for inst in &module.instances {
            counts.add(inst.type_name, 1).ok_or_else(overflow)?;
            if let Some(child) = self.module_index_by_id(inst.type_name) {
                let child_counts = self.counts_for(child, expanding)?;
                counts.merge(child_counts).ok_or_else(overflow)?;
            }
        }
        expanding.pop();

        log::trace!(
            "counts_for: {} has {} instance types",
            self.resolve(module.name),
            counts.len()
        );
        // Another thread may have filled the cell meanwhile; both values are
        // identical, so the first one wins.
        Ok(module.counts.get_or_init(|| counts))
    }

    /// Resolves `counts` to `(type name, count)` pairs sorted by type name.
    pub fn named_counts<'a>(&'a self, counts: &InstanceCounts) -> Vec<(&'a str, u64)> {
        let mut named: Vec<(&str, u64)> = counts
            .iter()
            .map(|(type_name, n)| (self.resolve(type_name), n))
            .collect();
        named.sort();
        named
    }
}
