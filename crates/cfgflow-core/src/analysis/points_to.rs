//! Forward may-alias analysis.
//!
//! Keys and targets are either instruction values or the memory object an allocation creates.
//! Stores are weak updates: a store only ever adds targets.

use super::cfg::{Direction, Edge};
use super::dataflow::{DataflowAnalysis, FlowContext, Lattice};
use crate::instructions::{Instruction, Opcode};
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Location {
    /// The value produced by the instruction at this index.
    Value(usize),
    /// The storage created by the allocation at this index.
    MemoryObject(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Value(index) => write!(f, "R{}", index),
            Location::MemoryObject(index) => write!(f, "M{}", index),
        }
    }
}

/// Serialized as a list of `{location, targets}` entries, since JSON object keys must be strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToMap {
    map: BTreeMap<Location, BTreeSet<Location>>,
}

impl PointsToMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, from: Location, to: Location) {
        self.map.entry(from).or_default().insert(to);
    }

    pub fn targets(&self, from: Location) -> Option<&BTreeSet<Location>> {
        self.map.get(&from)
    }

    pub fn points_to(&self, from: Location, to: Location) -> bool {
        self.map
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Location, &BTreeSet<Location>)> + '_ {
        self.map.iter()
    }

    /// Makes `to` an exact alias of `from`, dropping whatever `to` held before.
    fn replace_with(&mut self, to: Location, from: Location) {
        if to == from {
            return;
        }
        match self.map.get(&from).cloned() {
            Some(targets) => {
                self.map.insert(to, targets);
            }
            None => {
                self.map.remove(&to);
            }
        }
    }

    fn union_into(&mut self, to: Location, from: Location) {
        if to == from {
            return;
        }
        if let Some(targets) = self.map.get(&from).cloned() {
            self.map.entry(to).or_default().extend(targets);
        }
    }
}

#[derive(Serialize)]
struct EntryRef<'a> {
    location: &'a Location,
    targets: &'a BTreeSet<Location>,
}

#[derive(Deserialize)]
struct Entry {
    location: Location,
    targets: BTreeSet<Location>,
}

impl Serialize for PointsToMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.map
                .iter()
                .map(|(location, targets)| EntryRef { location, targets }),
        )
    }
}

impl<'de> Deserialize<'de> for PointsToMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        let mut map = PointsToMap::new();
        for entry in entries {
            map.map.entry(entry.location).or_default().extend(entry.targets);
        }
        Ok(map)
    }
}

impl Lattice for PointsToMap {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        for (from, targets) in &other.map {
            joined
                .map
                .entry(*from)
                .or_default()
                .extend(targets.iter().copied());
        }
        joined
    }
}

impl fmt::Display for PointsToMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (from, targets) in &self.map {
            write!(f, "{}->(", from)?;
            for target in targets {
                write!(f, "{}/", target)?;
            }
            write!(f, ")|")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PointsToAnalysis;

impl PointsToAnalysis {
    pub fn new() -> Self {
        Self
    }

    fn apply(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        index: usize,
        out: &mut PointsToMap,
    ) -> Result<()> {
        let result = Location::Value(index);

        match inst.opcode {
            op if op.is_allocation() => out.add(result, Location::MemoryObject(index)),

            op if op.is_address_cast() => {
                if let Some(source) = cx.tracked(cx.operand(inst, 0)?)? {
                    out.replace_with(result, Location::Value(source));
                }
            }

            Opcode::Load => {
                if let Some(ptr) = cx.tracked(cx.operand(inst, 0)?)? {
                    let pointees: Vec<Location> = out
                        .targets(Location::Value(ptr))
                        .into_iter()
                        .flatten()
                        .copied()
                        .filter(|loc| matches!(loc, Location::MemoryObject(_)))
                        .collect();
                    for pointee in pointees {
                        out.union_into(result, pointee);
                    }
                }
            }

            Opcode::Store => {
                let value = cx.tracked(cx.operand(inst, 0)?)?;
                let ptr = cx.tracked(cx.operand(inst, 1)?)?;
                if let (Some(value), Some(ptr)) = (value, ptr) {
                    let slots = out.targets(Location::Value(ptr)).cloned().unwrap_or_default();
                    let stored = out
                        .targets(Location::Value(value))
                        .cloned()
                        .unwrap_or_default();
                    for slot in &slots {
                        for target in &stored {
                            out.add(*slot, *target);
                        }
                    }
                }
            }

            Opcode::Select => {
                for position in [1, 2] {
                    if let Some(candidate) = cx.tracked(cx.operand(inst, position)?)? {
                        out.union_into(result, Location::Value(candidate));
                    }
                }
            }

            Opcode::Phi => {
                for (merge_index, merge) in cx.merge_group(inst.block)? {
                    for (value, _pred) in merge.incoming_pairs() {
                        if let Some(source) = cx.tracked(value)? {
                            out.union_into(Location::Value(merge_index), Location::Value(source));
                        }
                    }
                }
            }

            _ => {}
        }

        Ok(())
    }
}

impl DataflowAnalysis for PointsToAnalysis {
    type Info = PointsToMap;

    const DIRECTION: Direction = Direction::Forward;

    fn name(&self) -> &'static str {
        "points-to"
    }

    fn transfer(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        index: usize,
        input: &PointsToMap,
        outs: &[Edge],
    ) -> Result<Vec<PointsToMap>> {
        let mut out = input.clone();

        if !inst.is_merge() || cx.is_group_head(inst)? {
            self.apply(cx, inst, index, &mut out)?;
        }

        Ok(vec![out; outs.len()])
    }
}
