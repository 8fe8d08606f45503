// src/reconcile/mod.rs
use std::{collections::HashMap, fmt, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HvsError;
use crate::metric::Era;
use crate::process::LongRow;

mod renames;

/// Which side of the 2013 vocabulary change the output uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameMode {
    /// Rewrite new-style names in the late era to their old form.
    KeepOld,
    /// Rewrite old-style names in the early era to their new form.
    #[default]
    KeepNew,
    NoOp,
}

impl RenameMode {
    /// The era whose names get rewritten. The other era is assumed to already
    /// be in the target vocabulary.
    pub fn target_era(&self) -> Option<Era> {
        match self {
            RenameMode::KeepOld => Some(Era::Late),
            RenameMode::KeepNew => Some(Era::Early),
            RenameMode::NoOp => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenameMode::KeepOld => "keep-old",
            RenameMode::KeepNew => "keep-new",
            RenameMode::NoOp => "no-op",
        }
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenameMode {
    type Err = HvsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep-old" => Ok(RenameMode::KeepOld),
            "keep-new" => Ok(RenameMode::KeepNew),
            "no-op" | "noop" | "none" => Ok(RenameMode::NoOp),
            other => Err(HvsError::config(format!(
                "unknown rename mode {other:?} (expected keep-old, keep-new or no-op)"
            ))),
        }
    }
}

/// Immutable two-way lookup between old and new area names.
#[derive(Debug)]
pub struct RenameMap {
    new_by_old: HashMap<&'static str, &'static str>,
    old_by_new: HashMap<&'static str, &'static str>,
}

static CENSUS_RENAMES: Lazy<RenameMap> = Lazy::new(|| RenameMap::from_pairs(&renames::RENAMES));

impl RenameMap {
    /// The Census 2013 delineation renames.
    pub fn census() -> &'static RenameMap {
        &CENSUS_RENAMES
    }

    /// Build from `(new, old)` pairs.
    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        let new_by_old = pairs.iter().map(|&(new, old)| (old, new)).collect();
        let old_by_new = pairs.iter().map(|&(new, old)| (new, old)).collect();
        Self {
            new_by_old,
            old_by_new,
        }
    }

    pub fn len(&self) -> usize {
        self.new_by_old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_by_old.is_empty()
    }

    pub fn new_name(&self, old: &str) -> Option<&'static str> {
        self.new_by_old.get(old).copied()
    }

    pub fn old_name(&self, new: &str) -> Option<&'static str> {
        self.old_by_new.get(new).copied()
    }

    pub fn old_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.new_by_old.keys().copied()
    }

    pub fn new_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.old_by_new.keys().copied()
    }
}

/// Rewrite area names toward the vocabulary `mode` selects. Exact matches
/// only; names without an entry pass through unchanged.
pub fn reconcile(mut rows: Vec<LongRow>, map: &RenameMap, mode: RenameMode) -> Vec<LongRow> {
    let lookup: fn(&RenameMap, &str) -> Option<&'static str> = match mode {
        RenameMode::KeepNew => RenameMap::new_name,
        RenameMode::KeepOld => RenameMap::old_name,
        RenameMode::NoOp => return rows,
    };

    let mut renamed = 0usize;
    for row in rows.iter_mut() {
        if let Some(target) = lookup(map, &row.area_name) {
            row.area_name = target.to_string();
            renamed += 1;
        }
    }
    debug!(%mode, renamed, total = rows.len(), "reconciled area names");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::utils::sanitize_area_name;
    use crate::process::Quarter;
    use std::collections::HashSet;

    fn row(area: &str) -> LongRow {
        LongRow {
            area_name: area.into(),
            year: 2010,
            quarter: Quarter::Q1,
            value: Some(1.0),
        }
    }

    #[test]
    fn census_map_has_thirty_distinct_pairs() {
        let map = RenameMap::census();
        assert_eq!(map.len(), 30);
        assert_eq!(map.new_names().count(), 30);

        let old: HashSet<&str> = map.old_names().collect();
        let new: HashSet<&str> = map.new_names().collect();
        assert!(old.is_disjoint(&new));
    }

    #[test]
    fn census_names_survive_sanitizing() {
        let map = RenameMap::census();
        for name in map.old_names().chain(map.new_names()) {
            assert_eq!(sanitize_area_name(name), name);
        }
    }

    #[test]
    fn lookups_are_inverse() {
        let map = RenameMap::census();
        for old in map.old_names() {
            let new = map.new_name(old).unwrap();
            assert_eq!(map.old_name(new), Some(old));
        }
    }

    #[test]
    fn keep_new_rewrites_old_names() {
        let raw = sanitize_area_name("123 Atlanta-Sandy Springs-Marietta, GA  ");
        let rows = vec![row(&raw), row("Akron, OH")];
        let out = reconcile(rows, RenameMap::census(), RenameMode::KeepNew);
        assert_eq!(out[0].area_name, "Atlanta-Sandy Springs-Roswell, GA");
        assert_eq!(out[1].area_name, "Akron, OH");
    }

    #[test]
    fn keep_new_leaves_no_old_names() {
        let map = RenameMap::census();
        let rows: Vec<LongRow> = map.old_names().map(row).collect();
        let out = reconcile(rows, map, RenameMode::KeepNew);
        let old: HashSet<&str> = map.old_names().collect();
        assert!(out.iter().all(|r| !old.contains(r.area_name.as_str())));
    }

    #[test]
    fn keep_old_rewrites_new_names() {
        let rows = vec![row("Urban Honolulu, HI"), row("Honolulu, HI")];
        let out = reconcile(rows, RenameMap::census(), RenameMode::KeepOld);
        assert_eq!(out[0].area_name, "Honolulu, HI");
        assert_eq!(out[1].area_name, "Honolulu, HI");
    }

    #[test]
    fn no_op_is_identity() {
        let rows = vec![row("Atlanta-Sandy Springs-Marietta, GA")];
        let out = reconcile(rows.clone(), RenameMap::census(), RenameMode::NoOp);
        assert_eq!(out, rows);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("keep-old".parse::<RenameMode>().unwrap(), RenameMode::KeepOld);
        assert_eq!("KEEP_NEW".parse::<RenameMode>().unwrap(), RenameMode::KeepNew);
        assert_eq!("no-op".parse::<RenameMode>().unwrap(), RenameMode::NoOp);
        assert!("sideways".parse::<RenameMode>().is_err());
        assert_eq!(RenameMode::KeepNew.target_era(), Some(Era::Early));
        assert_eq!(RenameMode::KeepOld.target_era(), Some(Era::Late));
    }
}
